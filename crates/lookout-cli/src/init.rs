//! `lookout init`: write a default config and prompt files.
//!
//! Existing files are left untouched.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use lookout_core::config::{get_config_path, load_config, save_config, Config};

use crate::helpers::expand_tilde;

const SYSTEM_TEMPLATE: &str = "You are a meticulous code reviewer. You can only read the workspace; \
use the tools to inspect files before drawing conclusions, and call finish_analyze when done.\n";

const PROMPT_TEMPLATE: &str = "analyze code\n";

/// Run the init command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    println!();
    println!("{}", "🔭 Lookout: Setup".cyan().bold());
    println!();

    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    if write_default_config(&config_path)? {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    }

    let config = load_config(Some(&config_path));

    let prompt_dir = expand_tilde(&config.agent.prompt_dir);
    std::fs::create_dir_all(&prompt_dir)
        .with_context(|| format!("failed to create {}", prompt_dir.display()))?;
    create_template(&prompt_dir.join("system.txt"), SYSTEM_TEMPLATE)?;
    create_template(&prompt_dir.join("prompt.txt"), PROMPT_TEMPLATE)?;

    println!();
    println!(
        "{}",
        "Next: set GITHUB_TOKEN (or pass --token) and run `lookout analyze -w <dir>`.".dimmed()
    );
    println!();
    Ok(())
}

/// Write `Config::default()` unless a file is already there; returns whether
/// a file was written. Env overrides (credentials included) are not applied.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

fn create_template(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("  {} {} already exists", "✓".green(), path.display());
        return Ok(());
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    println!("  {} created {}", "✓".green(), path.display());
    Ok(())
}
