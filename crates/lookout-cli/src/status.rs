//! `lookout status`: show configuration and provider status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use lookout_core::config::{get_config_path, load_config};
use lookout_providers::registry::{default_spec, find_by_name, PROVIDERS};

use crate::helpers::expand_tilde;

fn mark(exists: bool) -> String {
    if exists {
        "✓".green().to_string()
    } else {
        "(not found)".red().to_string()
    }
}

fn path_row(label: &str, path: &Path) {
    println!("  {:<18} {} {}", label.bold(), path.display(), mark(path.exists()));
}

/// Run the status command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "🔭 Lookout Status".cyan().bold());
    println!();

    path_row("Config:", &config_path);
    path_row("Workspace:", &expand_tilde(&config.agent.workspace));

    let prompt_dir = expand_tilde(&config.agent.prompt_dir);
    path_row("Prompt dir:", &prompt_dir);
    for file in ["system.txt", "prompt.txt"] {
        let path = prompt_dir.join(file);
        let state = if path.is_file() {
            "✓".green().to_string()
        } else {
            "· default".dimmed().to_string()
        };
        println!("    {:<20} {}", file, state);
    }

    println!(
        "  {:<18} {}",
        "Output dir:".bold(),
        expand_tilde(&config.agent.output_dir).display()
    );
    let logs = if config.logging.enabled {
        expand_tilde(&config.logging.dir).display().to_string()
    } else {
        "disabled".dimmed().to_string()
    };
    println!("  {:<18} {}", "Run logs:".bold(), logs);
    println!(
        "  {:<18} {}",
        "Max iterations:".bold(),
        config.agent.max_iterations
    );

    // Provider
    println!();
    let spec = if config.provider.name.is_empty() {
        Some(default_spec())
    } else {
        find_by_name(&config.provider.name)
    };
    match spec {
        Some(spec) => {
            let key = if config.provider.is_configured() {
                format!("{} (key set)", "✓".green())
            } else if spec.requires_key {
                format!("{} set {} or pass --token", "✗".red(), spec.env_key)
            } else {
                format!("{}", "· not required".dimmed())
            };
            println!("  {:<18} {} ({})", "Provider:".bold(), spec.display_name, spec.name);
            println!(
                "  {:<18} {}",
                "Endpoint:".bold(),
                config
                    .provider
                    .api_base
                    .as_deref()
                    .unwrap_or(spec.default_api_base)
            );
            println!("  {:<18} {}", "Model:".bold(), config.provider.model);
            println!(
                "  {:<18} {} | max_tokens: {}",
                "Parameters:".bold(),
                format!("temp: {}", config.provider.temperature).dimmed(),
                format!("{}", config.provider.max_tokens).dimmed(),
            );
            println!("  {:<18} {}", "Credentials:".bold(), key);
        }
        None => {
            println!(
                "  {:<18} {} {}",
                "Provider:".bold(),
                config.provider.name,
                "(unknown)".red()
            );
        }
    }

    println!();
    println!("  {}", "Known providers:".bold());
    for spec in PROVIDERS {
        println!("    {:<20} {}", spec.display_name, spec.name.dimmed());
    }
    println!();

    Ok(())
}
