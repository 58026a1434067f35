//! Lookout CLI: entry point.
//!
//! # Commands
//!
//! - `lookout analyze [-w DIR] [-p PROMPT] ...`: run one analysis over a workspace
//! - `lookout tools`: list the built-in tools and their parameter schemas
//! - `lookout status`: show configuration and provider status
//! - `lookout init`: write a default config and prompt files

mod helpers;
mod init;
mod logs;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use lookout_agent::{
    AgentConfig, AgentLoop, ReadOnlyFileSystem, RunObserver, ToolRegistry, TracingObserver,
};
use lookout_core::config::{load_config, Config};
use lookout_providers::create_provider;

use crate::helpers::expand_tilde;
use crate::logs::JsonlObserver;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🔭 Lookout: read-only code analysis agent
#[derive(Parser)]
#[command(name = "lookout", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.lookout/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a workspace
    Analyze(AnalyzeArgs),

    /// List the built-in tools
    Tools,

    /// Show configuration and provider status
    Status,

    /// Write a default config and prompt files
    Init,
}

#[derive(Args, Debug, Default)]
struct AnalyzeArgs {
    /// Workspace directory to analyze
    #[arg(short, long)]
    workspace: Option<String>,

    /// Log every tool result
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Maximum number of model round-trips
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    max_iterations: Option<u32>,

    /// API token for the completion provider
    #[arg(short, long)]
    token: Option<String>,

    /// System prompt text (overrides system.txt)
    #[arg(short, long)]
    system: Option<String>,

    /// Analysis request (overrides prompt.txt)
    #[arg(short, long)]
    prompt: Option<String>,

    /// Do not write JSON-lines run logs
    #[arg(long, default_value_t = false)]
    no_log: bool,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => {
            init_logging(args.debug);
            run_analyze(cli.config, args).await
        }
        Commands::Tools => run_tools(cli.config),
        Commands::Status => status::run(cli.config.as_deref()),
        Commands::Init => init::run(cli.config.as_deref()),
    }
}

// ─────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────

async fn run_analyze(config_path: Option<PathBuf>, args: AnalyzeArgs) -> Result<()> {
    let mut config = load_config(config_path.as_deref());
    apply_overrides(&mut config, &args);

    let provider = create_provider(&config.provider).map_err(anyhow::Error::msg)?;
    let agent_config = build_agent_config(&config);
    let fs = Arc::new(ReadOnlyFileSystem::new(agent_config.workspace_root.clone()));

    let observer: Arc<dyn RunObserver> = if config.logging.enabled && !args.no_log {
        let observer = JsonlObserver::new(expand_tilde(&config.logging.dir));
        info!(dir = %observer.dir().display(), "writing run logs");
        Arc::new(observer)
    } else {
        Arc::new(TracingObserver)
    };

    let mut agent = AgentLoop::new(agent_config, Arc::new(provider), fs, observer);
    agent.initialize().context("failed to initialize agent")?;

    let result = agent.analyze_workspace(args.prompt.as_deref()).await;
    helpers::print_result(&result);

    match result.error {
        Some(error) => anyhow::bail!(error),
        None => Ok(()),
    }
}

fn run_tools(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref());
    let agent_config = build_agent_config(&config);
    let fs = Arc::new(ReadOnlyFileSystem::new(agent_config.workspace_root));
    let registry = ToolRegistry::with_read_only_tools(fs, agent_config.output_dir);
    helpers::print_tools(&registry);
    Ok(())
}

/// Fold command-line flags into the loaded config; flags win.
fn apply_overrides(config: &mut Config, args: &AnalyzeArgs) {
    if let Some(workspace) = &args.workspace {
        config.agent.workspace = workspace.clone();
    }
    if args.debug {
        config.agent.debug = true;
    }
    if let Some(max) = args.max_iterations {
        config.agent.max_iterations = max;
    }
    if let Some(token) = &args.token {
        config.provider.api_key = token.clone();
    }
    if let Some(system) = &args.system {
        config.agent.system_prompt = Some(system.clone());
    }
}

fn build_agent_config(config: &Config) -> AgentConfig {
    let mut agent_config = AgentConfig::from_defaults(&config.agent);
    agent_config.workspace_root = expand_tilde(&config.agent.workspace);
    agent_config.prompt_dir = expand_tilde(&config.agent.prompt_dir);
    agent_config.output_dir = expand_tilde(&config.agent.output_dir);
    agent_config
}

// ─────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("lookout=debug,info")
        } else {
            EnvFilter::new("lookout=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
