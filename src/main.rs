//! loadkit - dependency-closure builds for runtime loaders
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use loadkit::cli::{Cli, Commands};
use loadkit::config::ConfigManager;
use loadkit::error::{LoadkitError, LoadkitResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> LoadkitResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("loadkit=warn"),
        1 => EnvFilter::new("loadkit=info"),
        _ => EnvFilter::new("loadkit=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    let local_config_path = if cli.no_local || cli.config.is_some() {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| LoadkitError::io("getting current directory", e))?;
        let found = ConfigManager::find_local_config(&cwd);
        if let Some(ref path) = found {
            debug!("Found local config: {}", path.display());
        }
        found
    };

    let config = config_manager
        .load_preferring(local_config_path.as_deref())
        .await?;
    let verbose = cli.verbose > 0;

    match cli.command {
        Commands::Build(args) => loadkit::cli::commands::build(args, &config, verbose).await,
        Commands::Link(args) => loadkit::cli::commands::link(args, &config, verbose).await,
        Commands::Config(args) => {
            loadkit::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
