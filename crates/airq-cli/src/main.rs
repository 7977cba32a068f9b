use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use airq_cli::cli::{Cli, Commands};
use airq_cli::commands::{cmd_cache, cmd_check, cmd_config};
use airq_cli::config::{Config, default_config_path};
use airq_cli::format::FormatOptions;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let opts = FormatOptions::new(cli.no_color, cli.compact);
    tracing::debug!("Using config file {}", config_path.display());

    match cli.command {
        Commands::Config { action } => {
            cmd_config(action, &config_path)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Cache { action } => {
            let config = Config::load_validated(&config_path)?;
            cmd_cache(action, &config, &opts).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check(args) => {
            let config = Config::load_validated(&config_path)?;
            cmd_check(args, &config, &opts).await
        }
    }
}
