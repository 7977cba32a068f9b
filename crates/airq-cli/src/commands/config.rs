//! Config command - manage the configuration file.

use std::path::Path;

use anyhow::{Result, bail};

use crate::cli::ConfigAction;
use crate::config::Config;

/// Execute the config command.
pub fn cmd_config(action: ConfigAction, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let mut config = Config::load_or_default(path)?;
            let validation = config.validate();
            if config.api.api_key.is_some() {
                config.api.api_key = Some("********".to_string());
            }
            print!("{}", toml::to_string_pretty(&config)?);
            if let Err(e) = validation {
                eprintln!("\n{}", e);
            }
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
