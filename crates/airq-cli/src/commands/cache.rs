//! Cache command - inspect the local measurement cache.

use anyhow::{Context, Result};

use airq_core::{Clock, SystemClock};
use airq_store::{CacheStore, SqliteStore};

use crate::cli::{CacheAction, OutputFormat};
use crate::config::Config;
use crate::format::{CacheSummary, FormatOptions, format_cache_json, format_cache_text};

/// Execute the cache command.
pub async fn cmd_cache(action: CacheAction, config: &Config, opts: &FormatOptions) -> Result<()> {
    match action {
        CacheAction::Path => {
            println!("{}", config.cache.path.display());
            Ok(())
        }
        CacheAction::Show { format } => show(&open(config)?, format, config, opts).await,
        CacheAction::Clear => {
            let store = open(config)?;
            store.clear().await?;
            println!("Cache cleared: {}", config.cache.path.display());
            Ok(())
        }
    }
}

fn open(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&config.cache.path)
        .with_context(|| format!("Failed to open cache at {}", config.cache.path.display()))
}

async fn show(
    store: &SqliteStore,
    format: OutputFormat,
    config: &Config,
    opts: &FormatOptions,
) -> Result<()> {
    let slots = store.read_slots().await?;
    let info = store.slot_info()?;
    let summary = CacheSummary::new(
        &slots,
        info,
        &config.query_options().policy,
        SystemClock.now_unix(),
    );

    let content = match format {
        OutputFormat::Json => format_cache_json(&summary, opts)?,
        OutputFormat::Text => format_cache_text(&summary, opts),
    };
    print!("{}", content);
    Ok(())
}
