//! Command implementations for the CLI.

mod cache;
mod check;
mod config;

pub use cache::cmd_cache;
pub use check::cmd_check;
pub use config::cmd_config;
