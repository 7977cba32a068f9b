//! Single-entry cache store for air-quality sensor data.
//!
//! The cache holds exactly one entry made of three slots: the nearest
//! installations, their measurement payload, and the unix time at which both
//! were fetched. Slots are JSON documents stored under fixed string keys.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-local, used by tests and `--memory` runs
//! - [`SqliteStore`]: persistent, one `kv` table in a SQLite file
//!
//! # Ordering
//!
//! [`CacheStore::replace_entry`] clears the store and then writes
//! installations, data and timestamp in that order, so a present timestamp
//! implies a complete entry. [`CacheStore::read_slots`] returns a snapshot:
//! it never pairs installations or data from one entry with the timestamp
//! of another.
//!
//! # Example
//!
//! ```no_run
//! use airq_store::{CacheStore, SqliteStore};
//!
//! # async fn example() -> airq_store::Result<()> {
//! let store = SqliteStore::open_default()?;
//! let slots = store.read_slots().await?;
//! println!("cached at: {:?}", slots.timestamp);
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod schema;
mod slots;
mod sqlite;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use slots::{CacheStore, CachedSlots, Slot};
pub use sqlite::{SlotInfo, SqliteStore};

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/airq/cache.db`
/// - macOS: `~/Library/Application Support/airq/cache.db`
/// - Windows: `C:\Users\<user>\AppData\Local\airq\cache.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("airq")
        .join("cache.db")
}
