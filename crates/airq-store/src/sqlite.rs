//! SQLite-backed cache store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, info};

use airq_types::CacheEntry;

use crate::error::{Error, Result};
use crate::schema;
use crate::slots::{CacheStore, CachedSlots, Slot, decode_slots, encode_entry};

/// Metadata about one stored slot.
#[derive(Debug, Clone, Serialize)]
pub struct SlotInfo {
    /// Storage key.
    pub key: String,
    /// When the slot was last written.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Size of the stored JSON document in bytes.
    pub size_bytes: usize,
}

/// SQLite-based [`CacheStore`].
///
/// `replace_entry` runs the clear and the three writes in a single
/// transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish()
    }
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening cache database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Path of the database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Read the raw JSON stored in a slot.
    pub fn get_value(&self, slot: Slot) -> Result<Option<Value>> {
        let conn = self.lock()?;
        let text: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [slot.key()], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(text.map(|t| serde_json::from_str(&t)).transpose()?)
    }

    /// Read all three slots with a single statement.
    ///
    /// One `SELECT` sees one database state, so the result never mixes
    /// generations even when another process replaces the entry.
    pub fn read_snapshot(&self) -> Result<CachedSlots> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, value FROM kv WHERE key IN (?1, ?2, ?3)")?;
        let rows = stmt
            .query_map(Slot::ALL.map(|slot| slot.key()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut values: [Option<Value>; 3] = [None, None, None];
        for (key, text) in rows {
            if let Some(index) = Slot::ALL.iter().position(|slot| slot.key() == key) {
                values[index] = Some(serde_json::from_str(&text)?);
            }
        }

        let [installations, data, timestamp] = values;
        Ok(decode_slots(installations, data, timestamp))
    }

    /// Overwrite a slot.
    pub fn set_value(&self, slot: Slot, value: &Value) -> Result<()> {
        let text = serde_json::to_string(value)?;
        let conn = self.lock()?;
        write_slot(&conn, slot, &text)
    }

    /// Delete every slot.
    pub fn clear_all(&self) -> Result<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM kv", [])?;
        debug!("Cleared {} cache slot(s)", removed);
        Ok(())
    }

    /// Replace the whole entry inside one transaction.
    pub fn replace_entry_atomic(&self, entry: &CacheEntry) -> Result<()> {
        let texts = encode_entry(entry)?
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM kv", [])?;
        for (slot, text) in Slot::ALL.into_iter().zip(&texts) {
            write_slot(&tx, slot, text)?;
        }
        tx.commit()?;

        debug!("Replaced cache entry (timestamp {})", entry.timestamp);
        Ok(())
    }

    /// List stored slots in write order.
    pub fn slot_info(&self) -> Result<Vec<SlotInfo>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, updated_at, length(value) FROM kv")?;

        let mut infos = stmt
            .query_map([], |row| {
                let updated_at: i64 = row.get(1)?;
                let size: i64 = row.get(2)?;
                Ok(SlotInfo {
                    key: row.get(0)?,
                    updated_at: OffsetDateTime::from_unix_timestamp(updated_at)
                        .unwrap_or(OffsetDateTime::UNIX_EPOCH),
                    size_bytes: usize::try_from(size).unwrap_or(0),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        infos.sort_by_key(|info| {
            Slot::from_key(&info.key)
                .and_then(|slot| Slot::ALL.iter().position(|s| *s == slot))
                .unwrap_or(usize::MAX)
        });

        Ok(infos)
    }
}

fn write_slot(conn: &Connection, slot: Slot, text: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
        rusqlite::params![slot.key(), text, OffsetDateTime::now_utc().unix_timestamp()],
    )?;
    Ok(())
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn get(&self, slot: Slot) -> Result<Option<Value>> {
        self.get_value(slot)
    }

    async fn set(&self, slot: Slot, value: Value) -> Result<()> {
        self.set_value(slot, &value)
    }

    async fn clear(&self) -> Result<()> {
        self.clear_all()
    }

    async fn read_slots(&self) -> Result<CachedSlots> {
        self.read_snapshot()
    }

    async fn replace_entry(&self, entry: &CacheEntry) -> Result<()> {
        self.replace_entry_atomic(entry)
    }
}
