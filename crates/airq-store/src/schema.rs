//! Database schema.

use rusqlite::Connection;
use tracing::warn;

use crate::error::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Create the schema if the database is fresh.
pub fn initialize(conn: &Connection) -> Result<()> {
    match schema_version(conn)? {
        0 => {
            create_schema_v1(conn)?;
            conn.execute(
                "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?1)",
                [SCHEMA_VERSION],
            )?;
        }
        SCHEMA_VERSION => {}
        other => warn!(
            "Cache database has schema version {} (expected {}); using it as-is",
            other, SCHEMA_VERSION
        ),
    }

    Ok(())
}

/// Schema version recorded in the database, 0 if none.
fn schema_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    Ok(conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?)
}

fn create_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        -- One row per cache slot; value is a JSON document
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;

    Ok(())
}
