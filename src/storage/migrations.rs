//! Schema versioning through a dedicated single-row version table.

use rusqlite::Connection;
use tracing::info;

use super::schema::AUDIT_TABLES_V1;
use crate::errors::CitationResult;

/// Bump when adding a migration.
pub const CURRENT_VERSION: u32 = 1;

pub fn get_schema_version(conn: &Connection) -> CitationResult<u32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='audit_schema_version'",
        [],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(0);
    }
    match conn.query_row("SELECT version FROM audit_schema_version LIMIT 1", [], |row| {
        row.get::<_, u32>(0)
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: u32) -> CitationResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS audit_schema_version (
            version INTEGER NOT NULL
        ) STRICT;",
    )?;
    conn.execute("DELETE FROM audit_schema_version", [])?;
    conn.execute(
        "INSERT INTO audit_schema_version (version) VALUES (?1)",
        rusqlite::params![version],
    )?;
    Ok(())
}

/// Bring the database up to `CURRENT_VERSION`. Returns the resulting version.
pub fn migrate(conn: &Connection) -> CitationResult<u32> {
    let current = get_schema_version(conn)?;
    if current >= CURRENT_VERSION {
        return Ok(current);
    }

    if current < 1 {
        info!("Migrating audit schema: 0 -> 1");
        conn.execute_batch(AUDIT_TABLES_V1)?;
        set_schema_version(conn, 1)?;
    }

    let final_version = get_schema_version(conn)?;
    info!(from = current, to = final_version, "Audit schema migration complete");
    Ok(final_version)
}
