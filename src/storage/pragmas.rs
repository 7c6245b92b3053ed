//! SQLite PRAGMA configuration for audit connections.
//! Must be called on every connection immediately after opening.

use rusqlite::Connection;

use crate::errors::CitationResult;

/// WAL with a busy timeout: the audit worker writes while readers query history.
pub fn configure_connection(conn: &Connection) -> CitationResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -4000;
        PRAGMA temp_store = MEMORY;
        ",
    )?;
    Ok(())
}
