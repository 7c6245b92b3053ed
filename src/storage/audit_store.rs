//! `SqliteAuditSink`: the default audit collaborator.
//!
//! One row per verified response. The full `CitedResponse` is kept as JSON
//! in `payload`; headline figures get their own columns for querying.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::migrations::migrate;
use super::pragmas::configure_connection;
use crate::errors::{CitationError, CitationResult};
use crate::orchestrator::{AuditRecord, AuditSink};
use crate::types::CitedResponse;

/// One stored audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRow {
    pub id: String,
    pub user_id: String,
    pub query_text: String,
    pub response_text: String,
    pub grounding_score: f64,
    pub citation_count: i64,
    pub ungrounded_count: i64,
    pub degraded: bool,
    pub created_at: i64,
    pub response: CitedResponse,
}

pub struct SqliteAuditSink {
    conn: Mutex<Connection>,
}

impl SqliteAuditSink {
    pub fn open(path: impl AsRef<Path>) -> CitationResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> CitationResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> CitationResult<Self> {
        configure_connection(&conn)?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> CitationResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CitationError::Config(format!("audit connection lock poisoned: {}", e)))
    }

    /// Insert (or replace) the row for a record.
    pub fn write(&self, record: &AuditRecord) -> CitationResult<()> {
        let response = &record.response;
        let payload = serde_json::to_string(response)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO citation_audit_log
                (id, user_id, query_text, response_text, grounding_score,
                 citation_count, ungrounded_count, degraded, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                response.id,
                record.user_id,
                record.query_text,
                response.response_text,
                response.grounding_score,
                response.citations.len() as i64,
                response.ungrounded_claims.len() as i64,
                response.is_degraded() as i64,
                payload,
                record.recorded_at.timestamp(),
            ],
        )?;
        Ok(())
    }

    pub fn get_audit_record(&self, id: &str) -> CitationResult<Option<AuditRow>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, user_id, query_text, response_text, grounding_score,
                        citation_count, ungrounded_count, degraded, created_at, payload
                 FROM citation_audit_log WHERE id = ?1",
                params![id],
                read_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Newest first.
    pub fn recent_audit_records(&self, limit: usize) -> CitationResult<Vec<AuditRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, query_text, response_text, grounding_score,
                    citation_count, ungrounded_count, degraded, created_at, payload
             FROM citation_audit_log ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], read_row)?;
        let out = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(out)
    }

    pub fn count(&self) -> CitationResult<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM citation_audit_log", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Delete rows older than `days`. Returns how many were removed.
    pub fn apply_retention(&self, days: u32) -> CitationResult<usize> {
        let cutoff = Utc::now().timestamp() - i64::from(days) * 86_400;
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM citation_audit_log WHERE created_at < ?1",
            params![cutoff],
        )?;
        if deleted > 0 {
            info!(deleted, days, "Audit retention applied");
        }
        Ok(deleted)
    }
}

impl AuditSink for SqliteAuditSink {
    fn record(&self, record: &AuditRecord) -> CitationResult<()> {
        self.write(record).map_err(|e| CitationError::AuditFailed {
            response_id: record.response.id.clone(),
            reason: e.to_string(),
        })
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<AuditRow> {
    let payload: String = row.get(9)?;
    let response: CitedResponse = serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(AuditRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        query_text: row.get(2)?,
        response_text: row.get(3)?,
        grounding_score: row.get(4)?,
        citation_count: row.get(5)?,
        ungrounded_count: row.get(6)?,
        degraded: row.get::<_, i64>(7)? != 0,
        created_at: row.get(8)?,
        response,
    })
}
