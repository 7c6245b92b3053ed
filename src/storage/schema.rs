//! Schema SQL for the audit store.

/// V1: one row per verified response, plus lookup indexes.
pub const AUDIT_TABLES_V1: &str = "
    CREATE TABLE IF NOT EXISTS citation_audit_log (
        id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        query_text TEXT NOT NULL,
        response_text TEXT NOT NULL,
        grounding_score REAL NOT NULL,
        citation_count INTEGER NOT NULL,
        ungrounded_count INTEGER NOT NULL,
        degraded INTEGER NOT NULL DEFAULT 0,
        payload TEXT NOT NULL,
        created_at INTEGER NOT NULL DEFAULT (unixepoch())
    ) STRICT;

    CREATE INDEX IF NOT EXISTS idx_audit_user ON citation_audit_log(user_id);
    CREATE INDEX IF NOT EXISTS idx_audit_created ON citation_audit_log(created_at);
";

/// Tables owned by the audit store (excluding the version table).
pub const AUDIT_TABLE_NAMES: &[&str] = &["citation_audit_log"];
