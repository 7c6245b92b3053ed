//! SQLite persistence for the audit trail of verified responses.

pub mod audit_store;
pub mod migrations;
pub mod pragmas;
pub mod schema;

pub use audit_store::{AuditRow, SqliteAuditSink};
pub use migrations::migrate;
pub use pragmas::configure_connection;
pub use schema::AUDIT_TABLE_NAMES;
