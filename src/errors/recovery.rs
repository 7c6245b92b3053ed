//! RecoveryAction enum: what to do when a pipeline operation fails.

use std::fmt;

use super::CitationError;

/// Recommended recovery action for a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the operation (transient failure like SQLITE_BUSY).
    Retry,
    /// Degrade to a weaker but well-formed result.
    Fallback,
    /// Escalate to the caller: this error cannot be handled silently.
    Escalate,
    /// Ignore the error: operation was best-effort (audit).
    Ignore,
}

impl RecoveryAction {
    /// Determine the recommended recovery action for a CitationError.
    pub fn for_error(error: &CitationError) -> Self {
        match error {
            CitationError::Storage(e) if is_busy_error(e) => Self::Retry,

            // No claims to validate
            CitationError::ExtractionFailed { .. } => Self::Fallback,
            CitationError::ModelUnavailable { .. } => Self::Fallback,
            // Claim marked ungrounded with zero confidence
            CitationError::ClaimValidationFailed { .. } => Self::Fallback,
            // Continue with the backends that answered
            CitationError::SourceGatherFailed { .. } => Self::Fallback,
            // Proceed with partial results
            CitationError::DeadlineExceeded { .. } => Self::Fallback,

            CitationError::AuditFailed { .. } => Self::Ignore,

            CitationError::Config(_) => Self::Escalate,
            CitationError::InvalidInput(_) => Self::Escalate,
            CitationError::Serialization(_) => Self::Escalate,

            CitationError::Storage(_) => Self::Retry,
        }
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "Retry"),
            Self::Fallback => write!(f, "Fallback"),
            Self::Escalate => write!(f, "Escalate"),
            Self::Ignore => write!(f, "Ignore"),
        }
    }
}

/// Check if a rusqlite error is SQLITE_BUSY (lock contention).
fn is_busy_error(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ffi::ErrorCode::DatabaseBusy,
                ..
            },
            _,
        )
    )
}
