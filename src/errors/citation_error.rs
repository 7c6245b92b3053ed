//! CitationError: every failure the pipeline can observe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CitationError {
    #[error("Claim extraction failed: {reason}")]
    ExtractionFailed { reason: String },

    #[error("Language model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    #[error("Validation failed for claim '{claim}': {reason}")]
    ClaimValidationFailed { claim: String, reason: String },

    #[error("Source gathering failed for backend {backend}: {reason}")]
    SourceGatherFailed { backend: String, reason: String },

    #[error("Audit failed for response {response_id}: {reason}")]
    AuditFailed { response_id: String, reason: String },

    #[error("Deadline exceeded during {stage} after {elapsed_ms}ms")]
    DeadlineExceeded { stage: String, elapsed_ms: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CitationResult<T> = Result<T, CitationError>;
