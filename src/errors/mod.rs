//! Error types for the verification pipeline (thiserror).

mod chain;
mod citation_error;
mod recovery;

pub use chain::{ChainedError, ErrorChain};
pub use citation_error::{CitationError, CitationResult};
pub use recovery::RecoveryAction;
