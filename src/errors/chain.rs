//! Error chain builder for multi-step operations.
//!
//! Collects non-fatal errors during one verification so the caller
//! can inspect all failures rather than stopping at the first one.

use super::citation_error::CitationError;

/// A single link in an error chain.
#[derive(Debug)]
pub struct ChainedError {
    /// The error that occurred.
    pub error: CitationError,
    /// Pipeline stage that produced it (e.g. "memory", "validation").
    pub stage: &'static str,
    /// Step index within the stage (claim index, backend index).
    pub step: usize,
}

/// Accumulates errors that were degraded instead of propagated.
#[derive(Debug, Default)]
pub struct ErrorChain {
    errors: Vec<ChainedError>,
}

impl ErrorChain {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record an error at a given stage and step.
    pub fn push(&mut self, stage: &'static str, step: usize, error: CitationError) {
        self.errors.push(ChainedError { error, stage, step });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainedError> {
        self.errors.iter()
    }

    /// Consume the chain and return the collected errors.
    pub fn into_errors(self) -> Vec<ChainedError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_accumulates_in_order() {
        let mut chain = ErrorChain::new();
        assert!(chain.is_empty());
        chain.push(
            "memory",
            0,
            CitationError::SourceGatherFailed {
                backend: "generic".into(),
                reason: "timeout".into(),
            },
        );
        chain.push("validation", 3, CitationError::InvalidInput("empty claim".into()));
        assert_eq!(chain.len(), 2);
        assert!(chain.has_errors());
        let steps: Vec<_> = chain.iter().map(|c| (c.stage, c.step)).collect();
        assert_eq!(steps, vec![("memory", 0), ("validation", 3)]);
    }
}
