//! GroundingResult: the outcome of validating one claim.

use serde::{Deserialize, Serialize};

use super::citation::Citation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundingResult {
    pub claim_text: String,
    pub is_grounded: bool,
    /// Confidence of the best-supporting source, 0.0 to 1.0.
    pub confidence: f64,
    pub supporting_citations: Vec<Citation>,
    pub validation_time_ms: f64,
}

impl GroundingResult {
    /// A claim that could not be validated at all.
    pub fn failed(claim_text: impl Into<String>) -> Self {
        Self {
            claim_text: claim_text.into(),
            is_grounded: false,
            confidence: 0.0,
            supporting_citations: Vec::new(),
            validation_time_ms: 0.0,
        }
    }
}
