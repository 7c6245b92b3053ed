//! CitedResponse: the only entity that crosses the pipeline boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::citation::Citation;
use super::claim::Claim;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitedResponse {
    pub id: String,
    pub response_text: String,
    pub citations: Vec<Citation>,
    pub claims: Vec<Claim>,
    /// Mean confidence over grounding-required claims; 1.0 when there are none.
    pub grounding_score: f64,
    pub ungrounded_claims: Vec<String>,
    /// Timing and count metadata (ordered for stable serialization).
    pub meta: BTreeMap<String, Value>,
}

impl CitedResponse {
    /// Minimal response returned when the pipeline itself failed.
    pub fn degraded(raw_response: impl Into<String>, synopsis: impl Into<String>) -> Self {
        let mut meta = BTreeMap::new();
        meta.insert("degraded".to_string(), Value::Bool(true));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            response_text: raw_response.into(),
            citations: Vec::new(),
            claims: Vec::new(),
            grounding_score: 0.0,
            ungrounded_claims: vec![synopsis.into()],
            meta,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.meta.get("degraded").and_then(Value::as_bool).unwrap_or(false)
    }
}
