//! Claim: an atomic assertion extracted from a response.

use serde::{Deserialize, Serialize};

/// What kind of assertion a claim makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Factual,
    Historical,
    Recommendation,
    Other,
}

impl ClaimType {
    /// Parse a model-authored type label. Unknown labels become `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "factual" | "fact" | "metric" | "statistic" => Self::Factual,
            "historical" | "history" | "trend" => Self::Historical,
            "recommendation" | "advice" | "suggestion" => Self::Recommendation,
            _ => Self::Other,
        }
    }

    /// Factual and historical claims assert something checkable.
    pub fn grounded_by_default(&self) -> bool {
        matches!(self, Self::Factual | Self::Historical)
    }
}

/// An atomic assertion. Created per request, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub text: String,
    pub claim_type: ClaimType,
    pub requires_grounding: bool,
    #[serde(default)]
    pub entity_mentions: Vec<String>,
    #[serde(default)]
    pub metric_mentions: Vec<String>,
    #[serde(default)]
    pub temporal_reference: Option<String>,
}

impl Claim {
    /// A factual claim with no mentions; the caller fills in what it knows.
    pub fn factual(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            claim_type: ClaimType::Factual,
            requires_grounding: true,
            entity_mentions: Vec::new(),
            metric_mentions: Vec::new(),
            temporal_reference: None,
        }
    }

    pub fn with_entities(mut self, entities: &[&str]) -> Self {
        self.entity_mentions = entities.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_metrics(mut self, metrics: &[&str]) -> Self {
        self.metric_mentions = metrics.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_temporal(mut self, reference: &str) -> Self {
        self.temporal_reference = Some(reference.to_string());
        self
    }
}
