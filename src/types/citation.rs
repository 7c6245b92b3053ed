//! Citation: a structured pointer from text to the evidence that supports it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Database,
    Memory,
    Calculation,
    Inference,
}

impl SourceType {
    /// Primary-source preference: database > calculation > memory > inference.
    pub fn primary_bonus(&self) -> f64 {
        match self {
            Self::Database => 0.3,
            Self::Calculation => 0.2,
            Self::Memory => 0.1,
            Self::Inference => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Memory => "memory",
            Self::Calculation => "calculation",
            Self::Inference => "inference",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub source_type: SourceType,
    pub source_table: Option<String>,
    pub record_id: Option<String>,
    pub memory_id: Option<String>,
    pub asset_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub excerpt: String,
    /// 0.0 (no support) to 1.0 (certain).
    pub confidence: f64,
    pub display_text: String,
    /// The claim span this citation annotates, when it came from validation.
    pub claim_text: Option<String>,
}

impl Citation {
    /// Deduplication key: `record_id`, else `memory_id`, else the citation's own id.
    pub fn identity_key(&self) -> &str {
        self.record_id
            .as_deref()
            .or(self.memory_id.as_deref())
            .unwrap_or(&self.id)
    }
}
