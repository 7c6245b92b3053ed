//! Source: the heterogeneous evidence a response can be grounded against.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One piece of evidence supplied by a collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    DatabaseRecord(DatabaseRecord),
    MemoryEntry(MemoryEntry),
    Calculation(Calculation),
    Inference(Inference),
}

impl Source {
    /// Short kind label used in logs and metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DatabaseRecord(_) => "database",
            Self::MemoryEntry(_) => "memory",
            Self::Calculation(_) => "calculation",
            Self::Inference(_) => "inference",
        }
    }
}

impl From<DatabaseRecord> for Source {
    fn from(record: DatabaseRecord) -> Self {
        Self::DatabaseRecord(record)
    }
}

impl From<MemoryEntry> for Source {
    fn from(entry: MemoryEntry) -> Self {
        Self::MemoryEntry(entry)
    }
}

/// A flat row from the structured store, tagged with its table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRecord {
    pub table: String,
    pub record_id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl DatabaseRecord {
    pub fn new(table: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            record_id: record_id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Asset identity: `asset_id`, else `asset_name`.
    pub fn asset(&self) -> Option<String> {
        ["asset_id", "asset_name"]
            .iter()
            .filter_map(|key| self.fields.get(*key))
            .find_map(value_as_text)
    }
}

/// A semantic-memory search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub memory_id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub similarity: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Age reported by the recall backend; compared against the staleness threshold.
    #[serde(default)]
    pub age_days: Option<u32>,
}

impl MemoryEntry {
    pub fn new(memory_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            memory_id: memory_id.into(),
            content: content.into(),
            metadata: Map::new(),
            similarity: None,
            timestamp: None,
            age_days: None,
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn asset(&self) -> Option<String> {
        ["asset_id", "asset_name", "asset"]
            .iter()
            .filter_map(|key| self.metadata.get(*key))
            .find_map(value_as_text)
    }
}

/// A derived value computed from cited inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub name: String,
    pub formula: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, f64>,
    pub result: f64,
}

/// A statement the model inferred without a backing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inference {
    pub basis: String,
}

/// Render a scalar JSON value as text. Objects, arrays and nulls yield None.
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
