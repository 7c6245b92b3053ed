//! SourcePool: heterogeneous evidence normalized into one searchable form.
//!
//! Each source is flattened once per request into identity text (names, ids,
//! asset metadata), content text (every value plus humanized field names),
//! a stemmed token set, the numbers it states, and the dates it covers.
//! Inference sources are kept out: they are not evidence.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::Value;

use super::mentions::{normalize, parse_date_value, scan_numbers, token_set};
use crate::types::{MemoryEntry, Source};

/// Field-name fragments that identify *what* a record is about.
const IDENTIFYING_KEYS: &[&str] = &[
    "name", "asset", "machine", "line", "equipment", "site", "plant", "product", "area",
    "station", "source",
];

/// One normalized candidate source.
#[derive(Debug, Clone)]
pub struct PooledSource {
    /// Position in the pool; ties between equal scores resolve to the lower index.
    pub index: usize,
    pub source: Source,
    pub identity_text: String,
    pub content_text: String,
    pub tokens: HashSet<String>,
    pub numbers: Vec<f64>,
    pub dates: Vec<NaiveDate>,
}

/// The per-request set of grounding candidates.
#[derive(Debug, Clone, Default)]
pub struct SourcePool {
    entries: Vec<PooledSource>,
}

impl SourcePool {
    /// Build a pool from caller-supplied sources plus gathered memory entries.
    pub fn build(structured: &[Source], memories: &[MemoryEntry]) -> Self {
        let mut entries = Vec::with_capacity(structured.len() + memories.len());
        let all = structured
            .iter()
            .cloned()
            .chain(memories.iter().cloned().map(Source::MemoryEntry));
        for source in all {
            if let Some(pooled) = pool_source(entries.len(), source) {
                entries.push(pooled);
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[PooledSource] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_identifying_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key == "id"
        || key.ends_with("_id")
        || IDENTIFYING_KEYS.iter().any(|fragment| key.contains(fragment))
}

fn humanize_key(key: &str) -> String {
    key.replace(['_', '-'], " ")
}

/// Collect text, numbers and dates from one JSON scalar.
fn absorb_value(
    value: &Value,
    text: &mut Vec<String>,
    numbers: &mut Vec<f64>,
    dates: &mut Vec<NaiveDate>,
) {
    match value {
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                numbers.push(f);
            }
            text.push(n.to_string());
        }
        Value::String(s) => {
            if let Some(date) = parse_date_value(s) {
                dates.push(date);
            } else if let Ok(f) = s.trim().replace(',', "").parse::<f64>() {
                numbers.push(f);
            }
            text.push(s.clone());
        }
        Value::Bool(b) => text.push(b.to_string()),
        Value::Array(items) => {
            for item in items {
                absorb_value(item, text, numbers, dates);
            }
        }
        Value::Object(_) | Value::Null => {}
    }
}

fn pool_source(index: usize, source: Source) -> Option<PooledSource> {
    let mut identity = Vec::new();
    let mut content = Vec::new();
    let mut numbers = Vec::new();
    let mut dates = Vec::new();

    match &source {
        Source::DatabaseRecord(record) => {
            identity.push(humanize_key(&record.table));
            identity.push(record.record_id.clone());
            for (key, value) in &record.fields {
                content.push(humanize_key(key));
                let mut value_text = Vec::new();
                absorb_value(value, &mut value_text, &mut numbers, &mut dates);
                if is_identifying_key(key) {
                    identity.extend(value_text.iter().cloned());
                }
                content.extend(value_text);
            }
        }
        Source::MemoryEntry(entry) => {
            for (key, value) in &entry.metadata {
                let mut value_text = Vec::new();
                absorb_value(value, &mut value_text, &mut numbers, &mut dates);
                content.push(humanize_key(key));
                identity.extend(value_text.iter().cloned());
                content.extend(value_text);
            }
            content.push(entry.content.clone());
            numbers.extend(scan_numbers(&entry.content).into_iter().map(|n| n.value));
            if let Some(ts) = entry.timestamp {
                dates.push(ts.date_naive());
            }
        }
        Source::Calculation(calc) => {
            identity.push(calc.name.clone());
            content.push(calc.name.clone());
            content.push(calc.formula.clone());
            for (name, value) in &calc.inputs {
                content.push(humanize_key(name));
                numbers.push(*value);
            }
            numbers.push(calc.result);
        }
        Source::Inference(_) => return None,
    }

    numbers.retain(|n| n.is_finite());
    dates.sort();
    dates.dedup();

    let content_text = normalize(&content.join(" "));
    Some(PooledSource {
        index,
        tokens: token_set(&content_text),
        identity_text: normalize(&identity.join(" ")),
        content_text,
        source,
        numbers,
        dates,
    })
}
