//! CitationFactory: raw evidence → standalone citations.
//!
//! Citations built here are independent of claim text. They seed the
//! aggregator and cite data the model used without quoting it. Citation ids
//! are blake3 digests of the source identity, so the same evidence always
//! yields the same id.

use chrono::{DateTime, NaiveDate, Utc};

use super::formatting::{
    classify_field, field_label, format_value, human_date, table_priority_fields, FieldKind,
    MAX_PRIORITY_FIELDS,
};
use crate::config::CitationConfig;
use crate::grounding::mentions::{normalize, parse_date_value};
use crate::types::{Calculation, Citation, DatabaseRecord, Inference, MemoryEntry, Source, SourceType};

/// Characters of a memory id shown in its display text.
const SHORT_ID_LEN: usize = 8;

/// Deterministic citation id from the evidence identity.
pub fn citation_id(source_type: SourceType, identity: &str) -> String {
    let input = format!("{}:{}", source_type.as_str(), identity);
    let hash = blake3::hash(input.as_bytes()).to_hex();
    format!("cit_{}", &hash[..16])
}

/// Builds citations from every evidence kind.
#[derive(Debug, Clone)]
pub struct CitationFactory {
    config: CitationConfig,
}

impl CitationFactory {
    pub fn new(config: CitationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CitationConfig {
        &self.config
    }

    /// Cite every source. The first database record is primary evidence;
    /// later records corroborate it at lower confidence.
    pub fn from_sources(&self, sources: &[Source]) -> Vec<Citation> {
        let mut seen_record = false;
        sources
            .iter()
            .map(|source| match source {
                Source::DatabaseRecord(record) => {
                    let confidence = if seen_record {
                        self.config.corroborating_record_confidence
                    } else {
                        self.config.primary_record_confidence
                    };
                    seen_record = true;
                    self.from_record(record, confidence)
                }
                Source::MemoryEntry(entry) => self.from_memory(entry),
                Source::Calculation(calc) => self.from_calculation(calc),
                Source::Inference(inference) => self.from_inference(inference),
            })
            .collect()
    }

    /// Cite a batch of records: first primary, rest corroborating.
    pub fn from_records(&self, records: &[DatabaseRecord]) -> Vec<Citation> {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let confidence = if i == 0 {
                    self.config.primary_record_confidence
                } else {
                    self.config.corroborating_record_confidence
                };
                self.from_record(record, confidence)
            })
            .collect()
    }

    pub fn from_record(&self, record: &DatabaseRecord, confidence: f64) -> Citation {
        let priority = select_priority_fields(record);
        let excerpt = if priority.is_empty() {
            fallback_excerpt(record, self.config.excerpt_chars)
        } else {
            priority
                .iter()
                .map(|(key, formatted)| format!("{}: {}", field_label(key), formatted))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let date = record_date(record, &priority);
        let asset = record.asset();
        let locator = match (&date, &asset) {
            (Some(d), _) => human_date(*d),
            (None, Some(a)) => a.clone(),
            (None, None) => record.record_id.clone(),
        };

        Citation {
            id: citation_id(
                SourceType::Database,
                &format!("{}/{}", record.table, record.record_id),
            ),
            source_type: SourceType::Database,
            source_table: Some(record.table.clone()),
            record_id: Some(record.record_id.clone()),
            memory_id: None,
            asset_id: asset,
            timestamp: date.map(midnight_utc),
            excerpt,
            confidence: confidence.clamp(0.0, 1.0),
            display_text: format!("[Source: {}/{}]", record.table, locator),
            claim_text: None,
        }
    }

    pub fn from_memory(&self, entry: &MemoryEntry) -> Citation {
        let confidence = entry
            .similarity
            .filter(|s| s.is_finite())
            .map(|s| s.clamp(0.0, 1.0))
            .unwrap_or(self.config.memory_default_confidence);

        let origin = entry
            .metadata
            .get("source")
            .and_then(crate::types::source::value_as_text)
            .unwrap_or_else(|| "memory".to_string());
        let asset = entry.asset();
        let short_id: String = entry.memory_id.chars().take(SHORT_ID_LEN).collect();
        let mut locator = vec![origin];
        if let Some(slug) = asset.as_deref().map(slugify).filter(|s| !s.is_empty()) {
            locator.push(slug);
        }
        locator.push(short_id);

        let stale = entry
            .age_days
            .is_some_and(|age| age > self.config.staleness_days);
        let display_text = format!(
            "[Memory: {}{}]",
            locator.join("/"),
            if stale { " (stale)" } else { "" }
        );

        let timestamp = entry.timestamp.or_else(|| {
            entry
                .metadata
                .get("timestamp")
                .and_then(|v| v.as_str())
                .and_then(parse_date_value)
                .map(midnight_utc)
        });

        Citation {
            id: citation_id(SourceType::Memory, &entry.memory_id),
            source_type: SourceType::Memory,
            source_table: None,
            record_id: None,
            memory_id: Some(entry.memory_id.clone()),
            asset_id: asset,
            timestamp,
            excerpt: truncate_chars(&entry.content, self.config.excerpt_chars),
            confidence,
            display_text,
            claim_text: None,
        }
    }

    pub fn from_calculation(&self, calc: &Calculation) -> Citation {
        let inputs = calc
            .inputs
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        let excerpt = format!("{}: {}({}) = {}", calc.name, calc.formula, inputs, calc.result);
        Citation {
            id: citation_id(SourceType::Calculation, &excerpt),
            source_type: SourceType::Calculation,
            source_table: None,
            record_id: None,
            memory_id: None,
            asset_id: None,
            timestamp: None,
            excerpt,
            confidence: self.config.calculation_confidence,
            display_text: format!("[Calculation: {}]", calc.name),
            claim_text: None,
        }
    }

    /// An explicit inference. Never presented as sourced data.
    pub fn from_inference(&self, inference: &Inference) -> Citation {
        Citation {
            id: citation_id(SourceType::Inference, &inference.basis),
            source_type: SourceType::Inference,
            source_table: None,
            record_id: None,
            memory_id: None,
            asset_id: None,
            timestamp: None,
            excerpt: truncate_chars(&inference.basis, self.config.excerpt_chars),
            confidence: self.config.inference_confidence,
            display_text: "[AI inference: not directly sourced from data]".to_string(),
            claim_text: None,
        }
    }

    /// Cite a source on behalf of a validated claim.
    pub fn cite_for_claim(&self, source: &Source, confidence: f64, claim_text: &str) -> Citation {
        let mut citation = match source {
            Source::DatabaseRecord(record) => self.from_record(record, confidence),
            Source::MemoryEntry(entry) => self.from_memory(entry),
            Source::Calculation(calc) => self.from_calculation(calc),
            Source::Inference(inference) => self.from_inference(inference),
        };
        if !matches!(source, Source::Inference(_)) {
            citation.confidence = confidence.clamp(0.0, 1.0);
        }
        citation.claim_text = Some(claim_text.to_string());
        citation
    }
}

impl Default for CitationFactory {
    fn default() -> Self {
        Self::new(CitationConfig::default())
    }
}

/// Up to four formatted priority fields, in priority order.
fn select_priority_fields(record: &DatabaseRecord) -> Vec<(String, String)> {
    let mut selected = Vec::new();
    if let Some(fields) = table_priority_fields(&record.table) {
        for key in fields {
            if selected.len() == MAX_PRIORITY_FIELDS {
                break;
            }
            if let Some(formatted) = record
                .fields
                .get(*key)
                .and_then(|v| format_value(classify_field(key), v))
            {
                selected.push((key.to_string(), formatted));
            }
        }
    }
    if selected.is_empty() {
        for (key, value) in &record.fields {
            if selected.len() == MAX_PRIORITY_FIELDS {
                break;
            }
            let kind = classify_field(key);
            if kind == FieldKind::Text {
                continue;
            }
            if let Some(formatted) = format_value(kind, value) {
                selected.push((key.clone(), formatted));
            }
        }
    }
    selected
}

/// First date-typed field: priority fields first, then any column.
fn record_date(record: &DatabaseRecord, priority: &[(String, String)]) -> Option<NaiveDate> {
    let date_of = |key: &str| {
        if classify_field(key) != FieldKind::Date {
            return None;
        }
        record.fields.get(key)?.as_str().and_then(parse_date_value)
    };
    priority
        .iter()
        .find_map(|(key, _)| date_of(key))
        .or_else(|| record.fields.keys().find_map(|key| date_of(key)))
}

fn fallback_excerpt(record: &DatabaseRecord, max_chars: usize) -> String {
    let text = record
        .fields
        .iter()
        .filter_map(|(k, v)| {
            crate::types::source::value_as_text(v).map(|t| format!("{}: {}", field_label(k), t))
        })
        .collect::<Vec<_>>()
        .join(", ");
    if text.is_empty() {
        format!("{} record {}", record.table, record.record_id)
    } else {
        truncate_chars(&text, max_chars)
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

/// First `max` characters, with an ellipsis when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}

/// `Grinder 5` → `grinder-5`.
pub fn slugify(text: &str) -> String {
    normalize(text).replace(['.', ' '], "-")
}
