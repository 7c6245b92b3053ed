//! PipelineConfig: all verification settings, loadable from a TOML document.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Top-level configuration aggregating all stage configs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub grounding: GroundingConfig,
    pub citations: CitationConfig,
    pub extraction: ExtractionConfig,
    pub memory: MemoryConfig,
    pub cache: CacheConfig,
    pub audit: AuditConfig,
    /// Overall soft deadline for one `verify` call.
    pub deadline_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grounding: GroundingConfig::default(),
            citations: CitationConfig::default(),
            extraction: ExtractionConfig::default(),
            memory: MemoryConfig::default(),
            cache: CacheConfig::default(),
            audit: AuditConfig::default(),
            deadline_ms: 450,
        }
    }
}

impl PipelineConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// Claim grounding thresholds and signal weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingConfig {
    /// A claim is grounded at or above this confidence.
    pub threshold_min: f64,
    /// A response at or above this score needs no notice at all.
    pub threshold_high: f64,
    pub entity_weight: f64,
    pub metric_weight: f64,
    pub temporal_weight: f64,
    /// Allowed distance in days between a temporal reference and a source date.
    pub temporal_tolerance_days: i64,
    /// Relative tolerance when comparing numeric mentions to source values.
    pub numeric_tolerance: f64,
    /// Cap on citations attached to one GroundingResult.
    pub max_supporting_citations: usize,
    /// Date used to resolve "yesterday", "last week", ... (None = today, UTC).
    pub reference_date: Option<NaiveDate>,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            threshold_min: 0.6,
            threshold_high: 0.85,
            entity_weight: 0.4,
            metric_weight: 0.4,
            temporal_weight: 0.2,
            temporal_tolerance_days: 1,
            numeric_tolerance: 0.01,
            max_supporting_citations: 3,
            reference_date: None,
        }
    }
}

/// Citation construction and aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationConfig {
    pub max_citations: usize,
    pub max_citations_multi_source: usize,
    /// Confidence of the first record in a batch (primary evidence).
    pub primary_record_confidence: f64,
    /// Confidence of every later record in a batch (corroborating evidence).
    pub corroborating_record_confidence: f64,
    /// Memory confidence when the backend reported no similarity.
    pub memory_default_confidence: f64,
    pub calculation_confidence: f64,
    pub inference_confidence: f64,
    pub excerpt_chars: usize,
    /// Memories older than this many days are marked "(stale)".
    pub staleness_days: u32,
    /// Inline annotation (true) or a trailing footnote block (false).
    pub inline: bool,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            max_citations: 5,
            max_citations_multi_source: 10,
            primary_record_confidence: 0.9,
            corroborating_record_confidence: 0.8,
            memory_default_confidence: 0.7,
            calculation_confidence: 0.95,
            inference_confidence: 0.5,
            excerpt_chars: 150,
            staleness_days: 30,
            inline: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Claims beyond this count are dropped.
    pub max_claims: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { max_claims: 20 }
    }
}

/// Memory backend search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub enabled: bool,
    /// Results requested from each backend.
    pub limit: usize,
    pub timeout_ms: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 5,
            timeout_ms: 300,
        }
    }
}

/// Citation lookup cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: u64,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000,
            ttl_secs: 3_600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    /// Records waiting for the sink beyond this count are dropped.
    pub queue_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: 256,
        }
    }
}
