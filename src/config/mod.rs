//! Pipeline configuration: thresholds, caps, deadlines, cache and audit settings.

pub mod pipeline_config;
pub mod validation;

pub use pipeline_config::{
    AuditConfig, CacheConfig, CitationConfig, ExtractionConfig, GroundingConfig, MemoryConfig,
    PipelineConfig,
};
pub use validation::{validate, ConfigValidationError};
