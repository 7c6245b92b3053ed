//! Config validation: reject invalid combinations at startup.

use super::pipeline_config::PipelineConfig;

/// Validation error for pipeline configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Which field(s) are invalid.
    pub field: String,
    /// Description of the problem.
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config.{}: {}", self.field, self.message)
    }
}

fn check_unit(errors: &mut Vec<ConfigValidationError>, field: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigValidationError {
            field: field.to_string(),
            message: format!("must be in [0.0, 1.0], got {}", value),
        });
    }
}

fn check_nonzero(errors: &mut Vec<ConfigValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ConfigValidationError {
            field: field.to_string(),
            message: "must be > 0".to_string(),
        });
    }
}

/// Validate a PipelineConfig, returning all errors found.
pub fn validate(config: &PipelineConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    let g = &config.grounding;
    check_unit(&mut errors, "grounding.threshold_min", g.threshold_min);
    check_unit(&mut errors, "grounding.threshold_high", g.threshold_high);
    if g.threshold_min > g.threshold_high {
        errors.push(ConfigValidationError {
            field: "grounding.threshold_min".to_string(),
            message: format!(
                "must be <= threshold_high ({}), got {}",
                g.threshold_high, g.threshold_min
            ),
        });
    }
    for (field, weight) in [
        ("grounding.entity_weight", g.entity_weight),
        ("grounding.metric_weight", g.metric_weight),
        ("grounding.temporal_weight", g.temporal_weight),
    ] {
        if !weight.is_finite() || weight < 0.0 {
            errors.push(ConfigValidationError {
                field: field.to_string(),
                message: format!("must be a finite value >= 0.0, got {}", weight),
            });
        }
    }
    if g.entity_weight + g.metric_weight + g.temporal_weight <= 0.0 {
        errors.push(ConfigValidationError {
            field: "grounding.*_weight".to_string(),
            message: "weights must sum to a positive value".to_string(),
        });
    }
    if g.temporal_tolerance_days < 0 {
        errors.push(ConfigValidationError {
            field: "grounding.temporal_tolerance_days".to_string(),
            message: format!("must be >= 0, got {}", g.temporal_tolerance_days),
        });
    }
    check_unit(&mut errors, "grounding.numeric_tolerance", g.numeric_tolerance);
    check_nonzero(
        &mut errors,
        "grounding.max_supporting_citations",
        g.max_supporting_citations as u64,
    );

    let c = &config.citations;
    check_nonzero(&mut errors, "citations.max_citations", c.max_citations as u64);
    if c.max_citations > c.max_citations_multi_source {
        errors.push(ConfigValidationError {
            field: "citations.max_citations".to_string(),
            message: format!(
                "must be <= max_citations_multi_source ({}), got {}",
                c.max_citations_multi_source, c.max_citations
            ),
        });
    }
    check_unit(&mut errors, "citations.primary_record_confidence", c.primary_record_confidence);
    check_unit(
        &mut errors,
        "citations.corroborating_record_confidence",
        c.corroborating_record_confidence,
    );
    check_unit(&mut errors, "citations.memory_default_confidence", c.memory_default_confidence);
    check_unit(&mut errors, "citations.calculation_confidence", c.calculation_confidence);
    check_unit(&mut errors, "citations.inference_confidence", c.inference_confidence);
    check_nonzero(&mut errors, "citations.excerpt_chars", c.excerpt_chars as u64);

    check_nonzero(&mut errors, "extraction.max_claims", config.extraction.max_claims as u64);
    check_nonzero(&mut errors, "memory.limit", config.memory.limit as u64);
    check_nonzero(&mut errors, "memory.timeout_ms", config.memory.timeout_ms);
    check_nonzero(&mut errors, "cache.capacity", config.cache.capacity);
    check_nonzero(&mut errors, "cache.ttl_secs", config.cache.ttl_secs);
    check_nonzero(&mut errors, "audit.queue_capacity", config.audit.queue_capacity as u64);
    check_nonzero(&mut errors, "deadline_ms", config.deadline_ms);

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&PipelineConfig::default()).is_empty());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = PipelineConfig::default();
        config.grounding.threshold_min = 0.9;
        config.grounding.threshold_high = 0.5;
        let errors = validate(&config);
        assert!(errors.iter().any(|e| e.field == "grounding.threshold_min"));
    }

    #[test]
    fn test_zero_caps_rejected() {
        let mut config = PipelineConfig::default();
        config.citations.max_citations = 0;
        config.audit.queue_capacity = 0;
        let fields: Vec<_> = validate(&config).into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"citations.max_citations".to_string()));
        assert!(fields.contains(&"audit.queue_capacity".to_string()));
    }

    #[test]
    fn test_from_toml_partial_override() {
        let config = PipelineConfig::from_toml(
            "deadline_ms = 200\n[grounding]\nthreshold_min = 0.5\nreference_date = \"2026-01-06\"\n",
        )
        .unwrap();
        assert_eq!(config.deadline_ms, 200);
        assert!((config.grounding.threshold_min - 0.5).abs() < f64::EPSILON);
        assert!((config.grounding.threshold_high - 0.85).abs() < f64::EPSILON);
        assert_eq!(
            config.grounding.reference_date,
            chrono::NaiveDate::from_ymd_opt(2026, 1, 6)
        );
        assert_eq!(config.citations.max_citations, 5);
    }
}
