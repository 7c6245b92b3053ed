//! GroundingValidator: one claim against the source pool.
//!
//! Pure in-memory matching; no I/O. The orchestrator fans one validation
//! out per claim and collects results back in claim order.

use std::time::Instant;

use chrono::{NaiveDate, Utc};
use tracing::debug;

use super::scorer::{GroundingScorer, SourceScore};
use super::source_pool::{PooledSource, SourcePool};
use crate::citations::CitationFactory;
use crate::config::GroundingConfig;
use crate::errors::{CitationError, CitationResult};
use crate::types::{Claim, GroundingResult, MemoryEntry, Source};

#[derive(Debug, Clone)]
pub struct GroundingValidator {
    scorer: GroundingScorer,
    factory: CitationFactory,
    config: GroundingConfig,
}

impl GroundingValidator {
    pub fn new(config: GroundingConfig, factory: CitationFactory) -> Self {
        Self {
            scorer: GroundingScorer::new(config.clone()),
            factory,
            config,
        }
    }

    pub fn config(&self) -> &GroundingConfig {
        &self.config
    }

    /// The date relative references resolve against.
    pub fn as_of(&self) -> NaiveDate {
        self.config
            .reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Validate a claim against raw sources (builds a one-off pool).
    pub fn validate(
        &self,
        claim: &Claim,
        structured_sources: &[Source],
        memory_sources: &[MemoryEntry],
    ) -> CitationResult<GroundingResult> {
        let pool = SourcePool::build(structured_sources, memory_sources);
        self.validate_in_pool(claim, &pool)
    }

    /// Validate a claim against a prepared pool.
    pub fn validate_in_pool(
        &self,
        claim: &Claim,
        pool: &SourcePool,
    ) -> CitationResult<GroundingResult> {
        let start = Instant::now();

        if !claim.requires_grounding {
            return Ok(GroundingResult {
                claim_text: claim.text.clone(),
                is_grounded: true,
                confidence: 1.0,
                supporting_citations: Vec::new(),
                validation_time_ms: elapsed_ms(start),
            });
        }

        if claim.text.trim().is_empty() {
            return Err(CitationError::ClaimValidationFailed {
                claim: claim.text.clone(),
                reason: "claim text is empty".to_string(),
            });
        }

        let as_of = self.as_of();
        let mut scored: Vec<(&PooledSource, SourceScore)> = Vec::with_capacity(pool.len());
        for source in pool.entries() {
            let score = self.scorer.score(claim, source, as_of);
            if !score.confidence.is_finite() {
                return Err(CitationError::ClaimValidationFailed {
                    claim: claim.text.clone(),
                    reason: format!("non-finite score against source {}", source.index),
                });
            }
            scored.push((source, score));
        }

        // Highest confidence first; equal scores keep pool order.
        scored.sort_by(|(a_src, a), (b_src, b)| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a_src.index.cmp(&b_src.index))
        });

        let confidence = scored.first().map(|(_, s)| s.confidence).unwrap_or(0.0);
        let is_grounded = confidence >= self.config.threshold_min;

        let supporting_citations = scored
            .iter()
            .filter(|(_, s)| s.confidence >= self.config.threshold_min)
            .take(self.config.max_supporting_citations)
            .map(|(src, s)| {
                self.factory
                    .cite_for_claim(&src.source, s.confidence, &claim.text)
            })
            .collect();

        if let Some((best, score)) = scored.first() {
            debug!(
                claim = %claim.text,
                best_source = best.index,
                confidence = score.confidence,
                entity = ?score.entity,
                metric = ?score.metric,
                temporal = ?score.temporal,
                lexical = ?score.lexical,
                "Claim scored"
            );
        }

        Ok(GroundingResult {
            claim_text: claim.text.clone(),
            is_grounded,
            confidence,
            supporting_citations,
            validation_time_ms: elapsed_ms(start),
        })
    }
}

impl Default for GroundingValidator {
    fn default() -> Self {
        Self::new(GroundingConfig::default(), CitationFactory::default())
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1_000.0
}

/// Mean confidence over grounding-required claims; 1.0 when there are none.
pub fn grounding_score(claims: &[Claim], results: &[GroundingResult]) -> f64 {
    let required: Vec<f64> = claims
        .iter()
        .zip(results)
        .filter(|(claim, _)| claim.requires_grounding)
        .map(|(_, result)| {
            if result.confidence.is_finite() {
                result.confidence.clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
        .collect();
    if required.is_empty() {
        return 1.0;
    }
    (required.iter().sum::<f64>() / required.len() as f64).clamp(0.0, 1.0)
}
