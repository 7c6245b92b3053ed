//! Claim-to-source confidence from three overlap signals.
//!
//! - entity:   share of entity mentions found (identity fields = 1.0, anywhere else = 0.5)
//! - metric:   share of metric mentions found (numbers within tolerance, or the term as a field/value)
//! - temporal: 1.0 when a source date falls in the reference window ± tolerance, else 0.0
//!
//! Signals that do not apply (no mentions of that kind, no dates on the source,
//! unrecognized temporal reference) are left out and the remaining weights are
//! renormalized. A claim with no applicable signal falls back to lexical overlap.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::mentions::{
    contains_phrase, content_words, numbers_match, parse_metric, resolve_temporal, token_set,
};
use super::source_pool::PooledSource;
use crate::config::GroundingConfig;
use crate::types::Claim;

/// Credit for an entity found in content rather than identifying fields.
const CONTENT_ENTITY_CREDIT: f64 = 0.5;

/// Per-signal breakdown of one claim/source comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceScore {
    pub confidence: f64,
    pub entity: Option<f64>,
    pub metric: Option<f64>,
    pub temporal: Option<f64>,
    pub lexical: Option<f64>,
}

/// Grounding score computation engine.
#[derive(Debug, Clone)]
pub struct GroundingScorer {
    config: GroundingConfig,
}

impl GroundingScorer {
    pub fn new(config: GroundingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GroundingConfig {
        &self.config
    }

    /// Score one candidate source against a claim.
    pub fn score(&self, claim: &Claim, source: &PooledSource, as_of: NaiveDate) -> SourceScore {
        let entity = self.entity_overlap(claim, source);
        let metric = self.metric_overlap(claim, source);
        let temporal = self.temporal_overlap(claim, source, as_of);

        let weighted: Vec<(f64, f64)> = [
            (entity, self.config.entity_weight),
            (metric, self.config.metric_weight),
            (temporal, self.config.temporal_weight),
        ]
        .into_iter()
        .filter_map(|(signal, weight)| signal.map(|s| (s, weight)))
        .filter(|(s, w)| s.is_finite() && w.is_finite() && *w > 0.0)
        .collect();

        let total_weight: f64 = weighted.iter().map(|(_, w)| w).sum();
        if total_weight > 0.0 {
            let sum: f64 = weighted.iter().map(|(s, w)| s * w).sum();
            return SourceScore {
                confidence: (sum / total_weight).clamp(0.0, 1.0),
                entity,
                metric,
                temporal,
                lexical: None,
            };
        }

        let lexical = lexical_overlap(claim, source);
        SourceScore {
            confidence: lexical.unwrap_or(0.0).clamp(0.0, 1.0),
            entity,
            metric,
            temporal,
            lexical,
        }
    }

    fn entity_overlap(&self, claim: &Claim, source: &PooledSource) -> Option<f64> {
        let mentions: Vec<&String> = claim
            .entity_mentions
            .iter()
            .filter(|m| !m.trim().is_empty())
            .collect();
        if mentions.is_empty() {
            return None;
        }
        let credit: f64 = mentions
            .iter()
            .map(|mention| {
                if contains_phrase(&source.identity_text, mention) {
                    1.0
                } else if contains_phrase(&source.content_text, mention) {
                    CONTENT_ENTITY_CREDIT
                } else {
                    0.0
                }
            })
            .sum();
        Some(credit / mentions.len() as f64)
    }

    fn metric_overlap(&self, claim: &Claim, source: &PooledSource) -> Option<f64> {
        let mentions: Vec<&String> = claim
            .metric_mentions
            .iter()
            .filter(|m| !m.trim().is_empty())
            .collect();
        if mentions.is_empty() {
            return None;
        }
        let matched = mentions
            .iter()
            .filter(|mention| match parse_metric(mention) {
                Some(number) => source
                    .numbers
                    .iter()
                    .any(|stored| numbers_match(&number, *stored, self.config.numeric_tolerance)),
                None => term_present(mention, source),
            })
            .count();
        Some(matched as f64 / mentions.len() as f64)
    }

    fn temporal_overlap(
        &self,
        claim: &Claim,
        source: &PooledSource,
        as_of: NaiveDate,
    ) -> Option<f64> {
        let reference = claim.temporal_reference.as_deref()?;
        if source.dates.is_empty() {
            return None;
        }
        let window = resolve_temporal(reference, as_of)?;
        let hit = source
            .dates
            .iter()
            .any(|d| window.contains(*d, self.config.temporal_tolerance_days));
        Some(if hit { 1.0 } else { 0.0 })
    }
}

impl Default for GroundingScorer {
    fn default() -> Self {
        Self::new(GroundingConfig::default())
    }
}

/// A non-numeric metric term ("OEE", "losses") present as a field name or value.
fn term_present(term: &str, source: &PooledSource) -> bool {
    if contains_phrase(&source.content_text, term) {
        return true;
    }
    let wanted = token_set(term);
    !wanted.is_empty() && wanted.iter().all(|t| source.tokens.contains(t))
}

/// Share of the claim's content words present in the source.
fn lexical_overlap(claim: &Claim, source: &PooledSource) -> Option<f64> {
    let words = content_words(&claim.text);
    if words.is_empty() {
        return None;
    }
    let hits = words.iter().filter(|w| source.tokens.contains(*w)).count();
    Some(hits as f64 / words.len() as f64)
}
