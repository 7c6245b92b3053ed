//! ClaimExtractor: one model call per response, never fatal.

use tracing::{debug, warn};

use super::model::LanguageModel;
use super::parse::parse_claims;
use crate::config::ExtractionConfig;
use crate::errors::CitationResult;
use crate::types::Claim;

const EXTRACTION_PROMPT: &str = "\
Split the response below into atomic claims. Reply with a JSON array only.
Each element: {\"text\": verbatim sentence or clause from the response,
\"claim_type\": \"factual\" | \"historical\" | \"recommendation\" | \"other\",
\"requires_grounding\": true for stated facts and figures, false for advice or opinion,
\"entity_mentions\": [named assets, lines, products],
\"metric_mentions\": [numbers with units, or metric names],
\"temporal_reference\": date phrase or null}.

Response:
";

/// Segments response text into typed claims.
#[derive(Debug, Clone)]
pub struct ClaimExtractor<L> {
    model: L,
    config: ExtractionConfig,
}

impl<L: LanguageModel> ClaimExtractor<L> {
    pub fn new(model: L, config: ExtractionConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &L {
        &self.model
    }

    /// Extract claims. Model or parse failures yield an empty list.
    pub async fn extract(&self, text: &str) -> Vec<Claim> {
        match self.try_extract(text).await {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "Claim extraction failed, continuing without claims");
                Vec::new()
            }
        }
    }

    /// Extract claims, surfacing model failures to the caller.
    pub async fn try_extract(&self, text: &str) -> CitationResult<Vec<Claim>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let prompt = format!("{}{}", EXTRACTION_PROMPT, text);
        let reply = self.model.complete(&prompt).await?;
        let mut claims = parse_claims(&reply);
        if claims.len() > self.config.max_claims {
            debug!(
                extracted = claims.len(),
                max = self.config.max_claims,
                "Truncating extracted claims"
            );
            claims.truncate(self.config.max_claims);
        }
        debug!(count = claims.len(), "Claims extracted");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::errors::CitationError;

    struct CountingModel {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl LanguageModel for CountingModel {
        async fn complete(&self, _prompt: &str) -> CitationResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .clone()
                .ok_or_else(|| CitationError::ModelUnavailable {
                    reason: "offline".into(),
                })
        }
    }

    fn extractor(reply: Option<&str>, max_claims: usize) -> ClaimExtractor<CountingModel> {
        ClaimExtractor::new(
            CountingModel {
                reply: reply.map(str::to_string),
                calls: AtomicUsize::new(0),
            },
            ExtractionConfig { max_claims },
        )
    }

    #[tokio::test]
    async fn test_empty_text_skips_model() {
        let ex = extractor(Some("[]"), 20);
        assert!(ex.extract("   ").await.is_empty());
        assert_eq!(ex.model().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_failure_yields_empty() {
        let ex = extractor(None, 20);
        assert!(ex.extract("Grinder 5 ran at 87.5% OEE.").await.is_empty());
        assert!(ex.try_extract("Grinder 5 ran at 87.5% OEE.").await.is_err());
    }

    #[tokio::test]
    async fn test_claims_capped() {
        let reply = r#"[{"text":"a 1.5"},{"text":"b 2.5"},{"text":"c 3.5"}]"#;
        let ex = extractor(Some(reply), 2);
        let claims = ex.extract("a. b. c.").await;
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[1].text, "b 2.5");
    }
}
