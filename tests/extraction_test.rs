//! Claim extraction: defensive JSON location, strict schema, enrichment, caps.

use grounding_citations::config::ExtractionConfig;
use grounding_citations::errors::{CitationError, CitationResult};
use grounding_citations::extraction::{parse_claims, ClaimExtractor, LanguageModel};
use grounding_citations::types::ClaimType;

struct ScriptedModel(Result<String, String>);

impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> CitationResult<String> {
        assert!(prompt.contains("Response:"));
        self.0.clone().map_err(|reason| CitationError::ModelUnavailable { reason })
    }
}

fn extractor(reply: &str) -> ClaimExtractor<ScriptedModel> {
    ClaimExtractor::new(
        ScriptedModel(Ok(reply.to_string())),
        ExtractionConfig::default(),
    )
}

#[tokio::test]
async fn test_reply_wrapped_in_prose_is_parsed() {
    let reply = r#"Here is the breakdown you asked for:

```json
[
  {"text": "Grinder 5 had 87.5% OEE yesterday.", "claim_type": "factual",
   "requires_grounding": true, "entity_mentions": ["Grinder 5"],
   "metric_mentions": ["87.5%"], "temporal_reference": "yesterday"},
  {"text": "You may want to review the changeover schedule.", "claim_type": "recommendation",
   "requires_grounding": false}
]
```
Let me know if you need more."#;

    let claims = extractor(reply)
        .extract("Grinder 5 had 87.5% OEE yesterday. You may want to review the changeover schedule.")
        .await;

    assert_eq!(claims.len(), 2);
    assert_eq!(claims[0].claim_type, ClaimType::Factual);
    assert!(claims[0].requires_grounding);
    assert_eq!(claims[0].entity_mentions, vec!["Grinder 5"]);
    assert_eq!(claims[0].metric_mentions, vec!["87.5%"]);
    assert_eq!(claims[0].temporal_reference.as_deref(), Some("yesterday"));
    assert_eq!(claims[1].claim_type, ClaimType::Recommendation);
    assert!(!claims[1].requires_grounding);
}

#[tokio::test]
async fn test_unparseable_reply_means_no_claims() {
    let claims = extractor("I could not find any claims, sorry!")
        .extract("Hello there.")
        .await;
    assert!(claims.is_empty());
}

#[tokio::test]
async fn test_model_error_means_no_claims() {
    let ex = ClaimExtractor::new(
        ScriptedModel(Err("rate limited".into())),
        ExtractionConfig::default(),
    );
    assert!(ex.extract("Grinder 5 had 87.5% OEE.").await.is_empty());
    match ex.try_extract("Grinder 5 had 87.5% OEE.").await {
        Err(CitationError::ModelUnavailable { reason }) => assert_eq!(reason, "rate limited"),
        other => panic!("expected ModelUnavailable, got {:?}", other.map(|c| c.len())),
    }
}

#[tokio::test]
async fn test_max_claims_applied() {
    let entries: Vec<String> = (0..30)
        .map(|i| format!(r#"{{"text": "Line {} produced 1,{:03} units", "claim_type": "factual"}}"#, i, i))
        .collect();
    let reply = format!("[{}]", entries.join(","));
    let ex = ClaimExtractor::new(
        ScriptedModel(Ok(reply)),
        ExtractionConfig { max_claims: 20 },
    );
    let claims = ex.extract("many lines").await;
    assert_eq!(claims.len(), 20);
    assert_eq!(claims[0].text, "Line 0 produced 1,000 units");
}

#[test]
fn test_unknown_type_and_missing_flag_default_safely() {
    let claims = parse_claims(r#"[{"text": "Thanks for asking!", "claim_type": "greeting"}]"#);
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].claim_type, ClaimType::Other);
    assert!(!claims[0].requires_grounding);
}

#[test]
fn test_wrong_field_types_are_discarded() {
    let claims = parse_claims(
        r#"[{"text": "Pump 3 was down 45 minutes", "claim_type": "factual",
             "entity_mentions": "Pump 3", "metric_mentions": {"bad": true},
             "temporal_reference": 17}]"#,
    );
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].entity_mentions, vec!["Pump 3"]);
    // Malformed metric list is dropped; a bare "45" is not significant enough to enrich.
    assert!(claims[0].metric_mentions.is_empty());
    assert_eq!(claims[0].temporal_reference, None);
}

#[test]
fn test_metric_enrichment_picks_significant_numbers() {
    let claims = parse_claims(
        r#"[{"text": "Mixer 7 had 95% OEE and caused $50,000 in losses.", "claim_type": "factual"}]"#,
    );
    assert_eq!(claims[0].metric_mentions, vec!["95%", "$50,000"]);
}
