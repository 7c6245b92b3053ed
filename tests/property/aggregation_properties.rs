//! Property-based tests for aggregation, scoring and synthesis invariants.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use grounding_citations::citations::{aggregate, citation_id};
use grounding_citations::grounding::{grounding_score, GroundingValidator};
use grounding_citations::synthesis::ResponseSynthesizer;
use grounding_citations::types::{
    Citation, Claim, ClaimType, DatabaseRecord, GroundingResult, Source, SourceType,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_citation() -> impl Strategy<Value = Citation> {
    (0usize..12, any::<bool>(), 0.0f64..=1.0f64).prop_map(|(key, is_memory, confidence)| {
        let identity = format!("k{}", key);
        let source_type = if is_memory {
            SourceType::Memory
        } else {
            SourceType::Database
        };
        Citation {
            id: citation_id(source_type, &identity),
            source_type,
            source_table: (!is_memory).then(|| "t".to_string()),
            record_id: (!is_memory).then(|| identity.clone()),
            memory_id: is_memory.then(|| identity.clone()),
            asset_id: None,
            timestamp: None,
            excerpt: String::new(),
            confidence,
            display_text: format!("[{}]", identity),
            claim_text: None,
        }
    })
}

fn arb_result() -> impl Strategy<Value = (Claim, GroundingResult)> {
    (any::<bool>(), 0.0f64..=1.0f64).prop_map(|(required, confidence)| {
        let claim = Claim {
            requires_grounding: required,
            claim_type: if required {
                ClaimType::Factual
            } else {
                ClaimType::Recommendation
            },
            ..Claim::factual("claim")
        };
        let result = GroundingResult {
            claim_text: "claim".into(),
            is_grounded: confidence >= 0.6,
            confidence,
            supporting_citations: Vec::new(),
            validation_time_ms: 0.0,
        };
        (claim, result)
    })
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------
proptest! {
    #[test]
    fn prop_aggregate_bounded_sorted_unique(
        citations in prop::collection::vec(arb_citation(), 0..40),
        k in 1usize..=10,
    ) {
        let out = aggregate(&citations, k);
        prop_assert!(out.len() <= k);

        for pair in out.windows(2) {
            prop_assert!(pair[0].confidence >= pair[1].confidence);
        }

        let keys: HashSet<&str> = out.iter().map(|c| c.identity_key()).collect();
        prop_assert_eq!(keys.len(), out.len());
    }

    #[test]
    fn prop_aggregate_keeps_best_duplicate(
        citations in prop::collection::vec(arb_citation(), 1..40),
    ) {
        let mut best: HashMap<&str, f64> = HashMap::new();
        for c in &citations {
            let entry = best.entry(c.identity_key()).or_insert(c.confidence);
            if c.confidence > *entry {
                *entry = c.confidence;
            }
        }
        let out = aggregate(&citations, usize::MAX);
        prop_assert_eq!(out.len(), best.len());
        for c in &out {
            prop_assert_eq!(c.confidence, best[c.identity_key()]);
        }
    }

    #[test]
    fn prop_aggregate_is_deterministic(
        citations in prop::collection::vec(arb_citation(), 0..40),
    ) {
        prop_assert_eq!(aggregate(&citations, 5), aggregate(&citations, 5));
    }
}

// ---------------------------------------------------------------------------
// Grounding score
// ---------------------------------------------------------------------------
proptest! {
    #[test]
    fn prop_grounding_score_in_unit_range(
        pairs in prop::collection::vec(arb_result(), 0..20),
    ) {
        let (claims, results): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        let score = grounding_score(&claims, &results);
        prop_assert!((0.0..=1.0).contains(&score));
        if claims.iter().all(|c| !c.requires_grounding) {
            prop_assert_eq!(score, 1.0);
        }
    }

    #[test]
    fn prop_non_grounding_claims_always_pass(
        text in "[A-Za-z0-9 ]{1,40}",
        oee in 0.0f64..100.0,
    ) {
        let claim = Claim {
            requires_grounding: false,
            claim_type: ClaimType::Other,
            ..Claim::factual(text)
        };
        let source: Source = DatabaseRecord::new("daily_summaries", "r1")
            .with_field("oee_percentage", oee)
            .into();
        let result = GroundingValidator::default().validate(&claim, &[source], &[]).unwrap();
        prop_assert!(result.is_grounded);
        prop_assert_eq!(result.confidence, 1.0);
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------
proptest! {
    #[test]
    fn prop_inline_annotation_follows_claim(
        prefix in "[a-z ]{0,20}",
        claim in "[A-Z][a-z]{2,10} [0-9]{1,3}",
        suffix in "[a-z .]{0,20}",
    ) {
        let text = format!("{}{}{}", prefix, claim, suffix);
        let citation = Citation {
            id: "cit_x".into(),
            source_type: SourceType::Database,
            source_table: Some("t".into()),
            record_id: Some("r".into()),
            memory_id: None,
            asset_id: None,
            timestamp: None,
            excerpt: String::new(),
            confidence: 0.9,
            display_text: "[Source: t/r]".into(),
            claim_text: Some(claim.clone()),
        };
        let (out, used) = ResponseSynthesizer::default().format(&text, &[citation], true);
        let expected = format!("{}{}", claim, "[Source: t/r]");
        prop_assert!(out.contains(&expected));
        prop_assert_eq!(used.len(), 1);
    }

    #[test]
    fn prop_disclaimer_by_score(
        text in "[A-Za-z ,.]{0,60}",
        score in 0.0f64..=1.0,
    ) {
        let s = ResponseSynthesizer::default();
        let out = s.apply_disclaimer(&text, score, &["unverified".to_string()]);
        if score < 0.6 {
            prop_assert!(out.len() > text.len());
            prop_assert!(out.contains(&text));
        } else if score >= 0.85 {
            prop_assert_eq!(out, text);
        }
    }
}
