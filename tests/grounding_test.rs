//! Grounding validation: signal combination, thresholds, ordering, failures.

use chrono::NaiveDate;
use grounding_citations::citations::CitationFactory;
use grounding_citations::config::GroundingConfig;
use grounding_citations::grounding::{grounding_score, GroundingValidator, SourcePool};
use grounding_citations::types::{
    Calculation, Claim, ClaimType, DatabaseRecord, GroundingResult, Inference, MemoryEntry,
    Source,
};

fn validator_as_of(y: i32, m: u32, d: u32) -> GroundingValidator {
    let config = GroundingConfig {
        reference_date: NaiveDate::from_ymd_opt(y, m, d),
        ..GroundingConfig::default()
    };
    GroundingValidator::new(config, CitationFactory::default())
}

fn grinder_summary() -> Source {
    DatabaseRecord::new("daily_summaries", "ds-2026-01-05-g5")
        .with_field("asset_name", "Grinder 5")
        .with_field("oee_percentage", 87.5)
        .with_field("report_date", "2026-01-05")
        .into()
}

fn grinder_claim() -> Claim {
    Claim::factual("Grinder 5 had 87.5% OEE yesterday.")
        .with_entities(&["Grinder 5"])
        .with_metrics(&["87.5%"])
        .with_temporal("yesterday")
}

#[test]
fn test_matching_record_grounds_claim_fully() {
    let validator = validator_as_of(2026, 1, 6);
    let result = validator
        .validate(&grinder_claim(), &[grinder_summary()], &[])
        .unwrap();

    assert!(result.is_grounded);
    assert!((result.confidence - 1.0).abs() < 1e-9);
    assert_eq!(result.supporting_citations.len(), 1);
    let citation = &result.supporting_citations[0];
    assert_eq!(citation.source_table.as_deref(), Some("daily_summaries"));
    assert_eq!(citation.claim_text.as_deref(), Some("Grinder 5 had 87.5% OEE yesterday."));
}

#[test]
fn test_date_outside_window_lowers_confidence() {
    // "yesterday" resolves to Jan 9; the record is Jan 5.
    let validator = validator_as_of(2026, 1, 10);
    let result = validator
        .validate(&grinder_claim(), &[grinder_summary()], &[])
        .unwrap();

    assert!((result.confidence - 0.8).abs() < 1e-9);
    assert!(result.is_grounded);
}

#[test]
fn test_temporal_tolerance_of_one_day() {
    // "yesterday" = Jan 6, record Jan 5: inside ±1 day.
    let validator = validator_as_of(2026, 1, 7);
    let result = validator
        .validate(&grinder_claim(), &[grinder_summary()], &[])
        .unwrap();
    assert!((result.confidence - 1.0).abs() < 1e-9);
}

#[test]
fn test_wrong_entity_and_numbers_are_ungrounded() {
    let validator = validator_as_of(2026, 1, 6);
    let claim = Claim::factual("Mixer 7 had 95% OEE and caused $50,000 in losses.")
        .with_entities(&["Mixer 7"])
        .with_metrics(&["95%", "$50,000"]);
    let pump: Source = DatabaseRecord::new("downtime_events", "dt-88")
        .with_field("asset_name", "Pump 3")
        .with_field("duration_minutes", 45)
        .with_field("cost_impact", 1200.0)
        .into();

    let result = validator
        .validate(&claim, &[grinder_summary(), pump], &[])
        .unwrap();

    assert!(!result.is_grounded);
    assert!(result.confidence < 0.6);
    assert!(result.supporting_citations.is_empty());
}

#[test]
fn test_no_sources_means_zero_confidence() {
    let validator = GroundingValidator::default();
    let result = validator.validate(&grinder_claim(), &[], &[]).unwrap();
    assert!(!result.is_grounded);
    assert_eq!(result.confidence, 0.0);
}

#[test]
fn test_non_grounding_claim_short_circuits() {
    let validator = GroundingValidator::default();
    let claim = Claim {
        text: "Consider moving maintenance to the weekend.".into(),
        claim_type: ClaimType::Recommendation,
        requires_grounding: false,
        entity_mentions: vec![],
        metric_mentions: vec![],
        temporal_reference: None,
    };
    let result = validator.validate(&claim, &[], &[]).unwrap();
    assert!(result.is_grounded);
    assert_eq!(result.confidence, 1.0);
    assert!(result.supporting_citations.is_empty());
}

#[test]
fn test_empty_claim_text_is_an_error() {
    let validator = GroundingValidator::default();
    assert!(validator.validate(&Claim::factual("  "), &[], &[]).is_err());
}

#[test]
fn test_percent_matches_stored_fraction() {
    let validator = GroundingValidator::default();
    let record: Source = DatabaseRecord::new("daily_summaries", "ds-1")
        .with_field("asset_name", "Grinder 5")
        .with_field("oee_percentage", 0.875)
        .into();
    let claim = Claim::factual("Grinder 5 ran at 87.5% OEE")
        .with_entities(&["Grinder 5"])
        .with_metrics(&["87.5%"]);
    let result = validator.validate(&claim, &[record], &[]).unwrap();
    assert!((result.confidence - 1.0).abs() < 1e-9);
}

#[test]
fn test_abbreviated_currency_matches() {
    let validator = GroundingValidator::default();
    let record: Source = DatabaseRecord::new("financial_losses", "fl-3")
        .with_field("asset_name", "Mixer 7")
        .with_field("loss_amount", 50000)
        .into();
    let claim = Claim::factual("Mixer 7 lost about $50k")
        .with_entities(&["Mixer 7"])
        .with_metrics(&["$50k"]);
    let result = validator.validate(&claim, &[record], &[]).unwrap();
    assert!(result.is_grounded);
    assert!((result.confidence - 1.0).abs() < 1e-9);
}

#[test]
fn test_entity_in_memory_content_gets_partial_credit() {
    let validator = GroundingValidator::default();
    let memory = MemoryEntry::new("mem-1", "Grinder 5 reported 87.5% OEE on the night shift.");
    let claim = Claim::factual("Grinder 5 ran at 87.5% OEE")
        .with_entities(&["Grinder 5"])
        .with_metrics(&["87.5%"]);

    let result = validator.validate(&claim, &[], &[memory]).unwrap();
    // entity 0.5 * 0.4 + metric 1.0 * 0.4, renormalized over 0.8
    assert!((result.confidence - 0.75).abs() < 1e-9);
    assert_eq!(
        result.supporting_citations[0].memory_id.as_deref(),
        Some("mem-1")
    );
}

#[test]
fn test_lexical_fallback_without_mentions() {
    let validator = GroundingValidator::default();
    let memory = MemoryEntry::new(
        "mem-7",
        "Vibration on the conveyor belt increased sharply overnight.",
    );
    let claim = Claim::factual("Conveyor belt vibration increased sharply");
    let result = validator.validate(&claim, &[], &[memory]).unwrap();
    assert!((result.confidence - 1.0).abs() < 1e-9);
}

#[test]
fn test_calculation_is_a_candidate_but_inference_is_not() {
    let validator = GroundingValidator::default();
    let calc = Source::Calculation(Calculation {
        name: "scrap rate".into(),
        formula: "scrap / total".into(),
        inputs: [("scrap".to_string(), 12.0), ("total".to_string(), 400.0)]
            .into_iter()
            .collect(),
        result: 0.03,
    });
    let inference = Source::Inference(Inference {
        basis: "Scrap rate was 3%".into(),
    });
    let claim = Claim::factual("Scrap rate was 3%").with_metrics(&["3%"]);

    let result = validator
        .validate(&claim, &[inference.clone(), calc], &[])
        .unwrap();
    assert!(result.is_grounded);
    assert_eq!(result.supporting_citations.len(), 1);
    assert_eq!(
        result.supporting_citations[0].display_text,
        "[Calculation: scrap rate]"
    );

    let only_inference = validator.validate(&claim, &[inference], &[]).unwrap();
    assert_eq!(only_inference.confidence, 0.0);
}

#[test]
fn test_equal_scores_keep_source_order_and_cap() {
    let config = GroundingConfig {
        max_supporting_citations: 2,
        ..GroundingConfig::default()
    };
    let validator = GroundingValidator::new(config, CitationFactory::default());
    let sources: Vec<Source> = ["r1", "r2", "r3"]
        .iter()
        .map(|id| {
            DatabaseRecord::new("daily_summaries", *id)
                .with_field("asset_name", "Grinder 5")
                .with_field("oee_percentage", 87.5)
                .into()
        })
        .collect();
    let claim = Claim::factual("Grinder 5 had 87.5% OEE")
        .with_entities(&["Grinder 5"])
        .with_metrics(&["87.5%"]);

    let pool = SourcePool::build(&sources, &[]);
    let result = validator.validate_in_pool(&claim, &pool).unwrap();
    let ids: Vec<_> = result
        .supporting_citations
        .iter()
        .map(|c| c.record_id.clone().unwrap())
        .collect();
    assert_eq!(ids, vec!["r1", "r2"]);
}

#[test]
fn test_grounding_score_policy() {
    let recommendation = Claim {
        requires_grounding: false,
        claim_type: ClaimType::Recommendation,
        ..Claim::factual("Check the bearings.")
    };
    let ok = GroundingResult {
        claim_text: "a".into(),
        is_grounded: true,
        confidence: 0.9,
        supporting_citations: vec![],
        validation_time_ms: 0.1,
    };

    // Nothing asserted: nothing to disprove.
    assert_eq!(grounding_score(&[], &[]), 1.0);
    assert_eq!(
        grounding_score(&[recommendation.clone()], &[ok.clone()]),
        1.0
    );

    let claims = vec![Claim::factual("a"), recommendation, Claim::factual("b")];
    let results = vec![ok.clone(), ok, GroundingResult::failed("b")];
    assert!((grounding_score(&claims, &results) - 0.45).abs() < 1e-9);
}
