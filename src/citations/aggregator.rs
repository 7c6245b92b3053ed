//! Citation aggregation: dedup by identity key, rank, cap, pick the primary.

use std::collections::HashMap;

use crate::types::Citation;

/// Deduplicate, sort by confidence (descending), and keep at most `max_count`.
///
/// Duplicates share an identity key (`record_id`, else `memory_id`, else id);
/// the highest-confidence one survives, earliest first on ties. A survivor
/// without claim text inherits it from a dropped duplicate so inline
/// annotation can still place it. Order is `(confidence desc, first index)`,
/// independent of how the input was produced.
pub fn aggregate(citations: &[Citation], max_count: usize) -> Vec<Citation> {
    // identity key -> (first index seen, kept citation)
    let mut kept: HashMap<&str, (usize, Citation)> = HashMap::new();

    for (index, citation) in citations.iter().enumerate() {
        let confidence = sanitize(citation.confidence);
        match kept.get_mut(citation.identity_key()) {
            None => {
                let mut c = citation.clone();
                c.confidence = confidence;
                kept.insert(citation.identity_key(), (index, c));
            }
            Some((_, existing)) => {
                if confidence > existing.confidence {
                    let inherited = existing.claim_text.take();
                    let mut c = citation.clone();
                    c.confidence = confidence;
                    if c.claim_text.is_none() {
                        c.claim_text = inherited;
                    }
                    *existing = c;
                } else if existing.claim_text.is_none() {
                    existing.claim_text = citation.claim_text.clone();
                }
            }
        }
    }

    let mut ranked: Vec<(usize, Citation)> = kept.into_values().collect();
    ranked.sort_by(|(ai, a), (bi, b)| b.confidence.total_cmp(&a.confidence).then(ai.cmp(bi)));
    ranked
        .into_iter()
        .take(max_count)
        .map(|(_, c)| c)
        .collect()
}

/// `confidence + type bonus + 0.1·has(asset_id) + 0.1·has(timestamp)`.
pub fn primary_score(citation: &Citation) -> f64 {
    let mut score = sanitize(citation.confidence) + citation.source_type.primary_bonus();
    if citation.asset_id.is_some() {
        score += 0.1;
    }
    if citation.timestamp.is_some() {
        score += 0.1;
    }
    score
}

/// Highest primary score; the earliest citation wins ties. None for empty input.
pub fn select_primary(citations: &[Citation]) -> Option<&Citation> {
    citations.iter().fold(None, |best: Option<&Citation>, c| match best {
        Some(b) if primary_score(b) >= primary_score(c) => Some(b),
        _ => Some(c),
    })
}

fn sanitize(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
