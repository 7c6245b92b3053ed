//! ResponseSynthesizer: inline or footnote citations, then the disclaimer step.

use tracing::debug;

use crate::citations::select_primary;
use crate::config::GroundingConfig;
use crate::types::Citation;

const UNVERIFIED_PREFIX: &str =
    "Note: parts of this response could not be verified against the available data";
const PARTIAL_NOTICE: &str =
    "(Partially verified: some details could not be matched to a source.)";

/// Where a response's grounding score falls relative to the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundingLevel {
    /// Below `threshold_min`: full disclaimer.
    Weak,
    /// In `[threshold_min, threshold_high)`: trailing notice.
    Partial,
    /// At or above `threshold_high`: unchanged.
    Strong,
}

#[derive(Debug, Clone)]
pub struct ResponseSynthesizer {
    threshold_min: f64,
    threshold_high: f64,
}

impl ResponseSynthesizer {
    pub fn new(threshold_min: f64, threshold_high: f64) -> Self {
        Self {
            threshold_min,
            threshold_high,
        }
    }

    pub fn from_config(config: &GroundingConfig) -> Self {
        Self::new(config.threshold_min, config.threshold_high)
    }

    pub fn level(&self, grounding_score: f64) -> GroundingLevel {
        if !grounding_score.is_finite() || grounding_score < self.threshold_min {
            GroundingLevel::Weak
        } else if grounding_score < self.threshold_high {
            GroundingLevel::Partial
        } else {
            GroundingLevel::Strong
        }
    }

    /// Attach citations to `text`. Returns the new text and the citations placed.
    pub fn format(&self, text: &str, citations: &[Citation], inline: bool) -> (String, Vec<Citation>) {
        if inline {
            format_inline(text, citations)
        } else {
            format_footnotes(text, citations)
        }
    }

    /// Prepend a disclaimer or append a partial notice depending on the score.
    pub fn apply_disclaimer(
        &self,
        text: &str,
        grounding_score: f64,
        ungrounded_claims: &[String],
    ) -> String {
        match self.level(grounding_score) {
            GroundingLevel::Strong => text.to_string(),
            GroundingLevel::Partial => format!("{}\n\n{}", text, PARTIAL_NOTICE),
            GroundingLevel::Weak => {
                let named: Vec<String> = ungrounded_claims
                    .iter()
                    .filter(|c| !c.trim().is_empty())
                    .map(|c| format!("\"{}\"", c.trim()))
                    .collect();
                let notice = if named.is_empty() {
                    format!("{}.", UNVERIFIED_PREFIX)
                } else {
                    format!("{}: {}.", UNVERIFIED_PREFIX, named.join("; "))
                };
                format!("{}\n\n{}", notice, text)
            }
        }
    }

    /// `format` followed by `apply_disclaimer`.
    pub fn synthesize(
        &self,
        text: &str,
        citations: &[Citation],
        inline: bool,
        grounding_score: f64,
        ungrounded_claims: &[String],
    ) -> (String, Vec<Citation>) {
        let (formatted, used) = self.format(text, citations, inline);
        (
            self.apply_disclaimer(&formatted, grounding_score, ungrounded_claims),
            used,
        )
    }
}

impl Default for ResponseSynthesizer {
    fn default() -> Self {
        Self::from_config(&GroundingConfig::default())
    }
}

/// Insert each citation after the first unclaimed occurrence of its claim text.
fn format_inline(text: &str, citations: &[Citation]) -> (String, Vec<Citation>) {
    // (insert position, citation order, display text); spans are byte ranges in `text`.
    let mut insertions: Vec<(usize, usize, &str)> = Vec::new();
    let mut consumed: Vec<(usize, usize)> = Vec::new();
    let mut used = Vec::new();

    for (order, citation) in citations.iter().enumerate() {
        let Some(claim) = citation.claim_text.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        let span = text.match_indices(claim).map(|(start, m)| (start, start + m.len())).find(
            |(start, end)| {
                !consumed
                    .iter()
                    .any(|(cs, ce)| start < ce && cs < end)
            },
        );
        if let Some((start, end)) = span {
            consumed.push((start, end));
            insertions.push((end, order, citation.display_text.as_str()));
            used.push(citation.clone());
        }
    }

    if insertions.is_empty() {
        return match select_primary(citations) {
            Some(primary) => {
                debug!(citation = %primary.id, "No claim span matched, appending primary citation");
                (
                    format!("{} {}", text.trim_end(), primary.display_text),
                    vec![primary.clone()],
                )
            }
            None => (text.to_string(), Vec::new()),
        };
    }

    insertions.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    let mut out = String::with_capacity(text.len() + insertions.len() * 32);
    let mut cursor = 0;
    for (pos, _, display) in insertions {
        out.push_str(&text[cursor..pos]);
        out.push_str(display);
        cursor = pos;
    }
    out.push_str(&text[cursor..]);
    (out, used)
}

/// Leave the text alone and append a numbered source list.
fn format_footnotes(text: &str, citations: &[Citation]) -> (String, Vec<Citation>) {
    if citations.is_empty() {
        return (text.to_string(), Vec::new());
    }
    let mut out = format!("{}\n\nSources:", text);
    for (i, citation) in citations.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", i + 1, citation.display_text));
        if !citation.excerpt.is_empty() {
            out.push_str(&format!(" - {}", citation.excerpt));
        }
    }
    (out, citations.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceType;

    fn citation(id: &str, display: &str, claim: Option<&str>, confidence: f64) -> Citation {
        Citation {
            id: id.into(),
            source_type: SourceType::Database,
            source_table: Some("daily_summaries".into()),
            record_id: Some(id.into()),
            memory_id: None,
            asset_id: None,
            timestamp: None,
            excerpt: "oee percentage: 87.5%".into(),
            confidence,
            display_text: display.into(),
            claim_text: claim.map(str::to_string),
        }
    }

    #[test]
    fn test_same_span_annotated_once() {
        let text = "Grinder 5 ran well. Grinder 5 ran well.";
        let cites = vec![
            citation("a", "[A]", Some("Grinder 5 ran well"), 0.9),
            citation("b", "[B]", Some("Grinder 5 ran well"), 0.8),
            citation("c", "[C]", Some("Grinder 5 ran well"), 0.7),
        ];
        let (out, used) = ResponseSynthesizer::default().format(text, &cites, true);
        assert_eq!(out, "Grinder 5 ran well[A]. Grinder 5 ran well[B].");
        assert_eq!(used.len(), 2);
    }

    #[test]
    fn test_levels() {
        let s = ResponseSynthesizer::default();
        assert_eq!(s.level(0.59), GroundingLevel::Weak);
        assert_eq!(s.level(0.6), GroundingLevel::Partial);
        assert_eq!(s.level(0.85), GroundingLevel::Strong);
        assert_eq!(s.level(f64::NAN), GroundingLevel::Weak);
    }
}
