//! Strict parsing of model-authored claim JSON.
//!
//! Models wrap JSON in prose and drift from the schema. The reply is located
//! defensively (outermost `[...]`, else outermost `{...}`), each entry is read
//! into a permissive raw shape, and entries that fail validation are dropped.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::grounding::mentions::scan_numbers;
use crate::types::{Claim, ClaimType};

/// Raw entry as the model wrote it; every field is optional and untyped.
#[derive(Debug, Deserialize)]
struct RawClaim {
    #[serde(default, alias = "claim", alias = "sentence")]
    text: Option<Value>,
    #[serde(default, alias = "type")]
    claim_type: Option<Value>,
    #[serde(default)]
    requires_grounding: Option<Value>,
    #[serde(default, alias = "entities")]
    entity_mentions: Option<Value>,
    #[serde(default, alias = "metrics")]
    metric_mentions: Option<Value>,
    #[serde(default, alias = "temporal", alias = "time_reference")]
    temporal_reference: Option<Value>,
}

/// Slice out the JSON payload of a reply. Arrays win over objects.
pub fn locate_json(reply: &str) -> Option<&str> {
    let array = match (reply.find('['), reply.rfind(']')) {
        (Some(start), Some(end)) if start < end => Some(&reply[start..=end]),
        _ => None,
    };
    let object = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&reply[start..=end]),
        _ => None,
    };
    match (array, object) {
        // An object wrapping the array ({"claims": [...]}) starts first.
        (Some(a), Some(o)) if reply.find('{') < reply.find('[') && o.len() > a.len() => Some(o),
        (Some(a), _) => Some(a),
        (None, o) => o,
    }
}

/// Parse a model reply into validated claims. Unparseable replies yield `[]`.
pub fn parse_claims(reply: &str) -> Vec<Claim> {
    let Some(payload) = locate_json(reply) else {
        debug!("No JSON payload in extraction reply");
        return Vec::new();
    };
    let value: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "Extraction reply is not valid JSON");
            return Vec::new();
        }
    };

    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("claims") {
            Some(Value::Array(items)) => items,
            Some(_) => Vec::new(),
            None => vec![Value::Object(map)],
        },
        _ => Vec::new(),
    };

    let total = entries.len();
    let claims: Vec<Claim> = entries.into_iter().filter_map(validate_entry).collect();
    if claims.len() < total {
        debug!(
            accepted = claims.len(),
            dropped = total - claims.len(),
            "Dropped malformed claim entries"
        );
    }
    claims
}

fn validate_entry(entry: Value) -> Option<Claim> {
    let raw: RawClaim = match entry {
        Value::String(text) => RawClaim {
            text: Some(Value::String(text)),
            claim_type: None,
            requires_grounding: None,
            entity_mentions: None,
            metric_mentions: None,
            temporal_reference: None,
        },
        other => serde_json::from_value(other).ok()?,
    };

    let text = match raw.text {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return None,
    };
    let claim_type = match raw.claim_type {
        Some(Value::String(label)) => ClaimType::from_label(&label),
        _ => ClaimType::Other,
    };
    let requires_grounding = match raw.requires_grounding {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes"),
        _ => claim_type.grounded_by_default(),
    };
    let temporal_reference = match raw.temporal_reference {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    let mut claim = Claim {
        entity_mentions: string_list(raw.entity_mentions),
        metric_mentions: string_list(raw.metric_mentions),
        text,
        claim_type,
        requires_grounding,
        temporal_reference,
    };
    enrich_metrics(&mut claim);
    Some(claim)
}

/// Keep only non-empty strings (numbers are accepted and stringified).
fn string_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Fill empty metric mentions with the significant numbers stated in the claim.
pub fn enrich_metrics(claim: &mut Claim) {
    if !claim.requires_grounding || !claim.metric_mentions.is_empty() {
        return;
    }
    claim.metric_mentions = scan_numbers(&claim.text)
        .into_iter()
        .filter(|n| n.significant)
        .map(|n| n.raw)
        .collect();
}
