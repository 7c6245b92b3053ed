//! Semantic value formatting for citation excerpts.
//!
//! Field kinds are inferred from column names; a few known tables carry a
//! fixed priority list so their excerpts always lead with the headline metric.

use chrono::NaiveDate;
use serde_json::Value;

use crate::grounding::mentions::parse_date_value;

/// How a column's value should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Percentage,
    Currency,
    Count,
    Date,
    Text,
}

/// Fields shown per excerpt.
pub const MAX_PRIORITY_FIELDS: usize = 4;

/// Per-table priority columns, most important first.
const TABLE_PRIORITY_FIELDS: &[(&str, &[&str])] = &[
    (
        "daily_summaries",
        &[
            "oee_percentage",
            "report_date",
            "total_units_produced",
            "downtime_minutes",
            "scrap_cost",
        ],
    ),
    (
        "production_runs",
        &["units_produced", "efficiency_percentage", "target_units", "run_date"],
    ),
    (
        "downtime_events",
        &["duration_minutes", "cost_impact", "event_count", "start_time"],
    ),
    (
        "maintenance_work_orders",
        &["labor_cost", "parts_cost", "hours_spent", "completed_at"],
    ),
    (
        "quality_inspections",
        &["defect_rate_percentage", "units_inspected", "units_rejected", "inspection_date"],
    ),
    (
        "financial_losses",
        &["loss_amount", "loss_percentage", "units_lost", "period_start"],
    ),
];

/// Infer a column's kind from its name.
pub fn classify_field(name: &str) -> FieldKind {
    let name = name.to_ascii_lowercase();
    if name.ends_with("date")
        || name.ends_with("_at")
        || name.ends_with("timestamp")
        || name.ends_with("_time")
        || name.ends_with("_start")
        || name.ends_with("_end")
    {
        FieldKind::Date
    } else if name.contains("percent") || name.ends_with("_pct") || name.ends_with("_rate") {
        FieldKind::Percentage
    } else if ["cost", "revenue", "amount", "price", "loss", "usd", "spend"]
        .iter()
        .any(|f| name.contains(f))
    {
        FieldKind::Currency
    } else if ["count", "units", "minutes", "hours", "quantity", "total", "number"]
        .iter()
        .any(|f| name.contains(f))
    {
        FieldKind::Count
    } else {
        FieldKind::Text
    }
}

/// Priority column list for a table, if it is one of the known tables.
pub fn table_priority_fields(table: &str) -> Option<&'static [&'static str]> {
    TABLE_PRIORITY_FIELDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(table))
        .map(|(_, fields)| *fields)
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace([',', '$', '%'], "").parse().ok(),
        _ => None,
    }
    .filter(|f: &f64| f.is_finite())
}

/// Render a value by kind. Returns None when the value does not fit the kind.
pub fn format_value(kind: FieldKind, value: &Value) -> Option<String> {
    match kind {
        FieldKind::Percentage => value_as_f64(value).map(|v| format!("{:.1}%", v)),
        FieldKind::Currency => value_as_f64(value).map(format_currency),
        FieldKind::Count => value_as_f64(value).map(|v| group_thousands(v.round() as i64)),
        FieldKind::Date => value.as_str().and_then(parse_date_value).map(human_date),
        FieldKind::Text => crate::types::source::value_as_text(value),
    }
}

/// `1234567` → `1,234,567`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// `50000.0` → `$50,000.00`.
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as i64;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, group_thousands(cents / 100), cents % 100)
}

/// `2026-01-05` → `Jan 5, 2026`.
pub fn human_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// `oee_percentage` → `oee percentage`.
pub fn field_label(name: &str) -> String {
    name.replace('_', " ")
}
