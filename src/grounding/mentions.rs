//! Mention scanning shared by extraction and grounding:
//! numeric tokens, normalized phrases, and temporal references.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<cur>\$)?\s?(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)\s?(?P<suffix>%|percent\b|million\b|thousand\b|k\b|m\b)?",
    )
    .expect("number pattern is valid")
});

static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("iso date pattern is valid")
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?\b",
    )
    .expect("month-day pattern is valid")
});

static MONTH_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+(\d{4})\b")
        .expect("month-year pattern is valid")
});

static LAST_N_DAYS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:last|past|previous)\s+(\d{1,3})\s+days?\b")
        .expect("last-n-days pattern is valid")
});

const STOPWORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "being", "could", "does", "during", "each",
    "from", "have", "into", "more", "most", "only", "other", "over", "same", "should", "some",
    "than", "that", "their", "them", "then", "there", "these", "they", "this", "those", "through",
    "under", "very", "were", "what", "when", "where", "which", "while", "with", "would", "your",
];

/// A number found in text, with the unit hints that change how it compares.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericMention {
    pub raw: String,
    pub value: f64,
    pub is_percent: bool,
    pub is_currency: bool,
    /// Grouped, decimal, suffixed or unit-bearing: not a bare small integer.
    pub significant: bool,
}

/// Scan every number in `text`.
pub fn scan_numbers(text: &str) -> Vec<NumericMention> {
    NUMBER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let num_match = caps.name("num")?;
            // Skip digits glued to letters ("Q3", "v2"): part of a name, not a value.
            if text[..num_match.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphabetic())
            {
                return None;
            }
            let num = num_match.as_str();
            let mut value: f64 = num.replace(',', "").parse().ok()?;
            let suffix = caps
                .name("suffix")
                .map(|s| s.as_str().to_ascii_lowercase());
            let is_percent = matches!(suffix.as_deref(), Some("%") | Some("percent"));
            match suffix.as_deref() {
                Some("k") | Some("thousand") => value *= 1_000.0,
                Some("m") | Some("million") => value *= 1_000_000.0,
                _ => {}
            }
            let is_currency = caps.name("cur").is_some();
            let significant = is_percent
                || is_currency
                || suffix.is_some()
                || num.contains(',')
                || num.contains('.')
                || num.len() >= 3;
            Some(NumericMention {
                raw: whole.as_str().trim().to_string(),
                value,
                is_percent,
                is_currency,
                significant,
            })
        })
        .collect()
}

/// Parse a single metric mention ("87.5%", "$50,000", "1.2k") as a number.
pub fn parse_metric(mention: &str) -> Option<NumericMention> {
    let trimmed = mention.trim();
    let found = scan_numbers(trimmed);
    match found.as_slice() {
        [only] if only.raw.len() + 2 >= trimmed.len() => Some(only.clone()),
        _ => None,
    }
}

/// Relative comparison of a mentioned value against a stored one.
///
/// Percent mentions also match fractions (87.5% ~ 0.875) and vice versa.
pub fn numbers_match(mention: &NumericMention, stored: f64, tolerance: f64) -> bool {
    if !stored.is_finite() || !mention.value.is_finite() {
        return false;
    }
    let close = |a: f64, b: f64| {
        let diff = (a - b).abs();
        diff < 1e-9 || diff <= tolerance * a.abs().max(b.abs())
    };
    close(mention.value, stored)
        || (mention.is_percent
            && (close(mention.value / 100.0, stored) || close(mention.value, stored * 100.0)))
}

/// Lowercase, turn punctuation into spaces, collapse whitespace.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(|w| w.trim_matches('.'))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole-phrase containment on normalized text ("pump 3" does not match "pump 31").
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    let needle = normalize(needle);
    if needle.is_empty() {
        return false;
    }
    let haystack = normalize(haystack);
    haystack.match_indices(&needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = start == 0 || haystack.as_bytes()[start - 1] == b' ';
        let after_ok = end == haystack.len() || haystack.as_bytes()[end] == b' ';
        before_ok && after_ok
    })
}

/// Crude plural folding so "losses" meets "loss".
pub fn stem(word: &str) -> String {
    let w = word.to_lowercase();
    if w.len() > 4 && w.ends_with("sses") {
        w[..w.len() - 2].to_string()
    } else if w.len() > 4 && w.ends_with("ies") {
        format!("{}y", &w[..w.len() - 3])
    } else if w.len() > 3 && w.ends_with('s') && !w.ends_with("ss") {
        w[..w.len() - 1].to_string()
    } else {
        w
    }
}

/// Stemmed token set of normalized text.
pub fn token_set(text: &str) -> HashSet<String> {
    normalize(text).split(' ').filter(|t| !t.is_empty()).map(stem).collect()
}

/// Content words worth matching lexically: 4+ chars, not a stopword, not a bare number.
pub fn content_words(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    normalize(text)
        .split(' ')
        .filter(|w| w.len() >= 4 && !STOPWORDS.contains(w))
        .filter(|w| w.parse::<f64>().is_err())
        .map(stem)
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Inclusive date window a temporal reference resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Whether `date` falls inside the window widened by `tolerance_days`.
    pub fn contains(&self, date: NaiveDate, tolerance_days: i64) -> bool {
        let tol = Duration::days(tolerance_days.max(0));
        date >= self.start - tol && date <= self.end + tol
    }
}

fn month_number(abbrev: &str) -> Option<u32> {
    let idx = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ]
    .iter()
    .position(|m| abbrev.to_ascii_lowercase().starts_with(m))?;
    Some(idx as u32 + 1)
}

fn month_window(year: i32, month: u32) -> Option<DateWindow> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(DateWindow {
        start,
        end: next - Duration::days(1),
    })
}

/// Resolve a temporal reference against `as_of`.
///
/// Absolute forms win over relative keywords. A form that matches but does
/// not name a real date is skipped. Returns None when nothing is recognized.
pub fn resolve_temporal(reference: &str, as_of: NaiveDate) -> Option<DateWindow> {
    iso_day(reference)
        .or_else(|| month_day(reference, as_of))
        .or_else(|| month_year(reference))
        .or_else(|| last_n_days(reference, as_of))
        .or_else(|| relative_window(reference, as_of))
}

fn iso_day(reference: &str) -> Option<DateWindow> {
    let caps = ISO_DATE_RE.captures(reference)?;
    let date = NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )?;
    Some(DateWindow::day(date))
}

fn month_day(reference: &str, as_of: NaiveDate) -> Option<DateWindow> {
    let caps = MONTH_DAY_RE.captures(reference)?;
    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    // "Jan 2026" is a month, not a day; the day group only takes 1-2 digits.
    let year = match caps.get(3) {
        Some(y) => y.as_str().parse().ok()?,
        None => as_of.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day).map(DateWindow::day)
}

fn month_year(reference: &str) -> Option<DateWindow> {
    let caps = MONTH_YEAR_RE.captures(reference)?;
    month_window(caps[2].parse().ok()?, month_number(&caps[1])?)
}

fn last_n_days(reference: &str, as_of: NaiveDate) -> Option<DateWindow> {
    let caps = LAST_N_DAYS_RE.captures(reference)?;
    let n: i64 = caps[1].parse().ok()?;
    Some(DateWindow {
        start: as_of - Duration::days(n),
        end: as_of,
    })
}

fn relative_window(reference: &str, as_of: NaiveDate) -> Option<DateWindow> {
    let lower = reference.to_lowercase();
    let monday = as_of - Duration::days(as_of.weekday().num_days_from_monday() as i64);
    if lower.contains("yesterday") {
        Some(DateWindow::day(as_of - Duration::days(1)))
    } else if lower.contains("today") || lower.contains("this morning") {
        Some(DateWindow::day(as_of))
    } else if lower.contains("last week") || lower.contains("previous week") {
        Some(DateWindow {
            start: monday - Duration::days(7),
            end: monday - Duration::days(1),
        })
    } else if lower.contains("this week") {
        Some(DateWindow {
            start: monday,
            end: as_of,
        })
    } else if lower.contains("last month") || lower.contains("previous month") {
        let (year, month) = if as_of.month() == 1 {
            (as_of.year() - 1, 12)
        } else {
            (as_of.year(), as_of.month() - 1)
        };
        month_window(year, month)
    } else if lower.contains("this month") {
        Some(DateWindow {
            start: as_of.with_day(1)?,
            end: as_of,
        })
    } else {
        None
    }
}

/// Parse a stored value as a calendar date (ISO date, RFC 3339, or SQL timestamp).
pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if value.len() > 10 && value.is_char_boundary(10) {
        return NaiveDate::parse_from_str(&value[..10], "%Y-%m-%d").ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_scan_numbers_units() {
        let found = scan_numbers("Mixer 7 had 95% OEE and caused $50,000 in losses.");
        let values: Vec<_> = found.iter().map(|n| n.value).collect();
        assert_eq!(values, vec![7.0, 95.0, 50_000.0]);
        assert!(!found[0].significant);
        assert!(found[1].is_percent && found[1].significant);
        assert!(found[2].is_currency && found[2].significant);
    }

    #[test]
    fn test_scan_numbers_skips_glued_digits() {
        let found = scan_numbers("Q3 output rose 12.5k units");
        assert_eq!(found.len(), 1);
        assert!((found[0].value - 12_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_metric_requires_single_number() {
        assert_eq!(parse_metric("87.5%").map(|n| n.value), Some(87.5));
        assert_eq!(parse_metric("$50,000").map(|n| n.value), Some(50_000.0));
        assert!(parse_metric("OEE").is_none());
        assert!(parse_metric("between 3 and 4 hours").is_none());
    }

    #[test]
    fn test_percent_matches_fraction() {
        let m = parse_metric("87.5%").unwrap();
        assert!(numbers_match(&m, 87.5, 0.01));
        assert!(numbers_match(&m, 0.875, 0.01));
        assert!(!numbers_match(&m, 95.0, 0.01));
    }

    #[test]
    fn test_contains_phrase_word_boundaries() {
        assert!(contains_phrase("asset grinder 5 daily", "Grinder 5"));
        assert!(!contains_phrase("pump 31", "Pump 3"));
        assert!(contains_phrase("grinder-5", "grinder 5"));
    }

    #[test]
    fn test_stem_plurals() {
        assert_eq!(stem("losses"), "loss");
        assert_eq!(stem("batteries"), "battery");
        assert_eq!(stem("units"), "unit");
        assert_eq!(stem("process"), "process");
    }

    #[test]
    fn test_resolve_relative_references() {
        let as_of = d(2026, 1, 6); // Tuesday
        assert_eq!(resolve_temporal("yesterday", as_of), Some(DateWindow::day(d(2026, 1, 5))));
        let last_week = resolve_temporal("last week", as_of).unwrap();
        assert_eq!(last_week.start, d(2025, 12, 29));
        assert_eq!(last_week.end, d(2026, 1, 4));
        let last_month = resolve_temporal("last month", as_of).unwrap();
        assert_eq!(last_month.start, d(2025, 12, 1));
        assert_eq!(last_month.end, d(2025, 12, 31));
        assert!(resolve_temporal("at some point", as_of).is_none());
    }

    #[test]
    fn test_resolve_absolute_references() {
        let as_of = d(2026, 3, 1);
        assert_eq!(
            resolve_temporal("on 2026-01-05", as_of),
            Some(DateWindow::day(d(2026, 1, 5)))
        );
        assert_eq!(
            resolve_temporal("January 5th, 2026", as_of),
            Some(DateWindow::day(d(2026, 1, 5)))
        );
        assert_eq!(resolve_temporal("Feb 2", as_of), Some(DateWindow::day(d(2026, 2, 2))));
        let month = resolve_temporal("in December 2025", as_of).unwrap();
        assert_eq!(month.end, d(2025, 12, 31));
    }

    #[test]
    fn test_invalid_absolute_date_falls_through_to_keywords() {
        let as_of = d(2026, 1, 6);
        assert_eq!(
            resolve_temporal("2026-13-45 yesterday", as_of),
            Some(DateWindow::day(d(2026, 1, 5)))
        );
        assert_eq!(
            resolve_temporal("Feb 30 last week", as_of).map(|w| w.start),
            Some(d(2025, 12, 29))
        );
        assert!(resolve_temporal("2026-13-45", as_of).is_none());
    }

    #[test]
    fn test_parse_date_value_formats() {
        assert_eq!(parse_date_value("2026-01-05"), Some(d(2026, 1, 5)));
        assert_eq!(parse_date_value("2026-01-05T08:00:00Z"), Some(d(2026, 1, 5)));
        assert_eq!(parse_date_value("2026-01-05 08:00:00"), Some(d(2026, 1, 5)));
        assert_eq!(parse_date_value("Grinder 5"), None);
    }
}
