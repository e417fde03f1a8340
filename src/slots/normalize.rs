//! Coercion of loosely-typed slot values into tool parameters.
//!
//! Extractors may hand back numbers, numeric strings, or phrases such as
//! "5 lakhs" and "3 years". Tool parameter mapping needs plain numbers.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref AMOUNT_RE: Regex = Regex::new(
        r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(lakhs?|lacs?|lpa|crores?|cr\b|k\b|thousand)?"
    )
    .unwrap();
    static ref TENURE_RE: Regex =
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(years?|yrs?|months?|mos?)?").unwrap();
}

/// Multiplier for an Indian-English amount suffix
pub fn amount_multiplier(suffix: &str) -> f64 {
    let suffix = suffix.to_lowercase();
    if suffix.starts_with("lakh") || suffix.starts_with("lac") || suffix == "lpa" {
        100_000.0
    } else if suffix.starts_with("cr") {
        10_000_000.0
    } else if suffix == "k" || suffix == "thousand" {
        1_000.0
    } else {
        1.0
    }
}

/// Parse the first amount in a string, honouring lakh/crore/k suffixes
pub fn parse_amount(text: &str) -> Option<f64> {
    let caps = AMOUNT_RE.captures(text)?;
    let digits = caps.get(1)?.as_str().replace(',', "");
    let base: f64 = digits.parse().ok()?;
    let multiplier = caps
        .get(2)
        .map(|m| amount_multiplier(m.as_str()))
        .unwrap_or(1.0);
    Some(base * multiplier)
}

/// Parse a tenure into months; a bare number is read as months
pub fn parse_tenure_months(text: &str) -> Option<i64> {
    let caps = TENURE_RE.captures(text)?;
    let num: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default();

    if unit.starts_with('y') {
        Some((num * 12.0).round() as i64)
    } else {
        Some(num.round() as i64)
    }
}

pub fn coerce_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

pub fn coerce_months(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => parse_tenure_months(s),
        _ => None,
    }
}

pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whole numbers become JSON integers, everything else a float
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}
