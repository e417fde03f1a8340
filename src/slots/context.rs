//! Context-derived slot recovery.
//!
//! Re-derives slot values from the free-text digest of the previous turn.
//! Best effort and lossy: any unrelated 5+ digit number in the context is
//! read as `amount`, and the first card-benefit word wins. Assistant-authored
//! text is never mined, so example values inside a question such as
//! "(travel/cashback/premium)" are not taken as answers.

use crate::models::SlotMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

const MIN_BARE_TENURE: i64 = 2;
const MAX_BARE_TENURE: i64 = 360;

lazy_static! {
    static ref AMOUNT_RE: Regex = Regex::new(r"\b(\d{5,})\b").unwrap();
    static ref LOAN_TYPE_RE: Regex =
        Regex::new(r"(?i)\b(personal|home|car|education)(?:\s+loan)?\b").unwrap();
    static ref TENURE_RE: Regex = Regex::new(
        r"(?i)(?:tenure|duration|period|months?|years?).*?(\d+)\s*(months?|years?)?"
    )
    .unwrap();
    static ref HOW_LONG_RE: Regex = Regex::new(r"(?i)(?:how long|tenure).*?(\d+)").unwrap();
    static ref CARD_TYPE_RE: Regex =
        Regex::new(r"(?i)\b(travel|cashback|premium|rewards?)\b").unwrap();
    static ref INCOME_RE: Regex = Regex::new(r"(?i)income.*?(\d{5,})").unwrap();
}

const ASSISTANT_PREFIX: &str = "Assistant:";
const SECTION_PREFIXES: &[&str] = &["User:", "Intent:", "Slots:"];

/// The digest with assistant turns removed. An assistant reply runs until the
/// next `User:`, `Intent:` or `Slots:` line.
fn user_authored(context: &str) -> String {
    let mut in_assistant = false;
    let mut kept = Vec::new();

    for line in context.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(ASSISTANT_PREFIX) {
            in_assistant = true;
            continue;
        }
        if SECTION_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            in_assistant = false;
        }
        if !in_assistant {
            kept.push(line);
        }
    }

    kept.join("\n")
}

/// Recover previously-established slot values from a prior-turn digest
pub fn recover_slots(context: &str) -> SlotMap {
    let context = user_authored(context);
    let context = context.as_str();
    let mut slots = SlotMap::new();

    if let Some(amount) = AMOUNT_RE
        .captures(context)
        .and_then(|caps| caps[1].parse::<i64>().ok())
    {
        slots.insert("amount".to_string(), Value::from(amount));
    }

    if let Some(caps) = LOAN_TYPE_RE.captures(context) {
        slots.insert("loan_type".to_string(), Value::from(caps[1].to_lowercase()));
    }

    if let Some(months) = recover_tenure(context) {
        slots.insert("tenure".to_string(), Value::from(months));
    }

    if let Some(caps) = CARD_TYPE_RE.captures(context) {
        slots.insert("card_type".to_string(), Value::from(caps[1].to_lowercase()));
    }

    if let Some(income) = INCOME_RE
        .captures(context)
        .and_then(|caps| caps[1].parse::<i64>().ok())
    {
        slots.insert("income".to_string(), Value::from(income));
    }

    slots
}

fn recover_tenure(context: &str) -> Option<i64> {
    let (num, unit) = match TENURE_RE.captures(context) {
        Some(caps) => (
            caps[1].parse::<i64>().ok()?,
            caps.get(2)
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_default(),
        ),
        None => {
            let caps = HOW_LONG_RE.captures(context)?;
            (caps[1].parse::<i64>().ok()?, String::new())
        }
    };

    let months = if unit.contains("year") {
        num.checked_mul(12)?
    } else if unit.contains("month") || (MIN_BARE_TENURE..=MAX_BARE_TENURE).contains(&num) {
        num
    } else {
        return None;
    };

    (1..=MAX_BARE_TENURE).contains(&months).then_some(months)
}
