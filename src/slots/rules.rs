//! Rule-based slot extraction.
//!
//! Pattern matching over the current user message only. Context is accepted
//! for interface parity but never read: example values quoted in an
//! assistant question must not be captured as answers.

use super::normalize::{amount_multiplier, number_value};
use super::{Extraction, SlotExtractor};
use crate::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

/// Bare numbers at or above this are money, below it they may be a tenure
const MONEY_FLOOR: f64 = 1_000.0;
const MAX_TENURE_MONTHS: f64 = 360.0;
const MIN_DESCRIPTION_WORDS: usize = 4;

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(
        r"(?i)\b(\d[\d,]*(?:\.\d+)?)\s*(%|percent|lakhs?|lacs?|lpa|crores?|cr\b|k\b|thousand|years?|yrs?|months?|mos?)?"
    )
    .unwrap();
    static ref LOAN_TYPE_RE: Regex = Regex::new(r"(?i)\b(personal|home|car|education)\b").unwrap();
    static ref CARD_TYPE_RE: Regex =
        Regex::new(r"(?i)\b(travel|cashback|premium|rewards?)\b").unwrap();
    static ref CURRENCY_CODE_RE: Regex =
        Regex::new(r"(?i)\b(usd|eur|gbp|aed|sgd|aud|cad|chf|jpy)\b").unwrap();
    static ref TXN_TOKEN_RE: Regex =
        Regex::new(r"(?i)\b((?:txn|tx|ref|utr)[-_]?\d[\w-]*)\b").unwrap();
    static ref TXN_PHRASE_RE: Regex = Regex::new(
        r"(?i)\b(?:transaction|txn|reference|ref)\s*(?:id|no\.?|number)?\s*(?:is)?\s*[:#]?\s*([A-Za-z0-9-]{4,})"
    )
    .unwrap();
    static ref IMMEDIATE_RE: Regex = Regex::new(r"(?i)\b(immediate(?:ly)?|block|right now)\b").unwrap();
    static ref INCOME_HINT_RE: Regex = Regex::new(r"(?i)\b(income|salary|earn\w*|lpa|ctc)\b").unwrap();
}

const CURRENCY_WORDS: &[(&str, &str)] = &[
    ("singapore dollar", "SGD"),
    ("australian dollar", "AUD"),
    ("canadian dollar", "CAD"),
    ("dirham", "AED"),
    ("swiss franc", "CHF"),
    ("dollar", "USD"),
    ("euro", "EUR"),
    ("pound", "GBP"),
];

/// Numbers found in the message, bucketed by what their suffix says they are
#[derive(Debug, Default)]
struct NumberScan {
    money: Vec<f64>,
    tenure_months: Vec<i64>,
    rates: Vec<f64>,
    bare_small: Vec<f64>,
}

fn scan_numbers(text: &str) -> NumberScan {
    let mut scan = NumberScan::default();

    for caps in NUMBER_RE.captures_iter(text) {
        let Some(raw) = caps.get(1) else { continue };
        let Ok(value) = raw.as_str().trim_end_matches(',').replace(',', "").parse::<f64>() else {
            continue;
        };
        let suffix = caps
            .get(2)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();

        if suffix == "%" || suffix == "percent" {
            scan.rates.push(value);
        } else if suffix.starts_with('y') {
            scan.tenure_months.push((value * 12.0).round() as i64);
        } else if suffix.starts_with("mo") {
            scan.tenure_months.push(value.round() as i64);
        } else if !suffix.is_empty() {
            scan.money.push(value * amount_multiplier(&suffix));
        } else if value >= MONEY_FLOOR {
            scan.money.push(value);
        } else {
            scan.bare_small.push(value);
        }
    }

    scan
}

fn find_currency(text: &str) -> Option<String> {
    if let Some(caps) = CURRENCY_CODE_RE.captures(text) {
        return caps.get(1).map(|m| m.as_str().to_uppercase());
    }
    let lowered = text.to_lowercase();
    CURRENCY_WORDS
        .iter()
        .find(|(word, _)| lowered.contains(word))
        .map(|(_, code)| code.to_string())
}

fn find_transaction_id(text: &str) -> Option<String> {
    if let Some(caps) = TXN_TOKEN_RE.captures(text) {
        return caps.get(1).map(|m| m.as_str().to_uppercase());
    }
    if let Some(id) = TXN_PHRASE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| id.chars().any(|c| c.is_ascii_digit()))
    {
        return Some(id.to_uppercase());
    }
    if IMMEDIATE_RE.is_match(text) {
        return Some("immediate".to_string());
    }
    None
}

/// Deterministic extractor over the current message
#[derive(Debug, Default, Clone)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core; the trait impl wraps it
    pub fn extract_sync(&self, text: &str, wanted: &[String]) -> Extraction {
        let scan = scan_numbers(text);
        let word_count = text.split_whitespace().count();
        let short_answer = word_count <= 3;
        let wants = |slot: &str| wanted.iter().any(|w| w == slot);

        let mut extraction: Extraction = wanted.iter().map(|w| (w.clone(), None)).collect();
        let mut set = |slot: &str, value: Value| {
            if let Some(entry) = extraction.get_mut(slot) {
                *entry = Some(value);
            }
        };

        let first_money = scan.money.first().copied();
        let income_hinted = INCOME_HINT_RE.is_match(text);

        if let Some(money) = first_money {
            if wants("income") && (income_hinted || !wants("amount")) {
                set("income", number_value(money));
            } else if wants("amount") {
                set("amount", number_value(money));
            }
        }

        if wants("tenure") {
            if let Some(months) = scan.tenure_months.first() {
                set("tenure", Value::from(*months));
            } else if short_answer {
                if let Some(bare) = scan
                    .bare_small
                    .iter()
                    .find(|n| **n >= 1.0 && **n <= MAX_TENURE_MONTHS)
                {
                    set("tenure", Value::from(bare.round() as i64));
                }
            }
        }

        if let Some(rate) = scan.rates.first() {
            set("interest_rate", number_value(*rate));
        }

        if let Some(caps) = LOAN_TYPE_RE.captures(text) {
            set("loan_type", Value::from(caps[1].to_lowercase()));
        }

        if let Some(caps) = CARD_TYPE_RE.captures(text) {
            set("card_type", Value::from(caps[1].to_lowercase()));
        }

        if let Some(code) = find_currency(text) {
            set("currency", Value::from(code));
        }

        if wants("transaction_id") {
            if let Some(id) = find_transaction_id(text) {
                set("transaction_id", Value::from(id));
            }
        }

        if word_count >= MIN_DESCRIPTION_WORDS {
            set("description", Value::from(text.trim()));
        }

        extraction
    }
}

#[async_trait]
impl SlotExtractor for RuleBasedExtractor {
    async fn extract(
        &self,
        text: &str,
        wanted: &[String],
        _context: Option<&str>,
    ) -> Result<Extraction> {
        Ok(self.extract_sync(text, wanted))
    }

    fn name(&self) -> &str {
        "rules"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wanted(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn extract(text: &str, names: &[&str]) -> Extraction {
        RuleBasedExtractor::new().extract_sync(text, &wanted(names))
    }

    #[test]
    fn test_full_loan_request() {
        let out = extract(
            "I need a personal loan of 500000 for 60 months at 10.5% interest",
            &["loan_type", "amount", "tenure", "interest_rate"],
        );
        assert_eq!(out["loan_type"], Some(json!("personal")));
        assert_eq!(out["amount"], Some(json!(500000)));
        assert_eq!(out["tenure"], Some(json!(60)));
        assert_eq!(out["interest_rate"], Some(json!(10.5)));
    }

    #[test]
    fn test_lakh_amount_and_years() {
        let out = extract("I need 10 lakhs for 5 years", &["amount", "tenure"]);
        assert_eq!(out["amount"], Some(json!(1_000_000)));
        assert_eq!(out["tenure"], Some(json!(60)));
    }

    #[test]
    fn test_income_goes_to_income_slot() {
        let out = extract("My income is 800000", &["income", "card_type"]);
        assert_eq!(out["income"], Some(json!(800000)));
        assert_eq!(out["card_type"], None);
    }

    #[test]
    fn test_only_wanted_slots_returned() {
        let out = extract("personal loan of 500000", &["tenure"]);
        assert_eq!(out.len(), 1);
        assert_eq!(out["tenure"], None);
    }

    #[test]
    fn test_short_bare_number_is_tenure() {
        let out = extract("36", &["tenure"]);
        assert_eq!(out["tenure"], Some(json!(36)));

        // a bare small number inside a sentence is too ambiguous
        let out = extract("I have 2 kids and want savings", &["tenure"]);
        assert_eq!(out["tenure"], None);
    }

    #[test]
    fn test_currency_codes_and_words() {
        assert_eq!(extract("EUR", &["currency"])["currency"], Some(json!("EUR")));
        assert_eq!(
            extract("need some dollars", &["currency"])["currency"],
            Some(json!("USD"))
        );
        assert_eq!(
            extract("i want forex card", &["currency"])["currency"],
            None
        );
    }

    #[test]
    fn test_transaction_ids() {
        assert_eq!(
            extract("txn TXN98765 looks wrong", &["transaction_id"])["transaction_id"],
            Some(json!("TXN98765"))
        );
        assert_eq!(
            extract("transaction id is AB12CD", &["transaction_id"])["transaction_id"],
            Some(json!("AB12CD"))
        );
        assert_eq!(
            extract("block it immediately", &["transaction_id"])["transaction_id"],
            Some(json!("immediate"))
        );
        assert_eq!(
            extract("a transaction yesterday", &["transaction_id"])["transaction_id"],
            None
        );
    }

    #[test]
    fn test_description_needs_a_sentence() {
        assert_eq!(extract("fraud", &["description"])["description"], None);
        assert_eq!(
            extract("someone stole my card", &["description"])["description"],
            Some(json!("someone stole my card"))
        );
    }
}
