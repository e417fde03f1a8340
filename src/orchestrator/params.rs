//! Handler parameter mapping
//!
//! Each handler pulls its parameters out of the collected slots, with a
//! fixed default when a slot is absent. A value that cannot be coerced is
//! passed through as-is so the tool reports the bad input itself.

use crate::intents::{CARDS_TOOL, FOREX_TOOL, FRAUD_TOOL, LOANS_TOOL, POLICY_TOOL, SAVINGS_TOOL};
use crate::models::SlotMap;
use crate::slots::normalize::{coerce_amount, coerce_months, coerce_text, number_value};
use crate::tools::fraud::IMMEDIATE;
use serde_json::{json, Value};

const DEFAULT_LOAN_AMOUNT: f64 = 500_000.0;
const DEFAULT_INTEREST_RATE: f64 = 10.5;
const DEFAULT_LOAN_TENURE: i64 = 60;
const DEFAULT_INCOME: f64 = 500_000.0;
const DEFAULT_CARD_BENEFITS: &str = "general";
const DEFAULT_DEPOSIT: f64 = 100_000.0;
const DEFAULT_DEPOSIT_TENURE: i64 = 12;
const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_FOREX_AMOUNT: f64 = 50_000.0;

fn amount(slots: &SlotMap, name: &str, default: f64) -> Value {
    match slots.get(name) {
        None | Some(Value::Null) => number_value(default),
        Some(raw) => coerce_amount(raw)
            .map(number_value)
            .unwrap_or_else(|| raw.clone()),
    }
}

fn months(slots: &SlotMap, name: &str, default: i64) -> Value {
    match slots.get(name) {
        None | Some(Value::Null) => Value::from(default),
        Some(raw) => coerce_months(raw)
            .map(Value::from)
            .unwrap_or_else(|| raw.clone()),
    }
}

fn text(slots: &SlotMap, name: &str, default: &str) -> Value {
    match slots.get(name) {
        None | Some(Value::Null) => Value::from(default),
        Some(raw) => coerce_text(raw)
            .map(Value::from)
            .unwrap_or_else(|| raw.clone()),
    }
}

/// Parameters for `handler` built from the collected slots and the raw message
pub fn tool_params(handler: &str, slots: &SlotMap, message: &str) -> Value {
    match handler {
        LOANS_TOOL => json!({
            "loan_amount": amount(slots, "amount", DEFAULT_LOAN_AMOUNT),
            "interest_rate": amount(slots, "interest_rate", DEFAULT_INTEREST_RATE),
            "tenure_months": months(slots, "tenure", DEFAULT_LOAN_TENURE),
        }),
        CARDS_TOOL => json!({
            "income": amount(slots, "income", DEFAULT_INCOME),
            "preferred_benefits": text(slots, "card_type", DEFAULT_CARD_BENEFITS),
        }),
        SAVINGS_TOOL => json!({
            "total_amount": amount(slots, "amount", DEFAULT_DEPOSIT),
            "tenure_months": months(slots, "tenure", DEFAULT_DEPOSIT_TENURE),
        }),
        FOREX_TOOL => json!({
            "currency": text(slots, "currency", DEFAULT_CURRENCY),
            "amount": amount(slots, "amount", DEFAULT_FOREX_AMOUNT),
        }),
        FRAUD_TOOL => json!({
            "transaction_id": text(slots, "transaction_id", IMMEDIATE),
            "description": text(slots, "description", message),
        }),
        POLICY_TOOL => json!({ "query": message }),
        _ => json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(pairs: &[(&str, Value)]) -> SlotMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_loan_defaults() {
        let params = tool_params(LOANS_TOOL, &SlotMap::new(), "loan please");
        assert_eq!(params["loan_amount"], json!(500000));
        assert_eq!(params["interest_rate"], json!(10.5));
        assert_eq!(params["tenure_months"], json!(60));
    }

    #[test]
    fn test_loan_values_are_coerced() {
        let params = tool_params(
            LOANS_TOOL,
            &slots(&[
                ("amount", json!("5 lakhs")),
                ("tenure", json!("5 years")),
                ("interest_rate", json!("9.5%")),
            ]),
            "",
        );
        assert_eq!(params["loan_amount"], json!(500000));
        assert_eq!(params["tenure_months"], json!(60));
        assert_eq!(params["interest_rate"], json!(9.5));
    }

    #[test]
    fn test_uncoercible_value_passes_through() {
        let params = tool_params(LOANS_TOOL, &slots(&[("amount", json!("lots"))]), "");
        assert_eq!(params["loan_amount"], json!("lots"));
    }

    #[test]
    fn test_forex_and_cards_defaults() {
        let forex = tool_params(FOREX_TOOL, &SlotMap::new(), "");
        assert_eq!(forex, json!({"currency": "USD", "amount": 50000}));

        let cards = tool_params(CARDS_TOOL, &slots(&[("income", json!(800000))]), "");
        assert_eq!(cards, json!({"income": 800000, "preferred_benefits": "general"}));
    }

    #[test]
    fn test_savings_defaults() {
        let params = tool_params(SAVINGS_TOOL, &SlotMap::new(), "");
        assert_eq!(params, json!({"total_amount": 100000, "tenure_months": 12}));
    }

    #[test]
    fn test_fraud_falls_back_to_message() {
        let params = tool_params(FRAUD_TOOL, &SlotMap::new(), "someone stole my card");
        assert_eq!(params["transaction_id"], "immediate");
        assert_eq!(params["description"], "someone stole my card");
    }

    #[test]
    fn test_policy_uses_raw_message() {
        let params = tool_params(POLICY_TOOL, &slots(&[("amount", json!(1))]), "branch timings?");
        assert_eq!(params, json!({"query": "branch timings?"}));
    }

    #[test]
    fn test_unknown_handler_gets_empty_params() {
        assert_eq!(tool_params("mortgage_tool", &SlotMap::new(), "x"), json!({}));
    }
}
