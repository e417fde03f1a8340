//! Forex rates and travel currency

use super::{format_grouped, format_inr, parse_params, round2, Tool};
use crate::error::AssistantError;
use crate::intents::FOREX_TOOL;
use crate::models::ToolResult;
use crate::Result;
use serde::Deserialize;
use serde_json::{json, Value};

/// INR per unit of foreign currency
pub const FOREX_RATES: &[(&str, f64)] = &[
    ("USD", 83.25),
    ("EUR", 90.50),
    ("GBP", 105.75),
    ("AED", 22.65),
    ("SGD", 62.40),
    ("AUD", 54.30),
    ("CAD", 61.20),
    ("CHF", 94.80),
];

const CARD_MARKUP: f64 = 1.02;

pub fn rate_for(currency: &str) -> Option<f64> {
    FOREX_RATES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(currency))
        .map(|(_, rate)| *rate)
}

#[derive(Debug, Deserialize)]
struct ForexParams {
    currency: String,
    #[serde(default = "default_amount")]
    amount: f64,
}

fn default_amount() -> f64 {
    1000.0
}

/// Convert an INR amount into `currency` at the cash and forex-card rates
pub fn get_forex_rates(currency: &str, amount: f64) -> Result<ToolResult> {
    let currency = currency.trim().to_uppercase();

    let Some(rate) = rate_for(&currency) else {
        let available = FOREX_RATES
            .iter()
            .map(|(code, _)| *code)
            .collect::<Vec<_>>()
            .join(", ");
        return Ok(ToolResult {
            summary: format!("Currency {} not available. We support: {}", currency, available),
            bullets: vec![format!("Available currencies: {}", available)],
            data: json!({ "error": "unsupported_currency" }),
        });
    };

    if amount < 0.0 {
        return Err(AssistantError::InvalidToolInput(
            "amount cannot be negative".to_string(),
        ));
    }

    let foreign_amount = amount / rate;
    let card_rate = rate * CARD_MARKUP;
    let card_amount = amount / card_rate;

    let bullets = vec![
        format!("Today's Rate (Cash): 1 {} = ₹{:.2}", currency, rate),
        format!(
            "{} = {} {}",
            format_inr(amount, 2),
            format_grouped(foreign_amount, 2),
            currency
        ),
        format!("Forex Card Rate: 1 {} = ₹{:.2}", currency, card_rate),
        format!(
            "{} = {} {}",
            format_inr(amount, 2),
            format_grouped(card_amount, 2),
            currency
        ),
        "Services: multi-currency forex card, foreign currency cash, travel insurance".to_string(),
        "Documents: valid passport, visa (if applicable), travel tickets, PAN card".to_string(),
        "Visit any branch or order online".to_string(),
    ];

    Ok(ToolResult {
        summary: format!(
            "For {}, you'll get approximately {} {} at today's rate of ₹{:.2} per {}.",
            format_inr(amount, 0),
            format_grouped(foreign_amount, 2),
            currency,
            rate,
            currency
        ),
        bullets,
        data: json!({
            "currency": currency,
            "inr_amount": amount,
            "foreign_amount": round2(foreign_amount),
            "exchange_rate": rate,
            "card_rate": round2(card_rate),
            "card_amount": round2(card_amount),
        }),
    })
}

pub struct ForexTool;

#[async_trait::async_trait]
impl Tool for ForexTool {
    fn name(&self) -> &'static str {
        FOREX_TOOL
    }

    fn description(&self) -> &'static str {
        "Quote forex cash and card rates for an INR amount"
    }

    fn remedy(&self) -> &'static str {
        "Please contact our forex desk for current rates."
    }

    async fn execute(&self, params: &Value) -> Result<ToolResult> {
        let p: ForexParams = parse_params(FOREX_TOOL, params)?;
        get_forex_rates(&p.currency, p.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_conversion() {
        let result = get_forex_rates("usd", 83250.0).unwrap();
        assert_eq!(result.data["currency"], "USD");
        assert_eq!(result.data["foreign_amount"].as_f64().unwrap(), 1000.0);
        assert!((result.data["card_rate"].as_f64().unwrap() - 84.915).abs() < 0.01);
        assert!(result.summary.contains("1,000.00 USD"));
    }

    #[test]
    fn test_unsupported_currency() {
        let result = get_forex_rates("JPY", 50000.0).unwrap();
        assert_eq!(result.data["error"], "unsupported_currency");
        assert!(result.summary.contains("USD, EUR, GBP"));
        assert!(result.is_error());
    }

    #[test]
    fn test_card_amount_is_lower_than_cash() {
        let result = get_forex_rates("EUR", 50000.0).unwrap();
        let cash = result.data["foreign_amount"].as_f64().unwrap();
        let card = result.data["card_amount"].as_f64().unwrap();
        assert!(card < cash);
    }
}
