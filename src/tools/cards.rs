//! Credit card recommendation

use super::{format_grouped, format_inr, parse_params, Tool};
use crate::intents::CARDS_TOOL;
use crate::models::ToolResult;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
pub struct CardProduct {
    #[serde(rename = "type")]
    pub card_type: &'static str,
    pub name: &'static str,
    pub benefits: &'static [&'static str],
    pub annual_fee: u32,
    pub min_income: u64,
    pub reward_rate: u32,
}

pub static CARD_CATALOG: &[CardProduct] = &[
    CardProduct {
        card_type: "travel",
        name: "DemoBank Travel Elite",
        benefits: &[
            "5X rewards on travel",
            "Airport lounge access",
            "Complimentary travel insurance",
        ],
        annual_fee: 2999,
        min_income: 500_000,
        reward_rate: 5,
    },
    CardProduct {
        card_type: "cashback",
        name: "DemoBank Cashback Plus",
        benefits: &[
            "5% cashback on online shopping",
            "2% on dining",
            "Fuel surcharge waiver",
        ],
        annual_fee: 999,
        min_income: 300_000,
        reward_rate: 5,
    },
    CardProduct {
        card_type: "premium",
        name: "DemoBank Platinum Reserve",
        benefits: &[
            "10X rewards",
            "Concierge service",
            "Golf privileges",
            "Priority customer care",
        ],
        annual_fee: 10_000,
        min_income: 1_500_000,
        reward_rate: 10,
    },
    CardProduct {
        card_type: "entry",
        name: "DemoBank Silver Card",
        benefits: &["1% rewards", "EMI conversion", "Online fraud protection"],
        annual_fee: 0,
        min_income: 200_000,
        reward_rate: 1,
    },
];

#[derive(Debug, Deserialize)]
struct CardParams {
    income: f64,
    #[serde(default = "default_benefits")]
    preferred_benefits: String,
}

fn default_benefits() -> String {
    "general".to_string()
}

/// Recommend a card for an annual income, honouring the preferred
/// benefit type when the income qualifies for it.
pub fn recommend_card(income: f64, preferred_benefits: &str) -> Result<ToolResult> {
    let preference = preferred_benefits.trim().to_lowercase();

    // Stable sort keeps catalog order among equal reward rates
    let mut eligible: Vec<&CardProduct> = CARD_CATALOG
        .iter()
        .filter(|card| income >= card.min_income as f64)
        .collect();
    eligible.sort_by(|a, b| b.reward_rate.cmp(&a.reward_rate));

    let Some(best) = eligible.first() else {
        return Ok(ToolResult {
            summary: "Based on your income, we recommend building your credit profile first."
                .to_string(),
            bullets: vec![
                "Consider a secured credit card to start".to_string(),
                "Minimum income required: ₹2,00,000 per annum".to_string(),
                "You can reapply once your income increases".to_string(),
            ],
            data: json!({ "eligible": false, "cards": [] }),
        });
    };

    let recommended = eligible
        .iter()
        .find(|card| card.card_type == preference)
        .copied()
        .unwrap_or(*best);

    let mut bullets = vec![
        format!("Recommended: {}", recommended.name),
        format!("Annual Fee: ₹{}", format_grouped(recommended.annual_fee as f64, 0)),
        format!("Reward Rate: {}X points", recommended.reward_rate),
    ];
    bullets.extend(recommended.benefits.iter().map(|b| format!("✓ {}", b)));

    let all_eligible: Vec<Value> = eligible
        .iter()
        .map(|c| json!({ "type": c.card_type, "name": c.name, "annual_fee": c.annual_fee }))
        .collect();

    Ok(ToolResult {
        summary: format!(
            "Based on your income of {}, we recommend the {}.",
            format_inr(income, 0),
            recommended.name
        ),
        bullets,
        data: json!({
            "eligible": true,
            "recommended_card": recommended.card_type,
            "card_details": recommended,
            "all_eligible": all_eligible,
        }),
    })
}

pub struct CardsTool;

#[async_trait::async_trait]
impl Tool for CardsTool {
    fn name(&self) -> &'static str {
        CARDS_TOOL
    }

    fn description(&self) -> &'static str {
        "Recommend a credit card based on annual income and preferred benefits"
    }

    fn remedy(&self) -> &'static str {
        "Please try again with valid income information."
    }

    async fn execute(&self, params: &Value) -> Result<ToolResult> {
        let p: CardParams = parse_params(CARDS_TOOL, params)?;
        recommend_card(p.income, &p.preferred_benefits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_preference_honoured() {
        let result = recommend_card(800_000.0, "travel").unwrap();
        assert_eq!(result.data["recommended_card"], "travel");
        assert!(result.summary.contains("DemoBank Travel Elite"));
        assert!(result.summary.contains("₹800,000"));
    }

    #[test]
    fn test_general_picks_highest_reward() {
        let result = recommend_card(2_000_000.0, "general").unwrap();
        assert_eq!(result.data["recommended_card"], "premium");
        assert_eq!(result.data["all_eligible"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_unaffordable_preference_falls_back() {
        let result = recommend_card(600_000.0, "premium").unwrap();
        // travel and cashback tie on reward rate; catalog order wins
        assert_eq!(result.data["recommended_card"], "travel");
    }

    #[test]
    fn test_low_income_not_eligible() {
        let result = recommend_card(150_000.0, "cashback").unwrap();
        assert_eq!(result.data["eligible"], false);
        assert!(result.summary.contains("building your credit profile"));
    }

    #[test]
    fn test_card_type_serialized_as_type() {
        let result = recommend_card(300_000.0, "cashback").unwrap();
        assert_eq!(result.data["card_details"]["type"], "cashback");
        assert_eq!(result.data["card_details"]["annual_fee"], 999);
    }
}
