//! Fixed deposit ladder suggestion

use super::{format_inr, parse_params, round2, Tool};
use crate::error::AssistantError;
use crate::intents::SAVINGS_TOOL;
use crate::models::ToolResult;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// FD rate sheet: (tenure in months, annual rate %)
const FD_RATES: &[(i64, f64)] = &[(6, 6.5), (12, 7.0), (24, 7.25), (36, 7.5), (60, 7.75)];
const DEFAULT_FD_RATE: f64 = 7.0;

const SHORT_LADDER: &[(i64, f64)] = &[(6, 0.3), (6, 0.3), (12, 0.4)];
const LONG_LADDER: &[(i64, f64)] = &[(12, 0.25), (24, 0.25), (36, 0.25), (60, 0.25)];

pub fn fd_rate(months: i64) -> f64 {
    FD_RATES
        .iter()
        .find(|(m, _)| *m == months)
        .map(|(_, rate)| *rate)
        .unwrap_or(DEFAULT_FD_RATE)
}

#[derive(Debug, Clone, Serialize)]
pub struct LadderRung {
    pub fd_number: usize,
    pub amount: f64,
    pub tenure: i64,
    pub rate: f64,
    pub interest: f64,
    pub maturity_amount: f64,
}

#[derive(Debug, Deserialize)]
struct LadderParams {
    total_amount: f64,
    #[serde(default = "default_tenure")]
    tenure_months: i64,
}

fn default_tenure() -> i64 {
    12
}

pub fn suggest_fd_ladder(total_amount: f64, tenure_months: i64) -> Result<ToolResult> {
    if total_amount <= 0.0 {
        return Err(AssistantError::InvalidToolInput(
            "investment amount must be positive".to_string(),
        ));
    }

    let splits = if tenure_months <= 12 {
        SHORT_LADDER
    } else {
        LONG_LADDER
    };

    let ladder: Vec<LadderRung> = splits
        .iter()
        .enumerate()
        .map(|(i, (months, share))| {
            let amount = total_amount * share;
            let rate = fd_rate(*months);
            // simple interest
            let interest = amount * rate * *months as f64 / (12.0 * 100.0);
            LadderRung {
                fd_number: i + 1,
                amount,
                tenure: *months,
                rate,
                interest,
                maturity_amount: amount + interest,
            }
        })
        .collect();

    let total_interest: f64 = ladder.iter().map(|r| r.interest).sum();
    let total_maturity: f64 = ladder.iter().map(|r| r.maturity_amount).sum();
    let effective_rate = total_interest / total_amount * 100.0;

    let mut bullets = vec![
        format!("Total Investment: {}", format_inr(total_amount, 2)),
        format!("Total Interest Earned: {}", format_inr(total_interest, 2)),
        format!("Total Maturity Value: {}", format_inr(total_maturity, 2)),
        format!("Effective Return: {:.2}%", effective_rate),
        "FD Ladder Breakdown:".to_string(),
    ];
    bullets.extend(ladder.iter().map(|r| {
        format!(
            "FD-{}: {} @ {}% for {}m → Maturity: {}",
            r.fd_number,
            format_inr(r.amount, 2),
            r.rate,
            r.tenure,
            format_inr(r.maturity_amount, 2)
        )
    }));
    bullets.extend([
        "✓ Staggered maturity for regular liquidity".to_string(),
        "✓ Balanced returns across tenures".to_string(),
        "✓ Flexibility to reinvest at prevailing rates".to_string(),
    ]);

    Ok(ToolResult {
        summary: format!(
            "Invest {} across {} FDs for optimal returns and liquidity.",
            format_inr(total_amount, 0),
            ladder.len()
        ),
        bullets,
        data: json!({
            "total_investment": total_amount,
            "total_interest": round2(total_interest),
            "total_maturity": round2(total_maturity),
            "effective_rate": round2(effective_rate),
            "ladder": ladder,
        }),
    })
}

pub struct SavingsTool;

#[async_trait::async_trait]
impl Tool for SavingsTool {
    fn name(&self) -> &'static str {
        SAVINGS_TOOL
    }

    fn description(&self) -> &'static str {
        "Suggest a fixed deposit ladder with projected returns"
    }

    fn remedy(&self) -> &'static str {
        "Please check your input values and try again."
    }

    async fn execute(&self, params: &Value) -> Result<ToolResult> {
        let p: LadderParams = parse_params(SAVINGS_TOOL, params)?;
        suggest_fd_ladder(p.total_amount, p.tenure_months)
    }
}
