//! EMI calculation

use super::{format_inr, parse_params, round2, Tool};
use crate::error::AssistantError;
use crate::intents::LOANS_TOOL;
use crate::models::ToolResult;
use crate::Result;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct EmiParams {
    loan_amount: f64,
    interest_rate: f64,
    tenure_months: i64,
}

/// Equated monthly instalment for a principal, annual rate (percent) and tenure
pub fn calculate_emi(loan_amount: f64, interest_rate: f64, tenure_months: i64) -> Result<ToolResult> {
    if tenure_months <= 0 {
        return Err(AssistantError::InvalidToolInput(
            "tenure must be at least one month".to_string(),
        ));
    }
    if !loan_amount.is_finite() || !interest_rate.is_finite() {
        return Err(AssistantError::InvalidToolInput(
            "loan amount and interest rate must be finite numbers".to_string(),
        ));
    }
    if loan_amount < 0.0 || interest_rate < 0.0 {
        return Err(AssistantError::InvalidToolInput(
            "loan amount and interest rate cannot be negative".to_string(),
        ));
    }

    let monthly_rate = interest_rate / 12.0 / 100.0;
    let n = tenure_months as f64;

    // P × r × (1 + r)^n / ((1 + r)^n - 1)
    let emi = if monthly_rate == 0.0 {
        loan_amount / n
    } else {
        let growth = (1.0 + monthly_rate).powf(n);
        loan_amount * monthly_rate * growth / (growth - 1.0)
    };

    let total_payment = emi * n;
    let total_interest = total_payment - loan_amount;

    Ok(ToolResult {
        summary: format!(
            "Your EMI will be {} per month for {} months.",
            format_inr(emi, 0),
            tenure_months
        ),
        bullets: vec![
            format!("Monthly EMI: {}", format_inr(emi, 0)),
            format!("Total Amount Payable: {}", format_inr(total_payment, 0)),
            format!("Total Interest: {}", format_inr(total_interest, 0)),
            format!("Principal: {}", format_inr(loan_amount, 0)),
            format!("Interest Rate: {}% p.a.", interest_rate),
            format!(
                "Tenure: {} months ({} years {} months)",
                tenure_months,
                tenure_months / 12,
                tenure_months % 12
            ),
        ],
        data: json!({
            "emi": round2(emi),
            "total_payment": round2(total_payment),
            "total_interest": round2(total_interest),
            "principal": loan_amount,
            "rate": interest_rate,
            "tenure": tenure_months,
        }),
    })
}

pub struct LoansTool;

#[async_trait::async_trait]
impl Tool for LoansTool {
    fn name(&self) -> &'static str {
        LOANS_TOOL
    }

    fn description(&self) -> &'static str {
        "Calculate EMI, total payment and total interest for a loan"
    }

    fn remedy(&self) -> &'static str {
        "Please check your input values and try again."
    }

    async fn execute(&self, params: &Value) -> Result<ToolResult> {
        let p: EmiParams = parse_params(LOANS_TOOL, params)?;
        calculate_emi(p.loan_amount, p.interest_rate, p.tenure_months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_emi() {
        let result = calculate_emi(500000.0, 10.5, 60).unwrap();
        let emi = result.data["emi"].as_f64().unwrap();
        assert!((emi - 10746.95).abs() < 0.01, "emi was {}", emi);
        assert_eq!(result.data["tenure"], 60);
        let total = result.data["total_payment"].as_f64().unwrap();
        let interest = result.data["total_interest"].as_f64().unwrap();
        assert!((total - 644817.0).abs() < 1.0, "total was {}", total);
        assert!((total - interest - 500000.0).abs() < 0.02);
        assert!(result.summary.contains("₹10,747"));
    }

    #[test]
    fn test_emi_is_repeatable() {
        let a = calculate_emi(500000.0, 10.5, 60).unwrap();
        let b = calculate_emi(500000.0, 10.5, 60).unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_zero_rate_splits_evenly() {
        let result = calculate_emi(120000.0, 0.0, 12).unwrap();
        assert_eq!(result.data["emi"].as_f64().unwrap(), 10000.0);
        assert_eq!(result.data["total_interest"].as_f64().unwrap(), 0.0);
    }

    #[test]
    fn test_huge_principal_is_not_reported_as_zero() {
        let result = calculate_emi(5e22, 10.5, 60).unwrap();
        assert!(result.data["emi"].as_f64().unwrap() > 1e21);
        assert!(!result.summary.contains("₹0 per month"));
        assert!(result.summary.starts_with("Your EMI will be ₹1,"));
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        assert!(calculate_emi(f64::INFINITY, 10.5, 60).is_err());
        assert!(calculate_emi(500000.0, f64::NAN, 60).is_err());
    }

    #[test]
    fn test_zero_tenure_rejected() {
        assert!(calculate_emi(500000.0, 10.5, 0).is_err());
    }

    #[test]
    fn test_tenure_bullet_breakdown() {
        let result = calculate_emi(100000.0, 9.0, 30).unwrap();
        assert!(result
            .bullets
            .iter()
            .any(|b| b == "Tenure: 30 months (2 years 6 months)"));
    }
}
