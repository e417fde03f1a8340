//! Tool trait and registry
//!
//! Tools are deterministic, side-effect-free calculators bound to one intent.
//! Whatever goes wrong inside a tool comes back as an error-shaped
//! `ToolResult`; nothing propagates out of `ToolRegistry::invoke`.

pub mod cards;
pub mod forex;
pub mod fraud;
pub mod loans;
pub mod policy;
pub mod savings;

use crate::error::AssistantError;
use crate::models::ToolResult;
use crate::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

const DEFAULT_REMEDY: &str = "Please try again or contact support.";

/// Trait for a single tool (deterministic execution)
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;

    /// Remedial bullet shown when this tool fails
    fn remedy(&self) -> &'static str {
        DEFAULT_REMEDY
    }

    async fn execute(&self, params: &Value) -> Result<ToolResult>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Run a registered tool. Tool failures are reshaped into an
    /// error-shaped result; only an unknown name is reported as `Err`.
    pub async fn invoke(&self, name: &str, params: &Value) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| AssistantError::ToolNotFound(name.to_string()))?;

        match tool.execute(params).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                Ok(ToolResult::failure(
                    format!("Sorry, I encountered an error: {}", e),
                    tool.remedy(),
                    e.to_string(),
                ))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialize a tool's parameter object into its typed form
pub(crate) fn parse_params<T: DeserializeOwned>(tool: &str, params: &Value) -> Result<T> {
    if !params.is_object() {
        return Err(AssistantError::InvalidToolInput(format!(
            "{} expects a JSON object",
            tool
        )));
    }
    serde_json::from_value(params.clone())
        .map_err(|e| AssistantError::InvalidToolInput(format!("{}: {}", tool, e)))
}

/// Group a digit string in threes: "1234567" -> "1,234,567"
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Rupee amount with thousands separators and `decimals` fraction digits
pub(crate) fn format_inr(amount: f64, decimals: usize) -> String {
    format!("₹{}", format_grouped(amount, decimals))
}

pub(crate) fn format_grouped(amount: f64, decimals: usize) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let formatted = format!("{:.*}", decimals, amount.abs());
    let (whole, frac) = match formatted.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (formatted.as_str(), None),
    };
    match frac {
        Some(f) => format!("{}{}.{}", sign, group_thousands(whole), f),
        None => format!("{}{}", sign, group_thousands(whole)),
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Create the registry with every banking tool registered under its handler name.
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(loans::LoansTool));
    registry.register(Arc::new(cards::CardsTool));
    registry.register(Arc::new(savings::SavingsTool));
    registry.register(Arc::new(forex::ForexTool));
    registry.register(Arc::new(fraud::FraudTool));
    registry.register(Arc::new(policy::PolicyTool));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::INTENT_TABLE;
    use serde_json::json;

    #[test]
    fn test_every_intent_handler_is_registered() {
        let registry = create_default_registry();
        for spec in INTENT_TABLE {
            assert!(registry.contains(spec.handler), "{} missing", spec.handler);
        }
        assert_eq!(registry.list().len(), INTENT_TABLE.len());
    }

    #[test]
    fn test_unknown_tool_is_not_found() {
        let registry = create_default_registry();
        let result = tokio_test::block_on(registry.invoke("mortgage_tool", &json!({})));
        assert!(matches!(result, Err(AssistantError::ToolNotFound(_))));
    }

    #[test]
    fn test_tool_errors_are_reshaped() {
        let registry = create_default_registry();
        let result = tokio_test::block_on(registry.invoke(
            "loans_tool",
            &json!({"loan_amount": "lots", "interest_rate": 10.5, "tenure_months": 60}),
        ))
        .unwrap();

        assert!(result.summary.starts_with("Sorry, I encountered an error"));
        assert_eq!(result.bullets.len(), 1);
        assert!(result.is_error());
    }

    #[test]
    fn test_inr_formatting() {
        assert_eq!(format_inr(10746.95, 0), "₹10,747");
        assert_eq!(format_inr(1234567.891, 2), "₹1,234,567.89");
        assert_eq!(format_inr(999.0, 0), "₹999");
        assert_eq!(format_grouped(-144817.0, 0), "-144,817");
        assert_eq!(format_grouped(0.4, 0), "0");
        // beyond u64::MAX
        assert_eq!(
            format_grouped(2f64.powi(70), 0),
            "1,180,591,620,717,411,303,424"
        );
    }
}
