//! Core data models for the banking assistant

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Collected slot values keyed by slot name
pub type SlotMap = HashMap<String, Value>;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Loan,
    CreditCard,
    SavingsFd,
    ForexTravel,
    FraudDispute,
    PolicyFaq,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Loan => "loan",
            Intent::CreditCard => "credit_card",
            Intent::SavingsFd => "savings_fd",
            Intent::ForexTravel => "forex_travel",
            Intent::FraudDispute => "fraud_dispute",
            Intent::PolicyFaq => "policy_faq",
            Intent::Unknown => "unknown",
        }
    }

    /// Parse a classifier label. Unrecognised labels map to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "loan" => Intent::Loan,
            "credit_card" => Intent::CreditCard,
            "savings_fd" => Intent::SavingsFd,
            "forex_travel" => Intent::ForexTravel,
            "fraud_dispute" => Intent::FraudDispute,
            "policy_faq" => Intent::PolicyFaq,
            _ => Intent::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    Classifier,
    Context,
}

/// Terminal state reached by a turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnAction {
    Clarify,
    AskSlot,
    Tool,
}

//
// ================= Routing =================
//

/// Raw classifier output: a label and its distance (lower is closer)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub label: String,
    pub distance: f64,
}

impl Candidate {
    pub fn new(label: impl Into<String>, distance: f64) -> Self {
        Self {
            label: label.into(),
            distance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredCandidate {
    pub intent: Intent,
    pub score: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentMetadata {
    pub required_slots: Vec<String>,
    pub handler: Option<String>,
}

/// Outcome of intent resolution. Built once per turn and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterResult {
    pub intent: Intent,
    pub confidence: Confidence,
    pub score: f64,
    pub distance: Option<f64>,
    pub metadata: Option<IntentMetadata>,
    #[serde(default)]
    pub alternatives: Vec<ScoredCandidate>,
    pub source: RouteSource,
}

impl RouterResult {
    pub fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            confidence: Confidence::None,
            score: 0.0,
            distance: None,
            metadata: None,
            alternatives: Vec::new(),
            source: RouteSource::Classifier,
        }
    }

    pub fn handler(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.handler.as_deref())
    }
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub summary: String,
    pub bullets: Vec<String>,
    pub data: Value,
}

impl ToolResult {
    /// Error-shaped result: summary names the error, one remedial bullet, `data.error` set
    pub fn failure(summary: impl Into<String>, remedy: &str, error: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            bullets: vec![remedy.to_string()],
            data: serde_json::json!({ "error": error.into() }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.data.get("error").is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Proposal {
    pub bullets: Vec<String>,
    pub data: Value,
}

impl From<&ToolResult> for Proposal {
    fn from(result: &ToolResult) -> Self {
        Self {
            bullets: result.bullets.clone(),
            data: result.data.clone(),
        }
    }
}

//
// ================= Turn I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub user_id: Option<String>,
    pub session_id: String,
    pub text: String,
    pub context: Option<String>,
}

impl TurnRequest {
    pub fn new(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: None,
            session_id: session_id.into(),
            text: text.into(),
            context: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouterSummary {
    pub intent: Intent,
    pub confidence: Confidence,
    pub score: Option<f64>,
    pub source: RouteSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub reply: String,
    pub pending: Vec<String>,
    pub router: RouterSummary,
    pub proposal: Option<Proposal>,
    pub action: TurnAction,
    /// Every slot known at the end of the turn, for the caller to persist
    #[serde(default)]
    pub slots: SlotMap,
}

//
// ================= Per-turn State =================
//

/// Transient state threaded through the stages of a single turn
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub session_id: String,
    pub user_id: Option<String>,
    pub text: String,
    pub context: Option<String>,
    pub router: Option<RouterResult>,
    pub pending_slots: Vec<String>,
    pub slots: SlotMap,
    pub reply: String,
    pub tool_result: Option<ToolResult>,
    pub proposal: Option<Proposal>,
}

impl ConversationState {
    pub fn new(request: TurnRequest, slots: SlotMap) -> Self {
        Self {
            session_id: request.session_id,
            user_id: request.user_id,
            text: request.text,
            context: request.context,
            router: None,
            pending_slots: Vec::new(),
            slots,
            reply: String::new(),
            tool_result: None,
            proposal: None,
        }
    }

    pub fn intent(&self) -> Intent {
        self.router
            .as_ref()
            .map(|r| r.intent)
            .unwrap_or(Intent::Unknown)
    }

    /// Drop pending names that already have a collected value, preserving order
    pub fn prune_pending(&mut self) {
        let slots = &self.slots;
        self.pending_slots.retain(|name| !slots.contains_key(name));
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::None => "none",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_labels_round_trip_through_serde_names() {
        let json = serde_json::to_string(&Intent::CreditCard).unwrap();
        assert_eq!(json, "\"credit_card\"");
        assert_eq!(Intent::from_label("credit_card"), Intent::CreditCard);
        assert_eq!(Intent::from_label(" Savings_FD "), Intent::SavingsFd);
        assert_eq!(Intent::from_label("mortgage"), Intent::Unknown);
    }

    #[test]
    fn test_prune_pending_keeps_declaration_order() {
        let mut slots = SlotMap::new();
        slots.insert("amount".to_string(), serde_json::json!(500000));
        let mut state = ConversationState::new(TurnRequest::new("s1", "hi"), slots);
        state.pending_slots = vec![
            "loan_type".to_string(),
            "amount".to_string(),
            "tenure".to_string(),
        ];

        state.prune_pending();
        assert_eq!(state.pending_slots, vec!["loan_type", "tenure"]);
    }

    #[test]
    fn test_failure_result_shape() {
        let result = ToolResult::failure("Sorry", "Please try again.", "boom");
        assert!(result.is_error());
        assert_eq!(result.bullets.len(), 1);
        assert_eq!(result.data["error"], "boom");
    }
}
