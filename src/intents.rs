//! Intent table
//!
//! The one place where each intent's required slots, optional slots, handler
//! and context markers are declared. Fresh classification and context reuse
//! both read from here.

use crate::models::{Intent, IntentMetadata};

pub const LOANS_TOOL: &str = "loans_tool";
pub const CARDS_TOOL: &str = "cards_tool";
pub const SAVINGS_TOOL: &str = "savings_tool";
pub const FOREX_TOOL: &str = "forex_tool";
pub const FRAUD_TOOL: &str = "fraud_tool";
pub const POLICY_TOOL: &str = "policy_rag_tool";

pub const CLARIFICATION_REPLY: &str = "I'm not sure I understand. Could you please rephrase? I can help with loans, credit cards, FD investments, forex, policies, and fraud reports.";

pub const SUPPORT_REPLY: &str =
    "I found your intent but couldn't process it. Please contact support.";

const DEFAULT_DISTANCE_THRESHOLD: f64 = 0.4;

#[derive(Debug)]
pub struct IntentSpec {
    pub intent: Intent,
    pub required_slots: &'static [&'static str],
    /// Requested from the extractor when missing, never asked for
    pub optional_slots: &'static [&'static str],
    pub handler: &'static str,
    /// Case-insensitive substrings that tie a prior-turn context to this intent
    pub context_markers: &'static [&'static str],
    /// Classifier candidates further than this are discarded
    pub distance_threshold: f64,
}

impl IntentSpec {
    pub fn metadata(&self) -> IntentMetadata {
        IntentMetadata {
            required_slots: self.required_slots.iter().map(|s| s.to_string()).collect(),
            handler: Some(self.handler.to_string()),
        }
    }
}

/// Ordered by context-reuse priority
pub static INTENT_TABLE: &[IntentSpec] = &[
    IntentSpec {
        intent: Intent::Loan,
        required_slots: &["loan_type", "amount", "tenure"],
        optional_slots: &["interest_rate"],
        handler: LOANS_TOOL,
        context_markers: &["loan"],
        distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
    },
    IntentSpec {
        intent: Intent::CreditCard,
        required_slots: &["income", "card_type"],
        optional_slots: &[],
        handler: CARDS_TOOL,
        context_markers: &["credit"],
        distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
    },
    IntentSpec {
        intent: Intent::SavingsFd,
        required_slots: &["amount", "tenure"],
        optional_slots: &[],
        handler: SAVINGS_TOOL,
        context_markers: &["savings", "fd"],
        distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
    },
    IntentSpec {
        intent: Intent::ForexTravel,
        required_slots: &["currency", "amount"],
        optional_slots: &[],
        handler: FOREX_TOOL,
        context_markers: &["forex", "currency"],
        distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
    },
    IntentSpec {
        intent: Intent::PolicyFaq,
        required_slots: &[],
        optional_slots: &[],
        handler: POLICY_TOOL,
        context_markers: &["policy", "faq"],
        distance_threshold: 0.45,
    },
    IntentSpec {
        intent: Intent::FraudDispute,
        required_slots: &["transaction_id", "description"],
        optional_slots: &[],
        handler: FRAUD_TOOL,
        context_markers: &["fraud", "dispute"],
        distance_threshold: 0.35,
    },
];

/// Look up an intent's table entry. `Unknown` has none.
pub fn spec_for(intent: Intent) -> Option<&'static IntentSpec> {
    INTENT_TABLE.iter().find(|spec| spec.intent == intent)
}

const SLOT_QUESTIONS: &[(&str, &str)] = &[
    ("loan_amount", "What loan amount are you looking for?"),
    ("loan_type", "What type of loan do you need? (personal/home/car/education)"),
    ("interest_rate", "What interest rate were you quoted? (if you know)"),
    ("income", "What is your annual income?"),
    ("card_type", "What type of benefits are you interested in? (travel/cashback/premium)"),
    ("amount", "What amount are you planning to invest/need?"),
    ("tenure", "For how long? (in months)"),
    ("currency", "Which currency do you need? (USD/EUR/GBP/etc.)"),
    ("transaction_id", "What is the transaction ID? (or say 'immediate' to block card now)"),
    ("description", "Please describe the issue in detail."),
];

/// Canned follow-up question for a slot, with a templated fallback
pub fn question_for(slot: &str) -> String {
    SLOT_QUESTIONS
        .iter()
        .find(|(name, _)| *name == slot)
        .map(|(_, question)| question.to_string())
        .unwrap_or_else(|| format!("Could you provide: {}?", slot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_intent_has_exactly_one_entry() {
        for intent in [
            Intent::Loan,
            Intent::CreditCard,
            Intent::SavingsFd,
            Intent::ForexTravel,
            Intent::FraudDispute,
            Intent::PolicyFaq,
        ] {
            let count = INTENT_TABLE.iter().filter(|s| s.intent == intent).count();
            assert_eq!(count, 1, "{} should appear once", intent);
        }
        assert!(spec_for(Intent::Unknown).is_none());
    }

    #[test]
    fn test_handlers_are_unique() {
        let mut handlers: Vec<_> = INTENT_TABLE.iter().map(|s| s.handler).collect();
        handlers.sort();
        handlers.dedup();
        assert_eq!(handlers.len(), INTENT_TABLE.len());
    }

    #[test]
    fn test_policy_faq_needs_no_slots() {
        let spec = spec_for(Intent::PolicyFaq).unwrap();
        assert!(spec.required_slots.is_empty());
        assert_eq!(spec.metadata().handler.as_deref(), Some(POLICY_TOOL));
    }

    #[test]
    fn test_question_lookup_and_fallback() {
        assert_eq!(question_for("income"), "What is your annual income?");
        assert_eq!(question_for("pan_number"), "Could you provide: pan_number?");
    }
}
