//! Policy and FAQ lookup
//!
//! Word-overlap search over a small fixed knowledge base.

use super::{parse_params, Tool};
use crate::intents::POLICY_TOOL;
use crate::models::ToolResult;
use crate::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;

struct PolicyEntry {
    key: &'static str,
    question: &'static str,
    answer: &'static str,
}

static POLICY_KB: &[PolicyEntry] = &[
    PolicyEntry {
        key: "branch timings",
        question: "What are your branch timings?",
        answer: "Our branches are open Monday to Friday from 10:00 AM to 4:00 PM, and Saturday from 10:00 AM to 1:00 PM. We are closed on Sundays and public holidays.",
    },
    PolicyEntry {
        key: "password reset",
        question: "How do I reset my password?",
        answer: "To reset your password: 1) Visit the login page and click 'Forgot Password' 2) Enter your registered email/phone 3) Verify OTP 4) Set new password. Password must be 8-16 characters with at least one uppercase, one number, and one special character.",
    },
    PolicyEntry {
        key: "kyc documents",
        question: "What documents do I need for KYC?",
        answer: "For KYC verification, please provide: 1) Identity Proof (Aadhaar/PAN/Passport/Driving License) 2) Address Proof (Aadhaar/Utility Bill/Passport) 3) Recent photograph. All documents should be self-attested copies.",
    },
    PolicyEntry {
        key: "account closure",
        question: "How to close my account?",
        answer: "To close your account: 1) Visit your home branch 2) Submit account closure form with passbook/checkbook 3) Clear any pending dues 4) Balance will be transferred via check/NEFT. Processing takes 7-10 business days.",
    },
    PolicyEntry {
        key: "service charges",
        question: "What are the service charges?",
        answer: "Service charges vary by account type: Savings Account - ₹200/quarter if balance < minimum, ATM transactions - 5 free/month (₹20 thereafter), NEFT - Free, RTGS - ₹25-50 based on amount, Cheque book - ₹2/leaf.",
    },
    PolicyEntry {
        key: "privacy policy",
        question: "Tell me about your privacy policy",
        answer: "We protect your data with bank-grade encryption. We never share personal information with third parties without consent. Your data is used only for banking services. You can request data deletion anytime. Full policy at demobank.com/privacy",
    },
];

#[derive(Debug, Deserialize)]
struct PolicyParams {
    query: String,
}

fn words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Best entry by overlap between query words and the entry's key and question words.
/// Ties keep the earlier entry.
fn best_match(query: &str) -> Option<(&'static PolicyEntry, usize)> {
    let query_words = words(query);
    let mut best: Option<(&'static PolicyEntry, usize)> = None;

    for entry in POLICY_KB {
        let mut entry_words = words(entry.key);
        entry_words.extend(words(entry.question));
        let overlap = query_words.intersection(&entry_words).count();

        if overlap > best.map(|(_, score)| score).unwrap_or(0) {
            best = Some((entry, overlap));
        }
    }
    best
}

pub fn search_policy(query: &str) -> Result<ToolResult> {
    match best_match(query) {
        Some((entry, score)) => Ok(ToolResult {
            summary: entry.answer.to_string(),
            bullets: vec![
                format!("Question: {}", entry.question),
                "Customer Care: 1800-XXX-XXXX".to_string(),
                "Visit: demobank.com/help".to_string(),
                "Chat with us on the app".to_string(),
            ],
            data: json!({
                "matched": true,
                "matched_question": entry.question,
                "confidence": if score > 2 { "high" } else { "medium" },
            }),
        }),
        None => Ok(ToolResult {
            summary: "I couldn't find a specific policy answer. Let me connect you with customer support."
                .to_string(),
            bullets: vec![
                "Call: 1800-XXX-XXXX (24x7)".to_string(),
                "Email: support@demobank.com".to_string(),
                "Help Center: demobank.com/help".to_string(),
                "Visit nearest branch for detailed assistance".to_string(),
            ],
            data: json!({ "matched": false }),
        }),
    }
}

pub struct PolicyTool;

#[async_trait::async_trait]
impl Tool for PolicyTool {
    fn name(&self) -> &'static str {
        POLICY_TOOL
    }

    fn description(&self) -> &'static str {
        "Answer bank policy and FAQ questions"
    }

    fn remedy(&self) -> &'static str {
        "Please contact customer support for assistance."
    }

    async fn execute(&self, params: &Value) -> Result<ToolResult> {
        let p: PolicyParams = parse_params(POLICY_TOOL, params)?;
        search_policy(&p.query)
    }
}
