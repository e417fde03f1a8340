//! Intent Classifier
//!
//! Classifies a user message into ranked banking-intent candidates.
//! The production deployment plugs an embedding-backed router in behind
//! `IntentClassifier`; `KeywordClassifier` is the local deterministic tier.

use crate::intents::{spec_for, INTENT_TABLE};
use crate::models::{Candidate, Confidence, Intent};
use crate::Result;
use async_trait::async_trait;

/// Return at most this many candidates
const MAX_K: usize = 3;

const HIGH_CONFIDENCE_DISTANCE: f64 = 0.20;
const MEDIUM_CONFIDENCE_DISTANCE: f64 = 0.35;

/// Contract for anything that can rank intents for a piece of text.
/// Implementations are shared across sessions and must tolerate concurrent reads.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Ranked candidates, closest first. An empty list is a valid answer.
    async fn classify(&self, text: &str) -> Result<Vec<Candidate>>;
}

/// Map a distance to a confidence band
pub fn confidence_for_distance(distance: f64) -> Confidence {
    if distance < HIGH_CONFIDENCE_DISTANCE {
        Confidence::High
    } else if distance < MEDIUM_CONFIDENCE_DISTANCE {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Similarity score reported alongside a distance, rounded to 3 places
pub fn score_for_distance(distance: f64) -> f64 {
    ((1.0 - distance) * 1000.0).round() / 1000.0
}

/// Static keyword lists, matched on word boundaries
const LOAN_KEYWORDS: &[&str] = &[
    "loan", "loans", "emi", "borrow", "mortgage", "personal loan", "home loan", "car loan",
    "education loan", "loan eligibility",
];

const CREDIT_CARD_KEYWORDS: &[&str] = &[
    "credit card", "credit cards", "card benefits", "credit limit", "rewards card",
    "cashback card", "new card", "income", "salary",
];

const SAVINGS_KEYWORDS: &[&str] = &[
    "fd", "fds", "fixed deposit", "recurring deposit", "savings", "savings account",
    "fd ladder", "invest", "investment",
];

const FOREX_KEYWORDS: &[&str] = &[
    "forex", "foreign exchange", "currency", "exchange rate", "usd", "eur", "gbp", "abroad",
    "trip", "travel insurance",
];

const POLICY_KEYWORDS: &[&str] = &[
    "policy", "faq", "branch", "timings", "password", "kyc", "documents", "privacy",
    "close my account", "service charges", "charges",
];

const FRAUD_KEYWORDS: &[&str] = &[
    "fraud", "fraudulent", "unauthorized", "stolen", "stole", "dispute", "block",
    "without permission", "lost my card", "scam",
];

fn keywords_for(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Loan => LOAN_KEYWORDS,
        Intent::CreditCard => CREDIT_CARD_KEYWORDS,
        Intent::SavingsFd => SAVINGS_KEYWORDS,
        Intent::ForexTravel => FOREX_KEYWORDS,
        Intent::PolicyFaq => POLICY_KEYWORDS,
        Intent::FraudDispute => FRAUD_KEYWORDS,
        Intent::Unknown => &[],
    }
}

/// Keyword classifier
#[derive(Debug, Default, Clone)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    fn rank(&self, text: &str) -> Vec<Candidate> {
        let normalized = normalize(text);

        let mut scored: Vec<(usize, Candidate)> = INTENT_TABLE
            .iter()
            .enumerate()
            .filter_map(|(order, spec)| {
                let hits = keywords_for(spec.intent)
                    .iter()
                    .filter(|kw| normalized.contains(&format!(" {} ", kw)))
                    .count();
                if hits == 0 {
                    return None;
                }
                let distance = 0.5 / (1.0 + hits as f64);
                Some((order, Candidate::new(spec.intent.as_str(), distance)))
            })
            .filter(|(_, c)| {
                spec_for(Intent::from_label(&c.label))
                    .map(|spec| c.distance <= spec.distance_threshold)
                    .unwrap_or(false)
            })
            .collect();

        scored.sort_by(|(oa, a), (ob, b)| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(oa.cmp(ob))
        });

        scored.into_iter().take(MAX_K).map(|(_, c)| c).collect()
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<Candidate>> {
        Ok(self.rank(text))
    }
}

/// Lowercase, punctuation to spaces, padded so phrases match on word boundaries
fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    format!(" {} ", cleaned.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top(text: &str) -> Option<Candidate> {
        KeywordClassifier::new().rank(text).into_iter().next()
    }

    #[test]
    fn test_banking_queries() {
        let cases = vec![
            ("I want to apply for a credit card", "credit_card"),
            ("I need a personal loan of 500000 for 60 months", "loan"),
            ("Tell me about fixed deposit rates", "savings_fd"),
            ("I need forex for my US trip", "forex_travel"),
            ("Someone used my card without permission", "fraud_dispute"),
            ("What are your branch timings?", "policy_faq"),
        ];

        for (text, expected) in cases {
            let candidate = top(text).unwrap_or_else(|| panic!("no candidate for {}", text));
            assert_eq!(candidate.label, expected, "text: {}", text);
        }
    }

    #[test]
    fn test_no_keywords_yields_no_candidates() {
        assert!(top("hello there").is_none());
        assert!(top("").is_none());
    }

    #[test]
    fn test_word_boundaries_respected() {
        // "fd" inside another word must not count
        assert!(top("pdfdocs").is_none());
    }

    #[test]
    fn test_more_hits_means_closer() {
        let one = top("loan").unwrap();
        let two = top("personal loan").unwrap();
        assert!(two.distance < one.distance);
        assert_eq!(confidence_for_distance(two.distance), Confidence::High);
        assert_eq!(confidence_for_distance(one.distance), Confidence::Medium);
    }

    #[test]
    fn test_candidates_capped_and_sorted() {
        let ranked = KeywordClassifier::new()
            .rank("loan credit card fixed deposit forex fraud policy");
        assert!(ranked.len() <= MAX_K);
        for pair in ranked.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_confidence_thresholds() {
        assert_eq!(confidence_for_distance(0.1), Confidence::High);
        assert_eq!(confidence_for_distance(0.2), Confidence::Medium);
        assert_eq!(confidence_for_distance(0.34), Confidence::Medium);
        assert_eq!(confidence_for_distance(0.35), Confidence::Low);
        assert_eq!(score_for_distance(0.1234), 0.877);
    }
}
