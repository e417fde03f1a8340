//! Intent resolution
//!
//! Short follow-up answers reuse the intent implied by the prior-turn
//! context; everything else goes to the classifier.

use crate::classifier::{confidence_for_distance, score_for_distance, IntentClassifier};
use crate::intents::{spec_for, IntentSpec, INTENT_TABLE};
use crate::models::{Confidence, Intent, RouteSource, RouterResult, ScoredCandidate};
use tracing::{debug, warn};

const CONTEXT_REUSE_SCORE: f64 = 0.95;
const SHORT_ANSWER_MAX_TOKENS: usize = 3;

/// "5", "5 years", "personal loan please": too little to classify on its own
pub fn is_short_answer(text: &str) -> bool {
    let trimmed = text.trim();
    let all_digits = !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit());
    all_digits || trimmed.split_whitespace().count() <= SHORT_ANSWER_MAX_TOKENS
}

/// Intent named by the first `Intent: <label>` line of a context digest.
/// Unrecognised labels read as `Unknown`.
fn declared_intent(context: &str) -> Option<Intent> {
    context
        .lines()
        .find_map(|line| line.trim().strip_prefix("Intent:"))
        .map(|label| Intent::from_label(label.trim()))
}

/// First table entry, in priority order, with a marker present in the context
fn marked_intent(context: &str) -> Option<&'static IntentSpec> {
    let lowered = context.to_lowercase();
    INTENT_TABLE.iter().find(|spec| {
        spec.context_markers
            .iter()
            .any(|marker| lowered.contains(marker))
    })
}

/// Reuse the prior turn's intent for a short answer. Never consults the classifier.
/// A digest that declares no known intent (e.g. after a clarification) is not reused.
pub fn reuse_from_context(context: Option<&str>, text: &str) -> Option<RouterResult> {
    let context = context.filter(|c| !c.trim().is_empty())?;
    if !is_short_answer(text) {
        return None;
    }

    let spec = match declared_intent(context) {
        Some(intent) => spec_for(intent)?,
        None => marked_intent(context)?,
    };

    Some(RouterResult {
        intent: spec.intent,
        confidence: Confidence::High,
        score: CONTEXT_REUSE_SCORE,
        distance: None,
        metadata: Some(spec.metadata()),
        alternatives: Vec::new(),
        source: RouteSource::Context,
    })
}

/// Classify afresh and take the top candidate.
/// A classifier error or an empty list both resolve to `unknown`.
pub async fn classify(classifier: &dyn IntentClassifier, text: &str) -> RouterResult {
    let candidates = match classifier.classify(text).await {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(error = %e, "Intent classification failed");
            return RouterResult::unknown();
        }
    };

    let Some(top) = candidates.first() else {
        debug!("Classifier returned no candidates");
        return RouterResult::unknown();
    };

    let intent = Intent::from_label(&top.label);
    let Some(spec) = spec_for(intent) else {
        debug!(label = %top.label, "Top candidate is not a known intent");
        return RouterResult::unknown();
    };

    let alternatives = candidates
        .iter()
        .skip(1)
        .filter_map(|c| {
            let intent = Intent::from_label(&c.label);
            spec_for(intent).map(|_| ScoredCandidate {
                intent,
                score: score_for_distance(c.distance),
                distance: c.distance,
            })
        })
        .collect();

    RouterResult {
        intent: spec.intent,
        confidence: confidence_for_distance(top.distance),
        score: score_for_distance(top.distance),
        distance: Some(top.distance),
        metadata: Some(spec.metadata()),
        alternatives,
        source: RouteSource::Classifier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistantError;
    use crate::models::Candidate;
    use crate::Result;
    use async_trait::async_trait;

    struct FixedClassifier(Vec<Candidate>);

    #[async_trait]
    impl IntentClassifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<Vec<Candidate>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenClassifier;

    #[async_trait]
    impl IntentClassifier for BrokenClassifier {
        async fn classify(&self, _text: &str) -> Result<Vec<Candidate>> {
            Err(AssistantError::ClassifierError("index offline".into()))
        }
    }

    #[test]
    fn test_short_answer_detection() {
        assert!(is_short_answer("5"));
        assert!(is_short_answer("5 years"));
        assert!(is_short_answer("personal loan please"));
        assert!(is_short_answer("123456789"));
        assert!(!is_short_answer("My income is 800000"));
    }

    #[test]
    fn test_reuse_requires_context_and_short_text() {
        assert!(reuse_from_context(None, "5").is_none());
        assert!(reuse_from_context(Some("   "), "5").is_none());
        assert!(reuse_from_context(Some("Intent: loan"), "I would like it for five years").is_none());
    }

    #[test]
    fn test_reuse_from_marker() {
        let result = reuse_from_context(Some("Assistant: For how long? Your loan ..."), "5").unwrap();
        assert_eq!(result.intent, Intent::Loan);
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.score, 0.95);
        assert_eq!(result.source, RouteSource::Context);
        assert_eq!(
            result.metadata.unwrap().required_slots,
            vec!["loan_type", "amount", "tenure"]
        );
    }

    #[test]
    fn test_marker_priority_order() {
        // both "credit" and "forex" present; credit_card is earlier in the table
        let result = reuse_from_context(Some("forex or credit?"), "yes").unwrap();
        assert_eq!(result.intent, Intent::CreditCard);
    }

    #[test]
    fn test_declared_intent_beats_markers() {
        let context = "User: need forex after my home loan\nAssistant: Which currency do you need?\nIntent: forex_travel";
        let result = reuse_from_context(Some(context), "EUR").unwrap();
        assert_eq!(result.intent, Intent::ForexTravel);
    }

    #[test]
    fn test_declared_unknown_is_not_reused() {
        let context = format!(
            "User: blorp\nAssistant: {}\nIntent: unknown",
            crate::intents::CLARIFICATION_REPLY
        );
        assert!(reuse_from_context(Some(&context), "credit card").is_none());
        assert!(reuse_from_context(Some("User: what about fraud\nIntent: mortgage"), "ok").is_none());
    }

    #[test]
    fn test_no_marker_no_reuse() {
        assert!(reuse_from_context(Some("User: hello\nAssistant: hi"), "5").is_none());
    }

    #[tokio::test]
    async fn test_classify_top_candidate() {
        let classifier = FixedClassifier(vec![
            Candidate::new("forex_travel", 0.1),
            Candidate::new("savings_fd", 0.3),
        ]);
        let result = classify(&classifier, "USD for my trip").await;

        assert_eq!(result.intent, Intent::ForexTravel);
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.score, 0.9);
        assert_eq!(result.source, RouteSource::Classifier);
        assert_eq!(result.alternatives.len(), 1);
        assert_eq!(result.alternatives[0].intent, Intent::SavingsFd);
    }

    #[tokio::test]
    async fn test_confidence_bands() {
        let medium = classify(&FixedClassifier(vec![Candidate::new("loan", 0.25)]), "x").await;
        assert_eq!(medium.confidence, Confidence::Medium);

        let low = classify(&FixedClassifier(vec![Candidate::new("loan", 0.35)]), "x").await;
        assert_eq!(low.confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn test_empty_or_failing_classifier_is_unknown() {
        let empty = classify(&FixedClassifier(vec![]), "hello").await;
        assert_eq!(empty.intent, Intent::Unknown);
        assert_eq!(empty.confidence, Confidence::None);
        assert_eq!(empty.score, 0.0);

        let broken = classify(&BrokenClassifier, "hello").await;
        assert_eq!(broken.intent, Intent::Unknown);
    }
}
