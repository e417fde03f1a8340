//! Slot extraction
//!
//! Turns free text into values for the slots an intent still needs.
//! Extractors are external collaborators from the orchestrator's point of
//! view: any error they return is treated as "nothing extracted".

pub mod context;
pub mod llm;
pub mod normalize;
pub mod rules;

pub use context::recover_slots;
pub use llm::GeminiSlotExtractor;
pub use rules::RuleBasedExtractor;

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Extractor output: wanted field name → value, `None` when not found
pub type Extraction = HashMap<String, Option<Value>>;

/// Contract for slot-value extraction
#[async_trait]
pub trait SlotExtractor: Send + Sync {
    /// Extract values for `wanted` from `text`. `context` is a rendering of
    /// the previous turn; values must only come from `text` itself.
    async fn extract(
        &self,
        text: &str,
        wanted: &[String],
        context: Option<&str>,
    ) -> Result<Extraction>;

    /// Name of this extractor (for logging)
    fn name(&self) -> &str;
}

/// Composite extractor: local first, then a second tier for whatever is still missing
pub struct TieredExtractor {
    local: Box<dyn SlotExtractor>,
    fallback: Box<dyn SlotExtractor>,
}

impl TieredExtractor {
    pub fn new(local: Box<dyn SlotExtractor>, fallback: Box<dyn SlotExtractor>) -> Self {
        Self { local, fallback }
    }
}

#[async_trait]
impl SlotExtractor for TieredExtractor {
    async fn extract(
        &self,
        text: &str,
        wanted: &[String],
        context: Option<&str>,
    ) -> Result<Extraction> {
        let mut extraction = match self.local.extract(text, wanted, context).await {
            Ok(found) => found,
            Err(e) => {
                warn!(tier = self.local.name(), error = %e, "Local slot extraction failed");
                Extraction::new()
            }
        };

        let missing: Vec<String> = wanted
            .iter()
            .filter(|w| extraction.get(*w).map(Option::is_none).unwrap_or(true))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(extraction);
        }

        debug!(tier = self.fallback.name(), ?missing, "Falling back for missing slots");

        match self.fallback.extract(text, &missing, context).await {
            Ok(found) => {
                for (slot, value) in found {
                    if value.is_some() && missing.contains(&slot) {
                        extraction.insert(slot, value);
                    }
                }
            }
            Err(e) => {
                warn!(tier = self.fallback.name(), error = %e, "Fallback slot extraction failed");
            }
        }

        Ok(extraction)
    }

    fn name(&self) -> &str {
        "tiered"
    }
}
