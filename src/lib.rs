//! Banking Chat Orchestrator
//!
//! Routes one user message at a time through a fixed pipeline:
//! ROUTE → PARSE SLOTS → DECIDE → CALL TOOL → SUMMARIZE
//!
//! - Intents come from a classifier, or from the prior-turn context when
//!   the message is a short follow-up answer
//! - Missing required slots are asked for one at a time
//! - Once all slots are known, a deterministic banking tool runs and its
//!   result becomes the reply
//! - Tool and extractor failures never abort a turn

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod gemini;
pub mod intents;
pub mod memory;
pub mod models;
pub mod orchestrator;
pub mod slots;
pub mod tools;

pub use error::{AssistantError, Result};

// Re-export common types
pub use classifier::{IntentClassifier, KeywordClassifier};
pub use models::*;
pub use orchestrator::TurnOrchestrator;
pub use slots::{RuleBasedExtractor, SlotExtractor, TieredExtractor};
pub use tools::{create_default_registry, Tool, ToolRegistry};
