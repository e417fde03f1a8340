//! Gemini-backed slot extraction

use super::{Extraction, SlotExtractor};
use crate::error::AssistantError;
use crate::gemini::GeminiClient;
use crate::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

const SYSTEM_PROMPT: &str = r#"You are a slot extractor for a banking chatbot.

CRITICAL RULES:
1. ONLY extract values from the user's current message, NOT from the assistant's questions.
2. Never return example values that the assistant mentioned (like "USD/EUR/GBP" in a question).
3. If the assistant asked "Which currency? (USD/EUR/GBP)" and the user said "i want forex card", return null for currency.
4. Only extract if the user EXPLICITLY provided the information in their current message.
5. Use EXACT slot names from the list given.

Return ONLY a JSON object with extracted values. Use null if NOT found in the current user message.
Examples:
- Slots: currency, amount
  User: "I need USD for my trip" -> {"currency": "USD", "amount": null}
- Slots: currency, amount
  Assistant asked: "Which currency? (USD/EUR/GBP)"
  User: "EUR" -> {"currency": "EUR", "amount": null}
- Slots: currency, amount
  Assistant asked: "Which currency?"
  User: "i want forex card" -> {"currency": null, "amount": null}
- Slots: loan_type
  User: "personal loan" -> {"loan_type": "personal"}"#;

pub struct GeminiSlotExtractor {
    client: GeminiClient,
}

impl GeminiSlotExtractor {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::new(api_key)?,
        })
    }

    pub fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }
}

pub(crate) fn build_prompt(text: &str, wanted: &[String], context: Option<&str>) -> String {
    let mut prompt = format!("Slots to extract: {}\n", wanted.join(", "));
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\nPrevious conversation (for reference only, do not extract from it):\n");
        prompt.push_str(context);
        prompt.push('\n');
    }
    prompt.push_str("\nCURRENT USER MESSAGE:\n");
    prompt.push_str(text);
    prompt
}

/// Parse the model reply into an extraction restricted to `wanted`.
/// Tolerates ```json fences and surrounding prose.
pub(crate) fn parse_reply(reply: &str, wanted: &[String]) -> Result<Extraction> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let json_str = match (start, end) {
        (Some(s), Some(e)) if e > s => &reply[s..=e],
        _ => {
            return Err(AssistantError::SlotExtractionError(format!(
                "No JSON object in extractor reply: {}",
                reply
            )))
        }
    };

    let parsed: Map<String, Value> = serde_json::from_str(json_str).map_err(|e| {
        AssistantError::SlotExtractionError(format!("Malformed extractor reply: {}", e))
    })?;

    Ok(wanted
        .iter()
        .map(|slot| {
            let value = parsed
                .get(slot)
                .filter(|v| !v.is_null())
                .filter(|v| !matches!(v, Value::String(s) if s.trim().is_empty()))
                .cloned();
            (slot.clone(), value)
        })
        .collect())
}

#[async_trait]
impl SlotExtractor for GeminiSlotExtractor {
    async fn extract(
        &self,
        text: &str,
        wanted: &[String],
        context: Option<&str>,
    ) -> Result<Extraction> {
        let prompt = build_prompt(text, wanted, context);
        let reply = self.client.generate(&prompt, SYSTEM_PROMPT).await?;
        debug!(reply = %reply, "Gemini slot extraction reply");
        parse_reply(&reply, wanted)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
