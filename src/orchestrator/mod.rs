//! Turn orchestrator
//!
//! ROUTE → PARSE SLOTS → DECIDE → (CALL TOOL → SUMMARIZE)
//!
//! One call to [`TurnOrchestrator::handle_turn`] processes one user message
//! and always produces a well-formed [`TurnResponse`]. Collaborator failures
//! (classifier, extractor, tool) are absorbed along the way.

pub mod params;
pub mod routing;

use crate::classifier::IntentClassifier;
use crate::intents::{question_for, spec_for, CLARIFICATION_REPLY, SUPPORT_REPLY};
use crate::memory::SessionSlotStore;
use crate::models::{
    ConversationState, Intent, Proposal, RouteSource, RouterSummary, SlotMap, TurnAction,
    TurnRequest, TurnResponse,
};
use crate::slots::{recover_slots, SlotExtractor};
use crate::tools::ToolRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pipeline position within a single turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Route,
    ParseSlots,
    Decide,
    CallTool,
    Summarize,
    Done(TurnAction),
}

pub struct TurnOrchestrator {
    classifier: Arc<dyn IntentClassifier>,
    extractor: Arc<dyn SlotExtractor>,
    tools: ToolRegistry,
    sessions: Option<Arc<SessionSlotStore>>,
}

impl TurnOrchestrator {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        extractor: Arc<dyn SlotExtractor>,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            classifier,
            extractor,
            tools,
            sessions: None,
        }
    }

    /// Keep collected slots in an explicit session store instead of relying
    /// only on what can be re-mined from the context digest
    pub fn with_session_store(mut self, store: Arc<SessionSlotStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    pub fn session_store(&self) -> Option<&Arc<SessionSlotStore>> {
        self.sessions.as_ref()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Slots known before this turn. A live session-store entry is
    /// authoritative; without one they are re-mined from the context digest.
    async fn initial_slots(&self, request: &TurnRequest) -> SlotMap {
        if let Some(store) = &self.sessions {
            if let Some(entry) = store.get(&request.session_id).await {
                return entry.slots;
            }
        }

        request
            .context
            .as_deref()
            .map(recover_slots)
            .unwrap_or_default()
    }

    /// Process one user message
    pub async fn handle_turn(&self, request: TurnRequest) -> TurnResponse {
        let slots = self.initial_slots(&request).await;
        let mut state = ConversationState::new(request, slots);

        info!(
            session_id = %state.session_id,
            known_slots = state.slots.len(),
            "Turn started"
        );

        let mut stage = Stage::Route;
        let action = loop {
            debug!(session_id = %state.session_id, ?stage, "Stage");
            stage = match stage {
                Stage::Route => self.route(&mut state).await,
                Stage::ParseSlots => self.parse_slots(&mut state).await,
                Stage::Decide => self.decide(&mut state),
                Stage::CallTool => self.call_tool(&mut state).await,
                Stage::Summarize => self.summarize(&mut state),
                Stage::Done(action) => break action,
            };
        };

        if let Some(store) = &self.sessions {
            let intent = state.intent();
            if intent != Intent::Unknown {
                store
                    .save(&state.session_id, intent, state.slots.clone())
                    .await;
            }
        }

        info!(
            session_id = %state.session_id,
            intent = %state.intent(),
            ?action,
            pending = ?state.pending_slots,
            "Turn complete"
        );

        respond(state, action)
    }

    async fn route(&self, state: &mut ConversationState) -> Stage {
        let router = match routing::reuse_from_context(state.context.as_deref(), &state.text) {
            Some(reused) => {
                debug!(intent = %reused.intent, "Reusing intent from context");
                reused
            }
            None => routing::classify(self.classifier.as_ref(), &state.text).await,
        };

        info!(
            session_id = %state.session_id,
            intent = %router.intent,
            confidence = %router.confidence,
            score = router.score,
            source = ?router.source,
            "Intent resolved"
        );

        let next = if router.intent == Intent::Unknown {
            state.pending_slots.clear();
            state.reply = CLARIFICATION_REPLY.to_string();
            Stage::Done(TurnAction::Clarify)
        } else {
            state.pending_slots = router
                .metadata
                .as_ref()
                .map(|m| m.required_slots.clone())
                .unwrap_or_default();
            Stage::ParseSlots
        };

        state.router = Some(router);
        next
    }

    async fn parse_slots(&self, state: &mut ConversationState) -> Stage {
        state.prune_pending();
        if state.pending_slots.is_empty() {
            return Stage::Decide;
        }

        let mut wanted = state.pending_slots.clone();
        if let Some(spec) = spec_for(state.intent()) {
            wanted.extend(
                spec.optional_slots
                    .iter()
                    .filter(|slot| !state.slots.contains_key(**slot))
                    .map(|slot| slot.to_string()),
            );
        }

        let extraction = match self
            .extractor
            .extract(&state.text, &wanted, state.context.as_deref())
            .await
        {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!(
                    session_id = %state.session_id,
                    extractor = self.extractor.name(),
                    error = %e,
                    "Slot extraction failed, continuing with known slots"
                );
                return Stage::Decide;
            }
        };

        for (slot, value) in extraction {
            let Some(value) = value else { continue };
            if value.is_null() || !wanted.contains(&slot) || state.slots.contains_key(&slot) {
                continue;
            }
            state.slots.insert(slot, value);
        }
        state.prune_pending();

        debug!(
            session_id = %state.session_id,
            pending = ?state.pending_slots,
            "Slots parsed"
        );
        Stage::Decide
    }

    fn decide(&self, state: &mut ConversationState) -> Stage {
        state.prune_pending();

        match state.pending_slots.first() {
            Some(next_slot) => {
                state.reply = question_for(next_slot);
                Stage::Done(TurnAction::AskSlot)
            }
            None => Stage::CallTool,
        }
    }

    async fn call_tool(&self, state: &mut ConversationState) -> Stage {
        let handler = state
            .router
            .as_ref()
            .and_then(|r| r.handler())
            .map(str::to_string);

        let Some(handler) = handler.filter(|h| self.tools.contains(h)) else {
            warn!(
                session_id = %state.session_id,
                intent = %state.intent(),
                "No registered handler for intent"
            );
            state.reply = SUPPORT_REPLY.to_string();
            return Stage::Done(TurnAction::Tool);
        };

        let params = params::tool_params(&handler, &state.slots, &state.text);
        debug!(session_id = %state.session_id, handler = %handler, %params, "Calling tool");

        match self.tools.invoke(&handler, &params).await {
            Ok(result) => {
                if result.is_error() {
                    warn!(handler = %handler, "Tool returned an error result");
                }
                state.tool_result = Some(result);
                Stage::Summarize
            }
            Err(e) => {
                warn!(handler = %handler, error = %e, "Tool dispatch failed");
                state.reply = SUPPORT_REPLY.to_string();
                Stage::Done(TurnAction::Tool)
            }
        }
    }

    fn summarize(&self, state: &mut ConversationState) -> Stage {
        if let Some(result) = &state.tool_result {
            state.reply = result.summary.clone();
            state.proposal = Some(Proposal::from(result));
        }
        Stage::Done(TurnAction::Tool)
    }
}

fn respond(state: ConversationState, action: TurnAction) -> TurnResponse {
    let router = match &state.router {
        Some(r) => RouterSummary {
            intent: r.intent,
            confidence: r.confidence,
            score: Some(r.score),
            source: r.source,
        },
        None => RouterSummary {
            intent: Intent::Unknown,
            confidence: crate::models::Confidence::None,
            score: None,
            source: RouteSource::Classifier,
        },
    };

    TurnResponse {
        reply: state.reply,
        pending: state.pending_slots,
        router,
        proposal: state.proposal,
        action,
        slots: state.slots,
    }
}
