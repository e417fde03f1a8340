use banking_chat_orchestrator::{
    classifier::KeywordClassifier,
    memory::{HistoryStore, SessionSlotStore, TurnRecord},
    models::TurnRequest,
    orchestrator::TurnOrchestrator,
    slots::RuleBasedExtractor,
    tools::create_default_registry,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const SCRIPT: &[&str] = &[
    "I want a personal loan",
    "500000",
    "5 years",
    "I want to apply for a credit card",
    "My income is 800000",
    "cashback",
    "What are your branch timings?",
    "Someone made an unauthorized transaction on my card, please block it",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("Banking Chat Orchestrator demo starting");

    let orchestrator = TurnOrchestrator::new(
        Arc::new(KeywordClassifier::new()),
        Arc::new(RuleBasedExtractor::new()),
        create_default_registry(),
    )
    .with_session_store(Arc::new(SessionSlotStore::new(Duration::from_secs(1800))));
    let history = HistoryStore::in_memory();

    let session_id = Uuid::new_v4().to_string();
    info!(session_id = %session_id, "Running scripted conversation");

    for text in SCRIPT {
        let mut request = TurnRequest::new(session_id.clone(), *text);
        request.context = history.context_digest(&session_id).await?;

        let response = orchestrator.handle_turn(request).await;

        println!("\nUser: {}", text);
        println!(
            "  [{} / {:?} via {:?}] -> {:?}",
            response.router.intent.as_str(),
            response.router.confidence,
            response.router.source,
            response.action
        );
        if !response.pending.is_empty() {
            println!("  pending: {}", response.pending.join(", "));
        }
        println!("Assistant: {}", response.reply);

        history
            .append(
                &session_id,
                TurnRecord::new(
                    None,
                    *text,
                    response.reply.clone(),
                    response.router.intent,
                    response.slots.clone(),
                ),
            )
            .await?;
    }

    println!("\n=== CONVERSATION COMPLETE ===");
    println!("Turns recorded: {}", history.turn_count(&session_id).await?);

    Ok(())
}
