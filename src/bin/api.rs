use banking_chat_orchestrator::{
    api::{start_server, ApiState},
    classifier::KeywordClassifier,
    config::AppConfig,
    memory::{HistoryStore, SessionSlotStore},
    orchestrator::TurnOrchestrator,
    slots::{GeminiSlotExtractor, RuleBasedExtractor, SlotExtractor, TieredExtractor},
    tools::create_default_registry,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("🏦 Banking Chat Orchestrator - API Server");
    info!("📍 Port: {}", config.port);

    let extractor: Arc<dyn SlotExtractor> = match &config.gemini_api_key {
        Some(key) => {
            let gemini = GeminiSlotExtractor::new(key.clone())?;
            info!("Slot extraction: rules, then Gemini for anything missing");
            Arc::new(TieredExtractor::new(
                Box::new(RuleBasedExtractor::new()),
                Box::new(gemini),
            ))
        }
        None => {
            warn!("GEMINI_API_KEY not set, slot extraction is rule-based only");
            Arc::new(RuleBasedExtractor::new())
        }
    };

    let mut orchestrator = TurnOrchestrator::new(
        Arc::new(KeywordClassifier::new()),
        extractor,
        create_default_registry(),
    );

    if config.session_slot_store {
        info!(ttl_secs = config.session_ttl_secs, "Session slot store enabled");
        let store = Arc::new(SessionSlotStore::new(config.session_ttl()));
        tokio::spawn(store.clone().run_purge(config.purge_interval()));
        orchestrator = orchestrator.with_session_store(store);
    }

    let history = HistoryStore::from_database_url(config.database_url.as_deref());

    info!("✅ Orchestrator initialized");
    info!("📡 Starting API server...");

    let state = ApiState::new(Arc::new(orchestrator), Arc::new(history));
    start_server(state, &config).await?;

    Ok(())
}
