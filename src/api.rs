//! REST API server for the banking assistant
//!
//! Exposes the turn orchestrator over HTTP and owns conversation history:
//! it supplies the prior-turn digest when the client sends no context and
//! records each turn after replying.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::memory::{HistoryStore, TurnRecord};
use crate::models::{TurnRequest, TurnResponse};
use crate::orchestrator::TurnOrchestrator;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub text: String,
    pub context: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub session_id: String,
    pub helpful: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatData {
    pub session_id: String,
    #[serde(flatten)]
    pub turn: TurnResponse,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<TurnOrchestrator>,
    pub history: Arc<HistoryStore>,
}

impl ApiState {
    pub fn new(orchestrator: Arc<TurnOrchestrator>, history: Arc<HistoryStore>) -> Self {
        Self {
            orchestrator,
            history,
        }
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "history_backend": state.history.backend_name(),
        "session_store": state.orchestrator.session_store().is_some(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Message text is required".into())),
        );
    }

    let session_id = req
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let context = match req.context.filter(|c| !c.trim().is_empty()) {
        Some(context) => Some(context),
        None => match state.history.context_digest(&session_id).await {
            Ok(digest) => digest,
            Err(error) => {
                warn!(
                    session_id = %session_id,
                    "Conversation history load failed, continuing without context: {}",
                    error
                );
                None
            }
        },
    };

    info!(
        session_id = %session_id,
        has_context = context.is_some(),
        "chat_handler"
    );

    let mut request = TurnRequest::new(session_id.clone(), text.clone());
    request.user_id = req.user_id.clone();
    request.context = context;

    let turn = state.orchestrator.handle_turn(request).await;

    let record = TurnRecord::new(
        req.user_id,
        text,
        turn.reply.clone(),
        turn.router.intent,
        turn.slots.clone(),
    );
    if let Err(error) = state.history.append(&session_id, record).await {
        warn!(session_id = %session_id, "Failed to persist conversation turn: {}", error);
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(ChatData { session_id, turn })),
    )
}

/// =============================
/// Session Endpoints
/// =============================

async fn feedback_handler(
    State(state): State<ApiState>,
    Json(req): Json<FeedbackRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let mut cleared = false;
    if req.helpful {
        if let Some(store) = state.orchestrator.session_store() {
            cleared = store.clear(&req.session_id).await;
        }
    }

    info!(session_id = %req.session_id, helpful = req.helpful, cleared, "Feedback received");

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "sessionId": req.session_id,
            "slotsCleared": cleared,
        }))),
    )
}

async fn delete_session(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    let slots_cleared = match state.orchestrator.session_store() {
        Some(store) => store.clear(&session_id).await,
        None => false,
    };

    match state.history.clear(&session_id).await {
        Ok(history_cleared) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "sessionId": session_id,
                "slotsCleared": slots_cleared,
                "historyCleared": history_cleared,
            }))),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to clear session: {}", e))),
        ),
    }
}

/// =============================
/// Router
/// =============================

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_router(state: ApiState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/feedback", post(feedback_handler))
        .route("/api/sessions/:id", delete(delete_session))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    config: &AppConfig,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;

    info!("API Server listening on http://{}", config.bind_address());
    info!("Local: http://127.0.0.1:{}", config.port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use crate::memory::SessionSlotStore;
    use crate::slots::RuleBasedExtractor;
    use crate::tools::create_default_registry;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state() -> ApiState {
        let orchestrator = TurnOrchestrator::new(
            Arc::new(KeywordClassifier::new()),
            Arc::new(RuleBasedExtractor::new()),
            create_default_registry(),
        )
        .with_session_store(Arc::new(SessionSlotStore::new(Duration::from_secs(60))));

        ApiState::new(Arc::new(orchestrator), Arc::new(HistoryStore::in_memory()))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_router(test_state(), &[]);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["history_backend"], "in-memory");
    }

    #[tokio::test]
    async fn test_empty_text_is_bad_request() {
        let router = create_router(test_state(), &[]);
        let (status, body) = send(router, post_json("/api/chat", serde_json::json!({"text": "  "}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_chat_uses_stored_history_as_context() {
        let state = test_state();

        let (status, first) = send(
            create_router(state.clone(), &[]),
            post_json(
                "/api/chat",
                serde_json::json!({"sessionId": "s-api", "text": "I want a personal loan"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["data"]["sessionId"], "s-api");
        assert_eq!(first["data"]["router"]["intent"], "loan");
        assert_eq!(first["data"]["action"], "ask_slot");
        assert_eq!(first["data"]["pending"], serde_json::json!(["amount", "tenure"]));

        // no context in the request: the stored digest carries the loan intent
        let (_, second) = send(
            create_router(state.clone(), &[]),
            post_json("/api/chat", serde_json::json!({"sessionId": "s-api", "text": "500000"})),
        )
        .await;
        assert_eq!(second["data"]["router"]["intent"], "loan");
        assert_eq!(second["data"]["router"]["source"], "context");
        assert_eq!(second["data"]["pending"], serde_json::json!(["tenure"]));

        assert_eq!(state.history.turn_count("s-api").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_helpful_feedback_clears_slots() {
        let state = test_state();
        let store = state.orchestrator.session_store().unwrap().clone();
        store
            .save("s-fb", crate::models::Intent::Loan, Default::default())
            .await;

        let (status, body) = send(
            create_router(state, &[]),
            post_json(
                "/api/feedback",
                serde_json::json!({"sessionId": "s-fb", "helpful": true}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["slotsCleared"], true);
        assert!(store.get("s-fb").await.is_none());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let state = test_state();
        let (_, _) = send(
            create_router(state.clone(), &[]),
            post_json(
                "/api/chat",
                serde_json::json!({"sessionId": "s-del", "text": "What are your branch timings?"}),
            ),
        )
        .await;

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/sessions/s-del")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(create_router(state.clone(), &[]), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["historyCleared"], true);
        assert_eq!(state.history.turn_count("s-del").await.unwrap(), 0);
    }
}
