//! Conversation history
//!
//! Per-session turn log. The most recent turn is rendered as the context
//! digest handed to the orchestrator on the next message.

use crate::error::AssistantError;
use crate::intents::spec_for;
use crate::models::{Intent, SlotMap};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// In-memory sessions keep at most this many turns
const MAX_TURNS_PER_SESSION: usize = 50;

/// One completed user/assistant exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn_id: Uuid,
    pub user_id: Option<String>,
    pub user_text: String,
    pub reply: String,
    pub intent: Intent,
    pub slots: SlotMap,
    pub created_at: DateTime<Utc>,
}

impl TurnRecord {
    pub fn new(
        user_id: Option<String>,
        user_text: impl Into<String>,
        reply: impl Into<String>,
        intent: Intent,
        slots: SlotMap,
    ) -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            user_id,
            user_text: user_text.into(),
            reply: reply.into(),
            intent,
            slots,
            created_at: Utc::now(),
        }
    }

    /// Render as a context digest:
    ///
    /// ```text
    /// User: I want a credit card
    /// Assistant: What is your annual income?
    /// Intent: credit_card
    /// Slots: income=800000
    /// ```
    pub fn digest(&self) -> String {
        let mut lines = vec![
            format!("User: {}", self.user_text),
            format!("Assistant: {}", self.reply),
            format!("Intent: {}", self.intent),
        ];

        // Only the slots this turn's intent consumes
        let relevant = |name: &str| {
            spec_for(self.intent)
                .map(|spec| {
                    spec.required_slots.contains(&name) || spec.optional_slots.contains(&name)
                })
                .unwrap_or(false)
        };

        let mut pairs: Vec<String> = self
            .slots
            .iter()
            .filter(|(name, _)| relevant(name))
            .map(|(name, value)| match value {
                serde_json::Value::String(s) => format!("{}={}", name, s),
                other => format!("{}={}", name, other),
            })
            .collect();

        if !pairs.is_empty() {
            pairs.sort();
            lines.push(format!("Slots: {}", pairs.join(", ")));
        }

        lines.join("\n")
    }
}

enum HistoryBackend {
    InMemory {
        sessions: Arc<RwLock<HashMap<String, Vec<TurnRecord>>>>,
    },
    Postgres {
        pool: PgPool,
        schema_ready: Arc<OnceCell<()>>,
    },
}

pub struct HistoryStore {
    backend: HistoryBackend,
}

impl HistoryStore {
    pub fn in_memory() -> Self {
        Self {
            backend: HistoryBackend::InMemory {
                sessions: Arc::new(RwLock::new(HashMap::new())),
            },
        }
    }

    /// Postgres-backed history when a URL is given, otherwise in-memory.
    /// A URL that cannot be parsed falls back to in-memory with a warning.
    pub fn from_database_url(database_url: Option<&str>) -> Self {
        if let Some(url) = database_url {
            match sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect_lazy(url)
            {
                Ok(pool) => {
                    info!("Conversation history backend: postgres");
                    return Self {
                        backend: HistoryBackend::Postgres {
                            pool,
                            schema_ready: Arc::new(OnceCell::new()),
                        },
                    };
                }
                Err(error) => {
                    warn!(
                        "Failed to initialize postgres history backend, falling back to in-memory: {}",
                        error
                    );
                }
            }
        }

        info!("Conversation history backend: in-memory");
        Self::in_memory()
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            HistoryBackend::InMemory { .. } => "in-memory",
            HistoryBackend::Postgres { .. } => "postgres",
        }
    }

    async fn ensure_schema(&self, pool: &PgPool, schema_ready: &OnceCell<()>) -> Result<()> {
        schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS conversation_turns (
                      turn_id UUID PRIMARY KEY,
                      session_id TEXT NOT NULL,
                      user_id TEXT,
                      user_text TEXT NOT NULL,
                      reply TEXT NOT NULL,
                      intent TEXT NOT NULL,
                      slots TEXT NOT NULL,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(pool)
                .await?;

                sqlx::query(
                    r#"
                    CREATE INDEX IF NOT EXISTS idx_conversation_turns_session_time
                    ON conversation_turns (session_id, created_at);
                    "#,
                )
                .execute(pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                AssistantError::DatabaseError(format!(
                    "Failed to initialize conversation history schema: {}",
                    e
                ))
            })?;

        Ok(())
    }

    pub async fn append(&self, session_id: &str, record: TurnRecord) -> Result<()> {
        match &self.backend {
            HistoryBackend::InMemory { sessions } => {
                let mut locked = sessions.write().await;
                let turns = locked.entry(session_id.to_string()).or_default();
                turns.push(record);
                if turns.len() > MAX_TURNS_PER_SESSION {
                    let excess = turns.len() - MAX_TURNS_PER_SESSION;
                    turns.drain(..excess);
                }
                Ok(())
            }
            HistoryBackend::Postgres { pool, schema_ready } => {
                self.ensure_schema(pool, schema_ready).await?;

                let slots = serde_json::to_string(&record.slots)?;

                sqlx::query(
                    r#"
                    INSERT INTO conversation_turns
                      (turn_id, session_id, user_id, user_text, reply, intent, slots, created_at)
                    VALUES
                      ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(record.turn_id)
                .bind(session_id)
                .bind(&record.user_id)
                .bind(&record.user_text)
                .bind(&record.reply)
                .bind(record.intent.as_str())
                .bind(slots)
                .bind(record.created_at)
                .execute(pool)
                .await
                .map_err(|e| {
                    AssistantError::DatabaseError(format!(
                        "Failed to insert conversation turn: {}",
                        e
                    ))
                })?;

                Ok(())
            }
        }
    }

    pub async fn last_turn(&self, session_id: &str) -> Result<Option<TurnRecord>> {
        match &self.backend {
            HistoryBackend::InMemory { sessions } => {
                let locked = sessions.read().await;
                Ok(locked.get(session_id).and_then(|turns| turns.last().cloned()))
            }
            HistoryBackend::Postgres { pool, schema_ready } => {
                self.ensure_schema(pool, schema_ready).await?;

                let row = sqlx::query(
                    r#"
                    SELECT turn_id, user_id, user_text, reply, intent, slots, created_at
                    FROM conversation_turns
                    WHERE session_id = $1
                    ORDER BY created_at DESC
                    LIMIT 1
                    "#,
                )
                .bind(session_id)
                .fetch_optional(pool)
                .await
                .map_err(|e| {
                    AssistantError::DatabaseError(format!(
                        "Failed to load conversation history: {}",
                        e
                    ))
                })?;

                let Some(row) = row else {
                    return Ok(None);
                };

                let intent: String = row.try_get("intent").unwrap_or_default();
                let slots: String = row.try_get("slots").unwrap_or_default();

                Ok(Some(TurnRecord {
                    turn_id: row.try_get("turn_id").unwrap_or_else(|_| Uuid::new_v4()),
                    user_id: row.try_get::<Option<String>, _>("user_id").unwrap_or(None),
                    user_text: row.try_get("user_text").unwrap_or_default(),
                    reply: row.try_get("reply").unwrap_or_default(),
                    intent: Intent::from_label(&intent),
                    slots: serde_json::from_str(&slots).unwrap_or_default(),
                    created_at: row.try_get("created_at").unwrap_or_else(|_| Utc::now()),
                }))
            }
        }
    }

    /// Digest of the last turn, `None` for a fresh session
    pub async fn context_digest(&self, session_id: &str) -> Result<Option<String>> {
        Ok(self.last_turn(session_id).await?.map(|turn| turn.digest()))
    }

    /// Number of stored turns for a session
    pub async fn turn_count(&self, session_id: &str) -> Result<usize> {
        match &self.backend {
            HistoryBackend::InMemory { sessions } => {
                let locked = sessions.read().await;
                Ok(locked.get(session_id).map(Vec::len).unwrap_or(0))
            }
            HistoryBackend::Postgres { pool, schema_ready } => {
                self.ensure_schema(pool, schema_ready).await?;

                let count: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM conversation_turns WHERE session_id = $1",
                )
                .bind(session_id)
                .fetch_one(pool)
                .await
                .map_err(|e| {
                    AssistantError::DatabaseError(format!("Failed to count turns: {}", e))
                })?;

                Ok(count.max(0) as usize)
            }
        }
    }

    pub async fn clear(&self, session_id: &str) -> Result<bool> {
        match &self.backend {
            HistoryBackend::InMemory { sessions } => {
                let mut locked = sessions.write().await;
                Ok(locked.remove(session_id).is_some())
            }
            HistoryBackend::Postgres { pool, schema_ready } => {
                self.ensure_schema(pool, schema_ready).await?;

                let result = sqlx::query("DELETE FROM conversation_turns WHERE session_id = $1")
                    .bind(session_id)
                    .execute(pool)
                    .await
                    .map_err(|e| {
                        AssistantError::DatabaseError(format!(
                            "Failed to clear conversation history: {}",
                            e
                        ))
                    })?;

                Ok(result.rows_affected() > 0)
            }
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(text: &str, reply: &str, intent: Intent) -> TurnRecord {
        let mut slots = SlotMap::new();
        slots.insert("income".to_string(), json!(800000));
        slots.insert("card_type".to_string(), json!("travel"));
        TurnRecord::new(Some("u1".to_string()), text, reply, intent, slots)
    }

    #[test]
    fn test_digest_format() {
        let digest = record(
            "I want a credit card",
            "What is your annual income?",
            Intent::CreditCard,
        )
        .digest();

        assert_eq!(
            digest,
            "User: I want a credit card\n\
             Assistant: What is your annual income?\n\
             Intent: credit_card\n\
             Slots: card_type=travel, income=800000"
        );
    }

    #[test]
    fn test_digest_skips_slots_of_other_intents() {
        let mut turn = record("EUR", "done", Intent::ForexTravel);
        turn.slots.insert("currency".to_string(), json!("EUR"));
        assert!(turn.digest().ends_with("Slots: currency=EUR"));
    }

    #[test]
    fn test_digest_without_slots() {
        let turn = TurnRecord::new(None, "hi", "Could you rephrase?", Intent::Unknown, SlotMap::new());
        assert!(!turn.digest().contains("Slots:"));
    }

    #[tokio::test]
    async fn test_in_memory_last_turn_and_clear() {
        let store = HistoryStore::in_memory();
        assert!(store.context_digest("s1").await.unwrap().is_none());

        store
            .append("s1", record("first", "reply one", Intent::Loan))
            .await
            .unwrap();
        store
            .append("s1", record("second", "reply two", Intent::CreditCard))
            .await
            .unwrap();

        let digest = store.context_digest("s1").await.unwrap().unwrap();
        assert!(digest.starts_with("User: second"));
        assert_eq!(store.turn_count("s1").await.unwrap(), 2);

        assert!(store.clear("s1").await.unwrap());
        assert_eq!(store.turn_count("s1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_in_memory_history_is_bounded() {
        let store = HistoryStore::in_memory();
        for i in 0..(MAX_TURNS_PER_SESSION + 5) {
            store
                .append("s1", record(&format!("turn {}", i), "ok", Intent::PolicyFaq))
                .await
                .unwrap();
        }
        assert_eq!(store.turn_count("s1").await.unwrap(), MAX_TURNS_PER_SESSION);
    }

    #[test]
    fn test_missing_database_url_uses_memory() {
        assert_eq!(HistoryStore::from_database_url(None).backend_name(), "in-memory");
    }
}
