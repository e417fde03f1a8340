//! Session-keyed slot store
//!
//! Holds the slots collected so far for each session so that follow-up turns
//! do not depend on re-mining them from the context digest.

use crate::models::{Intent, SlotMap};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub intent: Intent,
    pub slots: SlotMap,
    pub updated_at: DateTime<Utc>,
}

pub struct SessionSlotStore {
    entries: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionSlotStore {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(1)),
        }
    }

    fn is_live(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.updated_at < self.ttl
    }

    /// Live entry for a session. Expired entries read as absent.
    pub async fn get(&self, session_id: &str) -> Option<SessionEntry> {
        let now = Utc::now();
        let entries = self.entries.read().await;
        entries
            .get(session_id)
            .filter(|entry| self.is_live(entry, now))
            .cloned()
    }

    /// Stored slots for a session, empty when none are live
    pub async fn slots(&self, session_id: &str) -> SlotMap {
        self.get(session_id)
            .await
            .map(|entry| entry.slots)
            .unwrap_or_default()
    }

    pub async fn save(&self, session_id: &str, intent: Intent, slots: SlotMap) {
        let mut entries = self.entries.write().await;
        entries.insert(
            session_id.to_string(),
            SessionEntry {
                intent,
                slots,
                updated_at: Utc::now(),
            },
        );
    }

    /// Forget a session. Returns whether anything was stored.
    pub async fn clear(&self, session_id: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(session_id).is_some()
    }

    /// Drop expired entries, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now - entry.updated_at < self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "Purged expired session slots");
        }
        removed
    }

    /// Purge expired entries every `every` until the task is cancelled.
    /// Intended to be spawned as a background tokio task.
    pub async fn run_purge(self: Arc<Self>, every: std::time::Duration) {
        let mut ticker = tokio::time::interval(every);
        // first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.purge_expired().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
