//! Server configuration from environment variables.

use crate::error::AssistantError;
use crate::Result;
use serde::Deserialize;
use std::time::Duration;

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Listen address (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Enables the Gemini slot-extraction tier when set.
    pub gemini_api_key: Option<String>,
    /// PostgreSQL URL for conversation history; in-memory when absent.
    pub database_url: Option<String>,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Keep collected slots in the session store. Off means context recovery only.
    #[serde(default = "default_true")]
    pub session_slot_store: bool,
    /// Allowed CORS origins; empty is permissive.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

const MAX_PURGE_INTERVAL_SECS: u64 = 60;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_session_ttl() -> u64 {
    1800
}

fn default_true() -> bool {
    true
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AssistantError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

impl AppConfig {
    /// Load config from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = non_empty(lookup("HOST")) {
            config.host = host;
        }

        if let Some(port) = non_empty(lookup("PORT")).or_else(|| non_empty(lookup("API_PORT"))) {
            config.port = port
                .parse()
                .map_err(|_| AssistantError::ConfigError(format!("invalid port '{}'", port)))?;
        }

        config.gemini_api_key = non_empty(lookup("GEMINI_API_KEY"));
        config.database_url =
            non_empty(lookup("DATABASE_URL")).or_else(|| non_empty(lookup("POSTGRES_URL")));

        if let Some(ttl) = non_empty(lookup("SESSION_TTL_SECS")) {
            config.session_ttl_secs = ttl.parse().map_err(|_| {
                AssistantError::ConfigError(format!("invalid SESSION_TTL_SECS '{}'", ttl))
            })?;
        }

        if let Some(flag) = non_empty(lookup("SESSION_SLOT_STORE")) {
            config.session_slot_store = parse_bool("SESSION_SLOT_STORE", &flag)?;
        }

        if let Some(origins) = non_empty(lookup("CORS_ORIGINS")) {
            config.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        Ok(config)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// How often expired session slots are purged: the TTL, capped at a minute
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs.clamp(1, MAX_PURGE_INTERVAL_SECS))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            gemini_api_key: None,
            database_url: None,
            session_ttl_secs: default_session_ttl(),
            session_slot_store: true,
            cors_origins: vec![],
        }
    }
}
