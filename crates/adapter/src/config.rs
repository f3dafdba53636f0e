//! Environment configuration.

use std::env;
use std::time::Duration;

use crate::core::SessionConfig;
use crate::types::{GameId, DEFAULT_HOST, DEFAULT_PORT};

/// Everything needed to bring a session up.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
    pub wire_log_path: Option<String>,
    /// Games to observe as soon as the session is ready.
    pub observe: Vec<GameId>,
    /// Ask the relay bot for its game list and observe every game on it.
    pub follow_relay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            session: SessionConfig::default(),
            wire_log_path: None,
            observe: Vec::new(),
            follow_relay: false,
        }
    }
}

impl ServerConfig {
    /// Create from `FICS_*` environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = var("FICS_HOST")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);
        let port = var("FICS_PORT")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);

        let mut session = defaults.session;
        if let Some(login) = var("FICS_LOGIN").filter(|s| !s.trim().is_empty()) {
            session.login = login.trim().to_string();
        }
        if let Some(password) = var("FICS_PASSWORD") {
            session.password = password;
        }
        if let Some(ms) = var("FICS_REPLY_TIMEOUT_MS").and_then(|s| s.trim().parse().ok()) {
            session.reply_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = var("FICS_THROTTLE_MS").and_then(|s| s.trim().parse().ok()) {
            session.throttle = Duration::from_millis(ms);
        }
        session.publish_outcomes = var("FICS_PUBLISH_OUTCOMES").is_some_and(|v| is_truthy(&v));

        let wire_log_path = var("FICS_WIRE_LOG_PATH")
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) });

        let observe = var("FICS_OBSERVE")
            .map(|s| s.split(',').filter_map(|id| id.parse().ok()).collect())
            .unwrap_or_default();

        Self {
            host,
            port,
            session,
            wire_log_path,
            observe,
            follow_relay: var("FICS_FOLLOW_RELAY").is_some_and(|v| is_truthy(&v)),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if the session is disabled via environment
    pub fn is_disabled() -> bool {
        env::var("FICS_DISABLED").is_ok_and(|v| is_truthy(&v))
    }
}

fn is_truthy(v: &str) -> bool {
    let v = v.trim();
    v == "1" || v.eq_ignore_ascii_case("true")
}
