// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use chrono::Duration;
use std::env;
use std::str::FromStr;

/// Which document store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// In-process store, for local development
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND")),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// GCP project ID
    pub gcp_project_id: String,
    pub store_backend: StoreBackend,
    /// Shared secret expected in the `x-ingest-key` header
    pub ingest_key: String,
    /// How far back a tag read may reuse a session (hours)
    pub read_lookback_hours: i64,
    /// How far back an explicit session start may reuse a session (hours)
    pub start_lookback_hours: i64,
    /// Maximum sessions fetched per location lookup
    pub session_candidate_limit: u32,
    /// Minimum delay before rescanning riders for a tag that missed (seconds)
    pub identity_scan_cooldown_secs: u64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            gcp_project_id: "test-project".to_string(),
            store_backend: StoreBackend::Memory,
            ingest_key: "test_ingest_key".to_string(),
            read_lookback_hours: 24,
            start_lookback_hours: 12,
            session_candidate_limit: 10,
            identity_scan_cooldown_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let ingest_key = env::var("INGEST_KEY")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("INGEST_KEY"))?;
        if ingest_key.is_empty() {
            return Err(ConfigError::Missing("INGEST_KEY"));
        }

        Ok(Self {
            port: parse_or("PORT", 8080),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            store_backend: match env::var("STORE_BACKEND") {
                Ok(v) => v.parse()?,
                Err(_) => StoreBackend::Firestore,
            },
            ingest_key,
            read_lookback_hours: parse_or("READ_LOOKBACK_HOURS", 24),
            start_lookback_hours: parse_or("START_LOOKBACK_HOURS", 12),
            session_candidate_limit: parse_or("SESSION_CANDIDATE_LIMIT", 10),
            identity_scan_cooldown_secs: parse_or("IDENTITY_SCAN_COOLDOWN_SECS", 30),
        })
    }

    pub fn read_lookback(&self) -> Duration {
        Duration::hours(self.read_lookback_hours)
    }

    pub fn start_lookback(&self) -> Duration {
        Duration::hours(self.start_lookback_hours)
    }

    pub fn identity_scan_cooldown(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.identity_scan_cooldown_secs)
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
