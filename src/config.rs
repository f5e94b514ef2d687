// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Resolved once at startup and handed to the services that need it;
//! nothing downstream reads the environment directly.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on model-call retries, whatever the environment asks for.
pub const MAX_GENERATION_RETRIES: u32 = 3;

/// Which persistence backend to wire into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// Process-local store for development; data is lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Persistence backend
    pub store_backend: StoreBackend,
    /// Expected `aud` claim on bearer tokens (None disables the check)
    pub jwt_audience: Option<String>,

    /// Model service base URL
    pub openai_api_url: String,
    /// Model identifier sent with every generation request
    pub openai_model: String,
    /// Per-call timeout for the model service
    pub openai_timeout: Duration,
    /// Retries for transient model failures (bounded by `MAX_GENERATION_RETRIES`)
    pub openai_max_retries: u32,

    /// Largest accepted `activityCount`
    pub max_activity_count: u32,
    /// Plans a free-tier user may create per quota window
    pub free_plans_per_window: u32,
    /// Length of the rolling quota window in days
    pub quota_window_days: i64,

    // --- Secrets ---
    /// HS256 key used to verify bearer credentials (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Model service API key
    pub openai_api_key: String,
}

impl Config {
    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            jwt_audience: Some("authenticated".to_string()),
            openai_api_url: "http://127.0.0.1:9".to_string(),
            openai_model: "gpt-4o".to_string(),
            openai_timeout: Duration::from_secs(5),
            openai_max_retries: 0,
            max_activity_count: 50,
            free_plans_per_window: 1,
            quota_window_days: 30,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            openai_api_key: "test_openai_key".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_audience = match env::var("JWT_AUDIENCE") {
            Ok(aud) if aud.trim().is_empty() => None,
            Ok(aud) => Some(aud.trim().to_string()),
            Err(_) => Some("authenticated".to_string()),
        };

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StoreBackend::Firestore,
        };

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_or("PORT", 8080)?,
            store_backend,
            jwt_audience,

            openai_api_url: env::var("OPENAI_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            openai_timeout: Duration::from_secs(parse_or("OPENAI_TIMEOUT_SECS", 120)?),
            openai_max_retries: parse_or::<u32>("OPENAI_MAX_RETRIES", 0)?
                .min(MAX_GENERATION_RETRIES),

            max_activity_count: positive("MAX_ACTIVITY_COUNT", parse_or("MAX_ACTIVITY_COUNT", 50)?)?,
            free_plans_per_window: positive(
                "FREE_PLANS_PER_WINDOW",
                parse_or("FREE_PLANS_PER_WINDOW", 1)?,
            )?,
            quota_window_days: window_days(parse_or("QUOTA_WINDOW_DAYS", 30)?)?,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            openai_api_key: env::var("OPENAI_API_KEY")
                .map(|v| v.trim().to_string())
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

fn positive(name: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(name, value.to_string()));
    }
    Ok(value)
}

/// Longest accepted quota window.
pub const MAX_QUOTA_WINDOW_DAYS: i64 = 366;

fn window_days(value: i64) -> Result<i64, ConfigError> {
    if !(1..=MAX_QUOTA_WINDOW_DAYS).contains(&value) {
        return Err(ConfigError::Invalid("QUOTA_WINDOW_DAYS", value.to_string()));
    }
    Ok(value)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
