use std::time::Duration;

use anyhow::{Context, Result};

use crate::store::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent selects the in-memory store.
    pub database_url: Option<String>,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub store_max_attempts: u32,
    pub store_base_delay_ms: u64,
    /// Present only when every archive variable is set.
    pub archive: Option<ArchiveConfig>,
    pub frontend_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            store_max_attempts: parse_env("STORE_MAX_ATTEMPTS", 5)?,
            store_base_delay_ms: parse_env("STORE_BASE_DELAY_MS", 200)?,
            archive: archive_from_env(),
            frontend_url: optional_env("FRONTEND_URL"),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.store_max_attempts.max(1),
            base_delay: Duration::from_millis(self.store_base_delay_ms),
            ..RetryPolicy::default()
        }
    }
}

fn archive_from_env() -> Option<ArchiveConfig> {
    Some(ArchiveConfig {
        bucket: optional_env("EXPORTS_BUCKET")?,
        endpoint: optional_env("S3_ENDPOINT")?,
        access_key_id: optional_env("AWS_ACCESS_KEY_ID")?,
        secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY")?,
        region: optional_env("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
    })
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
