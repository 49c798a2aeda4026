use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Start-up fails if a required variable is missing or a value is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub ai_gateway_url: String,
    pub ai_gateway_timeout_secs: u64,
    pub interview_duration_minutes: i64,
    pub expiration_check_interval_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            ai_gateway_url: require_env("AI_GATEWAY_URL")?,
            ai_gateway_timeout_secs: env_or("AI_GATEWAY_TIMEOUT_SECS", 30)?,
            interview_duration_minutes: env_or("INTERVIEW_DURATION_MINUTES", 45)?,
            expiration_check_interval_secs: env_or("EXPIRATION_CHECK_INTERVAL_SECS", 60)?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn ai_gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_gateway_timeout_secs)
    }

    /// How long an interview may stay open before the sweeper finishes it.
    pub fn interview_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.interview_duration_minutes)
    }

    pub fn expiration_check_interval(&self) -> Duration {
        Duration::from_secs(self.expiration_check_interval_secs)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Defaults with placeholder URLs, for router tests.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/interviews_test".to_string(),
            ai_gateway_url: "http://localhost:5000".to_string(),
            ai_gateway_timeout_secs: 30,
            interview_duration_minutes: 45,
            expiration_check_interval_secs: 60,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}
