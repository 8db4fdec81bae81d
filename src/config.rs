use crate::locale::DEFAULT_CACHE_TTL;
use crate::webhook::DEFAULT_TIMEOUT;
use anyhow::{Context, Result};
use std::time::Duration;

/// Runtime settings read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    // Locale store
    pub database_path: String,
    pub cache_ttl: Duration,

    // Alerting
    pub alert_config_path: String,
    pub webhook_timeout: Duration,

    // Server
    pub port: u16,
    pub admin_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "locales.db".to_string()),
            cache_ttl: seconds_or("LOCALE_CACHE_TTL_SECONDS", DEFAULT_CACHE_TTL)?,

            alert_config_path: std::env::var("ALERT_CONFIG_PATH")
                .unwrap_or_else(|_| "config/alerts.json".to_string()),
            webhook_timeout: seconds_or("WEBHOOK_TIMEOUT_SECONDS", DEFAULT_TIMEOUT)?,

            port: parse_or("PORT", 8080)?,
            admin_api_key: std::env::var("ADMIN_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
        })
    }
}

fn seconds_or(name: &str, default: Duration) -> Result<Duration> {
    parse_or(name, default.as_secs()).map(Duration::from_secs)
}

/// Parse an optional numeric variable, failing loudly on garbage.
fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got '{}'", name, value)),
        Err(_) => Ok(default),
    }
}
