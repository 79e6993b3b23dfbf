use chrono::Duration;
use std::env;
use thiserror::Error;

/// Secret used when `JWT_SECRET` is not set. Only fit for local development.
pub const DEFAULT_JWT_SECRET: &str = "noteapp-dev-secret-change-in-production";

const DEFAULT_TOKEN_EXPIRES_IN: &str = "259200s";
const DEFAULT_REFRESH_EXPIRES_IN: &str = "604800s";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid duration for {key}: {value:?}")]
    InvalidDuration { key: &'static str, value: String },

    #[error("invalid port: {0:?}")]
    InvalidPort(String),

    #[error("REFRESH_EXPIRES_IN must be longer than TOKEN_EXPIRES_IN")]
    RefreshNotLongerThanAccess,
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let port = port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port.clone()))?;

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());

        let access_token_ttl = duration_from_env("TOKEN_EXPIRES_IN", DEFAULT_TOKEN_EXPIRES_IN)?;
        let refresh_token_ttl =
            duration_from_env("REFRESH_EXPIRES_IN", DEFAULT_REFRESH_EXPIRES_IN)?;

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            db_path: env::var("DB_PATH").unwrap_or_else(|_| "./data/noteapp.db".to_string()),
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_token_ttl <= self.access_token_ttl {
            return Err(ConfigError::RefreshNotLongerThanAccess);
        }
        Ok(())
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn duration_from_env(key: &'static str, default: &str) -> Result<Duration, ConfigError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    parse_duration(&raw).ok_or(ConfigError::InvalidDuration { key, value: raw })
}

/// Parse `"259200"`, `"259200s"`, `"30m"`, `"72h"` or `"3d"`. Zero is rejected.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => raw.split_at(idx),
        None => (raw, "s"),
    };

    let amount: i64 = digits.parse().ok()?;
    if amount <= 0 {
        return None;
    }

    let seconds = match unit {
        "s" => amount,
        "m" => amount.checked_mul(60)?,
        "h" => amount.checked_mul(60 * 60)?,
        "d" => amount.checked_mul(24 * 60 * 60)?,
        _ => return None,
    };
    Duration::try_seconds(seconds)
}
