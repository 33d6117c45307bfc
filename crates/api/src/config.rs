//! Process configuration, read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEV_JWT_SECRET: &str = "festflow-dev-secret";

#[derive(Debug, Clone)]
pub struct Config {
    /// `BIND_ADDRESS`, default `0.0.0.0:3000`.
    pub bind_address: SocketAddr,

    /// `JWT_SECRET`. A development default is used (with a warning) when unset.
    pub jwt_secret: String,

    /// `TOKEN_TTL_SECONDS`, default one day.
    pub token_ttl: chrono::Duration,

    /// `DATABASE_URL`. PostgreSQL when set, in-memory stores otherwise.
    pub database_url: Option<String>,

    /// `NOTIFY_TIMEOUT_MS`, default 5000.
    pub notify_timeout: Duration,

    /// `COOKIE_SECURE`, default false.
    pub cookie_secure: bool,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Ten years; keeps `iat + ttl` well inside the representable date range.
const MAX_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Positive number of seconds, within the range `chrono::Duration` can hold.
fn parse_token_ttl(raw: &str) -> Result<chrono::Duration> {
    let seconds: i64 = raw
        .trim()
        .parse()
        .context("TOKEN_TTL_SECONDS must be an integer")?;
    if seconds <= 0 {
        anyhow::bail!("TOKEN_TTL_SECONDS must be positive");
    }
    if seconds > MAX_TOKEN_TTL_SECONDS {
        anyhow::bail!("TOKEN_TTL_SECONDS must be at most {MAX_TOKEN_TTL_SECONDS}");
    }
    chrono::Duration::try_seconds(seconds).context("TOKEN_TTL_SECONDS is out of range")
}

impl Config {
    /// In-memory configuration with the given signing secret.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            jwt_secret: jwt_secret.into(),
            token_ttl: festflow_auth::token::DEFAULT_TOKEN_TTL,
            database_url: None,
            notify_timeout: Duration::from_millis(5000),
            cookie_secure: false,
        }
    }

    pub fn from_env() -> Result<Self> {
        let bind_address = env_opt("BIND_ADDRESS")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .context("BIND_ADDRESS must be a socket address")?;

        let jwt_secret = env_opt("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let token_ttl = parse_token_ttl(
            &env_opt("TOKEN_TTL_SECONDS").unwrap_or_else(|| "86400".to_string()),
        )?;

        let notify_timeout_ms: u64 = env_opt("NOTIFY_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .context("NOTIFY_TIMEOUT_MS must be an integer")?;

        let cookie_secure = match env_opt("COOKIE_SECURE") {
            None => false,
            Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        };

        Ok(Self {
            bind_address,
            jwt_secret,
            token_ttl,
            database_url: env_opt("DATABASE_URL"),
            notify_timeout: Duration::from_millis(notify_timeout_ms),
            cookie_secure,
        })
    }
}
