//! Service wiring: stores, token codec, notifier and clock.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use festflow_auth::{Hs256JwtValidator, JwtValidator, Passwords};
use festflow_core::{Clock, SystemClock};
use festflow_infra::store::{self, Stores};
use festflow_infra::{Authenticator, ClubRegistry, EventLifecycle, LogNotifier, Notifier};

use crate::config::Config;

/// Cookie attributes for issued session tokens.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub max_age: chrono::Duration,
    pub secure: bool,
}

#[derive(Clone)]
pub struct AppServices {
    pub authenticator: Authenticator,
    pub lifecycle: EventLifecycle,
    pub registry: ClubRegistry,
    pub cookie: CookieSettings,
}

impl AppServices {
    pub fn new(
        config: &Config,
        stores: Stores,
        passwords: Passwords,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tokens: Arc<dyn JwtValidator> = Arc::new(Hs256JwtValidator::with_ttl(
            config.jwt_secret.clone().into_bytes(),
            config.token_ttl,
        ));

        Self {
            authenticator: Authenticator::new(
                stores.identities.clone(),
                passwords.clone(),
                tokens,
                clock.clone(),
            ),
            lifecycle: EventLifecycle::new(stores.clone(), notifier, clock.clone())
                .with_notify_timeout(config.notify_timeout),
            registry: ClubRegistry::new(stores, passwords, clock),
            cookie: CookieSettings {
                max_age: config.token_ttl,
                secure: config.cookie_secure,
            },
        }
    }
}

/// Connect to PostgreSQL when configured, otherwise use in-memory stores.
pub async fn build_stores(config: &Config) -> anyhow::Result<Stores> {
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            store::migrate(&pool)
                .await
                .context("failed to prepare database schema")?;
            tracing::info!("using postgres stores");
            Ok(Stores::postgres(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores (data is lost on restart)");
            Ok(Stores::in_memory())
        }
    }
}

pub async fn build_services(config: &Config) -> anyhow::Result<AppServices> {
    let stores = build_stores(config).await?;
    Ok(AppServices::new(
        config,
        stores,
        Passwords::default(),
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
    ))
}
