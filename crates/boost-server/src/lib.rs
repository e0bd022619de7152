pub mod api;
pub mod billing;
pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod telemetry;

use anyhow::Result;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::routes;
use crate::billing::{PaymentProvider, StripeClient};
use crate::config::Config;
use crate::identity::{IdentityProvider, SupabaseAuth};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub payments: Arc<dyn PaymentProvider>,
    pub identity: Arc<dyn IdentityProvider>,
}

pub struct App {
    state: Arc<AppState>,
}

impl App {
    pub fn db(&self) -> &PgPool {
        &self.state.db
    }

    /// Connects to Stripe and Supabase Auth with the configured keys.
    pub async fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let payments = Arc::new(StripeClient::new(
            http_client.clone(),
            config.stripe_secret_key.clone(),
        ));
        let identity = Arc::new(SupabaseAuth::new(http_client, &config));

        Self::with_providers(config, payments, identity).await
    }

    pub async fn with_providers(
        config: Config,
        payments: Arc<dyn PaymentProvider>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&db).await?;

        if config.stripe_webhook_secret.is_none() {
            tracing::warn!("STRIPE_WEBHOOK_SECRET unset, webhook signatures will not be verified");
        }

        let state = Arc::new(AppState {
            db,
            config,
            payments,
            identity,
        });

        Ok(Self { state })
    }

    pub fn router(&self) -> Router {
        routes::build(self.state.clone())
    }
}
