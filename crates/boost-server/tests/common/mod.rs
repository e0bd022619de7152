#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use boost_server::billing::{
    CheckoutRequest, CheckoutSession, PaymentProvider, StripeSubscription,
};
use boost_server::config::Config;
use boost_server::domain::{slugify, SubscriptionStatus};
use boost_server::error::{AppError, Result};
use boost_server::identity::{AuthUser, IdentityProvider};
use boost_server::App;
use serde_json::Value;
use sqlx::PgPool;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const SITE_URL: &str = "https://www.bewertungenboost.de";

static TEST_DB: OnceCell<(ContainerAsync<Postgres>, String)> = OnceCell::const_new();

async fn database_url() -> String {
    let (_, url) = TEST_DB
        .get_or_init(|| async {
            let container = Postgres::default()
                .start()
                .await
                .expect("Failed to start postgres container");
            let host = container.get_host().await.expect("Failed to get host");
            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("Failed to get port");
            let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
            (container, url)
        })
        .await;
    url.clone()
}

#[derive(Default)]
pub struct FakePayments {
    pub subscriptions: Mutex<HashMap<String, StripeSubscription>>,
    pub checkouts: Mutex<Vec<CheckoutRequest>>,
    pub cancellations: Mutex<Vec<String>>,
    pub portals: Mutex<Vec<(String, String)>>,
}

impl FakePayments {
    pub fn put_subscription(&self, id: &str, customer: &str, status: SubscriptionStatus) {
        self.subscriptions.lock().unwrap().insert(
            id.to_string(),
            StripeSubscription {
                id: id.to_string(),
                customer: Some(customer.to_string()),
                status,
                current_period_start: Some(1_700_000_000),
                current_period_end: Some(1_702_592_000),
                cancel_at_period_end: false,
            },
        );
    }
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> anyhow::Result<StripeSubscription> {
        self.subscriptions
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| anyhow!("No such subscription: '{subscription_id}'"))
    }

    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> anyhow::Result<StripeSubscription> {
        self.cancellations
            .lock()
            .unwrap()
            .push(subscription_id.to_string());
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let sub = subscriptions
            .entry(subscription_id.to_string())
            .or_insert_with(|| StripeSubscription {
                id: subscription_id.to_string(),
                customer: None,
                status: SubscriptionStatus::Active,
                current_period_start: None,
                current_period_end: None,
                cancel_at_period_end: false,
            });
        sub.cancel_at_period_end = cancel;
        Ok(sub.clone())
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> anyhow::Result<CheckoutSession> {
        self.checkouts.lock().unwrap().push(request.clone());
        Ok(CheckoutSession {
            id: format!("cs_test_{}", request.business_id.simple()),
            url: Some(format!(
                "https://checkout.stripe.test/c/pay/{}",
                request.business_id
            )),
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> anyhow::Result<String> {
        self.portals
            .lock()
            .unwrap()
            .push((customer_id.to_string(), return_url.to_string()));
        Ok(format!("https://billing.stripe.test/p/session/{customer_id}"))
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    tokens: Mutex<HashMap<String, AuthUser>>,
    registered: Mutex<HashMap<String, Uuid>>,
    /// Handed out by the next `create_user` instead of a fresh id.
    pub next_user_id: Mutex<Option<Uuid>>,
    pub deleted: Mutex<Vec<Uuid>>,
}

impl FakeIdentity {
    /// Issues an access token for `user_id`.
    pub fn login(&self, user_id: Uuid) -> String {
        let token = format!("token-{}", Uuid::new_v4());
        self.tokens.lock().unwrap().insert(
            token.clone(),
            AuthUser {
                id: user_id,
                email: None,
            },
        );
        token
    }

    pub fn is_registered(&self, email: &str) -> bool {
        self.registered.lock().unwrap().contains_key(email)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify_token(&self, access_token: &str) -> Result<AuthUser> {
        self.tokens
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or(AppError::Unauthorized)
    }

    async fn create_user(&self, email: &str, _password: &str) -> Result<AuthUser> {
        let mut registered = self.registered.lock().unwrap();
        if registered.contains_key(email) {
            return Err(AppError::Identity(
                "A user with this email address has already been registered".into(),
            ));
        }
        let id = self
            .next_user_id
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(Uuid::new_v4);
        registered.insert(email.to_string(), id);
        Ok(AuthUser {
            id,
            email: Some(email.to_string()),
        })
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        self.registered.lock().unwrap().retain(|_, v| *v != id);
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: PgPool,
    pub payments: Arc<FakePayments>,
    pub identity: Arc<FakeIdentity>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_webhook_secret(Some(WEBHOOK_SECRET)).await
    }

    pub async fn with_webhook_secret(secret: Option<&str>) -> Self {
        let config = Config {
            database_url: database_url().await,
            bind_address: "127.0.0.1:0".to_string(),
            db_max_connections: 5,
            otlp_endpoint: None,
            site_url: SITE_URL.to_string(),
            supabase_url: "http://supabase.invalid".to_string(),
            supabase_anon_key: "anon-key".to_string(),
            supabase_service_role_key: "service-role-key".to_string(),
            stripe_secret_key: "sk_test_unused".to_string(),
            stripe_webhook_secret: secret.map(str::to_string),
        };

        let payments = Arc::new(FakePayments::default());
        let identity = Arc::new(FakeIdentity::default());
        let app = App::with_providers(config, payments.clone(), identity.clone())
            .await
            .expect("Failed to create app");

        Self {
            router: app.router(),
            db: app.db().clone(),
            payments,
            identity,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.call(builder.body(body).unwrap()).await
    }

    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let res = self.router.clone().oneshot(request).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn post_webhook(&self, payload: &str, signature: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/webhooks/stripe")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header("stripe-signature", signature);
        }
        self.call(builder.body(Body::from(payload.to_string())).unwrap())
            .await
    }

    /// A business with a unique name and slug.
    pub async fn insert_business(&self, name: &str) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let slug = format!("{}-{}", slugify(name), id.simple());
        sqlx::query(
            "INSERT INTO businesses (id, name, slug, google_review_url) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(name)
        .bind(&slug)
        .bind(format!("https://g.page/r/{}/review", id.simple()))
        .execute(&self.db)
        .await
        .unwrap();
        (id, slug)
    }

    /// A tenant admin for `business_id`, logged in.
    pub async fn tenant_admin(&self, business_id: Uuid) -> (Uuid, String) {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO admins (id, business_id, email) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(business_id)
            .bind(format!("{}@example.de", id.simple()))
            .execute(&self.db)
            .await
            .unwrap();
        let token = self.identity.login(id);
        (id, token)
    }

    /// The database's single super-admin, created on first use, logged in.
    pub async fn super_admin(&self) -> (Uuid, String) {
        sqlx::query(
            "INSERT INTO admins (id, email, is_super_admin) VALUES ($1, 'root@bewertungenboost.de', TRUE) ON CONFLICT DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .execute(&self.db)
        .await
        .unwrap();
        let id: Uuid = sqlx::query_scalar("SELECT id FROM admins WHERE is_super_admin")
            .fetch_one(&self.db)
            .await
            .unwrap();
        let token = self.identity.login(id);
        (id, token)
    }

    /// A local subscription row for `business_id`.
    pub async fn insert_subscription(
        &self,
        business_id: Uuid,
        stripe_subscription_id: &str,
        customer_id: &str,
    ) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, business_id, stripe_customer_id, stripe_subscription_id, status)
            VALUES ($1, $2, $3, $4, 'active')
            "#,
        )
        .bind(id)
        .bind(business_id)
        .bind(customer_id)
        .bind(stripe_subscription_id)
        .execute(&self.db)
        .await
        .unwrap();
        id
    }
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}
