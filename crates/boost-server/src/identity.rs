//! Supabase Auth binding.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves an access token to its user. Any rejection is `Unauthorized`.
    async fn verify_token(&self, access_token: &str) -> Result<AuthUser>;

    /// Creates a confirmed email/password user.
    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser>;

    async fn delete_user(&self, id: Uuid) -> Result<()>;
}

#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

/// GoTrue reports errors under different keys depending on the endpoint.
#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

impl GoTrueError {
    fn into_message(self) -> Option<String> {
        self.msg.or(self.message).or(self.error_description)
    }
}

impl SupabaseAuth {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_role_key: config.supabase_service_role_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    async fn upstream_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        serde_json::from_str::<GoTrueError>(&body)
            .ok()
            .and_then(GoTrueError::into_message)
            .unwrap_or_else(|| format!("Supabase Auth error: {status}"))
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    #[instrument(skip_all)]
    async fn verify_token(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .client
            .get(self.url("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Supabase Auth request failed");
                AppError::Unauthorized
            })?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "access token rejected");
            return Err(AppError::Unauthorized);
        }

        response.json::<AuthUser>().await.map_err(|e| {
            error!(error = %e, "unexpected Supabase user payload");
            AppError::Unauthorized
        })
    }

    #[instrument(skip(self, password))]
    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser> {
        let response = self
            .client
            .post(self.url("/admin/users"))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
            }))
            .send()
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        if !response.status().is_success() {
            return Err(AppError::Identity(Self::upstream_message(response).await));
        }

        response
            .json::<AuthUser>()
            .await
            .map_err(|_| AppError::Identity("Benutzer konnte nicht erstellt werden".into()))
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/admin/users/{id}")))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            _ => Err(AppError::Identity(Self::upstream_message(response).await)),
        }
    }
}
