use anyhow::{bail, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::Config;

pub struct ApiClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.server.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .access_token
            .as_ref()
            .context("no access token configured, run `boost config set --access-token <token>`")?;
        Ok(req.bearer_auth(token))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let req = self.authorized(self.client.get(self.url(path)))?;
        let resp = req.send().await.context("request failed")?;
        handle_response(resp).await
    }

    pub async fn get_public<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let req = self.authorized(self.client.post(self.url(path)).json(body))?;
        let resp = req.send().await.context("request failed")?;
        handle_response(resp).await
    }

    pub async fn post_public<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    pub async fn patch_public<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let req = self.authorized(self.client.delete(self.url(path)))?;
        let resp = req.send().await.context("request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.context("failed to read response")?;
            bail!(error_message(status, &body));
        }
        Ok(())
    }

    /// Posts a raw webhook body with the given `Stripe-Signature` header.
    pub async fn post_webhook<T: DeserializeOwned>(
        &self,
        payload: String,
        signature: Option<&str>,
    ) -> Result<T> {
        let mut req = self
            .client
            .post(self.url("/webhooks/stripe"))
            .header("Content-Type", "application/json")
            .body(payload);
        if let Some(sig) = signature {
            req = req.header("Stripe-Signature", sig);
        }
        let resp = req.send().await.context("request failed")?;
        handle_response(resp).await
    }
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await.context("failed to read response")?;

    if !status.is_success() {
        bail!(error_message(status, &body));
    }

    serde_json::from_str(&body).context("failed to parse response")
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = err.get("error").and_then(|m| m.as_str()) {
            let code = err.get("code").and_then(|c| c.as_str()).unwrap_or("unknown");
            return format!("{}: {}", code, message);
        }
    }
    format!("request failed with status {}: {}", status, body)
}
