use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::domain::{SubscriptionStatus, SUBSCRIPTION_PRODUCT};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// The subset of Stripe's REST API the backend drives. Errors carry the
/// upstream detail; handlers attach the user-facing message.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn retrieve_subscription(&self, subscription_id: &str)
        -> anyhow::Result<StripeSubscription>;

    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> anyhow::Result<StripeSubscription>;

    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> anyhow::Result<CheckoutSession>;

    /// Returns the portal URL.
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

impl StripeSubscription {
    pub fn period_start(&self) -> Option<DateTime<Utc>> {
        self.current_period_start.and_then(from_unix)
    }

    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end.and_then(from_unix)
    }
}

pub(crate) fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PortalSession {
    url: String,
}

/// A subscription checkout for one business. `origin` is the base the
/// customer is sent back to.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub business_id: Uuid,
    pub origin: String,
}

impl CheckoutRequest {
    pub fn success_url(&self) -> String {
        format!(
            "{}/signup/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.origin.trim_end_matches('/')
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/signup?canceled=true", self.origin.trim_end_matches('/'))
    }

    /// Stripe's bracketed form encoding of the session parameters.
    pub fn form(&self) -> Vec<(String, String)> {
        let product = &SUBSCRIPTION_PRODUCT;
        let mut form: Vec<(String, String)> = vec![("mode".into(), "subscription".into())];

        for (i, method) in product.payment_method_types.iter().enumerate() {
            form.push((format!("payment_method_types[{i}]"), (*method).into()));
        }

        let item = "line_items[0]";
        form.extend([
            (format!("{item}[price_data][currency]"), product.currency.into()),
            (format!("{item}[price_data][product_data][name]"), product.name.into()),
            (
                format!("{item}[price_data][product_data][description]"),
                product.description.into(),
            ),
            (
                format!("{item}[price_data][unit_amount]"),
                product.unit_amount_cents.to_string(),
            ),
            (
                format!("{item}[price_data][recurring][interval]"),
                product.interval.into(),
            ),
            (format!("{item}[quantity]"), "1".into()),
            ("metadata[business_id]".into(), self.business_id.to_string()),
            ("success_url".into(), self.success_url()),
            ("cancel_url".into(), self.cancel_url()),
            ("locale".into(), product.locale.into()),
            ("billing_address_collection".into(), "required".into()),
            ("customer_creation".into(), "always".into()),
        ]);

        form
    }
}

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(client: Client, secret_key: impl Into<String>) -> Self {
        Self {
            client,
            secret_key: secret_key.into(),
        }
    }

    async fn stripe_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: Method,
        endpoint: &str,
        form: Option<&[(String, String)]>,
    ) -> anyhow::Result<T> {
        let url = format!("{STRIPE_API_BASE}{endpoint}");

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.secret_key, Option::<&str>::None);

        if let Some(form_data) = form {
            request = request.form(form_data);
        }

        let response = request.send().await.context("Stripe API request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, endpoint, "Stripe API error");
            return Err(anyhow!("Stripe API error: {status}"));
        }

        response
            .json::<T>()
            .await
            .context("failed to parse Stripe response")
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    #[instrument(skip(self))]
    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> anyhow::Result<StripeSubscription> {
        debug!("retrieving subscription");
        self.stripe_request(
            Method::GET,
            &format!("/subscriptions/{subscription_id}"),
            None,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> anyhow::Result<StripeSubscription> {
        let form = [("cancel_at_period_end".to_string(), cancel.to_string())];
        self.stripe_request(
            Method::POST,
            &format!("/subscriptions/{subscription_id}"),
            Some(&form[..]),
        )
        .await
    }

    #[instrument(skip(self, request), fields(business_id = %request.business_id))]
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> anyhow::Result<CheckoutSession> {
        debug!("creating checkout session");
        let form = request.form();
        self.stripe_request(Method::POST, "/checkout/sessions", Some(form.as_slice()))
            .await
    }

    #[instrument(skip(self))]
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> anyhow::Result<String> {
        let form = [
            ("customer".to_string(), customer_id.to_string()),
            ("return_url".to_string(), return_url.to_string()),
        ];
        let session: PortalSession = self
            .stripe_request(Method::POST, "/billing_portal/sessions", Some(&form[..]))
            .await?;
        Ok(session.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            business_id: Uuid::nil(),
            origin: "https://www.bewertungenboost.de/".into(),
        }
    }

    fn value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_checkout_urls() {
        let req = request();
        assert_eq!(
            req.success_url(),
            "https://www.bewertungenboost.de/signup/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(
            req.cancel_url(),
            "https://www.bewertungenboost.de/signup?canceled=true"
        );
    }

    #[test]
    fn test_checkout_form_carries_product_and_metadata() {
        let form = request().form();
        assert_eq!(value(&form, "mode"), Some("subscription"));
        assert_eq!(value(&form, "payment_method_types[0]"), Some("card"));
        assert_eq!(value(&form, "payment_method_types[1]"), Some("sepa_debit"));
        assert_eq!(
            value(&form, "line_items[0][price_data][unit_amount]"),
            Some("5000")
        );
        assert_eq!(
            value(&form, "line_items[0][price_data][recurring][interval]"),
            Some("month")
        );
        assert_eq!(
            value(&form, "metadata[business_id]"),
            Some("00000000-0000-0000-0000-000000000000")
        );
        assert_eq!(value(&form, "locale"), Some("de"));
        assert_eq!(value(&form, "billing_address_collection"), Some("required"));
    }

    #[test]
    fn test_subscription_without_periods() {
        let sub: StripeSubscription = serde_json::from_str(
            r#"{"id":"sub_1","customer":"cus_1","status":"incomplete_expired"}"#,
        )
        .unwrap();
        assert_eq!(sub.status, SubscriptionStatus::IncompleteExpired);
        assert!(sub.period_start().is_none());
        assert!(!sub.cancel_at_period_end);
    }
}
