use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use super::provider::{from_unix, StripeSubscription};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum age of a signed delivery, in seconds.
pub const TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing timestamp in signature header")]
    MissingTimestamp,
    #[error("missing v1 signature in signature header")]
    MissingSignature,
    #[error("invalid timestamp in signature header")]
    InvalidTimestamp,
    #[error("timestamp outside tolerance")]
    Expired,
    #[error("no signature matches the payload")]
    Mismatch,
}

/// Checks a `t=<unix>,v1=<hex>[,v1=<hex>...]` header against `payload`.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if candidates.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;
    if now.timestamp().abs_diff(ts) > TOLERANCE_SECS.unsigned_abs() {
        return Err(SignatureError::Expired);
    }

    let mac = signed_mac(secret, timestamp, payload)?;
    let matched = candidates.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

fn signed_mac(
    secret: &str,
    timestamp: &str,
    payload: &[u8],
) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Builds a header value `verify_signature` accepts.
pub fn signature_header(
    payload: &[u8],
    secret: &str,
    timestamp: i64,
) -> Result<String, SignatureError> {
    let mac = signed_mac(secret, &timestamp.to_string(), payload)?;
    Ok(format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

pub fn decode_event(payload: &[u8]) -> serde_json::Result<StripeEvent> {
    serde_json::from_slice(payload)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    pub mode: Option<String>,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    pub fn is_subscription(&self) -> bool {
        self.mode.as_deref() == Some("subscription")
    }

    /// `None` when absent or not a UUID.
    pub fn business_id(&self) -> Option<Uuid> {
        self.metadata
            .get("business_id")
            .and_then(|id| Uuid::parse_str(id).ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusTransitions {
    pub paid_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoice {
    pub id: String,
    pub subscription: Option<String>,
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    #[serde(default)]
    pub status_transitions: Option<StatusTransitions>,
}

impl StripeInvoice {
    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.status_transitions
            .as_ref()
            .and_then(|t| t.paid_at)
            .and_then(from_unix)
    }
}

/// The event kinds reconciliation acts on. Everything else is `Ignored`.
#[derive(Debug, Clone)]
pub enum BillingEvent {
    CheckoutCompleted(CheckoutSessionObject),
    SubscriptionUpdated(StripeSubscription),
    SubscriptionDeleted(StripeSubscription),
    InvoicePaid(StripeInvoice),
    InvoicePaymentFailed(StripeInvoice),
    Ignored { event_type: String },
}

impl BillingEvent {
    pub fn from_event(event: &StripeEvent) -> serde_json::Result<Self> {
        let object = event.data.object.clone();
        Ok(match event.event_type.as_str() {
            "checkout.session.completed" => {
                Self::CheckoutCompleted(serde_json::from_value(object)?)
            }
            "customer.subscription.updated" => {
                Self::SubscriptionUpdated(serde_json::from_value(object)?)
            }
            "customer.subscription.deleted" => {
                Self::SubscriptionDeleted(serde_json::from_value(object)?)
            }
            "invoice.paid" => Self::InvoicePaid(serde_json::from_value(object)?),
            "invoice.payment_failed" => Self::InvoicePaymentFailed(serde_json::from_value(object)?),
            other => Self::Ignored {
                event_type: other.to_string(),
            },
        })
    }

    /// The subscription a completed checkout needs fetched before it can be
    /// reconciled.
    pub fn subscription_to_fetch(&self) -> Option<&str> {
        match self {
            Self::CheckoutCompleted(session)
                if session.is_subscription() && session.business_id().is_some() =>
            {
                session.subscription.as_deref()
            }
            _ => None,
        }
    }
}
