use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::billing::reconcile;
use crate::billing::webhook::{decode_event, verify_signature, SIGNATURE_HEADER};
use crate::billing::BillingEvent;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Serialize)]
pub struct WebhookAck {
    received: bool,
}

fn invalid_payload(err: serde_json::Error) -> AppError {
    warn!(error = %err, "undecodable webhook payload");
    AppError::Validation("Ungültiger Webhook-Payload".into())
}

/// Stripe event intake. Once the event is authenticated and decoded the
/// delivery is acknowledged, even if individual writes fail.
pub async fn stripe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    match state.config.stripe_webhook_secret.as_deref() {
        Some(secret) => {
            let header = headers
                .get(SIGNATURE_HEADER)
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    warn!("webhook without signature header rejected");
                    AppError::InvalidSignature
                })?;
            verify_signature(&body, header, secret, Utc::now()).map_err(|e| {
                warn!(error = %e, "webhook signature verification failed");
                AppError::InvalidSignature
            })?;
        }
        None => warn!("STRIPE_WEBHOOK_SECRET unset, accepting unverified webhook payload"),
    }

    let event = decode_event(&body).map_err(invalid_payload)?;
    let billing = BillingEvent::from_event(&event).map_err(invalid_payload)?;

    info!(event_id = %event.id, event_type = %event.event_type, "stripe event received");

    let fetched = match billing.subscription_to_fetch() {
        Some(subscription_id) => Some(
            state
                .payments
                .retrieve_subscription(subscription_id)
                .await
                .map_err(|e| AppError::provider("Webhook handler failed", e))?,
        ),
        None => None,
    };

    let mutations = reconcile::plan(&billing, fetched.as_ref(), Utc::now());
    reconcile::apply(&state.db, &event.id, &mutations).await;

    Ok(Json(WebhookAck { received: true }))
}
