use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;

use crate::api::extract::ApiJson;
use crate::billing::CheckoutRequest;
use crate::domain::{CheckoutRequestBody, UrlResponse};
use crate::error::{AppError, Result};
use crate::AppState;

const CHECKOUT_FAILED: &str = "Checkout konnte nicht erstellt werden";

pub async fn subscription(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CheckoutRequestBody>,
) -> Result<Json<UrlResponse>> {
    let business_id = req
        .business_id
        .ok_or_else(|| AppError::Validation("Business ID fehlt".into()))?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM businesses WHERE id = $1)")
        .bind(business_id)
        .fetch_one(&state.db)
        .await?;
    if !exists {
        return Err(AppError::BusinessNotFound(business_id));
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|h| h.to_str().ok())
        .filter(|o| !o.is_empty())
        .unwrap_or(state.config.site_url.as_str())
        .to_string();

    let session = state
        .payments
        .create_checkout_session(&CheckoutRequest {
            business_id,
            origin,
        })
        .await
        .map_err(|e| AppError::provider(CHECKOUT_FAILED, e))?;

    let url = session.url.ok_or_else(|| {
        AppError::provider(
            CHECKOUT_FAILED,
            anyhow::anyhow!("checkout session {} has no url", session.id),
        )
    })?;

    tracing::info!(%business_id, session_id = %session.id, "checkout session created");

    Ok(Json(UrlResponse { url }))
}
