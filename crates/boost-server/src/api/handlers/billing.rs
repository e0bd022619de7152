use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::api::middleware::auth::AuthContext;
use crate::domain::{Subscription, SuccessResponse, UrlResponse};
use crate::error::{AppError, Result};
use crate::AppState;

async fn latest_subscription(state: &AppState, business_id: Uuid) -> Result<Option<Subscription>> {
    Ok(sqlx::query_as(
        "SELECT * FROM subscriptions WHERE business_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(business_id)
    .fetch_optional(&state.db)
    .await?)
}

/// Cancels at the end of the paid period; access continues until then.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<SuccessResponse>> {
    let business_id = auth
        .tenant(&state.db)
        .await?
        .ok_or(AppError::SubscriptionNotFound)?;

    let subscription = latest_subscription(&state, business_id)
        .await?
        .ok_or(AppError::SubscriptionNotFound)?;
    let stripe_id = subscription
        .stripe_subscription_id
        .as_deref()
        .ok_or(AppError::SubscriptionNotFound)?;

    state
        .payments
        .set_cancel_at_period_end(stripe_id, true)
        .await
        .map_err(|e| AppError::provider("Fehler beim Kündigen", e))?;

    sqlx::query(
        "UPDATE subscriptions SET cancel_at_period_end = TRUE, updated_at = $2 WHERE id = $1",
    )
    .bind(subscription.id)
    .bind(Utc::now())
    .execute(&state.db)
    .await?;

    tracing::info!(%business_id, stripe_subscription_id = %stripe_id, "subscription set to cancel");

    Ok(Json(SuccessResponse { success: true }))
}

pub async fn portal(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UrlResponse>> {
    let business_id = auth
        .tenant(&state.db)
        .await?
        .ok_or(AppError::CustomerNotFound)?;

    let from_subscription = latest_subscription(&state, business_id)
        .await?
        .and_then(|s| s.stripe_customer_id);
    let customer_id = match from_subscription {
        Some(id) => id,
        None => sqlx::query_scalar::<_, Option<String>>(
            "SELECT stripe_customer_id FROM businesses WHERE id = $1",
        )
        .bind(business_id)
        .fetch_optional(&state.db)
        .await?
        .flatten()
        .ok_or(AppError::CustomerNotFound)?,
    };

    let return_url = format!("{}/admin", state.config.site_url.trim_end_matches('/'));
    let url = state
        .payments
        .create_portal_session(&customer_id, &return_url)
        .await
        .map_err(|e| AppError::provider("Fehler beim Erstellen des Portals", e))?;

    Ok(Json(UrlResponse { url }))
}
