use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::api::extract::ApiJson;
use crate::domain::{slug_with_suffix, slugify, SignupRequest, SignupResponse};
use crate::error::{conflict_on_unique, AppError, Result};
use crate::AppState;

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Creates the business for a freshly registered user and links the user as
/// its admin. Both rows are written in one transaction.
pub async fn create_business(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<Json<SignupResponse>> {
    let (Some(user_id), Some(name), Some(google_review_url), Some(email)) = (
        req.user_id,
        required(req.business_name),
        required(req.google_review_url),
        required(req.email),
    ) else {
        return Err(AppError::MissingFields);
    };
    let address = required(req.address);

    let base_slug = slugify(&name);
    if base_slug.is_empty() {
        return Err(AppError::Validation(
            "Aus dem Namen lässt sich kein Slug bilden".into(),
        ));
    }

    let now = Utc::now();
    let mut tx = state.db.begin().await?;

    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM businesses WHERE slug = $1)")
        .bind(&base_slug)
        .fetch_one(&mut *tx)
        .await?;
    let slug = if taken {
        slug_with_suffix(&base_slug, now)
    } else {
        base_slug
    };

    let business_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO businesses (id, name, slug, address, google_review_url, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(&slug)
    .bind(&address)
    .bind(&google_review_url)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, "Slug ist bereits vergeben"))?;

    sqlx::query(
        r#"
        INSERT INTO admins (id, business_id, email, is_super_admin, created_at)
        VALUES ($1, $2, $3, FALSE, $4)
        "#,
    )
    .bind(user_id)
    .bind(business_id)
    .bind(&email)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, "Admin-Account existiert bereits"))?;

    tx.commit().await?;

    tracing::info!(%business_id, %slug, %user_id, "business signed up");

    Ok(Json(SignupResponse {
        success: true,
        business_id,
        slug,
    }))
}
