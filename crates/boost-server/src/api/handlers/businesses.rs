use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::api::extract::ApiJson;
use crate::api::middleware::auth::AuthContext;
use crate::domain::{slugify, Business, CreateBusinessRequest, PublicBusiness};
use crate::error::{conflict_on_unique, AppError, Result};
use crate::AppState;

/// Review-page lookup for an NFC stand.
pub async fn get_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<PublicBusiness>> {
    let business: Business = sqlx::query_as("SELECT * FROM businesses WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Geschäft nicht gefunden".into()))?;

    Ok(Json(business.into()))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateBusinessRequest>,
) -> Result<impl IntoResponse> {
    auth.super_admin(&state.db).await?;

    let name = req.name.trim();
    let google_review_url = req.google_review_url.trim();
    if name.is_empty() || google_review_url.is_empty() {
        return Err(AppError::MissingFields);
    }

    let slug = slugify(req.slug.as_deref().unwrap_or(name));
    if slug.is_empty() {
        return Err(AppError::Validation(
            "Aus dem Namen lässt sich kein Slug bilden".into(),
        ));
    }

    let business: Business = sqlx::query_as(
        r#"
        INSERT INTO businesses (id, name, slug, logo_url, address, google_review_url, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(&slug)
    .bind(&req.logo_url)
    .bind(&req.address)
    .bind(google_review_url)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "Slug ist bereits vergeben"))?;

    tracing::info!(business_id = %business.id, slug = %business.slug, "business created");

    Ok((StatusCode::CREATED, Json(business)))
}

/// Removes the business with its admins, reviews, subscriptions and payments.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.super_admin(&state.db).await?;

    let result = sqlx::query("DELETE FROM businesses WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::BusinessNotFound(id));
    }

    tracing::info!(business_id = %id, "business deleted");

    Ok(StatusCode::NO_CONTENT)
}
