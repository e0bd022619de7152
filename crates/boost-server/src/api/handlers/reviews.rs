use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::api::extract::ApiJson;
use crate::domain::{
    Business, CreateReviewRequest, Rating, Review, ReviewResponse, UpdateReviewRequest,
    MAX_MESSAGE_LEN,
};
use crate::error::{AppError, Result};
use crate::AppState;

/// Trims the message; blank becomes `None`.
fn normalize_message(message: Option<String>) -> Result<Option<String>> {
    let Some(message) = message else {
        return Ok(None);
    };
    let message = message.trim();
    if message.is_empty() {
        return Ok(None);
    }
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::Validation(format!(
            "Nachricht darf höchstens {MAX_MESSAGE_LEN} Zeichen lang sein"
        )));
    }
    Ok(Some(message.to_string()))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateReviewRequest>,
) -> Result<Json<ReviewResponse>> {
    let (Some(business_id), Some(rating)) = (req.business_id, req.rating) else {
        return Err(AppError::MissingFields);
    };
    let rating = Rating::new(rating).ok_or_else(|| {
        AppError::Validation("Bewertung muss zwischen 1 und 5 liegen".into())
    })?;
    let message = normalize_message(req.message)?;

    let business: Business = sqlx::query_as("SELECT * FROM businesses WHERE id = $1")
        .bind(business_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::BusinessNotFound(business_id))?;

    let redirected = rating.redirects_to_google();

    let review: Review = sqlx::query_as(
        r#"
        INSERT INTO reviews (id, business_id, rating, message, redirected_to_google, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(business_id)
    .bind(rating.value())
    .bind(&message)
    .bind(redirected)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        review_id = %review.id,
        %business_id,
        rating = rating.value(),
        redirected,
        "review recorded"
    );

    Ok(Json(ReviewResponse {
        success: true,
        review,
        redirect_url: redirected.then_some(business.google_review_url),
    }))
}

/// Attaches the follow-up message to a private review. Only a review without
/// a message can be changed.
pub async fn update_message(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>> {
    let review_id = req.review_id.ok_or(AppError::MissingFields)?;
    let message = normalize_message(req.message)?.ok_or(AppError::MissingFields)?;

    let updated: Option<Review> = sqlx::query_as(
        "UPDATE reviews SET message = $2 WHERE id = $1 AND message IS NULL RETURNING *",
    )
    .bind(review_id)
    .bind(&message)
    .fetch_optional(&state.db)
    .await?;

    if let Some(review) = updated {
        return Ok(Json(ReviewResponse {
            success: true,
            review,
            redirect_url: None,
        }));
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reviews WHERE id = $1)")
        .bind(review_id)
        .fetch_one(&state.db)
        .await?;

    if exists {
        Err(AppError::Conflict(
            "Zu dieser Bewertung wurde bereits eine Nachricht gespeichert".into(),
        ))
    } else {
        Err(AppError::ReviewNotFound(review_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_message() {
        assert_eq!(normalize_message(None).unwrap(), None);
        assert_eq!(normalize_message(Some("   ".into())).unwrap(), None);
        assert_eq!(
            normalize_message(Some(" Zu kalt. ".into())).unwrap().as_deref(),
            Some("Zu kalt.")
        );
        assert!(normalize_message(Some("ä".repeat(MAX_MESSAGE_LEN + 1))).is_err());
        assert!(normalize_message(Some("ä".repeat(MAX_MESSAGE_LEN))).is_ok());
    }
}
