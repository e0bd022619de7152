use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// User-facing messages are German, matching the front end.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Nicht autorisiert")]
    Unauthorized,

    #[error("Keine Berechtigung")]
    Forbidden,

    #[error("Admin nicht gefunden")]
    AdminNotFound,

    #[error("Geschäft nicht gefunden")]
    BusinessNotFound(Uuid),

    #[error("Bewertung nicht gefunden")]
    ReviewNotFound(Uuid),

    #[error("Kein aktives Abo gefunden")]
    SubscriptionNotFound,

    #[error("Kein Stripe-Konto gefunden")]
    CustomerNotFound,

    #[error("{0}")]
    NotFound(String),

    #[error("Fehlende Pflichtfelder")]
    MissingFields,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid signature")]
    InvalidSignature,

    /// Identity provider rejected the request; its message is passed through.
    #[error("{0}")]
    Identity(String),

    #[error("{message}")]
    Provider { message: String, source: anyhow::Error },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn provider(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Provider {
            message: message.into(),
            source,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            Self::AdminNotFound => (StatusCode::NOT_FOUND, "admin_not_found"),
            Self::BusinessNotFound(_) => (StatusCode::NOT_FOUND, "business_not_found"),
            Self::ReviewNotFound(_) => (StatusCode::NOT_FOUND, "review_not_found"),
            Self::SubscriptionNotFound => (StatusCode::NOT_FOUND, "subscription_not_found"),
            Self::CustomerNotFound => (StatusCode::NOT_FOUND, "customer_not_found"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::MissingFields => (StatusCode::BAD_REQUEST, "missing_fields"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            Self::InvalidSignature => (StatusCode::BAD_REQUEST, "invalid_signature"),
            Self::Identity(_) => (StatusCode::BAD_REQUEST, "identity_error"),
            Self::Provider { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "provider_error"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

/// Maps a unique-constraint violation to `Conflict`, everything else to `Database`.
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.into()),
        _ => AppError::Database(err),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(
            status = %rejection.status(),
            reason = %rejection.body_text(),
            "request body rejected"
        );
        AppError::Validation("Ungültiger Request-Body".into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status.is_server_error() {
            match &self {
                Self::Provider { message, source } => {
                    tracing::error!(error = %source, "{message}");
                    message.clone()
                }
                other => {
                    tracing::error!(error = %other, "request failed");
                    "Ein unerwarteter Fehler ist aufgetreten".to_string()
                }
            }
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message, code })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
