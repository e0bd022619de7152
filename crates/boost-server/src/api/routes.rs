use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{
    admin, billing, businesses, checkout, health, reviews, signup, webhooks,
};
use crate::api::middleware::auth;
use crate::AppState;

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpunkt nicht gefunden",
            "code": "not_found"
        })),
    )
}

pub fn build(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/billing/cancel", post(billing::cancel))
        .route("/billing/portal", post(billing::portal))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/businesses", post(businesses::create))
        .route("/admin/businesses/:id", delete(businesses::delete))
        .route("/admin/create-admin", post(admin::create_admin))
        .route_layer(from_fn_with_state(state.clone(), auth::middleware));

    let public = Router::new()
        .route("/businesses/:slug", get(businesses::get_by_slug))
        .route("/reviews", post(reviews::create).patch(reviews::update_message))
        .route("/signup/create-business", post(signup::create_business))
        .route("/checkout/subscription", post(checkout::subscription))
        .route("/webhooks/stripe", post(webhooks::stripe))
        .route("/admin/setup", post(admin::setup));

    let api = Router::new()
        .nest("/api", protected.merge(public))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .fallback(fallback);

    api.with_state(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(30)))
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive()),
    )
}
