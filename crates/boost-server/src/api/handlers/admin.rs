use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::extract::ApiJson;
use crate::api::middleware::auth::AuthContext;
use crate::domain::{
    Admin, AdminScope, Business, CreateAdminRequest, Dashboard, GlobalOverview, Payment,
    PaymentResponse, Review, ReviewStats, SetupRequest, Subscription, TenantDashboard,
    ValueReport, RECENT_REVIEWS_LIMIT, SUBSCRIPTION_PRODUCT,
};
use crate::error::{conflict_on_unique, AppError, Result};
use crate::identity::{AuthUser, IdentityProvider};
use crate::AppState;

#[derive(Serialize)]
pub struct AdminCreated {
    success: bool,
    admin: Admin,
}

/// Tenant admins see their own business; super-admins get the global overview.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Dashboard>> {
    let (_, scope) = auth.admin(&state.db).await?;

    let dashboard = match scope {
        AdminScope::Tenant { business_id } => {
            Dashboard::Tenant(Box::new(tenant_dashboard(&state.db, business_id).await?))
        }
        AdminScope::Global => Dashboard::Global(global_overview(&state.db).await?),
    };

    Ok(Json(dashboard))
}

async fn tenant_dashboard(db: &PgPool, business_id: Uuid) -> Result<TenantDashboard> {
    let business: Business = sqlx::query_as("SELECT * FROM businesses WHERE id = $1")
        .bind(business_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::BusinessNotFound(business_id))?;

    let reviews: Vec<Review> = sqlx::query_as(
        "SELECT * FROM reviews WHERE business_id = $1 ORDER BY created_at DESC",
    )
    .bind(business_id)
    .fetch_all(db)
    .await?;

    let subscription: Option<Subscription> = sqlx::query_as(
        "SELECT * FROM subscriptions WHERE business_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(business_id)
    .fetch_optional(db)
    .await?;

    let payments: Vec<Payment> = sqlx::query_as(
        r#"
        SELECT p.* FROM payments p
        JOIN subscriptions s ON s.id = p.subscription_id
        WHERE s.business_id = $1
        ORDER BY p.paid_at DESC NULLS LAST, p.created_at DESC
        "#,
    )
    .bind(business_id)
    .fetch_all(db)
    .await?;

    let stats = ReviewStats::from_reviews(&reviews);
    let value = ValueReport::compute(
        &stats,
        subscription.as_ref().map(|s| s.created_at),
        SUBSCRIPTION_PRODUCT.monthly_price(),
        Utc::now(),
    );

    Ok(TenantDashboard {
        business,
        stats,
        value,
        recent_reviews: reviews.into_iter().take(RECENT_REVIEWS_LIMIT).collect(),
        subscription,
        payments: payments.into_iter().map(PaymentResponse::from).collect(),
    })
}

async fn global_overview(db: &PgPool) -> Result<GlobalOverview> {
    let businesses: Vec<Business> =
        sqlx::query_as("SELECT * FROM businesses ORDER BY created_at DESC")
            .fetch_all(db)
            .await?;
    let admins: Vec<Admin> = sqlx::query_as("SELECT * FROM admins ORDER BY created_at DESC")
        .fetch_all(db)
        .await?;
    let subscriptions: Vec<Subscription> =
        sqlx::query_as("SELECT * FROM subscriptions ORDER BY created_at DESC")
            .fetch_all(db)
            .await?;
    let payments: Vec<Payment> = sqlx::query_as("SELECT * FROM payments ORDER BY created_at DESC")
        .fetch_all(db)
        .await?;

    Ok(GlobalOverview {
        businesses,
        admins,
        subscriptions,
        payments: payments.into_iter().map(PaymentResponse::from).collect(),
    })
}

fn credentials(email: Option<String>, password: Option<String>) -> Result<(String, String)> {
    match (email.map(|e| e.trim().to_string()), password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            Ok((email, password))
        }
        _ => Err(AppError::MissingFields),
    }
}

/// Inserts the admin row for an identity user that was just created, and
/// deletes that user again if the insert fails.
async fn insert_admin_or_rollback(
    db: &PgPool,
    identity: &dyn IdentityProvider,
    user: &AuthUser,
    email: &str,
    business_id: Option<Uuid>,
) -> Result<Admin> {
    let inserted = sqlx::query_as::<_, Admin>(
        r#"
        INSERT INTO admins (id, business_id, email, is_super_admin, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(business_id)
    .bind(email)
    .bind(business_id.is_none())
    .bind(Utc::now())
    .fetch_one(db)
    .await;

    match inserted {
        Ok(admin) => Ok(admin),
        Err(err) => {
            if let Err(cleanup) = identity.delete_user(user.id).await {
                tracing::error!(
                    user_id = %user.id,
                    error = %cleanup,
                    "orphaned identity user after failed admin insert"
                );
            }
            Err(conflict_on_unique(err, "Admin existiert bereits"))
        }
    }
}

/// Bootstraps the single super-admin. Refused once one exists.
pub async fn setup(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SetupRequest>,
) -> Result<impl IntoResponse> {
    let (email, password) = credentials(req.email, req.password)?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admins WHERE is_super_admin)")
            .fetch_one(&state.db)
            .await?;
    if exists {
        return Err(AppError::Conflict("Super-Admin existiert bereits".into()));
    }

    let user = state.identity.create_user(&email, &password).await?;
    let admin =
        insert_admin_or_rollback(&state.db, state.identity.as_ref(), &user, &email, None)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::Conflict("Super-Admin existiert bereits".into()),
                other => other,
            })?;

    tracing::info!(admin_id = %admin.id, "super-admin created");

    Ok((
        StatusCode::CREATED,
        Json(AdminCreated {
            success: true,
            admin,
        }),
    ))
}

pub async fn create_admin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateAdminRequest>,
) -> Result<Json<AdminCreated>> {
    auth.super_admin(&state.db).await?;

    let (email, password) = credentials(req.email, req.password)?;
    let business_id = req.business_id.ok_or(AppError::MissingFields)?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM businesses WHERE id = $1)")
        .bind(business_id)
        .fetch_one(&state.db)
        .await?;
    if !exists {
        return Err(AppError::BusinessNotFound(business_id));
    }

    let user = state.identity.create_user(&email, &password).await?;
    let admin = insert_admin_or_rollback(
        &state.db,
        state.identity.as_ref(),
        &user,
        &email,
        Some(business_id),
    )
    .await?;

    tracing::info!(admin_id = %admin.id, %business_id, "admin created");

    Ok(Json(AdminCreated {
        success: true,
        admin,
    }))
}
