use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Admin, AdminScope};
use crate::error::{AppError, Result};
use crate::identity::AuthUser;
use crate::AppState;

#[derive(Clone)]
pub struct AuthContext {
    pub user: AuthUser,
}

impl AuthContext {
    async fn find_admin(&self, db: &PgPool) -> Result<Option<Admin>> {
        Ok(sqlx::query_as("SELECT * FROM admins WHERE id = $1")
            .bind(self.user.id)
            .fetch_optional(db)
            .await?)
    }

    /// The admin row for the caller together with what it may see.
    pub async fn admin(&self, db: &PgPool) -> Result<(Admin, AdminScope)> {
        let admin = self.find_admin(db).await?.ok_or(AppError::AdminNotFound)?;
        let scope = admin.scope().ok_or(AppError::Forbidden)?;
        Ok((admin, scope))
    }

    /// The caller's business; `None` for a super-admin.
    pub async fn tenant(&self, db: &PgPool) -> Result<Option<Uuid>> {
        match self.admin(db).await? {
            (_, AdminScope::Tenant { business_id }) => Ok(Some(business_id)),
            (_, AdminScope::Global) => Ok(None),
        }
    }

    pub async fn super_admin(&self, db: &PgPool) -> Result<Admin> {
        match self.find_admin(db).await? {
            Some(admin) if admin.is_super_admin => Ok(admin),
            _ => Err(AppError::Forbidden),
        }
    }
}

pub async fn middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> std::result::Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let user = state.identity.verify_token(token).await?;
    tracing::debug!(user_id = %user.id, "request authenticated");

    req.extensions_mut().insert(AuthContext { user });

    Ok(next.run(req).await)
}
