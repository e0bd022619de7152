use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Admin {
    /// Same id as the identity-provider user.
    pub id: Uuid,
    pub business_id: Option<Uuid>,
    pub email: String,
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome of the two-tier admin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminScope {
    Tenant { business_id: Uuid },
    Global,
}

impl Admin {
    /// `None` only for a regular admin row without a business, which the
    /// `admins_business_scope` constraint rules out.
    pub fn scope(&self) -> Option<AdminScope> {
        if self.is_super_admin {
            return Some(AdminScope::Global);
        }
        self.business_id
            .map(|business_id| AdminScope::Tenant { business_id })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub business_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SetupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(business_id: Option<Uuid>, is_super_admin: bool) -> Admin {
        Admin {
            id: Uuid::new_v4(),
            business_id,
            email: "inhaber@example.de".into(),
            is_super_admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_super_admin_is_global() {
        assert_eq!(admin(None, true).scope(), Some(AdminScope::Global));
    }

    #[test]
    fn test_regular_admin_is_tenant_scoped() {
        let business_id = Uuid::new_v4();
        assert_eq!(
            admin(Some(business_id), false).scope(),
            Some(AdminScope::Tenant { business_id })
        );
    }

    #[test]
    fn test_regular_admin_without_business_has_no_scope() {
        assert_eq!(admin(None, false).scope(), None);
    }
}
