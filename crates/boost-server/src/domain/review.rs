use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ratings at or above this go to the public Google review page.
pub const GOOGLE_REDIRECT_MIN_RATING: i32 = 4;

pub const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub business_id: Uuid,
    pub rating: i32,
    pub message: Option<String>,
    /// Decided once at insert; never recomputed.
    pub redirected_to_google: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(i32);

impl Rating {
    pub fn new(value: i32) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> i32 {
        self.0
    }

    pub fn redirects_to_google(self) -> bool {
        self.0 >= GOOGLE_REDIRECT_MIN_RATING
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub business_id: Option<Uuid>,
    pub rating: Option<i32>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub review_id: Option<Uuid>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub success: bool,
    pub review: Review,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}
