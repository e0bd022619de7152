//! Per-request dashboard aggregation. Nothing computed here is persisted.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::{Admin, Business, PaymentResponse, Review, Subscription};

/// Customers assumed lost per public negative review.
const LOST_CUSTOMERS_PER_BAD_REVIEW: i64 = 30;
/// Average spend per customer in EUR.
const AVG_CUSTOMER_VALUE: i64 = 25;
const DAYS_PER_BILLING_MONTH: i64 = 30;

pub const RECENT_REVIEWS_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingCount {
    pub rating: i32,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_reviews: i64,
    pub average_rating: f64,
    pub rating_distribution: Vec<RatingCount>,
    pub private_reviews: i64,
    pub google_redirects: i64,
}

impl ReviewStats {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let total_reviews = reviews.len() as i64;
        let rating_sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
        let average_rating = if total_reviews > 0 {
            rating_sum as f64 / total_reviews as f64
        } else {
            0.0
        };

        let rating_distribution = (1..=5)
            .map(|rating| RatingCount {
                rating,
                count: reviews.iter().filter(|r| r.rating == rating).count() as i64,
            })
            .collect();

        let google_redirects = reviews.iter().filter(|r| r.redirected_to_google).count() as i64;

        Self {
            total_reviews,
            average_rating,
            rating_distribution,
            private_reviews: total_reviews - google_redirects,
            google_redirects,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueReport {
    pub protection_rate: i64,
    pub google_success_rate: i64,
    pub estimated_revenue_saved: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub rating_without_protection: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub rating_with_protection: Decimal,
    pub months_active: i64,
    pub total_cost: i64,
    pub roi_multiplier: i64,
}

impl ValueReport {
    pub fn compute(
        stats: &ReviewStats,
        subscribed_since: Option<DateTime<Utc>>,
        monthly_price: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let estimated_revenue_saved =
            stats.private_reviews * LOST_CUSTOMERS_PER_BAD_REVIEW * AVG_CUSTOMER_VALUE;

        let weighted = |min_rating: i32| -> i64 {
            stats
                .rating_distribution
                .iter()
                .filter(|r| r.rating >= min_rating)
                .map(|r| i64::from(r.rating) * r.count)
                .sum()
        };

        let months_active = subscribed_since
            .map(|since| {
                let days = (now - since).num_seconds() as f64 / 86_400.0;
                ((days / DAYS_PER_BILLING_MONTH as f64).ceil() as i64).max(1)
            })
            .unwrap_or(1);
        let total_cost = months_active * monthly_price;

        Self {
            protection_rate: percentage(stats.private_reviews, stats.total_reviews),
            google_success_rate: percentage(stats.google_redirects, stats.total_reviews),
            estimated_revenue_saved,
            rating_without_protection: one_decimal(weighted(1), stats.total_reviews),
            rating_with_protection: one_decimal(weighted(4), stats.google_redirects),
            months_active,
            total_cost,
            roi_multiplier: if total_cost > 0 {
                (estimated_revenue_saved as f64 / total_cost as f64).round() as i64
            } else {
                0
            },
        }
    }
}

fn percentage(part: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as i64
}

fn one_decimal(sum: i64, count: i64) -> Decimal {
    if count == 0 {
        return Decimal::new(0, 1);
    }
    (Decimal::from(sum) / Decimal::from(count))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDashboard {
    pub business: Business,
    pub stats: ReviewStats,
    pub value: ValueReport,
    pub recent_reviews: Vec<Review>,
    pub subscription: Option<Subscription>,
    pub payments: Vec<PaymentResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalOverview {
    pub businesses: Vec<Business>,
    pub admins: Vec<Admin>,
    pub subscriptions: Vec<Subscription>,
    pub payments: Vec<PaymentResponse>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Dashboard {
    Tenant(Box<TenantDashboard>),
    Global(GlobalOverview),
}
