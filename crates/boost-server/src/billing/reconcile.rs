//! Turns billing events into local subscription and payment rows.
//!
//! `plan` decides what to write and touches nothing. `apply` runs each
//! mutation as its own statement; a failed write is logged and the rest
//! still run. There is no transaction across mutations, so redelivery of an
//! event is only safe where a mutation's conflict key makes it so.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::provider::StripeSubscription;
use super::webhook::{BillingEvent, StripeInvoice};
use crate::domain::{PaymentStatus, SubscriptionStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub stripe_subscription_id: String,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

impl From<&StripeSubscription> for SubscriptionSnapshot {
    fn from(sub: &StripeSubscription) -> Self {
        Self {
            stripe_subscription_id: sub.id.clone(),
            status: sub.status,
            current_period_start: sub.period_start(),
            current_period_end: sub.period_end(),
            cancel_at_period_end: sub.cancel_at_period_end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub stripe_subscription_id: String,
    pub stripe_invoice_id: String,
    pub stripe_payment_intent_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    LinkCustomer {
        business_id: Uuid,
        customer_id: String,
    },
    UpsertSubscription {
        business_id: Uuid,
        customer_id: Option<String>,
        snapshot: SubscriptionSnapshot,
    },
    /// Matches by Stripe id only; no local row means nothing happens.
    UpdateSubscription { snapshot: SubscriptionSnapshot },
    MarkPastDue { stripe_subscription_id: String },
    RecordPayment(PaymentRecord),
}

/// What makes a mutation safe to repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKey<'a> {
    Business(Uuid),
    StripeSubscription(&'a str),
    /// Repeating the mutation repeats the write.
    None,
}

impl Mutation {
    pub fn conflict_key(&self) -> ConflictKey<'_> {
        match self {
            Self::LinkCustomer { business_id, .. } => ConflictKey::Business(*business_id),
            Self::UpsertSubscription { snapshot, .. } | Self::UpdateSubscription { snapshot } => {
                ConflictKey::StripeSubscription(&snapshot.stripe_subscription_id)
            }
            Self::MarkPastDue {
                stripe_subscription_id,
            } => ConflictKey::StripeSubscription(stripe_subscription_id),
            Self::RecordPayment(_) => ConflictKey::None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::LinkCustomer { .. } => "link_customer",
            Self::UpsertSubscription { .. } => "upsert_subscription",
            Self::UpdateSubscription { .. } => "update_subscription",
            Self::MarkPastDue { .. } => "mark_past_due",
            Self::RecordPayment(_) => "record_payment",
        }
    }
}

/// `fetched` is the subscription named by a completed checkout, as returned
/// by the payment provider. Without it a checkout plans nothing.
pub fn plan(
    event: &BillingEvent,
    fetched: Option<&StripeSubscription>,
    now: DateTime<Utc>,
) -> Vec<Mutation> {
    match event {
        BillingEvent::CheckoutCompleted(session) => {
            if !session.is_subscription() {
                return Vec::new();
            }
            let (Some(business_id), Some(sub)) = (session.business_id(), fetched) else {
                return Vec::new();
            };
            let customer_id = session.customer.clone().or_else(|| sub.customer.clone());

            let mut mutations = Vec::with_capacity(2);
            if let Some(customer_id) = &customer_id {
                mutations.push(Mutation::LinkCustomer {
                    business_id,
                    customer_id: customer_id.clone(),
                });
            }
            mutations.push(Mutation::UpsertSubscription {
                business_id,
                customer_id,
                snapshot: sub.into(),
            });
            mutations
        }
        BillingEvent::SubscriptionUpdated(sub) | BillingEvent::SubscriptionDeleted(sub) => {
            vec![Mutation::UpdateSubscription {
                snapshot: sub.into(),
            }]
        }
        BillingEvent::InvoicePaid(invoice) => invoice
            .subscription
            .as_ref()
            .map(|sub_id| {
                vec![Mutation::RecordPayment(PaymentRecord {
                    stripe_subscription_id: sub_id.clone(),
                    stripe_invoice_id: invoice.id.clone(),
                    stripe_payment_intent_id: invoice.payment_intent.clone(),
                    amount_cents: invoice.amount_paid,
                    currency: invoice.currency.clone(),
                    status: PaymentStatus::Succeeded,
                    paid_at: Some(invoice.paid_at().unwrap_or(now)),
                })]
            })
            .unwrap_or_default(),
        BillingEvent::InvoicePaymentFailed(invoice) => invoice
            .subscription
            .as_ref()
            .map(|sub_id| failed_payment(sub_id, invoice))
            .unwrap_or_default(),
        BillingEvent::Ignored { .. } => Vec::new(),
    }
}

fn failed_payment(sub_id: &str, invoice: &StripeInvoice) -> Vec<Mutation> {
    vec![
        Mutation::MarkPastDue {
            stripe_subscription_id: sub_id.to_string(),
        },
        Mutation::RecordPayment(PaymentRecord {
            stripe_subscription_id: sub_id.to_string(),
            stripe_invoice_id: invoice.id.clone(),
            stripe_payment_intent_id: invoice.payment_intent.clone(),
            amount_cents: invoice.amount_due,
            currency: invoice.currency.clone(),
            status: PaymentStatus::Failed,
            paid_at: None,
        }),
    ]
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    /// Targeted rows that do not exist locally.
    pub unmatched: usize,
    pub failed: usize,
}

enum Outcome {
    Applied,
    Unmatched,
}

pub async fn apply(db: &PgPool, event_id: &str, mutations: &[Mutation]) -> ApplyReport {
    let mut report = ApplyReport::default();

    for mutation in mutations {
        match apply_one(db, mutation).await {
            Ok(Outcome::Applied) => {
                debug!(event_id, mutation = mutation.kind(), "mutation applied");
                report.applied += 1;
            }
            Ok(Outcome::Unmatched) => report.unmatched += 1,
            Err(e) => {
                warn!(
                    event_id,
                    mutation = mutation.kind(),
                    conflict_key = ?mutation.conflict_key(),
                    error = %e,
                    "billing mutation failed"
                );
                report.failed += 1;
            }
        }
    }

    info!(
        event_id,
        applied = report.applied,
        unmatched = report.unmatched,
        failed = report.failed,
        "billing event reconciled"
    );
    report
}

async fn apply_one(db: &PgPool, mutation: &Mutation) -> Result<Outcome, sqlx::Error> {
    let now = Utc::now();

    match mutation {
        Mutation::LinkCustomer {
            business_id,
            customer_id,
        } => {
            let result = sqlx::query(
                "UPDATE businesses SET stripe_customer_id = $2, updated_at = $3 WHERE id = $1",
            )
            .bind(business_id)
            .bind(customer_id)
            .bind(now)
            .execute(db)
            .await?;

            if result.rows_affected() == 0 {
                warn!(%business_id, "checkout completed for unknown business");
                return Ok(Outcome::Unmatched);
            }
        }
        Mutation::UpsertSubscription {
            business_id,
            customer_id,
            snapshot,
        } => {
            sqlx::query(
                r#"
                INSERT INTO subscriptions (
                    id, business_id, stripe_customer_id, stripe_subscription_id, status,
                    current_period_start, current_period_end, cancel_at_period_end,
                    created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
                ON CONFLICT (stripe_subscription_id) DO UPDATE
                SET business_id = EXCLUDED.business_id,
                    stripe_customer_id = EXCLUDED.stripe_customer_id,
                    status = EXCLUDED.status,
                    current_period_start = EXCLUDED.current_period_start,
                    current_period_end = EXCLUDED.current_period_end,
                    cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(business_id)
            .bind(customer_id)
            .bind(&snapshot.stripe_subscription_id)
            .bind(snapshot.status)
            .bind(snapshot.current_period_start)
            .bind(snapshot.current_period_end)
            .bind(snapshot.cancel_at_period_end)
            .bind(now)
            .execute(db)
            .await?;
        }
        Mutation::UpdateSubscription { snapshot } => {
            let result = sqlx::query(
                r#"
                UPDATE subscriptions
                SET status = $2,
                    current_period_start = $3,
                    current_period_end = $4,
                    cancel_at_period_end = $5,
                    updated_at = $6
                WHERE stripe_subscription_id = $1
                "#,
            )
            .bind(&snapshot.stripe_subscription_id)
            .bind(snapshot.status)
            .bind(snapshot.current_period_start)
            .bind(snapshot.current_period_end)
            .bind(snapshot.cancel_at_period_end)
            .bind(now)
            .execute(db)
            .await?;

            if result.rows_affected() == 0 {
                debug!(
                    stripe_subscription_id = %snapshot.stripe_subscription_id,
                    "subscription update for unknown subscription ignored"
                );
                return Ok(Outcome::Unmatched);
            }
        }
        Mutation::MarkPastDue {
            stripe_subscription_id,
        } => {
            let result = sqlx::query(
                "UPDATE subscriptions SET status = $2, updated_at = $3 WHERE stripe_subscription_id = $1",
            )
            .bind(stripe_subscription_id)
            .bind(SubscriptionStatus::PastDue)
            .bind(now)
            .execute(db)
            .await?;

            if result.rows_affected() == 0 {
                debug!(%stripe_subscription_id, "payment failure for unknown subscription");
                return Ok(Outcome::Unmatched);
            }
        }
        Mutation::RecordPayment(record) => {
            let subscription_id: Option<Uuid> =
                sqlx::query_scalar("SELECT id FROM subscriptions WHERE stripe_subscription_id = $1")
                    .bind(&record.stripe_subscription_id)
                    .fetch_optional(db)
                    .await?;

            let Some(subscription_id) = subscription_id else {
                warn!(
                    stripe_subscription_id = %record.stripe_subscription_id,
                    stripe_invoice_id = %record.stripe_invoice_id,
                    "payment dropped, no local subscription"
                );
                return Ok(Outcome::Unmatched);
            };

            sqlx::query(
                r#"
                INSERT INTO payments (
                    id, subscription_id, stripe_invoice_id, stripe_payment_intent_id,
                    amount_cents, currency, status, paid_at, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(subscription_id)
            .bind(&record.stripe_invoice_id)
            .bind(&record.stripe_payment_intent_id)
            .bind(record.amount_cents)
            .bind(&record.currency)
            .bind(record.status)
            .bind(record.paid_at)
            .bind(now)
            .execute(db)
            .await?;
        }
    }

    Ok(Outcome::Applied)
}
