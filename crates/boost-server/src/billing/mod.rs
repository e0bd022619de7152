//! Stripe billing: the REST binding, webhook verification and decoding, and
//! the reconciliation of webhook events into local subscription state.

pub mod provider;
pub mod reconcile;
pub mod webhook;

pub use provider::{CheckoutRequest, CheckoutSession, PaymentProvider, StripeClient, StripeSubscription};
pub use webhook::{BillingEvent, StripeEvent};
