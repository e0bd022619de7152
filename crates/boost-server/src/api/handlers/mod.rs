pub mod admin;
pub mod billing;
pub mod businesses;
pub mod checkout;
pub mod health;
pub mod reviews;
pub mod signup;
pub mod webhooks;
