pub mod admin;
pub mod billing;
pub mod business;
pub mod review;
pub mod signup;
pub mod webhook;
