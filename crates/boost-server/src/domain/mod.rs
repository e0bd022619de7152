mod admin;
mod business;
mod dashboard;
mod payment;
mod product;
mod review;
mod subscription;

pub use admin::*;
pub use business::*;
pub use dashboard::*;
pub use payment::*;
pub use product::*;
pub use review::*;
pub use subscription::*;
