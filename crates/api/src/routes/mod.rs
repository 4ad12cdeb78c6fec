//! Route handlers grouped by resource.

pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod reports;
pub mod tokens;
