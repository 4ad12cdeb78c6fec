//! Order & Cart lifecycle manager.
//!
//! Owns the order document's lifecycle over the persistence traits:
//! creation, cart mutation, status transition with stock side effects,
//! and the monthly income report. Auth, product CRUD, and HTTP concerns
//! live in the neighboring crates.

pub mod error;
pub mod manager;

pub use error::CheckoutError;
pub use manager::{OrderManager, OrderWithOwner, OrdersWithTotal};
