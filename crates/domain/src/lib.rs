//! Domain layer for the shop backend.
//!
//! This crate provides the core entities and pure lifecycle logic:
//! - Order document with its finalized manifest and mutable cart
//! - Fulfillment state machine (Processing → Shipped → Delivered)
//! - Product catalog entry with guarded stock
//! - User display profile projected into order reads

pub mod money;
pub mod order;
pub mod product;
pub mod user;

pub use money::Money;
pub use order::{CartEntry, CartStatus, NewOrder, Order, OrderError, OrderLine, OrderStatus};
pub use product::Product;
pub use user::UserProfile;
