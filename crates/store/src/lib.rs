//! Persistence layer for the shop backend.
//!
//! Defines the [`OrderStore`], [`ProductStore`], and [`UserStore`]
//! traits together with two implementations:
//! - [`MemoryStore`] — single-lock in-memory store for tests and the
//!   default server mode
//! - [`PostgresStore`] — sqlx-backed store with JSONB document columns
//!
//! Whole-document saves use an optimistic version check; fulfillment
//! applies the order write and all stock decrements in one transaction.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::{MonthlyIncome, OrderStore, ProductStore, Store, UserStore};
