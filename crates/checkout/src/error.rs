//! Lifecycle manager error taxonomy.

use common::{OrderId, ProductId};
use domain::OrderError;
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the order & cart lifecycle manager.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No order has the requested id.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The referenced product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// A lifecycle rule was violated (terminal re-transition, empty
    /// manifest, zero quantity).
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The persistence layer failed or lost an optimistic race.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CheckoutError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => CheckoutError::OrderNotFound(id),
            StoreError::ProductNotFound(id) => CheckoutError::ProductNotFound(id),
            other => CheckoutError::Store(other),
        }
    }
}

/// Result type for manager operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;
