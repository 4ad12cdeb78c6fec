use common::{OrderId, ProductId, UserId};
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The saved document's version no longer matches the stored one.
    /// Another writer got in between the read and the save.
    #[error("version conflict saving order {order_id}: expected version {expected}")]
    VersionConflict { order_id: OrderId, expected: i64 },

    /// The order to save does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// A manifest line references a product that is not in the catalog.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// A stock decrement would drive the product's stock negative.
    #[error("insufficient stock for product {product_id}: {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
    },

    /// A second open cart was inserted for the same user.
    #[error("user {0} already has an open cart")]
    OpenCartExists(UserId),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row could not be mapped back to a document.
    #[error("invalid stored document: {0}")]
    InvalidDocument(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
