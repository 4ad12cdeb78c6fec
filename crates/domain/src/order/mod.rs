//! Order document and related types.

mod model;
mod status;
mod value_objects;

pub use model::{NewOrder, Order};
pub use status::{CartStatus, OrderStatus};
pub use value_objects::{CartEntry, OrderLine};

use common::OrderId;
use thiserror::Error;

/// Errors that can occur during order lifecycle operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Requested status is not reachable from the current one.
    #[error("invalid status transition: cannot move from {current} to {requested}")]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    /// Order already reached the terminal status.
    #[error("order {order_id} has already been delivered")]
    AlreadyDelivered { order_id: OrderId },

    /// Checkout payload carried no manifest lines.
    #[error("order has no items")]
    NoItems,

    /// Quantity must be positive.
    #[error("invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Cart mutation attempted on a checked-out order.
    #[error("cart of order {order_id} is no longer open")]
    CartClosed { order_id: OrderId },
}
