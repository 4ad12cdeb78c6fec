//! Fulfillment state machine.

use serde::{Deserialize, Serialize};

/// The fulfillment stage of an order.
///
/// State transitions:
/// ```text
/// Processing ──► Shipped ──► Delivered
///      │                         ▲
///      └─────────────────────────┘
/// ```
///
/// Delivered is terminal; transitions only move forward. The target
/// status arrives from the client as a string and is rejected at
/// deserialization when it names no known stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, awaiting shipment.
    #[default]
    Processing,

    /// Order handed to the carrier.
    Shipped,

    /// Order delivered to the customer (terminal state).
    Delivered,
}

impl OrderStatus {
    fn rank(self) -> u8 {
        match self {
            OrderStatus::Processing => 0,
            OrderStatus::Shipped => 1,
            OrderStatus::Delivered => 2,
        }
    }

    /// Returns true if this is the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }

    /// Returns true if the order may move from this status to `target`.
    pub fn can_advance_to(&self, target: OrderStatus) -> bool {
        !self.is_terminal() && target.rank() > self.rank()
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an order's cart is still open for mutation.
///
/// Cart operations locate "the" order for a user by this flag alone,
/// so at most one `Open` order may exist per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CartStatus {
    /// Cart may still be mutated; invisible to fulfillment.
    Open,

    /// Order was placed through checkout; cart is frozen.
    #[default]
    CheckedOut,
}

impl CartStatus {
    /// Returns true if cart entries may still be added.
    pub fn is_open(&self) -> bool {
        matches!(self, CartStatus::Open)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Open => "Open",
            CartStatus::CheckedOut => "CheckedOut",
        }
    }
}
