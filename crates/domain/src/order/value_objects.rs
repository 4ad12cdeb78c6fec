//! Line-item value objects for the order document.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A finalized line in an order's purchase manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// The referenced product.
    pub product: ProductId,

    /// Number of units purchased.
    pub quantity: u32,

    /// Unit price captured at checkout; not recomputed afterwards.
    pub price: Money,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(product: ProductId, quantity: u32, price: Money) -> Self {
        Self {
            product,
            quantity,
            price,
        }
    }

    /// Returns the line total (quantity * price).
    pub fn line_total(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// A staged entry in an order's pre-checkout cart.
///
/// Exactly one entry exists per distinct product; repeated adds merge
/// into the existing entry's quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// The referenced product.
    pub product: ProductId,

    /// Staged quantity, incremented on repeated adds.
    pub quantity: u32,

    /// Unit price captured when the product was first added.
    pub price: Money,
}

impl CartEntry {
    /// Creates a new cart entry.
    pub fn new(product: ProductId, quantity: u32, price: Money) -> Self {
        Self {
            product,
            quantity,
            price,
        }
    }
}
