//! Product catalog entry.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A catalog product with its current stock level.
///
/// Stock is a plain count; it is decremented by fulfillment and must
/// never go negative. The guarded decrement lives in the store layer so
/// the check and the write happen under one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

impl Product {
    /// Creates a new product with a fresh identifier.
    pub fn new(name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            price,
            stock,
        }
    }

    /// Returns true if `quantity` units can be taken from stock.
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}
