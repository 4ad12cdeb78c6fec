//! The order document and its lifecycle operations.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

use super::status::{CartStatus, OrderStatus};
use super::value_objects::{CartEntry, OrderLine};
use super::OrderError;

/// Caller-supplied payload for checkout-style order creation.
///
/// Prices arrive pre-computed and are persisted as-is; the shipping and
/// payment blobs are opaque to this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_items: Vec<OrderLine>,
    pub shipping_info: serde_json::Value,
    pub payment_info: serde_json::Value,
    pub items_price: Money,
    pub tax_price: Money,
    pub shipping_price: Money,
    pub total_price: Money,
}

/// A purchase record: finalized manifest, staging cart, totals, and
/// fulfillment status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Assigned at creation, immutable.
    pub id: OrderId,

    /// Owning identity; never reassigned.
    pub user: UserId,

    /// Finalized purchase manifest, immutable after creation.
    pub order_items: Vec<OrderLine>,

    /// Mutable pre-checkout staging area, one entry per distinct product.
    pub cart: Vec<CartEntry>,

    /// Whether the cart may still be mutated.
    pub cart_status: CartStatus,

    /// Opaque shipping details supplied by the caller.
    pub shipping_info: serde_json::Value,

    /// Opaque payment details supplied by the caller.
    pub payment_info: serde_json::Value,

    pub items_price: Money,
    pub tax_price: Money,
    pub shipping_price: Money,
    pub total_price: Money,

    /// Fulfillment stage, see [`OrderStatus`].
    pub order_status: OrderStatus,

    /// Stamped at creation time, mirroring the upstream checkout flow
    /// where payment is confirmed before the order is recorded.
    pub paid_at: DateTime<Utc>,

    /// Set only when the order reaches [`OrderStatus::Delivered`].
    pub delivered_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    /// Optimistic-concurrency token, bumped by the store on every save.
    pub version: i64,
}

impl Order {
    /// Creates a checked-out order from a full checkout payload.
    ///
    /// The manifest must be non-empty and every line quantity positive;
    /// the price fields are trusted without cross-checking against the
    /// manifest.
    pub fn checkout(user: UserId, payload: NewOrder) -> Result<Self, OrderError> {
        if payload.order_items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for line in &payload.order_items {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity { quantity: 0 });
            }
        }

        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            user,
            order_items: payload.order_items,
            cart: Vec::new(),
            cart_status: CartStatus::CheckedOut,
            shipping_info: payload.shipping_info,
            payment_info: payload.payment_info,
            items_price: payload.items_price,
            tax_price: payload.tax_price,
            shipping_price: payload.shipping_price,
            total_price: payload.total_price,
            order_status: OrderStatus::Processing,
            paid_at: now,
            delivered_at: None,
            created_at: now,
            version: 0,
        })
    }

    /// Creates an order lazily from a first cart touch.
    ///
    /// The manifest and totals stay empty until checkout; only the cart
    /// carries content.
    pub fn open_cart(user: UserId, entry: CartEntry) -> Result<Self, OrderError> {
        if entry.quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity: 0 });
        }

        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            user,
            order_items: Vec::new(),
            cart: vec![entry],
            cart_status: CartStatus::Open,
            shipping_info: serde_json::Value::Null,
            payment_info: serde_json::Value::Null,
            items_price: Money::zero(),
            tax_price: Money::zero(),
            shipping_price: Money::zero(),
            total_price: Money::zero(),
            order_status: OrderStatus::Processing,
            paid_at: now,
            delivered_at: None,
            created_at: now,
            version: 0,
        })
    }

    /// Merges a product into the cart.
    ///
    /// An existing entry for the product gets its quantity incremented;
    /// otherwise a new entry is appended, preserving first-seen order.
    /// The captured price of an existing entry is kept.
    pub fn add_to_cart(
        &mut self,
        product: ProductId,
        quantity: u32,
        price: Money,
    ) -> Result<(), OrderError> {
        if !self.cart_status.is_open() {
            return Err(OrderError::CartClosed { order_id: self.id });
        }
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity: 0 });
        }

        match self.cart.iter_mut().find(|e| e.product == product) {
            Some(entry) => entry.quantity += quantity,
            None => self.cart.push(CartEntry::new(product, quantity, price)),
        }
        Ok(())
    }

    /// Advances the fulfillment status.
    ///
    /// Fails on a terminal order and on any non-forward move.
    /// `delivered_at` is stamped only when the target is `Delivered`.
    pub fn advance_status(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        if self.order_status.is_terminal() {
            return Err(OrderError::AlreadyDelivered { order_id: self.id });
        }
        if !self.order_status.can_advance_to(target) {
            return Err(OrderError::InvalidTransition {
                current: self.order_status,
                requested: target,
            });
        }

        self.order_status = target;
        if target == OrderStatus::Delivered {
            self.delivered_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Stock decrements implied by the manifest, one per line.
    pub fn stock_decrements(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.order_items
            .iter()
            .map(|line| (line.product, line.quantity))
    }
}
