use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{Money, Order, Product, UserProfile};
use serde::{Deserialize, Serialize};

use crate::Result;

/// One month's summed order income.
///
/// `month` is the calendar month number (1–12) of order creation; rows
/// come back in whatever order the grouping produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyIncome {
    pub month: u32,
    pub total: Money,
}

/// Order document persistence.
///
/// All implementations must be thread-safe (Send + Sync). Reads return
/// documents in the store's natural (insertion) order.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a freshly created order at version 0.
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Point lookup by id. Returns None when no order has that id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// All orders owned by `user`, unfiltered by status.
    async fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>>;

    /// Every order in the store. No pagination; the full result set is
    /// materialized.
    async fn all_orders(&self) -> Result<Vec<Order>>;

    /// The user's order with an open cart, if any. At most one exists.
    async fn find_open_cart(&self, user: UserId) -> Result<Option<Order>>;

    /// Saves the mutable portion of an order (cart, cart status,
    /// fulfillment status, delivery timestamp).
    ///
    /// The save succeeds only if the stored version still equals
    /// `order.version`; otherwise it fails with `VersionConflict` and
    /// the caller must re-read. Returns the new version.
    async fn update_order(&self, order: &Order) -> Result<i64>;

    /// Persists a status transition together with its stock decrements.
    ///
    /// The order save and every decrement apply atomically: any missing
    /// product, insufficient stock, or version conflict fails the whole
    /// operation with no change applied.
    async fn apply_fulfillment(
        &self,
        order: &Order,
        decrements: &[(ProductId, u32)],
    ) -> Result<i64>;

    /// Sums `total_price` grouped by calendar month of creation over
    /// orders created at or after `since`.
    async fn monthly_income(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyIncome>>;
}

/// Product catalog persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Inserts a new product.
    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Point lookup by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Every product in the catalog.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Replaces a product document. Fails with `ProductNotFound` when
    /// the product does not exist.
    async fn update_product(&self, product: &Product) -> Result<()>;

    /// Deletes a product. Returns false when nothing was deleted.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;
}

/// User display-profile persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts or replaces a profile.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()>;

    /// Point lookup by user id.
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>>;
}

/// Blanket trait for full store implementations, used to keep the
/// handler bounds short.
pub trait Store: OrderStore + ProductStore + UserStore + Clone + Send + Sync + 'static {}

impl<T> Store for T where T: OrderStore + ProductStore + UserStore + Clone + Send + Sync + 'static {}
