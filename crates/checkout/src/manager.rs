//! The lifecycle manager over the persistence traits.

use chrono::{Months, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{CartEntry, Money, NewOrder, Order, OrderStatus, UserProfile};
use store::{MonthlyIncome, OrderStore, ProductStore, UserStore};

use crate::error::{CheckoutError, Result};

/// An order paired with its owner's display identity, when known.
#[derive(Debug, Clone)]
pub struct OrderWithOwner {
    pub order: Order,
    pub owner: Option<UserProfile>,
}

/// The full order list plus the derived income total.
#[derive(Debug, Clone)]
pub struct OrdersWithTotal {
    pub orders: Vec<Order>,
    pub total_amount: Money,
}

/// Order & cart lifecycle manager.
///
/// Every operation is a short read-check-write against the store; the
/// store's optimistic version check turns concurrent cart mutations for
/// the same user into an explicit conflict instead of a lost update.
#[derive(Clone)]
pub struct OrderManager<S> {
    store: S,
}

impl<S> OrderManager<S>
where
    S: OrderStore + ProductStore + UserStore,
{
    /// Creates a new manager over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates and persists a checked-out order from a full payload.
    ///
    /// `paid_at` is stamped with the current time; price fields are
    /// persisted as supplied, without recomputation.
    #[tracing::instrument(skip(self, payload))]
    pub async fn place_order(&self, user: UserId, payload: NewOrder) -> Result<Order> {
        let order = Order::checkout(user, payload)?;
        self.store.insert_order(&order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, %user, "order placed");
        Ok(order)
    }

    /// Fetches one order by id with the owner's profile projected in.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<OrderWithOwner> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(id))?;

        let owner = self.store.get_profile(order.user).await?;
        Ok(OrderWithOwner { order, owner })
    }

    /// All orders owned by the caller, in the store's natural order.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(user).await?)
    }

    /// Every order plus the summed `total_price` across them.
    #[tracing::instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<OrdersWithTotal> {
        let orders = self.store.all_orders().await?;
        let total_amount = orders.iter().map(|o| o.total_price).sum();
        Ok(OrdersWithTotal {
            orders,
            total_amount,
        })
    }

    /// Advances an order's fulfillment status and applies the manifest's
    /// stock decrements.
    ///
    /// The status write and all decrements land atomically; the response
    /// is only produced after everything is persisted. A terminal order
    /// or a non-forward target fails without touching anything.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, target: OrderStatus) -> Result<()> {
        let mut order = self
            .store
            .get_order(id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(id))?;

        order.advance_status(target)?;

        let decrements: Vec<(ProductId, u32)> = order.stock_decrements().collect();
        self.store.apply_fulfillment(&order, &decrements).await?;

        metrics::counter!("orders_fulfilled_total").increment(1);
        tracing::info!(order_id = %id, status = %target, "order status advanced");
        Ok(())
    }

    /// Merges a product into the caller's open cart, creating the cart
    /// order on first touch.
    ///
    /// The unit price is captured from the catalog at add time. No stock
    /// check is made here; stock is only consumed by fulfillment.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<()> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound(product_id))?;

        match self.store.find_open_cart(user).await? {
            None => {
                let entry = CartEntry::new(product.id, quantity, product.price);
                let order = Order::open_cart(user, entry)?;
                self.store.insert_order(&order).await?;
            }
            Some(mut order) => {
                order.add_to_cart(product.id, quantity, product.price)?;
                self.store.update_order(&order).await?;
            }
        }

        metrics::counter!("cart_items_added_total").increment(1);
        Ok(())
    }

    /// Sums order income per calendar month over the trailing year.
    ///
    /// Rows arrive in the store's grouping order; callers must not
    /// assume ascending months.
    #[tracing::instrument(skip(self))]
    pub async fn monthly_income(&self) -> Result<Vec<MonthlyIncome>> {
        let now = Utc::now();
        let since = now.checked_sub_months(Months::new(12)).unwrap_or(now);
        Ok(self.store.monthly_income(since).await?)
    }
}
