use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{CartStatus, Money, Order, Product, UserProfile};
use tokio::sync::RwLock;

use crate::store::{MonthlyIncome, OrderStore, ProductStore, UserStore};
use crate::{Result, StoreError};

#[derive(Default)]
struct Inner {
    // Vec keeps the store's natural (insertion) order for scans.
    orders: Vec<Order>,
    products: HashMap<ProductId, Product>,
    profiles: HashMap<UserId, UserProfile>,
}

/// In-memory store for tests and the default server mode.
///
/// A single lock guards all collections, so multi-document operations
/// (fulfillment) are atomic within one call, matching the transactional
/// behavior of the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Clears all collections.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.orders.clear();
        inner.products.clear();
        inner.profiles.clear();
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut inner = self.inner.write().await;

        if order.cart_status == CartStatus::Open
            && inner
                .orders
                .iter()
                .any(|o| o.user == order.user && o.cart_status == CartStatus::Open)
        {
            return Err(StoreError::OpenCartExists(order.user));
        }

        inner.orders.push(order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .filter(|o| o.user == user)
            .cloned()
            .collect())
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.clone())
    }

    async fn find_open_cart(&self, user: UserId) -> Result<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .find(|o| o.user == user && o.cart_status == CartStatus::Open)
            .cloned())
    }

    async fn update_order(&self, order: &Order) -> Result<i64> {
        let mut inner = self.inner.write().await;

        let stored = inner
            .orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or(StoreError::OrderNotFound(order.id))?;

        if stored.version != order.version {
            return Err(StoreError::VersionConflict {
                order_id: order.id,
                expected: order.version,
            });
        }

        *stored = order.clone();
        stored.version += 1;
        Ok(stored.version)
    }

    async fn apply_fulfillment(
        &self,
        order: &Order,
        decrements: &[(ProductId, u32)],
    ) -> Result<i64> {
        let mut inner = self.inner.write().await;

        let position = inner
            .orders
            .iter()
            .position(|o| o.id == order.id)
            .ok_or(StoreError::OrderNotFound(order.id))?;

        if inner.orders[position].version != order.version {
            return Err(StoreError::VersionConflict {
                order_id: order.id,
                expected: order.version,
            });
        }

        // A manifest may repeat a product, so decrements are summed per
        // product and validated against the combined quantity before
        // anything is touched. A failure leaves no partial state behind.
        let mut needed: HashMap<ProductId, u32> = HashMap::new();
        for &(product_id, quantity) in decrements {
            *needed.entry(product_id).or_default() += quantity;
        }

        for (&product_id, &quantity) in &needed {
            let product = inner
                .products
                .get(&product_id)
                .ok_or(StoreError::ProductNotFound(product_id))?;
            if !product.has_stock(quantity) {
                return Err(StoreError::InsufficientStock {
                    product_id,
                    requested: quantity,
                });
            }
        }

        for (product_id, quantity) in needed {
            if let Some(product) = inner.products.get_mut(&product_id) {
                product.stock -= quantity;
            }
        }

        let mut saved = order.clone();
        saved.version += 1;
        let new_version = saved.version;
        inner.orders[position] = saved;
        Ok(new_version)
    }

    async fn monthly_income(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyIncome>> {
        let inner = self.inner.read().await;

        let mut totals: HashMap<u32, Money> = HashMap::new();
        for order in inner.orders.iter().filter(|o| o.created_at >= since) {
            *totals.entry(order.created_at.month()).or_default() += order.total_price;
        }

        Ok(totals
            .into_iter()
            .map(|(month, total)| MonthlyIncome { month, total })
            .collect())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.values().cloned().collect())
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.products.get_mut(&product.id) {
            Some(stored) => {
                *stored = product.clone();
                Ok(())
            }
            None => Err(StoreError::ProductNotFound(product.id)),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.products.remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::{CartEntry, NewOrder, OrderLine};

    fn checkout_order(user: UserId, total_cents: i64) -> Order {
        Order::checkout(
            user,
            NewOrder {
                order_items: vec![OrderLine::new(ProductId::new(), 1, Money::from_cents(100))],
                shipping_info: serde_json::Value::Null,
                payment_info: serde_json::Value::Null,
                items_price: Money::from_cents(total_cents),
                tax_price: Money::zero(),
                shipping_price: Money::zero(),
                total_price: Money::from_cents(total_cents),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_order() {
        let store = MemoryStore::new();
        let order = checkout_order(UserId::new(), 1000);

        store.insert_order(&order).await.unwrap();
        let fetched = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(fetched, order);
    }

    #[tokio::test]
    async fn test_get_missing_order_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get_order(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_orders_for_user_preserves_insertion_order() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let first = checkout_order(user, 100);
        let second = checkout_order(user, 200);
        let other = checkout_order(UserId::new(), 300);

        store.insert_order(&first).await.unwrap();
        store.insert_order(&other).await.unwrap();
        store.insert_order(&second).await.unwrap();

        let orders = store.orders_for_user(user).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, first.id);
        assert_eq!(orders[1].id, second.id);
    }

    #[tokio::test]
    async fn test_second_open_cart_rejected() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let entry = CartEntry::new(ProductId::new(), 1, Money::from_cents(100));
        let cart = Order::open_cart(user, entry.clone()).unwrap();

        store.insert_order(&cart).await.unwrap();

        let second = Order::open_cart(user, entry).unwrap();
        let err = store.insert_order(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::OpenCartExists(u) if u == user));
    }

    #[tokio::test]
    async fn test_update_order_bumps_version() {
        let store = MemoryStore::new();
        let order = checkout_order(UserId::new(), 1000);
        store.insert_order(&order).await.unwrap();

        let new_version = store.update_order(&order).await.unwrap();
        assert_eq!(new_version, 1);
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts() {
        let store = MemoryStore::new();
        let order = checkout_order(UserId::new(), 1000);
        store.insert_order(&order).await.unwrap();
        store.update_order(&order).await.unwrap();

        // Still at version 0, the store is at 1.
        let err = store.update_order(&order).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));
    }

    #[tokio::test]
    async fn test_fulfillment_decrements_stock_atomically() {
        let store = MemoryStore::new();
        let p1 = Product::new("Widget", Money::from_cents(100), 5);
        let p2 = Product::new("Gadget", Money::from_cents(200), 5);
        store.insert_product(&p1).await.unwrap();
        store.insert_product(&p2).await.unwrap();

        let order = checkout_order(UserId::new(), 1000);
        store.insert_order(&order).await.unwrap();

        store
            .apply_fulfillment(&order, &[(p1.id, 2), (p2.id, 3)])
            .await
            .unwrap();

        assert_eq!(store.get_product(p1.id).await.unwrap().unwrap().stock, 3);
        assert_eq!(store.get_product(p2.id).await.unwrap().unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_everything_untouched() {
        let store = MemoryStore::new();
        let p1 = Product::new("Widget", Money::from_cents(100), 5);
        let p2 = Product::new("Gadget", Money::from_cents(200), 1);
        store.insert_product(&p1).await.unwrap();
        store.insert_product(&p2).await.unwrap();

        let order = checkout_order(UserId::new(), 1000);
        store.insert_order(&order).await.unwrap();

        let err = store
            .apply_fulfillment(&order, &[(p1.id, 2), (p2.id, 3)])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::InsufficientStock { .. }));
        // First decrement in the list must not have been applied.
        assert_eq!(store.get_product(p1.id).await.unwrap().unwrap().stock, 5);
        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 0);
    }

    #[tokio::test]
    async fn test_duplicate_manifest_lines_checked_against_combined_quantity() {
        let store = MemoryStore::new();
        let product = Product::new("Widget", Money::from_cents(100), 3);
        store.insert_product(&product).await.unwrap();

        let order = checkout_order(UserId::new(), 1000);
        store.insert_order(&order).await.unwrap();

        // 2 + 2 exceeds the stock of 3 even though each line alone fits.
        let err = store
            .apply_fulfillment(&order, &[(product.id, 2), (product.id, 2)])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::InsufficientStock { .. }));
        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 3);
        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 0);
    }

    #[tokio::test]
    async fn test_duplicate_manifest_lines_decrement_once_with_their_sum() {
        let store = MemoryStore::new();
        let product = Product::new("Widget", Money::from_cents(100), 4);
        store.insert_product(&product).await.unwrap();

        let order = checkout_order(UserId::new(), 1000);
        store.insert_order(&order).await.unwrap();

        store
            .apply_fulfillment(&order, &[(product.id, 2), (product.id, 2)])
            .await
            .unwrap();

        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_monthly_income_groups_by_calendar_month() {
        let store = MemoryStore::new();
        let user = UserId::new();

        let mut a = checkout_order(user, 100);
        let mut b = checkout_order(user, 200);
        let mut c = checkout_order(user, 50);
        a.created_at = Utc::now() - Duration::days(40);
        b.created_at = a.created_at;
        c.created_at = Utc::now();

        for order in [&a, &b, &c] {
            store.insert_order(order).await.unwrap();
        }

        let report = store
            .monthly_income(Utc::now() - Duration::days(365))
            .await
            .unwrap();

        assert_eq!(report.len(), 2);
        let month_a = a.created_at.month();
        let month_c = c.created_at.month();
        let total_for = |m: u32| {
            report
                .iter()
                .find(|r| r.month == m)
                .map(|r| r.total.cents())
        };
        assert_eq!(total_for(month_a), Some(300));
        assert_eq!(total_for(month_c), Some(50));
    }

    #[tokio::test]
    async fn test_monthly_income_excludes_orders_before_cutoff() {
        let store = MemoryStore::new();
        let mut old = checkout_order(UserId::new(), 999);
        old.created_at = Utc::now() - Duration::days(400);
        store.insert_order(&old).await.unwrap();

        let report = store
            .monthly_income(Utc::now() - Duration::days(365))
            .await
            .unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_product_crud_roundtrip() {
        let store = MemoryStore::new();
        let mut product = Product::new("Widget", Money::from_cents(100), 5);

        store.insert_product(&product).await.unwrap();
        product.stock = 7;
        store.update_product(&product).await.unwrap();

        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 7);
        assert!(store.delete_product(product.id).await.unwrap());
        assert!(!store.delete_product(product.id).await.unwrap());
        assert!(store.get_product(product.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_product_fails() {
        let store = MemoryStore::new();
        let product = Product::new("Ghost", Money::from_cents(100), 1);

        let err = store.update_product(&product).await.unwrap_err();
        assert!(matches!(err, StoreError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_profile_upsert_and_get() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let profile = UserProfile::new(user, "An Nguyen", "an@example.com");

        store.upsert_profile(&profile).await.unwrap();
        let fetched = store.get_profile(user).await.unwrap().unwrap();
        assert_eq!(fetched.email, "an@example.com");
    }
}
