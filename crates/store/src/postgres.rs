use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{CartStatus, Money, Order, OrderStatus, Product, UserProfile};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::store::{MonthlyIncome, OrderStore, ProductStore, UserStore};
use crate::{Result, StoreError};

/// PostgreSQL-backed store.
///
/// Orders are stored one row per document with the nested sequences
/// (manifest, cart, shipping/payment blobs) in JSONB columns and the
/// queryable fields broken out. A `BIGSERIAL` column preserves the
/// store's natural order for scans.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        tracing::info!("connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            order_items: serde_json::from_value(row.try_get("order_items")?)?,
            cart: serde_json::from_value(row.try_get("cart")?)?,
            cart_status: cart_status_from_str(row.try_get("cart_status")?)?,
            shipping_info: row.try_get("shipping_info")?,
            payment_info: row.try_get("payment_info")?,
            items_price: Money::from_cents(row.try_get("items_price_cents")?),
            tax_price: Money::from_cents(row.try_get("tax_price_cents")?),
            shipping_price: Money::from_cents(row.try_get("shipping_price_cents")?),
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            order_status: order_status_from_str(row.try_get("order_status")?)?,
            paid_at: row.try_get("paid_at")?,
            delivered_at: row.try_get("delivered_at")?,
            created_at: row.try_get("created_at")?,
            version: row.try_get("version")?,
        })
    }
}

fn order_status_from_str(s: &str) -> Result<OrderStatus> {
    match s {
        "Processing" => Ok(OrderStatus::Processing),
        "Shipped" => Ok(OrderStatus::Shipped),
        "Delivered" => Ok(OrderStatus::Delivered),
        other => Err(StoreError::InvalidDocument(format!(
            "unknown order status: {other}"
        ))),
    }
}

fn cart_status_from_str(s: &str) -> Result<CartStatus> {
    match s {
        "Open" => Ok(CartStatus::Open),
        "CheckedOut" => Ok(CartStatus::CheckedOut),
        other => Err(StoreError::InvalidDocument(format!(
            "unknown cart status: {other}"
        ))),
    }
}

const SELECT_ORDER: &str = "SELECT id, user_id, cart_status, order_status, order_items, cart, \
     shipping_info, payment_info, items_price_cents, tax_price_cents, \
     shipping_price_cents, total_price_cents, paid_at, delivered_at, created_at, version \
     FROM orders";

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO orders (id, user_id, cart_status, order_status, order_items, cart, \
             shipping_info, payment_info, items_price_cents, tax_price_cents, \
             shipping_price_cents, total_price_cents, paid_at, delivered_at, created_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(order.id.as_uuid())
        .bind(order.user.as_uuid())
        .bind(order.cart_status.as_str())
        .bind(order.order_status.as_str())
        .bind(serde_json::to_value(&order.order_items)?)
        .bind(serde_json::to_value(&order.cart)?)
        .bind(&order.shipping_info)
        .bind(&order.payment_info)
        .bind(order.items_price.cents())
        .bind(order.tax_price.cents())
        .bind(order.shipping_price.cents())
        .bind(order.total_price.cents())
        .bind(order.paid_at)
        .bind(order.delivered_at)
        .bind(order.created_at)
        .bind(order.version)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db))
                if db.constraint() == Some("idx_orders_open_cart") =>
            {
                Err(StoreError::OpenCartExists(order.user))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!("{SELECT_ORDER} WHERE user_id = $1 ORDER BY seq"))
            .bind(user.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_order).collect()
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!("{SELECT_ORDER} ORDER BY seq"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_order).collect()
    }

    async fn find_open_cart(&self, user: UserId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "{SELECT_ORDER} WHERE user_id = $1 AND cart_status = 'Open'"
        ))
        .bind(user.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn update_order(&self, order: &Order) -> Result<i64> {
        // Only the mutable portion of the document is written; the
        // manifest, totals, and blobs are frozen at creation.
        let result = sqlx::query(
            "UPDATE orders SET cart = $2, cart_status = $3, order_status = $4, \
             delivered_at = $5, version = version + 1 \
             WHERE id = $1 AND version = $6",
        )
        .bind(order.id.as_uuid())
        .bind(serde_json::to_value(&order.cart)?)
        .bind(order.cart_status.as_str())
        .bind(order.order_status.as_str())
        .bind(order.delivered_at)
        .bind(order.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.stale_save_error(order).await?);
        }
        Ok(order.version + 1)
    }

    async fn apply_fulfillment(
        &self,
        order: &Order,
        decrements: &[(ProductId, u32)],
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE orders SET order_status = $2, delivered_at = $3, version = version + 1 \
             WHERE id = $1 AND version = $4",
        )
        .bind(order.id.as_uuid())
        .bind(order.order_status.as_str())
        .bind(order.delivered_at)
        .bind(order.version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(self.stale_save_error(order).await?);
        }

        for &(product_id, quantity) in decrements {
            let decremented =
                sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
                    .bind(product_id.as_uuid())
                    .bind(quantity as i32)
                    .execute(&mut *tx)
                    .await?;

            if decremented.rows_affected() == 0 {
                // Missing product and exhausted stock both land here;
                // the dropped transaction rolls everything back.
                let exists = sqlx::query("SELECT 1 FROM products WHERE id = $1")
                    .bind(product_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?
                    .is_some();

                return Err(if exists {
                    StoreError::InsufficientStock {
                        product_id,
                        requested: quantity,
                    }
                } else {
                    StoreError::ProductNotFound(product_id)
                });
            }
        }

        tx.commit().await?;
        Ok(order.version + 1)
    }

    async fn monthly_income(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyIncome>> {
        let rows = sqlx::query(
            "SELECT CAST(date_part('month', created_at) AS INTEGER) AS month, \
             CAST(SUM(total_price_cents) AS BIGINT) AS total \
             FROM orders WHERE created_at >= $1 GROUP BY 1",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(MonthlyIncome {
                    month: row.try_get::<i32, _>("month")? as u32,
                    total: Money::from_cents(row.try_get("total")?),
                })
            })
            .collect()
    }
}

impl PostgresStore {
    /// Decides whether a zero-row optimistic save means a missing order
    /// or a version conflict.
    async fn stale_save_error(&self, order: &Order) -> Result<StoreError> {
        let exists = sqlx::query("SELECT 1 FROM orders WHERE id = $1")
            .bind(order.id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        Ok(if exists {
            StoreError::VersionConflict {
                order_id: order.id,
                expected: order.version,
            }
        } else {
            StoreError::OrderNotFound(order.id)
        })
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query("INSERT INTO products (id, name, price_cents, stock) VALUES ($1, $2, $3, $4)")
            .bind(product.id.as_uuid())
            .bind(&product.name)
            .bind(product.price.cents())
            .bind(product.stock as i32)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT id, name, price_cents, stock FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(Product {
                id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
                name: row.try_get("name")?,
                price: Money::from_cents(row.try_get("price_cents")?),
                stock: row.try_get::<i32, _>("stock")? as u32,
            })
        })
        .transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query("SELECT id, name, price_cents, stock FROM products ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Product {
                    id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    name: row.try_get("name")?,
                    price: Money::from_cents(row.try_get("price_cents")?),
                    stock: row.try_get::<i32, _>("stock")? as u32,
                })
            })
            .collect()
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let result =
            sqlx::query("UPDATE products SET name = $2, price_cents = $3, stock = $4 WHERE id = $1")
                .bind(product.id.as_uuid())
                .bind(&product.name)
                .bind(product.price.cents())
                .bind(product.stock as i32)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(product.id));
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_profiles (id, name, email) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email",
        )
        .bind(profile.id.as_uuid())
        .bind(&profile.name)
        .bind(&profile.email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT id, name, email FROM user_profiles WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(UserProfile {
                id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
                name: row.try_get("name")?,
                email: row.try_get("email")?,
            })
        })
        .transpose()
    }
}
