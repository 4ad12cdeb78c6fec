//! Order creation, retrieval, and status transition endpoints.
//!
//! All money fields cross the wire as integer cents.

use auth::{AdminUser, AuthUser, TokenService};
use axum::Json;
use axum::extract::{FromRef, Path, State};
use checkout::OrderManager;
use common::{OrderId, ProductId, UserId};
use domain::{Money, NewOrder, Order, OrderLine, OrderStatus, UserProfile};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub manager: OrderManager<S>,
    pub tokens: TokenService,
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

impl<S: Store> FromRef<AppState<S>> for TokenService {
    fn from_ref(state: &AppState<S>) -> TokenService {
        state.tokens.clone()
    }
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order_items: Vec<OrderLineRequest>,
    pub shipping_info: serde_json::Value,
    pub payment_info: serde_json::Value,
    pub items_price: i64,
    pub tax_price: i64,
    pub shipping_price: i64,
    pub total_price: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product: ProductId,
    pub quantity: u32,
    pub price: i64,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(req: CreateOrderRequest) -> Self {
        NewOrder {
            order_items: req
                .order_items
                .into_iter()
                .map(|line| OrderLine::new(line.product, line.quantity, Money::from_cents(line.price)))
                .collect(),
            shipping_info: req.shipping_info,
            payment_info: req.payment_info,
            items_price: Money::from_cents(req.items_price),
            tax_price: Money::from_cents(req.tax_price),
            shipping_price: Money::from_cents(req.shipping_price),
            total_price: Money::from_cents(req.total_price),
        }
    }
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResponse {
    pub product: ProductId,
    pub quantity: u32,
    pub price: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: OrderId,
    pub user: UserRef,
    pub order_items: Vec<LineResponse>,
    pub cart: Vec<LineResponse>,
    pub order_status: String,
    pub items_price: i64,
    pub tax_price: i64,
    pub shipping_price: i64,
    pub total_price: i64,
    pub shipping_info: serde_json::Value,
    pub payment_info: serde_json::Value,
    pub paid_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,
    pub created_at: String,
}

impl OrderResponse {
    pub fn from_order(order: Order) -> Self {
        Self::with_owner(order, None)
    }

    pub fn with_owner(order: Order, owner: Option<UserProfile>) -> Self {
        let lines = |items: &[OrderLine]| {
            items
                .iter()
                .map(|line| LineResponse {
                    product: line.product,
                    quantity: line.quantity,
                    price: line.price.cents(),
                })
                .collect()
        };
        let cart: Vec<LineResponse> = order
            .cart
            .iter()
            .map(|entry| LineResponse {
                product: entry.product,
                quantity: entry.quantity,
                price: entry.price.cents(),
            })
            .collect();

        Self {
            id: order.id,
            user: UserRef {
                id: order.user,
                name: owner.as_ref().map(|p| p.name.clone()),
                email: owner.map(|p| p.email),
            },
            order_items: lines(&order.order_items),
            cart,
            order_status: order.order_status.to_string(),
            items_price: order.items_price.cents(),
            tax_price: order.tax_price.cents(),
            shipping_price: order.shipping_price.cents(),
            total_price: order.total_price.cents(),
            shipping_info: order.shipping_info,
            payment_info: order.payment_info,
            paid_at: order.paid_at.to_rfc3339(),
            delivered_at: order.delivered_at.map(|t| t.to_rfc3339()),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderEnvelope {
    pub success: bool,
    pub order: OrderResponse,
}

#[derive(Serialize)]
pub struct OrdersEnvelope {
    pub success: bool,
    pub orders: Vec<OrderResponse>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllOrdersEnvelope {
    pub success: bool,
    pub total_amount: i64,
    pub orders: Vec<OrderResponse>,
}

#[derive(Serialize)]
pub struct SuccessEnvelope {
    pub success: bool,
}

// -- Handlers --

/// POST /api/v1/order/new — create an order from a full checkout payload.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let order = state.manager.place_order(user.user_id, req.into()).await?;

    Ok(Json(OrderEnvelope {
        success: true,
        order: OrderResponse::from_order(order),
    }))
}

/// GET /api/v1/order/:id — fetch one order with its owner's identity.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<AppState<S>>,
    _user: AuthUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let found = state.manager.get_order(id).await?;

    Ok(Json(OrderEnvelope {
        success: true,
        order: OrderResponse::with_owner(found.order, found.owner),
    }))
}

/// GET /api/v1/orders/me — the caller's orders, any status.
#[tracing::instrument(skip(state))]
pub async fn mine<S: Store>(
    State(state): State<AppState<S>>,
    user: AuthUser,
) -> Result<Json<OrdersEnvelope>, ApiError> {
    let orders = state.manager.orders_for_user(user.user_id).await?;

    Ok(Json(OrdersEnvelope {
        success: true,
        orders: orders.into_iter().map(OrderResponse::from_order).collect(),
    }))
}

/// GET /api/v1/admin/orders — every order plus the summed totals.
#[tracing::instrument(skip(state))]
pub async fn all<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
) -> Result<Json<AllOrdersEnvelope>, ApiError> {
    let all = state.manager.all_orders().await?;

    Ok(Json(AllOrdersEnvelope {
        success: true,
        total_amount: all.total_amount.cents(),
        orders: all
            .orders
            .into_iter()
            .map(OrderResponse::from_order)
            .collect(),
    }))
}

/// PATCH /api/v1/admin/order/:id — advance fulfillment status and
/// apply the manifest's stock decrements.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<SuccessEnvelope>, ApiError> {
    state.manager.update_status(id, req.status).await?;

    Ok(Json(SuccessEnvelope { success: true }))
}
