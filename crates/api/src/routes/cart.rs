//! Cart mutation endpoint.

use auth::AuthUser;
use axum::Json;
use axum::extract::State;
use common::ProductId;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct MessageEnvelope {
    pub success: bool,
    pub message: String,
}

/// POST /api/v1/cart — merge a product into the caller's open cart.
///
/// The updated cart is not echoed back; callers re-read if they need it.
#[tracing::instrument(skip(state, req))]
pub async fn add<S: Store>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<MessageEnvelope>, ApiError> {
    state
        .manager
        .add_to_cart(user.user_id, req.product_id, req.quantity)
        .await?;

    Ok(Json(MessageEnvelope {
        success: true,
        message: "product added to cart".to_string(),
    }))
}
