//! Product catalog CRUD endpoints.
//!
//! Reads require any authenticated caller; mutations require the admin
//! role. Prices cross the wire as integer cents.

use auth::{AdminUser, AuthUser};
use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use domain::{Money, Product};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::routes::orders::{AppState, SuccessEnvelope};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub price: i64,
    pub stock: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub price: i64,
    pub stock: u32,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price.cents(),
            stock: product.stock,
        }
    }
}

#[derive(Serialize)]
pub struct ProductEnvelope {
    pub success: bool,
    pub product: ProductResponse,
}

#[derive(Serialize)]
pub struct ProductsEnvelope {
    pub success: bool,
    pub products: Vec<ProductResponse>,
}

/// GET /api/v1/products — the full catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    _user: AuthUser,
) -> Result<Json<ProductsEnvelope>, ApiError> {
    let products = state.manager.store().list_products().await?;

    Ok(Json(ProductsEnvelope {
        success: true,
        products: products.into_iter().map(ProductResponse::from).collect(),
    }))
}

/// GET /api/v1/products/:id — one catalog entry.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<AppState<S>>,
    _user: AuthUser,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let product = state
        .manager
        .store()
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product not found: {id}")))?;

    Ok(Json(ProductEnvelope {
        success: true,
        product: product.into(),
    }))
}

/// POST /api/v1/products — add a product to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let product = Product::new(req.name, Money::from_cents(req.price), req.stock);
    state.manager.store().insert_product(&product).await?;

    Ok(Json(ProductEnvelope {
        success: true,
        product: product.into(),
    }))
}

/// PATCH /api/v1/products/:id — partial update of a catalog entry.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
    Path(id): Path<ProductId>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let mut product = state
        .manager
        .store()
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product not found: {id}")))?;

    if let Some(name) = req.name {
        product.name = name;
    }
    if let Some(price) = req.price {
        product.price = Money::from_cents(price);
    }
    if let Some(stock) = req.stock {
        product.stock = stock;
    }

    state.manager.store().update_product(&product).await?;

    Ok(Json(ProductEnvelope {
        success: true,
        product: product.into(),
    }))
}

/// DELETE /api/v1/products/:id — remove a catalog entry.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
    Path(id): Path<ProductId>,
) -> Result<Json<SuccessEnvelope>, ApiError> {
    let deleted = state.manager.store().delete_product(id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("product not found: {id}")));
    }

    Ok(Json(SuccessEnvelope { success: true }))
}
