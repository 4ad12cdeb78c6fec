//! HTTP API server for the shop backend.
//!
//! Wires the order & cart lifecycle manager, product catalog, and JWT
//! auth behind the REST surface, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use auth::TokenService;
use axum::Router;
use axum::routing::{get, patch, post};
use checkout::OrderManager;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: AppState<S>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/v1/order/new", post(routes::orders::create::<S>))
        .route("/api/v1/order/{id}", get(routes::orders::get::<S>))
        .route("/api/v1/orders/me", get(routes::orders::mine::<S>))
        .route("/api/v1/admin/orders", get(routes::orders::all::<S>))
        .route(
            "/api/v1/admin/order/{id}",
            patch(routes::orders::update_status::<S>),
        )
        .route("/api/v1/cart", post(routes::cart::add::<S>))
        .route(
            "/api/v1/admin/income",
            get(routes::reports::monthly_income::<S>),
        )
        .route(
            "/api/v1/products",
            get(routes::products::list::<S>).post(routes::products::create::<S>),
        )
        .route(
            "/api/v1/products/{id}",
            get(routes::products::get::<S>)
                .patch(routes::products::update::<S>)
                .delete(routes::products::delete::<S>),
        )
        .route("/api/v1/auth/refresh", post(routes::tokens::refresh::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given store.
pub fn create_state<S: Store>(store: S, tokens: TokenService) -> AppState<S> {
    AppState {
        manager: OrderManager::new(store),
        tokens,
    }
}
