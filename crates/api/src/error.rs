//! API error types with HTTP response mapping.
//!
//! Every handler funnels failures through [`ApiError`], including the
//! income report path; nothing responds with a raw error object.

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::OrderError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Lifecycle manager error.
    Checkout(CheckoutError),
    /// Token issuance/validation error.
    Auth(AuthError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Auth(err) => return err.into_response(),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "success": false, "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::OrderNotFound(_) | CheckoutError::ProductNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CheckoutError::Order(order_err) => match order_err {
            OrderError::AlreadyDelivered { .. }
            | OrderError::InvalidTransition { .. }
            | OrderError::NoItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::CartClosed { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        CheckoutError::Store(store_err) => match store_err {
            StoreError::VersionConflict { .. }
            | StoreError::InsufficientStock { .. }
            | StoreError::OpenCartExists(_) => (StatusCode::CONFLICT, err.to_string()),
            _ => {
                tracing::error!(error = %err, "store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        },
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Checkout(CheckoutError::from(err))
    }
}
