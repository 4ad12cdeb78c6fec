//! Token refresh endpoint.
//!
//! Credential login lives with the external auth collaborator; this
//! surface only exchanges a valid refresh token for a fresh access
//! token.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub access_token: String,
}

/// POST /api/v1/auth/refresh — mint a new access token.
#[tracing::instrument(skip(state, req))]
pub async fn refresh<S: Store>(
    State(state): State<AppState<S>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let access_token = state.tokens.refresh(&req.refresh_token)?;

    Ok(Json(RefreshResponse {
        success: true,
        access_token,
    }))
}
