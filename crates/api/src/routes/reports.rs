//! Reporting endpoints.

use auth::AdminUser;
use axum::Json;
use axum::extract::State;
use store::{MonthlyIncome, Store};

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// GET /api/v1/admin/income — summed order income per calendar month
/// over the trailing year.
///
/// Records are one per month that has at least one order; their order
/// follows the store's grouping and is not guaranteed ascending.
#[tracing::instrument(skip(state))]
pub async fn monthly_income<S: Store>(
    State(state): State<AppState<S>>,
    _admin: AdminUser,
) -> Result<Json<Vec<MonthlyIncome>>, ApiError> {
    let report = state.manager.monthly_income().await?;
    Ok(Json(report))
}
