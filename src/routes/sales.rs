//! Sales routes — history and REST checkout.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::services::notification::Notification;
use crate::services::sales::{self, CheckoutLine, Sale, SalesError};
use crate::state::AppState;

const DEFAULT_SALES_LIMIT: i64 = 50;
const MAX_SALES_LIMIT: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub lines: Vec<CheckoutLine>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub sale: Sale,
    /// Low-stock notifications the sale produced.
    pub alerts: Vec<Notification>,
}

/// `GET /api/sales?limit=N` — most recent first.
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    let limit = match query.limit {
        Some(limit) if limit < 1 => return Err(ApiError::bad_request("E_INVALID_LIMIT", "limit must be positive")),
        Some(limit) => limit.min(MAX_SALES_LIMIT),
        None => DEFAULT_SALES_LIMIT,
    };
    let rows = sales::list_sales(&state.pool, limit)
        .await
        .map_err(sales_error_to_status)?;
    Ok(Json(rows))
}

/// `POST /api/sales/checkout` — body `{ "lines": [{ "product_id", "quantity" }] }`.
pub async fn checkout(
    State(state): State<AppState>,
    Json(body): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let outcome = sales::checkout(&state, &body.lines)
        .await
        .map_err(sales_error_to_status)?;
    Ok((StatusCode::CREATED, Json(CheckoutResponse { sale: outcome.sale, alerts: outcome.alerts })))
}

pub(crate) fn sales_error_to_status(err: SalesError) -> ApiError {
    let status = match &err {
        SalesError::EmptyCart | SalesError::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
        SalesError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        SalesError::InsufficientStock { .. } => StatusCode::CONFLICT,
        SalesError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    ApiError::new(status, &err)
}

#[cfg(test)]
#[path = "sales_test.rs"]
mod tests;
