//! Inventory routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiError;
use crate::services::inventory::{self, InventoryError, Product, ProductInput};
use crate::state::AppState;

/// Product plus the list-view low-stock flag.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub low_stock: bool,
}

fn to_response(product: Product, threshold: i32) -> ProductResponse {
    let low_stock = product.is_low_stock(threshold);
    ProductResponse { product, low_stock }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// POS catalogue: only products with stock on hand.
    #[serde(default)]
    pub in_stock: bool,
}

/// `GET /api/products` — newest first, or the POS catalogue with `?in_stock=true`.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let rows = if query.in_stock {
        inventory::list_in_stock(&state.pool).await
    } else {
        inventory::list_products(&state.pool).await
    }
    .map_err(inventory_error_to_status)?;

    let threshold = state.settings.low_stock_threshold;
    Ok(Json(rows.into_iter().map(|p| to_response(p, threshold)).collect()))
}

/// `GET /api/products/low-stock`
pub async fn low_stock(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let threshold = state.settings.low_stock_threshold;
    let rows = inventory::low_stock(&state.pool, threshold)
        .await
        .map_err(inventory_error_to_status)?;
    Ok(Json(rows.into_iter().map(|p| to_response(p, threshold)).collect()))
}

/// `GET /api/products/:id`
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = inventory::get_product(&state.pool, id)
        .await
        .map_err(inventory_error_to_status)?;
    Ok(Json(to_response(product, state.settings.low_stock_threshold)))
}

/// `POST /api/products`
pub async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<ProductInput>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = inventory::create_product(&state, body)
        .await
        .map_err(inventory_error_to_status)?;
    Ok((StatusCode::CREATED, Json(to_response(product, state.settings.low_stock_threshold))))
}

/// `PUT /api/products/:id` — overwrite every editable field.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ProductInput>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = inventory::update_product(&state, id, body)
        .await
        .map_err(inventory_error_to_status)?;
    Ok(Json(to_response(product, state.settings.low_stock_threshold)))
}

/// `DELETE /api/products/:id`
pub async fn delete_product(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    inventory::delete_product(&state, id)
        .await
        .map_err(inventory_error_to_status)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn inventory_error_to_status(err: InventoryError) -> ApiError {
    let status = match &err {
        InventoryError::NotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::Invalid(_) => StatusCode::BAD_REQUEST,
        InventoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    ApiError::new(status, &err)
}

#[cfg(test)]
#[path = "products_test.rs"]
mod tests;
