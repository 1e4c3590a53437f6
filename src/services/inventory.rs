//! Inventory service — product CRUD and low-stock queries.
//!
//! DESIGN
//! ======
//! Products are read straight from Postgres on every call; there is no
//! in-memory cache. Writes publish `product:changed` / `product:deleted` on
//! the live feed after they commit so open POS and inventory views refresh.
//!
//! An edit that takes a product from at-or-above the low-stock threshold to
//! below it records a stock notification in the same transaction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::feed;
use super::notification::{self, Notification, NotificationKind};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("product not found: {0}")]
    NotFound(Uuid),
    #[error("invalid product: {0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::frame::ErrorCode for InventoryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_PRODUCT_NOT_FOUND",
            Self::Invalid(_) => "E_INVALID_PRODUCT",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Mirrors the `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Product {
    /// List-view flag: strictly below the threshold.
    #[must_use]
    pub fn is_low_stock(&self, threshold: i32) -> bool {
        self.stock_quantity < threshold
    }
}

/// Editable product fields, as submitted by the inventory form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProductInput {
    /// Trim text fields, turn a blank image URL into `None`, and reject
    /// empty names or negative numbers.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Invalid` describing the first bad field.
    pub fn validate(self) -> Result<Self, InventoryError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(InventoryError::Invalid("name is required".into()));
        }
        if self.price.is_sign_negative() {
            return Err(InventoryError::Invalid("price must not be negative".into()));
        }
        if self.stock_quantity < 0 {
            return Err(InventoryError::Invalid("stock_quantity must not be negative".into()));
        }
        let image_url = self
            .image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        Ok(Self {
            name,
            category: self.category.trim().to_string(),
            price: self.price.round_dp(2),
            stock_quantity: self.stock_quantity,
            image_url,
        })
    }
}

/// Crossing test shared by product edits and checkout.
#[must_use]
pub fn crossed_below(previous: i32, current: i32, threshold: i32) -> bool {
    previous >= threshold && current < threshold
}

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, category, price, stock_quantity, image_url, created_at";

// =============================================================================
// QUERIES
// =============================================================================

/// All products, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<Product>, InventoryError> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Products that can be sold right now (the POS catalogue).
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_in_stock(pool: &PgPool) -> Result<Vec<Product>, InventoryError> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock_quantity > 0 ORDER BY name ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns `NotFound` if no product has this id.
pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Product, InventoryError> {
    sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(InventoryError::NotFound(id))
}

/// Products strictly below `threshold`, lowest stock first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn low_stock(pool: &PgPool, threshold: i32) -> Result<Vec<Product>, InventoryError> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock_quantity < $1 ORDER BY stock_quantity ASC, name ASC"
    ))
    .bind(threshold)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Validate and insert a product.
///
/// # Errors
///
/// Returns `Invalid` for bad input or a database error.
pub async fn create_product(state: &AppState, input: ProductInput) -> Result<Product, InventoryError> {
    let input = input.validate()?;
    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products (id, name, category, price, stock_quantity, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(&input.category)
    .bind(input.price)
    .bind(input.stock_quantity)
    .bind(&input.image_url)
    .fetch_one(&state.pool)
    .await?;

    info!(product_id = %product.id, name = %product.name, stock = product.stock_quantity, "inventory: product created");
    feed::publish_event(state, feed::PRODUCT_CHANGED, &product).await;
    Ok(product)
}

/// Validate and overwrite every editable field of a product.
///
/// # Errors
///
/// Returns `NotFound`, `Invalid`, or a database error.
pub async fn update_product(state: &AppState, id: Uuid, input: ProductInput) -> Result<Product, InventoryError> {
    let input = input.validate()?;
    let threshold = state.settings.low_stock_threshold;
    let mut tx = state.pool.begin().await?;

    let previous: i32 = sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(tx.as_mut())
        .await?
        .ok_or(InventoryError::NotFound(id))?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET name = $2, category = $3, price = $4, stock_quantity = $5, image_url = $6, \
         updated_at = now() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(&input.name)
    .bind(&input.category)
    .bind(input.price)
    .bind(input.stock_quantity)
    .bind(&input.image_url)
    .fetch_one(tx.as_mut())
    .await?;

    let alert: Option<Notification> = if crossed_below(previous, product.stock_quantity, threshold) {
        let message = notification::low_stock_message(&product.name, product.stock_quantity);
        Some(notification::insert_notification(tx.as_mut(), &message, NotificationKind::Stock).await?)
    } else {
        None
    };

    tx.commit().await?;

    info!(product_id = %id, previous, stock = product.stock_quantity, "inventory: product updated");
    feed::publish_event(state, feed::PRODUCT_CHANGED, &product).await;
    if let Some(alert) = alert {
        feed::publish_event(state, feed::NOTIFICATION_CREATED, &alert).await;
    }
    Ok(product)
}

/// # Errors
///
/// Returns `NotFound` if nothing was deleted.
pub async fn delete_product(state: &AppState, id: Uuid) -> Result<(), InventoryError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(InventoryError::NotFound(id));
    }

    info!(product_id = %id, "inventory: product deleted");
    feed::publish_event(state, feed::PRODUCT_DELETED, &serde_json::json!({ "id": id })).await;
    Ok(())
}

#[cfg(test)]
#[path = "inventory_test.rs"]
mod tests;
