//! Sales service — checkout and sale history.
//!
//! DESIGN
//! ======
//! Checkout is one transaction: every stock decrement, the sale header, its
//! line items, and any low-stock notifications commit together or not at
//! all. Decrements are guarded (`stock_quantity >= $n`) so two registers
//! racing for the last unit cannot both succeed. Unit prices come from the
//! product rows, never from the client.
//!
//! Feed events (`product:changed`, `notification:created`, `sale:completed`)
//! are published only after commit.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::feed;
use super::inventory::{self, PRODUCT_COLUMNS, Product};
use super::notification::{self, Notification, NotificationKind};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SalesError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: Uuid, quantity: i32 },
    #[error("product not found: {0}")]
    ProductNotFound(Uuid),
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock { product_id: Uuid, requested: i32, available: i32 },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::frame::ErrorCode for SalesError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyCart => "E_EMPTY_CART",
            Self::InvalidQuantity { .. } => "E_INVALID_QUANTITY",
            Self::ProductNotFound(_) => "E_PRODUCT_NOT_FOUND",
            Self::InsufficientStock { .. } => "E_INSUFFICIENT_STOCK",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// One requested product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    /// `None` once the product has been deleted.
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub total_amount: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub sale_date: OffsetDateTime,
    pub items: Vec<SaleItem>,
}

/// The two columns the dashboard aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, sqlx::FromRow)]
pub struct SaleSummary {
    pub total_amount: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub sale_date: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: Uuid,
    total_amount: Decimal,
    sale_date: OffsetDateTime,
}

/// Everything checkout produced, for the caller and the feed.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub sale: Sale,
    pub products: Vec<Product>,
    pub alerts: Vec<Notification>,
}

// =============================================================================
// LINE MERGING
// =============================================================================

/// Reject empty carts and non-positive quantities, and fold duplicate
/// products into one line (first occurrence keeps its position).
///
/// # Errors
///
/// Returns `EmptyCart` or `InvalidQuantity`.
pub fn merge_lines(lines: &[CheckoutLine]) -> Result<Vec<CheckoutLine>, SalesError> {
    if lines.is_empty() {
        return Err(SalesError::EmptyCart);
    }

    let mut merged: Vec<CheckoutLine> = Vec::with_capacity(lines.len());
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    for line in lines {
        if line.quantity <= 0 {
            return Err(SalesError::InvalidQuantity { product_id: line.product_id, quantity: line.quantity });
        }
        match index.get(&line.product_id) {
            Some(&i) => {
                let existing = &mut merged[i];
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or(SalesError::InvalidQuantity { product_id: line.product_id, quantity: i32::MAX })?;
            }
            None => {
                index.insert(line.product_id, merged.len());
                merged.push(*line);
            }
        }
    }
    Ok(merged)
}

// =============================================================================
// CHECKOUT
// =============================================================================

/// Record a sale for `lines` and decrement stock, atomically.
///
/// # Errors
///
/// Returns `EmptyCart`, `InvalidQuantity`, `ProductNotFound`,
/// `InsufficientStock`, or a database error. Nothing is written on error.
pub async fn checkout(state: &AppState, lines: &[CheckoutLine]) -> Result<CheckoutOutcome, SalesError> {
    let merged = merge_lines(lines)?;
    let threshold = state.settings.low_stock_threshold;

    // Lock rows in a stable order so concurrent checkouts can't deadlock.
    let mut lock_order = merged.clone();
    lock_order.sort_by_key(|l| l.product_id);

    let mut tx = state.pool.begin().await?;
    let mut updated: HashMap<Uuid, Product> = HashMap::with_capacity(merged.len());

    for line in &lock_order {
        let row = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET stock_quantity = stock_quantity - $2, updated_at = now() \
             WHERE id = $1 AND stock_quantity >= $2 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(line.product_id)
        .bind(line.quantity)
        .fetch_optional(tx.as_mut())
        .await?;

        let Some(product) = row else {
            let available: Option<i32> = sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
                .bind(line.product_id)
                .fetch_optional(tx.as_mut())
                .await?;
            return Err(match available {
                None => SalesError::ProductNotFound(line.product_id),
                Some(available) => SalesError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                },
            });
        };
        updated.insert(product.id, product);
    }

    let total_amount: Decimal = merged
        .iter()
        .filter_map(|l| updated.get(&l.product_id).map(|p| p.price * Decimal::from(l.quantity)))
        .sum();

    let sale_id = Uuid::new_v4();
    let header = sqlx::query_as::<_, SaleRow>(
        "INSERT INTO sales (id, total_amount) VALUES ($1, $2) RETURNING id, total_amount, sale_date",
    )
    .bind(sale_id)
    .bind(total_amount)
    .fetch_one(tx.as_mut())
    .await?;

    let mut items = Vec::with_capacity(merged.len());
    let mut products = Vec::with_capacity(merged.len());
    for (line_no, line) in (0_i32..).zip(&merged) {
        let Some(product) = updated.remove(&line.product_id) else {
            continue;
        };
        let item_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO sale_items (id, sale_id, line_no, product_id, quantity, unit_price) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(item_id)
        .bind(sale_id)
        .bind(line_no)
        .bind(product.id)
        .bind(line.quantity)
        .bind(product.price)
        .execute(tx.as_mut())
        .await?;
        items.push(SaleItem {
            id: item_id,
            sale_id,
            product_id: Some(product.id),
            product_name: Some(product.name.clone()),
            quantity: line.quantity,
            unit_price: product.price,
        });
        products.push((line.quantity, product));
    }

    let mut alerts = Vec::new();
    for (sold, product) in &products {
        if inventory::crossed_below(product.stock_quantity + sold, product.stock_quantity, threshold) {
            let message = notification::low_stock_message(&product.name, product.stock_quantity);
            alerts.push(notification::insert_notification(tx.as_mut(), &message, NotificationKind::Stock).await?);
        }
    }

    tx.commit().await?;

    let sale = Sale { id: header.id, total_amount: header.total_amount, sale_date: header.sale_date, items };
    let products: Vec<Product> = products.into_iter().map(|(_, p)| p).collect();
    info!(sale_id = %sale.id, total = %sale.total_amount, lines = sale.items.len(), alerts = alerts.len(), "sales: checkout complete");

    for product in &products {
        feed::publish_event(state, feed::PRODUCT_CHANGED, product).await;
    }
    for alert in &alerts {
        warn!(notification_id = %alert.id, "sales: {}", alert.message);
        feed::publish_event(state, feed::NOTIFICATION_CREATED, alert).await;
    }
    feed::publish_event(state, feed::SALE_COMPLETED, &sale).await;

    Ok(CheckoutOutcome { sale, products, alerts })
}

// =============================================================================
// HISTORY
// =============================================================================

/// Most recent sales with their items.
///
/// # Errors
///
/// Returns a database error if either query fails.
pub async fn list_sales(pool: &PgPool, limit: i64) -> Result<Vec<Sale>, SalesError> {
    let headers = sqlx::query_as::<_, SaleRow>(
        "SELECT id, total_amount, sale_date FROM sales ORDER BY sale_date DESC LIMIT $1",
    )
    .bind(limit.max(0))
    .fetch_all(pool)
    .await?;
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
    let rows = sqlx::query_as::<_, SaleItem>(
        "SELECT si.id, si.sale_id, si.product_id, p.name AS product_name, si.quantity, si.unit_price \
         FROM sale_items si LEFT JOIN products p ON p.id = si.product_id \
         WHERE si.sale_id = ANY($1) ORDER BY si.sale_id, si.line_no",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_sale: HashMap<Uuid, Vec<SaleItem>> = HashMap::new();
    for item in rows {
        by_sale.entry(item.sale_id).or_default().push(item);
    }

    Ok(headers
        .into_iter()
        .map(|h| Sale {
            items: by_sale.remove(&h.id).unwrap_or_default(),
            id: h.id,
            total_amount: h.total_amount,
            sale_date: h.sale_date,
        })
        .collect())
}

/// `(total_amount, sale_date)` for every sale on or after `since`.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_sale_summaries(pool: &PgPool, since: OffsetDateTime) -> Result<Vec<SaleSummary>, SalesError> {
    let rows = sqlx::query_as::<_, SaleSummary>(
        "SELECT total_amount, sale_date FROM sales WHERE sale_date >= $1 ORDER BY sale_date ASC",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
#[path = "sales_test.rs"]
mod tests;
