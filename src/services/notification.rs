//! Notification service — stored alerts plus computed low-stock warnings.
//!
//! DESIGN
//! ======
//! Stored notifications are rows in `notifications`; every insert is pushed
//! to websocket subscribers as `notification:created`. Low-stock alerts are
//! not stored: they are computed from `products` on each read.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::feed;
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification not found: {0}")]
    NotFound(Uuid),
    #[error("notification message must not be empty")]
    EmptyMessage,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::frame::ErrorCode for NotificationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_NOTIFICATION_NOT_FOUND",
            Self::EmptyMessage => "E_INVALID_NOTIFICATION",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    System,
    Stock,
}

impl NotificationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Stock => "stock",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "system" => Some(Self::System),
            "stock" => Some(Self::Stock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    message: String,
    kind: String,
    is_read: bool,
    created_at: OffsetDateTime,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            message: row.message,
            // The column has a CHECK constraint; anything else is treated as system.
            kind: NotificationKind::parse(&row.kind).unwrap_or(NotificationKind::System),
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

/// A product currently under the low-stock threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct LowStockAlert {
    pub product_id: Uuid,
    pub name: String,
    pub stock_quantity: i32,
}

/// Alert text stored for a product that dropped below the threshold.
#[must_use]
pub fn low_stock_message(name: &str, stock_quantity: i32) -> String {
    format!("El producto {name} tiene pocas existencias ({stock_quantity} restantes).")
}

const NOTIFICATION_COLUMNS: &str = "id, message, kind, is_read, created_at";

// =============================================================================
// QUERIES
// =============================================================================

/// Newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_notifications(pool: &PgPool) -> Result<Vec<Notification>, NotificationError> {
    let rows = sqlx::query_as::<_, NotificationRow>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Notification::from).collect())
}

/// Products strictly below `threshold`, lowest stock first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn low_stock_alerts(pool: &PgPool, threshold: i32) -> Result<Vec<LowStockAlert>, NotificationError> {
    let rows = sqlx::query_as::<_, LowStockAlert>(
        "SELECT id AS product_id, name, stock_quantity FROM products \
         WHERE stock_quantity < $1 ORDER BY stock_quantity ASC, name ASC",
    )
    .bind(threshold)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Insert without publishing. Takes any executor so inventory edits and
/// checkout can record alerts inside their own transaction; the caller
/// publishes after commit.
///
/// # Errors
///
/// Returns the underlying database error.
pub async fn insert_notification<'e, E>(
    executor: E,
    message: &str,
    kind: NotificationKind,
) -> Result<Notification, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, NotificationRow>(&format!(
        "INSERT INTO notifications (id, message, kind) VALUES ($1, $2, $3) RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(message)
    .bind(kind.as_str())
    .fetch_one(executor)
    .await?;
    Ok(row.into())
}

/// Insert and publish `notification:created`.
///
/// # Errors
///
/// Returns `EmptyMessage` for blank text or a database error.
pub async fn create_notification(
    state: &AppState,
    message: &str,
    kind: NotificationKind,
) -> Result<Notification, NotificationError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(NotificationError::EmptyMessage);
    }
    let notification = insert_notification(&state.pool, message, kind).await?;
    info!(notification_id = %notification.id, kind = kind.as_str(), "notification: created");
    feed::publish_event(state, feed::NOTIFICATION_CREATED, &notification).await;
    Ok(notification)
}

/// # Errors
///
/// Returns `NotFound` if no notification has this id.
pub async fn mark_read(state: &AppState, id: Uuid) -> Result<Notification, NotificationError> {
    let notification = sqlx::query_as::<_, NotificationRow>(&format!(
        "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .map(Notification::from)
    .ok_or(NotificationError::NotFound(id))?;

    feed::publish_event(state, feed::NOTIFICATION_UPDATED, &notification).await;
    Ok(notification)
}

/// Returns how many rows changed.
///
/// # Errors
///
/// Returns a database error if the update fails.
pub async fn mark_all_read(state: &AppState) -> Result<u64, NotificationError> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE is_read = FALSE")
        .execute(&state.pool)
        .await?;
    let updated = result.rows_affected();
    info!(updated, "notification: marked all read");
    if updated > 0 {
        feed::publish_event(state, feed::NOTIFICATION_UPDATED, &serde_json::json!({ "all_read": true })).await;
    }
    Ok(updated)
}

#[cfg(test)]
#[path = "notification_test.rs"]
mod tests;
