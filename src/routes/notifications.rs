//! Notification routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::ApiError;
use crate::services::notification::{self, LowStockAlert, Notification, NotificationError, NotificationKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateNotificationBody {
    pub message: String,
    #[serde(default)]
    pub kind: Option<NotificationKind>,
}

/// `GET /api/notifications` — newest first.
pub async fn list_notifications(State(state): State<AppState>) -> Result<Json<Vec<Notification>>, ApiError> {
    let rows = notification::list_notifications(&state.pool)
        .await
        .map_err(notification_error_to_status)?;
    Ok(Json(rows))
}

/// `POST /api/notifications` — defaults to a system notification.
pub async fn create_notification(
    State(state): State<AppState>,
    Json(body): Json<CreateNotificationBody>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let kind = body.kind.unwrap_or(NotificationKind::System);
    let created = notification::create_notification(&state, &body.message, kind)
        .await
        .map_err(notification_error_to_status)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /api/notifications/:id/read`
pub async fn mark_read(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Notification>, ApiError> {
    let updated = notification::mark_read(&state, id)
        .await
        .map_err(notification_error_to_status)?;
    Ok(Json(updated))
}

/// `POST /api/notifications/read-all`
pub async fn mark_all_read(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = notification::mark_all_read(&state)
        .await
        .map_err(notification_error_to_status)?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}

/// `GET /api/notifications/low-stock` — computed, not stored.
pub async fn low_stock_alerts(State(state): State<AppState>) -> Result<Json<Vec<LowStockAlert>>, ApiError> {
    let alerts = notification::low_stock_alerts(&state.pool, state.settings.low_stock_threshold)
        .await
        .map_err(notification_error_to_status)?;
    Ok(Json(alerts))
}

pub(crate) fn notification_error_to_status(err: NotificationError) -> ApiError {
    let status = match &err {
        NotificationError::NotFound(_) => StatusCode::NOT_FOUND,
        NotificationError::EmptyMessage => StatusCode::BAD_REQUEST,
        NotificationError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    ApiError::new(status, &err)
}

#[cfg(test)]
#[path = "notifications_test.rs"]
mod tests;
