//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API and the websocket endpoint under a single
//! Axum router. A shell UI fetches `/api/nav` to render the sidebar, talks
//! REST for page data, and keeps one websocket open for the cart, the
//! assistant widget and live feed events.

pub mod assistant;
pub mod dashboard;
pub mod notifications;
pub mod products;
pub mod sales;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::frame::ErrorCode;
use crate::state::AppState;

// =============================================================================
// API ERROR
// =============================================================================

/// JSON error body: `{ "code": "E_...", "message": "..." }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Self {
        let api = Self { status, code: err.error_code(), message: err.to_string() };
        if status.is_server_error() {
            error!(status = %status, code = api.code, message = %api.message, "api: request failed");
        }
        api
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, code, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "code": self.code, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

pub const NAV_ITEMS: [NavItem; 5] = [
    NavItem { label: "Panel de Control", path: "/" },
    NavItem { label: "Ventas y POS", path: "/sales" },
    NavItem { label: "Inventario", path: "/inventory" },
    NavItem { label: "Notificaciones", path: "/notifications" },
    NavItem { label: "Asistente IA", path: "/ai-assistant" },
];

async fn nav() -> Json<&'static [NavItem]> {
    Json(&NAV_ITEMS)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// ROUTER
// =============================================================================

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/nav", get(nav))
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .route("/api/products", get(products::list_products).post(products::create_product))
        .route("/api/products/low-stock", get(products::low_stock))
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/sales", get(sales::list_sales))
        .route("/api/sales/checkout", post(sales::checkout))
        .route(
            "/api/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route("/api/notifications/low-stock", get(notifications::low_stock_alerts))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/notifications/{id}/read", post(notifications::mark_read))
        .route("/api/assistant/greeting", get(assistant::greeting))
        .route("/api/assistant/chat", post(assistant::chat))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
