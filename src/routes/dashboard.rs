//! Dashboard route.

use axum::extract::State;
use axum::response::Json;
use time::OffsetDateTime;

use super::ApiError;
use super::sales::sales_error_to_status;
use crate::services::dashboard::{self, Dashboard};
use crate::state::AppState;

/// `GET /api/dashboard` — sales stats and the monthly revenue chart.
pub async fn get_dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, ApiError> {
    let body = dashboard::dashboard(&state.pool, OffsetDateTime::now_utc())
        .await
        .map_err(sales_error_to_status)?;
    Ok(Json(body))
}

