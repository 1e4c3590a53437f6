//! Assistant routes for stateless clients.
//!
//! REST callers keep the transcript themselves and send it with every
//! message. `client_id` is optional and only keys the rate limiter;
//! callers that omit it share one anonymous bucket.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiError;
use super::products::inventory_error_to_status;
use crate::llm::types::Message;
use crate::services::assistant::{self, AssistantError, AssistantVariant};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GreetingQuery {
    #[serde(default)]
    pub variant: AssistantVariant,
}

#[derive(Debug, Serialize)]
pub struct GreetingResponse {
    pub variant: AssistantVariant,
    pub greeting: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub variant: AssistantVariant,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub message: String,
    #[serde(default)]
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// `GET /api/assistant/greeting?variant=page|floating`
pub async fn greeting(Query(query): Query<GreetingQuery>) -> Json<GreetingResponse> {
    Json(GreetingResponse { variant: query.variant, greeting: assistant::greeting(query.variant) })
}

/// `POST /api/assistant/chat`
pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatBody>) -> Result<Json<ChatReply>, ApiError> {
    let client_id = body.client_id.unwrap_or(Uuid::nil());
    let reply = assistant::chat(&state, client_id, body.variant, &body.messages, &body.message)
        .await
        .map_err(assistant_error_to_status)?;
    Ok(Json(ChatReply { reply }))
}

pub(crate) fn assistant_error_to_status(err: AssistantError) -> ApiError {
    let status = match err {
        AssistantError::Inventory(inner) => return inventory_error_to_status(inner),
        AssistantError::LlmNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        AssistantError::EmptyMessage => StatusCode::BAD_REQUEST,
        AssistantError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        AssistantError::Llm(_) => StatusCode::BAD_GATEWAY,
    };
    ApiError::new(status, &err)
}

#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;
