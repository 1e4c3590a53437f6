//! Assistant service — inventory-grounded chat over an LLM.
//!
//! DESIGN
//! ======
//! Each request is single-turn prompt assembly: the current inventory is
//! rendered into the system prompt, followed by the visible transcript and
//! the new user message. Nothing is stored server side except the
//! per-connection `Transcript` a websocket session keeps in memory.
//!
//! Two variants share the flow and differ only in greeting and
//! instruction text: `Page` (full-screen advisor) and `Floating` (widget).

use std::fmt::Write;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::inventory::{self, InventoryError, Product};
use crate::frame::ErrorCode;
use crate::llm::LlmChat;
use crate::llm::types::{LlmError, Message};
use crate::rate_limit::RateLimitError;
use crate::state::AppState;

/// Reply used when the model returns no text.
pub const FALLBACK_REPLY: &str = "Lo siento, no pude procesar tu solicitud.";

const EMPTY_INVENTORY: &str = "No hay productos en el inventario.";

const PAGE_GREETING: &str = "¡Hola! Puedo ayudarte a encontrar componentes para tus proyectos. \
Intenta preguntar algo como \"Quiero construir una red local\" o \"Necesito arreglar una lámpara\".";

const FLOATING_GREETING: &str = "¡Hola! Soy tu asistente de Manu-Shop. ¿En qué te puedo ayudar hoy? \
Puedo verificar tu stock y recomendarte componentes para tus proyectos.";

const PROMPT_ROLE: &str =
    "Eres un asistente experto en componentes electrónicos y ventas para el sistema \"ElectroMonitor\".";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("LLM not configured")]
    LlmNotConfigured,
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

impl ErrorCode for AssistantError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::LlmNotConfigured => "E_LLM_NOT_CONFIGURED",
            Self::EmptyMessage => "E_EMPTY_MESSAGE",
            Self::RateLimited(_) => "E_RATE_LIMITED",
            Self::Llm(_) => "E_LLM_ERROR",
            Self::Inventory(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Llm(e) => e.retryable(),
            Self::Inventory(e) => e.retryable(),
            Self::LlmNotConfigured | Self::EmptyMessage => false,
        }
    }
}

impl From<RateLimitError> for AssistantError {
    fn from(e: RateLimitError) -> Self {
        Self::RateLimited(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantVariant {
    /// Full-screen advisor page.
    Page,
    /// Always-mounted floating widget.
    #[default]
    Floating,
}

impl AssistantVariant {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "page" => Some(Self::Page),
            "floating" => Some(Self::Floating),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Floating => "floating",
        }
    }
}

// =============================================================================
// PROMPT ASSEMBLY
// =============================================================================

#[must_use]
pub fn greeting(variant: AssistantVariant) -> &'static str {
    match variant {
        AssistantVariant::Page => PAGE_GREETING,
        AssistantVariant::Floating => FLOATING_GREETING,
    }
}

/// One line per product, or a fixed sentence for an empty inventory.
#[must_use]
pub fn inventory_context(products: &[Product]) -> String {
    if products.is_empty() {
        return EMPTY_INVENTORY.to_string();
    }
    let mut out = String::new();
    for (i, p) in products.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "- {} (Stock: {}, Precio: ${}, Categoria: {})",
            p.name,
            p.stock_quantity,
            p.price.normalize(),
            p.category
        );
    }
    out
}

#[must_use]
pub fn build_system_prompt(variant: AssistantVariant, products: &[Product]) -> String {
    let context = inventory_context(products);
    match variant {
        AssistantVariant::Page => format!(
            "{PROMPT_ROLE}\n\
             Tu objetivo es verificar inventario y sugerir componentes.\n\n\
             INVENTARIO ACTUAL:\n{context}\n\n\
             INSTRUCCIONES:\n\
             1. Responde basándote PRIMORDIALMENTE en el inventario actual.\n\
             2. Indica qué tenemos en stock y qué falta para el proyecto del usuario."
        ),
        AssistantVariant::Floating => format!(
            "{PROMPT_ROLE}\n\
             Tu objetivo es ayudar al usuario (vendedor o administrador) a encontrar componentes para proyectos, \
             verificar stock y sugerir materiales faltantes.\n\n\
             INVENTARIO ACTUAL:\n{context}\n\n\
             INSTRUCCIONES:\n\
             1. Responde basándote PRIMORDIALMENTE en el inventario actual.\n\
             2. Si el usuario pide componentes para un proyecto (ej. \"cableado de casa\"):\n   \
             - Lista los materiales necesarios.\n   \
             - Indica cuáles TENEMOS en stock (con cantidad y precio).\n   \
             - Indica cuáles FALTAN en el inventario y recomiéndalos agregar.\n\
             3. Sé amable, conciso y profesional.\n\
             4. Si te preguntan por algo que no es de electrónica, trata de relacionarlo o indica amablemente tu función."
        ),
    }
}

// =============================================================================
// CHAT
// =============================================================================

/// Answer `user_message` against a given inventory snapshot.
///
/// # Errors
///
/// Returns `EmptyMessage`, `RateLimited`, or an LLM error.
pub async fn respond(
    state: &AppState,
    llm: &Arc<dyn LlmChat>,
    client_id: Uuid,
    variant: AssistantVariant,
    products: &[Product],
    transcript: &[Message],
    user_message: &str,
) -> Result<String, AssistantError> {
    let user_message = user_message.trim();
    if user_message.is_empty() {
        return Err(AssistantError::EmptyMessage);
    }
    state.rate_limiter.check_and_record(client_id)?;

    let system = build_system_prompt(variant, products);
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    messages.extend_from_slice(transcript);
    messages.push(Message::user(user_message));

    let response = llm
        .chat(state.settings.assistant_max_tokens, &system, &messages)
        .await?;
    info!(
        %client_id,
        variant = variant.as_str(),
        products = products.len(),
        turns = messages.len(),
        model = %response.model,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        "assistant: reply received"
    );

    Ok(response.text().unwrap_or_else(|| FALLBACK_REPLY.to_string()))
}

/// Fetch the live inventory, then [`respond`].
///
/// # Errors
///
/// Returns `LlmNotConfigured` when no provider is set up, plus every error
/// [`respond`] can return, plus inventory read failures.
pub async fn chat(
    state: &AppState,
    client_id: Uuid,
    variant: AssistantVariant,
    transcript: &[Message],
    user_message: &str,
) -> Result<String, AssistantError> {
    let llm = state.llm.clone().ok_or(AssistantError::LlmNotConfigured)?;
    if user_message.trim().is_empty() {
        return Err(AssistantError::EmptyMessage);
    }
    let products = inventory::list_products(&state.pool).await?;
    respond(state, &llm, client_id, variant, &products, transcript, user_message).await
}

// =============================================================================
// TRANSCRIPT
// =============================================================================

/// Visible conversation of one websocket session. Starts with the
/// variant's greeting. A failed turn keeps the user's message followed by
/// an error line, so the conversation reads the same as the chat panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    variant: AssistantVariant,
    messages: Vec<Message>,
}

impl Transcript {
    #[must_use]
    pub fn new(variant: AssistantVariant) -> Self {
        Self { variant, messages: vec![Message::assistant(greeting(variant))] }
    }

    #[must_use]
    pub fn variant(&self) -> AssistantVariant {
        self.variant
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Start over, optionally switching variant.
    pub fn reset(&mut self, variant: AssistantVariant) {
        *self = Self::new(variant);
    }

    /// Record a completed exchange.
    pub fn record(&mut self, user_message: &str, reply: &str) {
        self.messages.push(Message::user(user_message.trim()));
        self.messages.push(Message::assistant(reply));
    }

    /// Record a turn the assistant could not answer. Empty input never
    /// becomes a turn.
    pub fn record_failure(&mut self, user_message: &str, err: &AssistantError) {
        if matches!(err, AssistantError::EmptyMessage) {
            return;
        }
        self.messages.push(Message::user(user_message.trim()));
        self.messages.push(Message::assistant(failure_line(err)));
    }
}

/// Assistant line shown in place of a reply when a turn fails.
#[must_use]
pub fn failure_line(err: &AssistantError) -> String {
    format!("Error: {err}. (Verifica tu API Key)")
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(AssistantVariant::default())
    }
}

#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;
