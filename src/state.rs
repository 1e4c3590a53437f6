//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the database pool, the optional LLM client, the assistant rate
//! limiter, shop settings, and the live-feed subscriber map (one sender per
//! connected websocket client).

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::ShopSettings;
use crate::frame::Frame;
use crate::llm::LlmChat;
use crate::rate_limit::RateLimiter;

/// Connected feed subscribers: `client_id` -> sender for outgoing frames.
pub type Subscribers = Arc<RwLock<HashMap<Uuid, mpsc::Sender<Frame>>>>;

/// Clone is required by Axum; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// `None` if LLM env vars are not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
    pub rate_limiter: RateLimiter,
    pub settings: ShopSettings,
    pub subscribers: Subscribers,
}

impl AppState {
    #[must_use]
    pub fn new(
        pool: PgPool,
        llm: Option<Arc<dyn LlmChat>>,
        rate_limiter: RateLimiter,
        settings: ShopSettings,
    ) -> Self {
        Self { pool, llm, rate_limiter, settings, subscribers: Arc::new(RwLock::new(HashMap::new())) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
