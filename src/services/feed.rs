//! Live feed — fan-out of change events to websocket subscribers.
//!
//! DESIGN
//! ======
//! Every connected websocket registers an `mpsc::Sender<Frame>` in
//! `AppState::subscribers`. Services publish after their write commits:
//! `notification:created`, `notification:updated`, `product:changed`,
//! `product:deleted`, `sale:completed`. Delivery is best-effort: a full
//! client queue drops the frame instead of blocking the writer.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::state::AppState;

pub const NOTIFICATION_CREATED: &str = "notification:created";
pub const NOTIFICATION_UPDATED: &str = "notification:updated";
pub const PRODUCT_CHANGED: &str = "product:changed";
pub const PRODUCT_DELETED: &str = "product:deleted";
pub const SALE_COMPLETED: &str = "sale:completed";

pub async fn subscribe(state: &AppState, client_id: Uuid, tx: mpsc::Sender<Frame>) {
    let mut subscribers = state.subscribers.write().await;
    subscribers.insert(client_id, tx);
    debug!(%client_id, subscribers = subscribers.len(), "feed: subscribed");
}

pub async fn unsubscribe(state: &AppState, client_id: Uuid) {
    let mut subscribers = state.subscribers.write().await;
    subscribers.remove(&client_id);
    debug!(%client_id, subscribers = subscribers.len(), "feed: unsubscribed");
}

/// Build an event frame whose data is the serialized payload's fields.
///
/// Non-object payloads land under a single `value` key.
pub fn event(syscall: &str, payload: &impl Serialize) -> Frame {
    let data = match serde_json::to_value(payload) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect::<Data>(),
        Ok(other) => {
            let mut data = Data::new();
            data.insert("value".into(), other);
            data
        }
        Err(e) => {
            warn!(syscall, error = %e, "feed: failed to serialize event payload");
            Data::new()
        }
    };
    Frame::request(syscall, data)
}

/// Send a frame to every subscriber.
pub async fn publish(state: &AppState, frame: &Frame) {
    let subscribers = state.subscribers.read().await;
    for (client_id, tx) in subscribers.iter() {
        if tx.try_send(frame.clone()).is_err() {
            warn!(%client_id, syscall = %frame.syscall, "feed: subscriber queue full or closed; dropping frame");
        }
    }
}

/// Serialize and publish in one step.
pub async fn publish_event(state: &AppState, syscall: &str, payload: &impl Serialize) {
    publish(state, &event(syscall, payload)).await;
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
