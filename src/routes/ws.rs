//! WebSocket handler — session frames plus the live feed.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, registers a feed subscriber, and
//! enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix
//! - Feed events (product, notification, sale changes) → forward to client
//!
//! Each connection owns a `Session`: the POS cart and the assistant
//! transcript. Both live only as long as the socket. Handlers return an
//! `Outcome`; the dispatch layer turns it into the reply frame. Fan-out to
//! other clients is done by the services through the feed after commit.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id`
//! 2. Client sends frames → dispatch → handler returns Outcome → reply
//! 3. Feed events keep the session cart's stock caps current
//! 4. Close → unsubscribe from the feed, forget rate-limit history

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame, Status};
use crate::services::assistant::{self, AssistantVariant, Transcript};
use crate::services::cart::Cart;
use crate::services::inventory::{self, Product};
use crate::services::{feed, notification, sales};
use crate::state::AppState;

const CLIENT_QUEUE_CAPACITY: usize = 256;

// =============================================================================
// SESSION + OUTCOME
// =============================================================================

/// Per-connection state.
#[derive(Debug, Default)]
struct Session {
    cart: Cart,
    transcript: Transcript,
}

enum Outcome {
    /// Send done+data to sender.
    Reply(Data),
    /// Send empty done to sender.
    Done,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(CLIENT_QUEUE_CAPACITY);
    feed::subscribe(&state, client_id, client_tx).await;

    let mut session = Session::default();
    let welcome = Frame::request("session:connected", Data::new()).with_data("client_id", client_id.to_string());

    if send_frame(&mut socket, &welcome).await.is_ok() {
        info!(%client_id, "ws: client connected");
        'conn: loop {
            tokio::select! {
                msg = socket.recv() => {
                    let Some(Ok(msg)) = msg else { break };
                    match msg {
                        Message::Text(text) => {
                            for frame in process_inbound_text(&state, &mut session, client_id, &text).await {
                                if send_frame(&mut socket, &frame).await.is_err() {
                                    break 'conn;
                                }
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
                Some(frame) = client_rx.recv() => {
                    apply_feed_event(&mut session.cart, &frame);
                    if send_frame(&mut socket, &frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    feed::unsubscribe(&state, client_id).await;
    state.rate_limiter.forget(client_id);
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
///
/// Kept apart from the socket so tests can drive dispatch directly.
async fn process_inbound_text(state: &AppState, session: &mut Session, client_id: Uuid, text: &str) -> Vec<Frame> {
    let mut req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new()).with_data("message", format!("invalid json: {e}"));
            return vec![err];
        }
    };
    req.from = Some(client_id.to_string());
    info!(%client_id, id = %req.id, syscall = %req.syscall, "ws: recv frame");

    let result = match req.prefix() {
        "cart" => handle_cart(state, &mut session.cart, &req).await,
        "chat" => handle_chat(state, &mut session.transcript, client_id, &req).await,
        "product" => handle_product(state, &req).await,
        "notification" => handle_notification(state, &req).await,
        prefix => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(Outcome::Reply(data)) => vec![req.done_with(data)],
        Ok(Outcome::Done) => vec![req.done()],
        Err(err_frame) => vec![err_frame],
    }
}

/// Keep the session cart in step with stock changes made elsewhere.
fn apply_feed_event(cart: &mut Cart, frame: &Frame) {
    match frame.syscall.as_str() {
        feed::PRODUCT_CHANGED => {
            let value = serde_json::Value::Object(frame.data.clone().into_iter().collect());
            if let Ok(product) = serde_json::from_value::<Product>(value) {
                cart.sync_available(&product);
            }
        }
        feed::PRODUCT_DELETED => {
            if let Some(id) = frame.uuid_field("id") {
                cart.remove(id);
            }
        }
        _ => {}
    }
}

// =============================================================================
// CART HANDLERS
// =============================================================================

async fn handle_cart(state: &AppState, cart: &mut Cart, req: &Frame) -> Result<Outcome, Frame> {
    let changed = match req.op() {
        "get" => true,
        "add" => {
            let product_id = required_uuid(req, "product_id")?;
            let product = inventory::get_product(&state.pool, product_id)
                .await
                .map_err(|e| req.error_from(&e))?;
            cart.add(&product)
        }
        "update" => {
            let product_id = required_uuid(req, "product_id")?;
            let Some(delta) = req
                .data
                .get("delta")
                .and_then(serde_json::Value::as_i64)
                .and_then(|v| i32::try_from(v).ok())
            else {
                return Err(req.error("delta required"));
            };
            cart.update_quantity(product_id, delta)
        }
        "remove" => {
            let product_id = required_uuid(req, "product_id")?;
            cart.remove(product_id)
        }
        "clear" => {
            cart.clear();
            true
        }
        "checkout" => {
            let outcome = sales::checkout(state, &cart.checkout_lines())
                .await
                .map_err(|e| req.error_from(&e))?;
            cart.clear();
            let mut data = cart_data(cart);
            insert_json(&mut data, "sale", &outcome.sale);
            insert_json(&mut data, "alerts", &outcome.alerts);
            return Ok(Outcome::Reply(data));
        }
        op => return Err(req.error(format!("unknown cart op: {op}"))),
    };

    let mut data = cart_data(cart);
    data.insert("changed".into(), serde_json::json!(changed));
    Ok(Outcome::Reply(data))
}

fn cart_data(cart: &Cart) -> Data {
    let mut data = Data::new();
    insert_json(&mut data, "lines", &cart.lines());
    insert_json(&mut data, "total", &cart.total());
    data.insert("item_count".into(), serde_json::json!(cart.item_count()));
    data
}

// =============================================================================
// CHAT HANDLERS
// =============================================================================

async fn handle_chat(
    state: &AppState,
    transcript: &mut Transcript,
    client_id: Uuid,
    req: &Frame,
) -> Result<Outcome, Frame> {
    match req.op() {
        "send" => {
            let message = req
                .data
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            let reply = match assistant::chat(state, client_id, transcript.variant(), transcript.messages(), message).await
            {
                Ok(reply) => reply,
                Err(e) => {
                    transcript.record_failure(message, &e);
                    return Err(req.error_from(&e));
                }
            };
            transcript.record(message, &reply);

            let mut data = transcript_data(transcript);
            data.insert("reply".into(), serde_json::json!(reply));
            Ok(Outcome::Reply(data))
        }
        "history" => Ok(Outcome::Reply(transcript_data(transcript))),
        "reset" => {
            let variant = req
                .data
                .get("variant")
                .and_then(|v| v.as_str())
                .and_then(AssistantVariant::parse)
                .unwrap_or(transcript.variant());
            transcript.reset(variant);
            Ok(Outcome::Reply(transcript_data(transcript)))
        }
        op => Err(req.error(format!("unknown chat op: {op}"))),
    }
}

fn transcript_data(transcript: &Transcript) -> Data {
    let mut data = Data::new();
    data.insert("variant".into(), serde_json::json!(transcript.variant().as_str()));
    insert_json(&mut data, "messages", &transcript.messages());
    data
}

// =============================================================================
// PRODUCT + NOTIFICATION HANDLERS
// =============================================================================

async fn handle_product(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    match req.op() {
        "list" => {
            let in_stock = req
                .data
                .get("in_stock")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false);
            let products = if in_stock {
                inventory::list_in_stock(&state.pool).await
            } else {
                inventory::list_products(&state.pool).await
            }
            .map_err(|e| req.error_from(&e))?;

            let mut data = Data::new();
            insert_json(&mut data, "products", &products);
            Ok(Outcome::Reply(data))
        }
        op => Err(req.error(format!("unknown product op: {op}"))),
    }
}

async fn handle_notification(state: &AppState, req: &Frame) -> Result<Outcome, Frame> {
    match req.op() {
        "list" => {
            let notifications = notification::list_notifications(&state.pool)
                .await
                .map_err(|e| req.error_from(&e))?;
            let low_stock = notification::low_stock_alerts(&state.pool, state.settings.low_stock_threshold)
                .await
                .map_err(|e| req.error_from(&e))?;

            let mut data = Data::new();
            insert_json(&mut data, "notifications", &notifications);
            insert_json(&mut data, "low_stock", &low_stock);
            Ok(Outcome::Reply(data))
        }
        "read" => {
            let id = required_uuid(req, "id")?;
            let updated = notification::mark_read(state, id)
                .await
                .map_err(|e| req.error_from(&e))?;
            let mut data = Data::new();
            insert_json(&mut data, "notification", &updated);
            Ok(Outcome::Reply(data))
        }
        "read_all" => {
            notification::mark_all_read(state)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(Outcome::Done)
        }
        op => Err(req.error(format!("unknown notification op: {op}"))),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn required_uuid(req: &Frame, key: &str) -> Result<Uuid, Frame> {
    req.uuid_field(key)
        .ok_or_else(|| req.error(format!("{key} required")))
}

fn insert_json(data: &mut Data, key: &str, value: &impl Serialize) {
    data.insert(key.into(), serde_json::to_value(value).unwrap_or_default());
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == Status::Error {
        let code = frame
            .data
            .get("code")
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        let message = frame
            .data
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
    } else {
        info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
