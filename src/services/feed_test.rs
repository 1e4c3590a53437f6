use super::*;
use crate::frame::Status;
use crate::state::test_helpers;
use tokio::time::{Duration, timeout};

async fn recv(rx: &mut mpsc::Receiver<Frame>) -> Frame {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("frame receive timed out")
        .expect("channel closed")
}

async fn assert_channel_empty(rx: &mut mpsc::Receiver<Frame>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected channel to remain empty"
    );
}

#[derive(Serialize)]
struct Payload {
    id: u32,
    message: &'static str,
}

#[test]
fn event_flattens_object_payload() {
    let frame = event(NOTIFICATION_CREATED, &Payload { id: 7, message: "hola" });
    assert_eq!(frame.syscall, "notification:created");
    assert_eq!(frame.status, Status::Request);
    assert_eq!(frame.data.get("id").and_then(serde_json::Value::as_u64), Some(7));
    assert_eq!(frame.data.get("message").and_then(|v| v.as_str()), Some("hola"));
}

#[test]
fn event_wraps_scalar_payload() {
    let frame = event(PRODUCT_DELETED, &"abc");
    assert_eq!(frame.data.get("value").and_then(|v| v.as_str()), Some("abc"));
}

#[tokio::test]
async fn publish_reaches_every_subscriber() {
    let state = test_helpers::test_app_state();
    let (_a, mut rx_a) = test_helpers::subscribe(&state).await;
    let (_b, mut rx_b) = test_helpers::subscribe(&state).await;

    let frame = event(PRODUCT_CHANGED, &Payload { id: 1, message: "x" });
    publish(&state, &frame).await;

    assert_eq!(recv(&mut rx_a).await.syscall, "product:changed");
    assert_eq!(recv(&mut rx_b).await.syscall, "product:changed");
    assert_channel_empty(&mut rx_a).await;
}

#[tokio::test]
async fn unsubscribed_clients_stop_receiving() {
    let state = test_helpers::test_app_state();
    let (client, mut rx) = test_helpers::subscribe(&state).await;
    unsubscribe(&state, client).await;

    publish_event(&state, SALE_COMPLETED, &Payload { id: 2, message: "y" }).await;
    // Sender was dropped with the map entry, so the channel reports closed.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn full_subscriber_queue_does_not_block_others() {
    let state = test_helpers::test_app_state();
    let slow = Uuid::new_v4();
    let (slow_tx, _slow_rx) = mpsc::channel(1);
    subscribe(&state, slow, slow_tx).await;
    let (_fast, mut fast_rx) = test_helpers::subscribe(&state).await;

    for id in 0..3 {
        publish_event(&state, PRODUCT_CHANGED, &Payload { id, message: "z" }).await;
    }

    for expected in 0..3_u64 {
        let frame = recv(&mut fast_rx).await;
        assert_eq!(frame.data.get("id").and_then(serde_json::Value::as_u64), Some(expected));
    }
}
