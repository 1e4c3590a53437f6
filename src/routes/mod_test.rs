use super::*;
use crate::services::inventory::InventoryError;
use crate::state::test_helpers;

#[tokio::test]
async fn api_error_renders_code_and_message() {
    let err = ApiError::new(StatusCode::NOT_FOUND, &InventoryError::NotFound(uuid::Uuid::nil()));
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "E_PRODUCT_NOT_FOUND");
    assert!(body["message"].as_str().is_some_and(|m| m.starts_with("product not found")));
}

#[test]
fn bad_request_helper() {
    let err = ApiError::bad_request("E_BAD_INPUT", "limit must be positive");
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "E_BAD_INPUT");
}

#[test]
fn nav_lists_every_section_in_order() {
    let paths: Vec<_> = NAV_ITEMS.iter().map(|n| n.path).collect();
    assert_eq!(paths, ["/", "/sales", "/inventory", "/notifications", "/ai-assistant"]);
    assert_eq!(NAV_ITEMS[0].label, "Panel de Control");
}

#[tokio::test]
async fn router_serves_health_nav_and_greeting_without_database() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app(test_helpers::test_app_state());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let health = client.get(format!("http://{addr}/healthz")).send().await.unwrap();
    assert_eq!(health.status(), reqwest::StatusCode::OK);

    let nav: serde_json::Value = client
        .get(format!("http://{addr}/api/nav"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(nav[1]["label"], "Ventas y POS");

    let greeting: serde_json::Value = client
        .get(format!("http://{addr}/api/assistant/greeting?variant=page"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(greeting["variant"], "page");

    let missing = client
        .post(format!("http://{addr}/api/assistant/chat"))
        .json(&serde_json::json!({ "message": "hola" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
}
