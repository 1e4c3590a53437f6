use super::*;
use crate::services::inventory::InventoryError;
use crate::state::test_helpers;

#[test]
fn assistant_error_to_status_maps_each_variant() {
    assert_eq!(
        assistant_error_to_status(AssistantError::LlmNotConfigured).status,
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(assistant_error_to_status(AssistantError::EmptyMessage).status, StatusCode::BAD_REQUEST);
    assert_eq!(
        assistant_error_to_status(AssistantError::RateLimited("slow down".into())).status,
        StatusCode::TOO_MANY_REQUESTS
    );
    let api = assistant_error_to_status(AssistantError::Inventory(InventoryError::Invalid("x".into())));
    assert_eq!(api.status, StatusCode::BAD_REQUEST);
    assert_eq!(api.code, "E_INVALID_PRODUCT");
}

#[test]
fn chat_body_defaults() {
    let body: ChatBody = serde_json::from_str(r#"{"message":"¿Tienen Arduino?"}"#).unwrap();
    assert_eq!(body.variant, AssistantVariant::Floating);
    assert!(body.messages.is_empty());
    assert!(body.client_id.is_none());
}

#[tokio::test]
async fn greeting_follows_variant() {
    let Json(page) = greeting(Query(GreetingQuery { variant: AssistantVariant::Page })).await;
    assert_eq!(page.greeting, assistant::greeting(AssistantVariant::Page));
    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["variant"], "page");
}

#[tokio::test]
async fn chat_without_llm_is_service_unavailable() {
    let state = test_helpers::test_app_state();
    let body = ChatBody {
        variant: AssistantVariant::Page,
        messages: vec![],
        message: "hola".into(),
        client_id: None,
    };
    let err = chat(State(state), Json(body)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err.code, "E_LLM_NOT_CONFIGURED");
}
