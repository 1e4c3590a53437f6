use super::*;
use crate::state::test_helpers;
use uuid::Uuid;

#[test]
fn sales_error_to_status_maps_stock_conflict() {
    let err = SalesError::InsufficientStock { product_id: Uuid::nil(), requested: 3, available: 1 };
    let api = sales_error_to_status(err);
    assert_eq!(api.status, StatusCode::CONFLICT);
    assert_eq!(api.code, "E_INSUFFICIENT_STOCK");
}

#[test]
fn sales_error_to_status_maps_client_errors() {
    assert_eq!(sales_error_to_status(SalesError::EmptyCart).status, StatusCode::BAD_REQUEST);
    assert_eq!(
        sales_error_to_status(SalesError::InvalidQuantity { product_id: Uuid::nil(), quantity: 0 }).status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(sales_error_to_status(SalesError::ProductNotFound(Uuid::nil())).status, StatusCode::NOT_FOUND);
}

#[test]
fn checkout_body_parses_lines() {
    let id = Uuid::new_v4();
    let body: CheckoutBody =
        serde_json::from_value(serde_json::json!({ "lines": [{ "product_id": id, "quantity": 2 }] })).unwrap();
    assert_eq!(body.lines, vec![CheckoutLine { product_id: id, quantity: 2 }]);
}

#[tokio::test]
async fn non_positive_limit_is_bad_request() {
    let state = test_helpers::test_app_state();
    let err = list_sales(State(state), Query(ListQuery { limit: Some(0) })).await.unwrap_err();
    assert_eq!(err.code, "E_INVALID_LIMIT");
}

#[tokio::test]
async fn empty_checkout_is_bad_request() {
    let state = test_helpers::test_app_state();
    let err = checkout(State(state), Json(CheckoutBody { lines: vec![] })).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "E_EMPTY_CART");
}
