use super::*;

fn make_response(content: serde_json::Value) -> String {
    serde_json::json!({
        "id": "msg_123",
        "type": "message",
        "role": "assistant",
        "content": content,
        "model": "claude-sonnet-4-5-20250929",
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 100, "output_tokens": 50 }
    })
    .to_string()
}

#[test]
fn parse_text_response() {
    let json = make_response(serde_json::json!([
        { "type": "text", "text": "Tenemos 12 cables UTP en stock." }
    ]));
    let resp = parse_response(&json).unwrap();
    assert_eq!(resp.content.len(), 1);
    assert_eq!(resp.text().as_deref(), Some("Tenemos 12 cables UTP en stock."));
    assert_eq!(resp.model, "claude-sonnet-4-5-20250929");
    assert_eq!(resp.stop_reason, "end_turn");
    assert_eq!(resp.input_tokens, 100);
    assert_eq!(resp.output_tokens, 50);
}

#[test]
fn parse_filters_thinking_and_unknown_blocks() {
    let json = make_response(serde_json::json!([
        { "type": "thinking", "thinking": "Let me check the stock..." },
        { "type": "some_future_type", "data": {} },
        { "type": "text", "text": "Here is my answer" }
    ]));
    let resp = parse_response(&json).unwrap();
    assert_eq!(resp.content.len(), 1);
    assert!(matches!(&resp.content[0], ContentBlock::Text { text } if text == "Here is my answer"));
}

#[test]
fn parse_thinking_only_response_is_empty() {
    let json = make_response(serde_json::json!([
        { "type": "thinking", "thinking": "..." }
    ]));
    let resp = parse_response(&json).unwrap();
    assert!(resp.content.is_empty());
    assert!(resp.text().is_none());
}

#[test]
fn parse_invalid_json() {
    let err = parse_response("not json").unwrap_err();
    assert!(matches!(err, LlmError::ApiParse(_)));
}

#[test]
fn request_serializes_plain_text_turns() {
    let messages = vec![Message::assistant("¡Hola!"), Message::user("¿Hay LEDs?")];
    let body = ApiRequest { model: "m", max_tokens: 512, system: "sys", messages: &messages };
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["system"], "sys");
    assert_eq!(json["messages"][0]["role"], "assistant");
    assert_eq!(json["messages"][1]["content"], "¿Hay LEDs?");
}

#[test]
fn leading_assistant_greeting_is_dropped() {
    let messages = vec![Message::assistant("¡Hola!"), Message::user("a"), Message::assistant("b")];
    let trimmed = from_first_user_turn(&messages);
    assert_eq!(trimmed.len(), 2);
    assert_eq!(trimmed[0], Message::user("a"));
    assert!(from_first_user_turn(&[Message::assistant("solo")]).is_empty());
}
