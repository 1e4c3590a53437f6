use super::*;

#[test]
fn parse_text_response() {
    let json = serde_json::json!({
        "model": "google/gemini-2.5-flash-lite",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": "Tenemos 4 relés disponibles." },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
    })
    .to_string();
    let resp = parse_chat_completions_response(&json).unwrap();
    assert_eq!(resp.text().as_deref(), Some("Tenemos 4 relés disponibles."));
    assert_eq!(resp.model, "google/gemini-2.5-flash-lite");
    assert_eq!(resp.stop_reason, "end_turn");
    assert_eq!(resp.input_tokens, 10);
    assert_eq!(resp.output_tokens, 5);
}

#[test]
fn parse_length_finish_maps_to_max_tokens() {
    let json = serde_json::json!({
        "choices": [{ "message": { "content": "trunc" }, "finish_reason": "length" }]
    })
    .to_string();
    let resp = parse_chat_completions_response(&json).unwrap();
    assert_eq!(resp.stop_reason, "max_tokens");
    assert_eq!(resp.input_tokens, 0);
}

#[test]
fn parse_null_content_yields_no_text() {
    let json = serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": null }, "finish_reason": "stop" }]
    })
    .to_string();
    let resp = parse_chat_completions_response(&json).unwrap();
    assert!(resp.text().is_none());
}

#[test]
fn parse_error_body_is_provider_error() {
    let json = serde_json::json!({ "error": { "message": "No auth credentials found", "code": 401 } }).to_string();
    let err = parse_chat_completions_response(&json).unwrap_err();
    assert!(matches!(err, LlmError::Provider(m) if m == "No auth credentials found"));
}

#[test]
fn parse_missing_choices() {
    let json = serde_json::json!({ "model": "x", "choices": [] }).to_string();
    assert!(matches!(parse_chat_completions_response(&json), Err(LlmError::ApiParse(_))));
    assert!(matches!(parse_chat_completions_response("nope"), Err(LlmError::ApiParse(_))));
}

#[test]
fn build_messages_prepends_system_prompt() {
    let transcript = vec![Message::assistant("¡Hola!"), Message::user("Quiero una red local")];
    let msgs = build_messages("INVENTARIO ACTUAL", &transcript);
    assert_eq!(msgs.len(), 3);
    assert_eq!(msgs[0].role, "system");
    assert_eq!(msgs[0].content, "INVENTARIO ACTUAL");
    assert_eq!(msgs[1].role, "assistant");
    assert_eq!(msgs[2].role, "user");
    assert_eq!(msgs[2].content, "Quiero una red local");
}

#[test]
fn build_messages_skips_blank_system() {
    let transcript = vec![Message::user("hola")];
    let msgs = build_messages("  ", &transcript);
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].role, "user");
}
