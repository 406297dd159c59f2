//! Phase 1 type tests: message shapes, codec, method table, error mapping,
//! schema validation, and URI templates.

use serde_json::json;

use mcp_duplex::protocol::validator::{self, Coercion};
use mcp_duplex::protocol::{codec, Method};
use mcp_duplex::registry::UriTemplate;
use mcp_duplex::types::*;

#[test]
fn test_request_id_forms() {
    assert_eq!(serde_json::to_string(&RequestId::Number(42)).unwrap(), "42");
    assert_eq!(
        serde_json::to_string(&RequestId::String("abc".to_string())).unwrap(),
        "\"abc\""
    );

    let parsed: RequestId = serde_json::from_str("\"req-7\"").unwrap();
    assert_eq!(parsed, RequestId::String("req-7".to_string()));
    assert_eq!(parsed.to_string(), "req-7");
}

#[test]
fn test_codec_round_trip_all_shapes() {
    let messages = vec![
        JsonRpcMessage::Request(JsonRpcRequest::new(
            RequestId::Number(1),
            "tools/call",
            Some(json!({"name": "search_flights", "arguments": {"origin": "LAX"}})),
        )),
        JsonRpcMessage::Response(JsonRpcResponse::new(
            RequestId::String("a".to_string()),
            json!({"ok": true}),
        )),
        JsonRpcMessage::Error(McpError::ToolNotFound("nope".to_string()).to_json_rpc_error(
            RequestId::Number(3),
        )),
        JsonRpcMessage::Notification(JsonRpcNotification::new(
            "notifications/initialized",
            None,
        )),
    ];

    for message in messages {
        let bytes = codec::encode(&message).unwrap();
        assert!(!bytes.contains(&b'\n'), "frames must be single-line");
        let decoded = codec::decode(&bytes).unwrap();
        assert_eq!(decoded, message);
    }
}

#[test]
fn test_decode_classifies_by_shape() {
    let request = codec::decode(br#"{"jsonrpc":"2.0","id":5,"method":"ping"}"#).unwrap();
    assert!(matches!(request, JsonRpcMessage::Request(_)));
    assert_eq!(request.id(), Some(&RequestId::Number(5)));

    let notification =
        codec::decode(br#"{"jsonrpc":"2.0","method":"notifications/cancelled"}"#).unwrap();
    assert!(matches!(notification, JsonRpcMessage::Notification(_)));
    assert_eq!(notification.id(), None);

    let error = codec::decode(
        br#"{"jsonrpc":"2.0","id":"x","error":{"code":-32601,"message":"missing"}}"#,
    )
    .unwrap();
    match error {
        JsonRpcMessage::Error(e) => {
            assert_eq!(e.error.code, error_codes::METHOD_NOT_FOUND);
            assert_eq!(e.error.message, "missing");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn test_decode_rejects_malformed_frames() {
    let bad_frames: [&[u8]; 5] = [
        b"not json",
        br#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#,
        br#"{"jsonrpc":"2.0","id":1}"#,
        br#"{"jsonrpc":"2.0","id":1,"method":"ping","params":[1,2]}"#,
        br#"[1,2,3]"#,
    ];

    for frame in bad_frames {
        let err = codec::decode(frame).unwrap_err();
        assert!(matches!(err, McpError::DecodeError(_)), "{err:?}");
        assert_eq!(err.code(), error_codes::PARSE_ERROR);
    }
}

#[test]
fn test_method_table() {
    for method in Method::ALL {
        assert_eq!(Method::parse(method.as_str()), Some(method));
    }
    assert_eq!(Method::ToolsCall.as_str(), "tools/call");
    assert_eq!(
        Method::SamplingCreateMessage.as_str(),
        "sampling/createMessage"
    );
    assert_eq!(
        Method::ResourcesRead.required_capability(),
        Some(CapabilityKind::Resource)
    );
    assert_eq!(Method::Ping.required_capability(), None);

    let err = "tools/delete".parse::<Method>().unwrap_err();
    assert!(matches!(err, McpError::MethodNotFound(_)));
}

#[test]
fn test_mcp_error_codes() {
    assert_eq!(
        McpError::InvalidParams("x".to_string()).code(),
        error_codes::INVALID_PARAMS
    );
    assert_eq!(
        McpError::NotReady("x".to_string()).code(),
        mcp_error_codes::NOT_READY
    );
    assert_eq!(McpError::SessionClosed.code(), mcp_error_codes::SESSION_CLOSED);
    assert_eq!(
        McpError::PromptNotFound("p".to_string()).code(),
        mcp_error_codes::PROMPT_NOT_FOUND
    );
    assert!(McpError::TransportClosed.is_transport());
    assert!(!McpError::SessionClosed.is_transport());
}

#[test]
fn test_error_object_round_trip() {
    let original = McpError::RequestTimeout {
        method: "tools/call".to_string(),
        timeout_ms: 50,
    };
    let object = original.to_error_object();
    assert_eq!(object.code, mcp_error_codes::REQUEST_TIMEOUT);
    assert_eq!(object.data.as_ref().unwrap()["timeoutMs"], 50);

    match McpError::from_error_object(&object) {
        McpError::RequestTimeout { method, timeout_ms } => {
            assert_eq!(method, "tools/call");
            assert_eq!(timeout_ms, 50);
        }
        other => panic!("unexpected {other:?}"),
    }

    let object = McpError::ResourceNotFound("file://nowhere".to_string()).to_error_object();
    assert_eq!(object.message, "file://nowhere");
    assert!(matches!(
        McpError::from_error_object(&object),
        McpError::ResourceNotFound(uri) if uri == "file://nowhere"
    ));

    let unknown = JsonRpcErrorObject {
        code: -1,
        message: "custom".to_string(),
        data: None,
    };
    assert!(matches!(
        McpError::from_error_object(&unknown),
        McpError::Remote { code: -1, .. }
    ));
}

#[test]
fn test_capability_set_queries() {
    let set = CapabilitySet::new(vec![
        CapabilityDescriptor::new("search_flights", CapabilityKind::Tool),
        CapabilityDescriptor::new("file://airports", CapabilityKind::Resource),
    ]);

    assert!(set.supports(CapabilityKind::Tool));
    assert!(!set.supports(CapabilityKind::Sampling));
    assert!(set.find(CapabilityKind::Tool, "search_flights").is_some());
    assert!(set.find(CapabilityKind::Prompt, "search_flights").is_none());
    assert_eq!(set.of_kind(CapabilityKind::Resource).count(), 1);

    let json = serde_json::to_value(&set).unwrap();
    assert_eq!(json[0]["kind"], "tool");
    assert_eq!(json[1]["name"], "file://airports");
}

#[test]
fn test_elicit_result_wire_form() {
    let decline = ElicitResult::Decline {
        reason: Some("busy".to_string()),
    };
    assert_eq!(
        serde_json::to_value(&decline).unwrap(),
        json!({"action": "decline", "reason": "busy"})
    );

    let parsed: ElicitResult =
        serde_json::from_value(json!({"action": "accept", "content": {"seat": "aisle"}}))
            .unwrap();
    assert_eq!(
        parsed,
        ElicitResult::Accept {
            content: json!({"seat": "aisle"})
        }
    );
}

#[test]
fn test_validator_strict_and_coercing() {
    let schema = validator::object_schema([
        ("budget", json!({"type": "number"}), true),
        ("preferences", json!({"type": "string"}), false),
    ]);

    let ok = validator::validate(&json!({"budget": 800.0}), &schema, Coercion::Strict).unwrap();
    assert_eq!(ok["budget"], 800.0);

    let err = validator::validate(&json!({"budget": "800.0"}), &schema, Coercion::Strict)
        .unwrap_err();
    assert!(matches!(err, McpError::InvalidParams(ref m) if m.contains("budget")));

    let coerced =
        validator::validate(&json!({"budget": "800.0"}), &schema, Coercion::NumericStrings)
            .unwrap();
    assert_eq!(coerced["budget"], 800.0);

    let missing = validator::validate(&json!({}), &schema, Coercion::NumericStrings);
    assert!(matches!(missing, Err(McpError::InvalidParams(_))));

    let not_a_number =
        validator::validate(&json!({"budget": "cheap"}), &schema, Coercion::NumericStrings);
    assert!(matches!(not_a_number, Err(McpError::InvalidParams(_))));
}

#[test]
fn test_validator_bounds_enum_and_extra_properties() {
    let schema = json!({
        "type": "object",
        "properties": {
            "days": {"type": "integer", "minimum": 1, "maximum": 30},
            "cabin": {"enum": ["economy", "business"]}
        },
        "additionalProperties": false
    });

    assert!(validator::validate(&json!({"days": 3}), &schema, Coercion::Strict).is_ok());
    assert!(validator::validate(&json!({"days": 0}), &schema, Coercion::Strict).is_err());
    assert!(validator::validate(&json!({"days": 2.5}), &schema, Coercion::Strict).is_err());
    assert!(validator::validate(&json!({"cabin": "first"}), &schema, Coercion::Strict).is_err());
    assert!(validator::validate(&json!({"extra": 1}), &schema, Coercion::Strict).is_err());
}

#[test]
fn test_uri_template_matching() {
    let template = UriTemplate::parse("flight://booking/{booking_id}");

    let vars = template.matches("flight://booking/BK123").unwrap();
    assert_eq!(vars.get("booking_id").map(String::as_str), Some("BK123"));

    assert!(template.matches("flight://booking/").is_none());
    assert!(template.matches("flight://booking/a/b").is_none());
    assert!(template.matches("flight://other/BK123").is_none());

    let two = UriTemplate::parse("mem://{kind}/{id}.json");
    let vars = two.matches("mem://node/7.json").unwrap();
    assert_eq!(vars["kind"], "node");
    assert_eq!(vars["id"], "7");
}
