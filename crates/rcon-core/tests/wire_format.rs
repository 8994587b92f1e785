use rcon_core::{FrameKind, InboundFrame, OutboundFrame, RequestId};
use serde_json::json;

#[test]
fn outbound_frame_uses_pascal_case_fields() {
    let frame = OutboundFrame {
        name: "console".to_string(),
        identifier: RequestId(1),
        message: "status".to_string(),
    };

    let encoded = serde_json::to_value(&frame).expect("outbound encode should succeed");
    assert_eq!(
        encoded,
        json!({ "Name": "console", "Identifier": 1, "Message": "status" })
    );
}

#[test]
fn inbound_frame_decodes_server_shape() {
    let text = r#"{"Type":"Generic","Identifier":1,"Message":"ok","Stacktrace":""}"#;
    let frame: InboundFrame = serde_json::from_str(text).expect("inbound decode should succeed");

    assert_eq!(frame.kind, FrameKind::Generic);
    assert_eq!(frame.identifier, RequestId(1));
    assert_eq!(frame.message, "ok");
}

#[test]
fn inbound_frame_tolerates_missing_stacktrace_and_unknown_type() {
    let text = r#"{"Type":"Warning","Identifier":0,"Message":"low memory"}"#;
    let frame: InboundFrame = serde_json::from_str(text).expect("inbound decode should succeed");

    assert_eq!(frame.kind, FrameKind::Other);
    assert!(frame.stacktrace.is_empty());
}

#[test]
fn inbound_frame_rejects_missing_identifier() {
    let text = r#"{"Type":"Generic","Message":"ok"}"#;
    let result = serde_json::from_str::<InboundFrame>(text);
    assert!(result.is_err());
}
