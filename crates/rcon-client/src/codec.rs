use rcon_core::{Frame, InboundFrame};
use serde::{Serialize, de::DeserializeOwned};

use crate::RconError;

/// Serializes a value to JSON text for wire transmission.
pub fn encode<T: Serialize>(value: &T) -> Result<String, RconError> {
    serde_json::to_string(value).map_err(|err| RconError::Encode(err.to_string()))
}

/// Deserializes a JSON text frame into a typed value.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, RconError> {
    serde_json::from_str(text).map_err(|err| RconError::Decode(err.to_string()))
}

/// Decodes and classifies one inbound text frame.
pub fn decode_frame(text: &str) -> Result<Frame, RconError> {
    Ok(decode::<InboundFrame>(text)?.classify())
}

#[cfg(test)]
mod tests {
    use rcon_core::{Frame, RequestId};

    use super::decode_frame;
    use crate::RconError;

    #[test]
    fn decode_frame_classifies_reply() {
        let frame = decode_frame(r#"{"Type":"Generic","Identifier":4,"Message":"done"}"#)
            .expect("frame should decode");
        assert!(matches!(frame, Frame::Reply { id: RequestId(4), .. }));
    }

    #[test]
    fn decode_frame_rejects_garbage() {
        let err = decode_frame("{oops").expect_err("garbage must fail");
        assert!(matches!(err, RconError::Decode(_)));
    }

    #[test]
    fn decode_frame_leaves_chat_payload_encoded() {
        let frame = decode_frame(r#"{"Type":"Chat","Identifier":-1,"Message":"[]"}"#)
            .expect("envelope should decode");
        assert_eq!(frame, Frame::ChatBroadcast("[]".to_string()));
    }
}
