//! Tendermint RPC wire messages and event envelope normalization

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Event key carrying the pool reserve attribute in the flat envelope shape
pub const RESERVES_EVENT_KEY: &str = "wasm.reserves";

/// Decoded attribute key carrying the reserve list in the nested envelope shape
pub const RESERVES_ATTRIBUTE: &str = "reserves";

/// JSON-RPC request sent over the WebSocket connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: String,
    pub method: String,
    pub params: SubscribeParams,
}

/// Parameters of a subscribe request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeParams {
    pub query: String,
}

impl RpcRequest {
    /// Build a subscribe request for the given event query
    pub fn subscribe(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.into(),
            method: "subscribe".to_string(),
            params: SubscribeParams {
                query: query.into(),
            },
        }
    }
}

/// Flat envelope: `result.events` is a key -> array-of-strings map
#[derive(Debug, Clone, Deserialize)]
pub struct FlatEnvelope {
    pub result: FlatResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlatResult {
    pub events: HashMap<String, Vec<String>>,
}

/// Nested envelope: `result.data.value.TxResult.result.events` is an array of
/// ABCI events with base64-encoded key/value attribute pairs
#[derive(Debug, Clone, Deserialize)]
pub struct NestedEnvelope {
    pub result: NestedResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NestedResult {
    pub data: NestedData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NestedData {
    pub value: NestedValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NestedValue {
    #[serde(rename = "TxResult")]
    pub tx_result: TxResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxResult {
    pub result: TxResultInner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxResultInner {
    #[serde(default)]
    pub events: Vec<AbciEvent>,
}

/// A single ABCI event
#[derive(Debug, Clone, Deserialize)]
pub struct AbciEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub attributes: Vec<AbciAttribute>,
}

/// A key/value attribute of an ABCI event, possibly base64-encoded
#[derive(Debug, Clone, Deserialize)]
pub struct AbciAttribute {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// The two upstream event-envelope shapes, normalized by a single parse step
///
/// Shape 1 (flat) is checked first; the first shape that yields a reserve
/// attribute wins.
#[derive(Debug, Clone)]
pub enum ReserveEnvelope {
    Flat(FlatEnvelope),
    Nested(NestedEnvelope),
}

impl ReserveEnvelope {
    /// Resolve a parsed message into whichever envelope shape carries reserves
    pub fn parse(msg: &Value) -> Option<Self> {
        if let Ok(flat) = serde_json::from_value::<FlatEnvelope>(msg.clone()) {
            if flat
                .result
                .events
                .get(RESERVES_EVENT_KEY)
                .is_some_and(|vals| !vals.is_empty())
            {
                return Some(ReserveEnvelope::Flat(flat));
            }
        }

        if let Ok(nested) = serde_json::from_value::<NestedEnvelope>(msg.clone()) {
            let envelope = ReserveEnvelope::Nested(nested);
            if envelope.reserve_attribute().is_some() {
                return Some(envelope);
            }
        }

        None
    }

    /// The decoded reserve attribute (`denom:amount,denom:amount`)
    pub fn reserve_attribute(&self) -> Option<String> {
        match self {
            ReserveEnvelope::Flat(flat) => {
                let vals = flat.result.events.get(RESERVES_EVENT_KEY)?;
                let raw = vals.last()?;
                if looks_base64(raw) {
                    Some(b64_to_str(raw))
                } else {
                    Some(raw.clone())
                }
            }
            ReserveEnvelope::Nested(nested) => {
                for event in &nested.result.data.value.tx_result.result.events {
                    if event.event_type != "wasm" {
                        continue;
                    }
                    for attr in &event.attributes {
                        if b64_to_str(&attr.key) == RESERVES_ATTRIBUTE {
                            return Some(b64_to_str(&attr.value));
                        }
                    }
                }
                None
            }
        }
    }
}

/// Extract the raw reserve string from a stream message, if present
pub fn extract_reserves(msg: &Value) -> Option<String> {
    ReserveEnvelope::parse(msg)?.reserve_attribute()
}

/// Extract the JSON-RPC response id, if present
pub fn message_id(msg: &Value) -> Option<String> {
    match msg.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether a string is plausibly base64
///
/// Raw reserve strings always contain a `:` separator, which is outside the
/// base64 alphabet, so a literal colon means the value is not encoded.
pub fn looks_base64(s: &str) -> bool {
    !s.is_empty()
        && s.len() % 4 == 0
        && !s.contains(':')
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

/// Decode base64 to UTF-8, falling back to the input on any failure
pub fn b64_to_str(s: &str) -> String {
    match BASE64.decode(s) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| s.to_string()),
        Err(_) => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn b64(s: &str) -> String {
        BASE64.encode(s)
    }

    #[test]
    fn test_subscribe_request_shape() {
        let req = RpcRequest::subscribe("7", "tm.event='Tx'");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], "7");
        assert_eq!(value["method"], "subscribe");
        assert_eq!(value["params"]["query"], "tm.event='Tx'");
    }

    #[test]
    fn test_extract_flat_raw() {
        let msg = json!({
            "result": {
                "events": {
                    "wasm.reserves": ["uzig:10,stzig:9"]
                }
            }
        });
        assert_eq!(extract_reserves(&msg).as_deref(), Some("uzig:10,stzig:9"));
    }

    #[test]
    fn test_extract_flat_takes_last_value_and_decodes_base64() {
        let msg = json!({
            "result": {
                "events": {
                    "wasm.reserves": ["uzig:1,stzig:1", b64("uzig:20,stzig:19")]
                }
            }
        });
        assert_eq!(extract_reserves(&msg).as_deref(), Some("uzig:20,stzig:19"));
    }

    #[test]
    fn test_extract_nested_base64_attributes() {
        let msg = json!({
            "result": {
                "data": {
                    "value": {
                        "TxResult": {
                            "result": {
                                "events": [
                                    {
                                        "type": "transfer",
                                        "attributes": []
                                    },
                                    {
                                        "type": "wasm",
                                        "attributes": [
                                            { "key": b64("action"), "value": b64("swap") },
                                            { "key": b64("reserves"), "value": b64("uzig:30,stzig:29") }
                                        ]
                                    }
                                ]
                            }
                        }
                    }
                }
            }
        });
        assert_eq!(extract_reserves(&msg).as_deref(), Some("uzig:30,stzig:29"));
    }

    #[test]
    fn test_flat_shape_wins_over_nested() {
        let msg = json!({
            "result": {
                "events": {
                    "wasm.reserves": ["uzig:1,stzig:2"]
                },
                "data": {
                    "value": {
                        "TxResult": {
                            "result": {
                                "events": [{
                                    "type": "wasm",
                                    "attributes": [
                                        { "key": b64("reserves"), "value": b64("uzig:9,stzig:9") }
                                    ]
                                }]
                            }
                        }
                    }
                }
            }
        });
        assert_eq!(extract_reserves(&msg).as_deref(), Some("uzig:1,stzig:2"));
    }

    #[test]
    fn test_extract_missing_shapes() {
        assert_eq!(extract_reserves(&json!({"result": {}})), None);
        assert_eq!(extract_reserves(&json!({"jsonrpc": "2.0", "id": "1"})), None);
        assert_eq!(
            extract_reserves(&json!({"result": {"events": {"wasm.action": ["swap"]}}})),
            None
        );
    }

    #[test]
    fn test_looks_base64() {
        assert!(looks_base64("dXppZzoxMA=="));
        // Raw reserve strings carry a colon and must not be decoded.
        assert!(!looks_base64("uzig:10,stzig:9"));
        // Length not a multiple of four.
        assert!(!looks_base64("abcde"));
        assert!(!looks_base64(""));
    }

    #[test]
    fn test_b64_to_str_falls_back_on_garbage() {
        assert_eq!(b64_to_str("%%%%"), "%%%%");
        assert_eq!(b64_to_str(&b64("hello")), "hello");
    }

    #[test]
    fn test_message_id_string_and_number() {
        assert_eq!(message_id(&json!({"id": "3"})).as_deref(), Some("3"));
        assert_eq!(message_id(&json!({"id": 3})).as_deref(), Some("3"));
        assert_eq!(message_id(&json!({})), None);
    }
}
