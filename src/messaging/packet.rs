//! Engine.IO v4 / Socket.IO v4 text framing.
//!
//! Every WebSocket text frame carries one Engine.IO packet. The first
//! character is the Engine.IO type; type `4` (message) wraps a Socket.IO
//! packet whose first character is the Socket.IO type. Only the default
//! namespace and text payloads are used by the backend.

use crate::types::{RealtimeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Payload of the Engine.IO open packet (`0{...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

impl Handshake {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout)
    }
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// `0` - session opened
    Open(Handshake),
    /// `1` - transport closing
    Close,
    /// `2` - server heartbeat
    Ping,
    /// `3` - heartbeat answer
    Pong,
    /// `5`
    Upgrade,
    /// `6`
    Noop,
    /// `40` - namespace connect (client request or server ack)
    Connect(Option<Value>),
    /// `41` - namespace disconnect
    Disconnect,
    /// `42` - named event with its first argument
    Event { name: String, data: Value },
    /// `43` - acknowledgement, contents unused
    Ack,
    /// `44` - namespace connect refused
    ConnectError(String),
}

impl Packet {
    pub fn event(name: impl Into<String>, data: Value) -> Self {
        Self::Event {
            name: name.into(),
            data,
        }
    }

    /// Decodes a single text frame.
    pub fn decode(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let Some(kind) = chars.next() else {
            return Err(RealtimeError::Protocol("empty frame".to_string()));
        };
        let body = chars.as_str();

        match kind {
            '0' => serde_json::from_str(body)
                .map(Self::Open)
                .map_err(|e| RealtimeError::Protocol(format!("invalid open packet: {}", e))),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping),
            '3' => Ok(Self::Pong),
            '4' => Self::decode_socket(body),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(RealtimeError::Protocol(format!(
                "unknown engine.io packet type '{}'",
                other
            ))),
        }
    }

    fn decode_socket(body: &str) -> Result<Self> {
        let mut chars = body.chars();
        let Some(kind) = chars.next() else {
            return Err(RealtimeError::Protocol(
                "empty socket.io packet".to_string(),
            ));
        };
        let rest = skip_namespace(chars.as_str());

        match kind {
            '0' => {
                if rest.is_empty() {
                    Ok(Self::Connect(None))
                } else {
                    let value = serde_json::from_str(rest).map_err(|e| {
                        RealtimeError::Protocol(format!("invalid connect payload: {}", e))
                    })?;
                    Ok(Self::Connect(Some(value)))
                }
            }
            '1' => Ok(Self::Disconnect),
            '2' => decode_event(rest),
            '3' => Ok(Self::Ack),
            '4' => {
                let message = match serde_json::from_str::<Value>(rest) {
                    Ok(Value::Object(map)) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| Value::Object(map).to_string()),
                    Ok(Value::String(s)) => s,
                    Ok(other) => other.to_string(),
                    Err(_) => rest.to_string(),
                };
                Ok(Self::ConnectError(message))
            }
            '5' | '6' => Err(RealtimeError::Protocol(
                "binary socket.io packets are not supported".to_string(),
            )),
            other => Err(RealtimeError::Protocol(format!(
                "unknown socket.io packet type '{}'",
                other
            ))),
        }
    }

    /// Encodes the packet as a text frame.
    pub fn encode(&self) -> Result<String> {
        let frame = match self {
            Self::Open(handshake) => format!("0{}", serde_json::to_string(handshake)?),
            Self::Close => "1".to_string(),
            Self::Ping => "2".to_string(),
            Self::Pong => "3".to_string(),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
            Self::Connect(None) => "40".to_string(),
            Self::Connect(Some(payload)) => format!("40{}", payload),
            Self::Disconnect => "41".to_string(),
            Self::Event { name, data } => format!("42{}", serde_json::to_string(&(name, data))?),
            Self::Ack => "43[]".to_string(),
            Self::ConnectError(message) => {
                format!("44{}", serde_json::json!({ "message": message }))
            }
        };
        Ok(frame)
    }
}

/// Drops a leading `/namespace,` if present.
fn skip_namespace(body: &str) -> &str {
    if !body.starts_with('/') {
        return body;
    }
    match body.find(',') {
        Some(idx) => &body[idx + 1..],
        None => "",
    }
}

fn decode_event(body: &str) -> Result<Packet> {
    // Optional numeric ack id precedes the JSON array
    let json = body.trim_start_matches(|c: char| c.is_ascii_digit());

    let args: Vec<Value> = serde_json::from_str(json)
        .map_err(|e| RealtimeError::Protocol(format!("invalid event body: {}", e)))?;
    let mut args = args.into_iter();

    let name = match args.next() {
        Some(Value::String(name)) => name,
        _ => {
            return Err(RealtimeError::Protocol(
                "event packet without a name".to_string(),
            ));
        }
    };

    Ok(Packet::Event {
        name,
        data: args.next().unwrap_or(Value::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open_packet() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let Packet::Open(handshake) = Packet::decode(frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(handshake.sid, "abc");
        assert_eq!(handshake.ping_interval(), Duration::from_secs(25));
        assert_eq!(handshake.ping_timeout(), Duration::from_secs(20));
        assert_eq!(handshake.max_payload, Some(1_000_000));
    }

    #[test]
    fn test_decode_heartbeat_and_control_packets() {
        assert_eq!(Packet::decode("1").unwrap(), Packet::Close);
        assert_eq!(Packet::decode("2").unwrap(), Packet::Ping);
        assert_eq!(Packet::decode("3").unwrap(), Packet::Pong);
        assert_eq!(Packet::decode("6").unwrap(), Packet::Noop);
        assert_eq!(Packet::decode("41").unwrap(), Packet::Disconnect);
    }

    #[test]
    fn test_decode_connect_ack() {
        assert_eq!(Packet::decode("40").unwrap(), Packet::Connect(None));
        assert_eq!(
            Packet::decode(r#"40{"sid":"xyz"}"#).unwrap(),
            Packet::Connect(Some(json!({"sid": "xyz"})))
        );
    }

    #[test]
    fn test_decode_connect_error_message() {
        assert_eq!(
            Packet::decode(r#"44{"message":"Not authorized"}"#).unwrap(),
            Packet::ConnectError("Not authorized".to_string())
        );
    }

    #[test]
    fn test_decode_event() {
        let packet =
            Packet::decode(r#"42["generation_progress",{"status":"Working","progress":40}]"#)
                .unwrap();
        assert_eq!(
            packet,
            Packet::event(
                "generation_progress",
                json!({"status": "Working", "progress": 40})
            )
        );
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack_id() {
        let packet = Packet::decode(r#"42/admin,17["status",{"message":"hi"}]"#).unwrap();
        assert_eq!(packet, Packet::event("status", json!({"message": "hi"})));
    }

    #[test]
    fn test_decode_event_without_payload() {
        let packet = Packet::decode(r#"42["generation_started"]"#).unwrap();
        assert_eq!(packet, Packet::event("generation_started", Value::Null));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(Packet::decode(""), Err(RealtimeError::Protocol(_))));
        assert!(matches!(Packet::decode("9"), Err(RealtimeError::Protocol(_))));
        assert!(matches!(Packet::decode("4"), Err(RealtimeError::Protocol(_))));
        assert!(matches!(
            Packet::decode("42{\"not\":\"an array\"}"),
            Err(RealtimeError::Protocol(_))
        ));
        assert!(matches!(
            Packet::decode("42[1,2]"),
            Err(RealtimeError::Protocol(_))
        ));
        assert!(matches!(Packet::decode("é"), Err(RealtimeError::Protocol(_))));
        assert!(matches!(
            Packet::decode(r#"451-["bin",{"_placeholder":true,"num":0}]"#),
            Err(RealtimeError::Protocol(_))
        ));
    }

    #[test]
    fn test_encode_event_frame() {
        let frame = Packet::event("join_session", json!({"session_id": "s1", "user_id": "u1"}))
            .encode()
            .unwrap();
        assert_eq!(
            frame,
            r#"42["join_session",{"session_id":"s1","user_id":"u1"}]"#
        );
    }

    #[test]
    fn test_encode_control_frames() {
        assert_eq!(Packet::Connect(None).encode().unwrap(), "40");
        assert_eq!(Packet::Pong.encode().unwrap(), "3");
        assert_eq!(Packet::Disconnect.encode().unwrap(), "41");
    }
}
