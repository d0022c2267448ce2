//! Real-time transport events.
//!
//! Every WebSocket text frame is a JSON object of the form
//! `{"event": "<name>", "data": {...}}`. Inbound frames decode into
//! [`ClientEvent`], outbound frames encode from [`ServerEvent`].

use serde::{Deserialize, Serialize};

use crate::message::{DirectMessage, GroupMessage};
use crate::room::RoomId;

/// Events a client may send over its connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Join the direct room shared by `sender` and `receiver`.
    Join { sender: String, receiver: String },
    /// Join a group room.
    JoinGroup { username: String, group_id: i64 },
    /// Leave a direct room.
    Leave { sender: String, receiver: String },
    /// Leave a group room.
    LeaveGroup { username: String, group_id: i64 },
    /// Send a direct message.
    SendMessage {
        sender: String,
        receiver: String,
        message: String,
    },
    /// Send a group message.
    SendGroupMessage {
        group_id: i64,
        sender: String,
        message: String,
    },
    /// Keep-alive. Answered with [`ServerEvent::Pong`].
    Ping,
    /// Explicit logout; closes the session.
    Logout,
}

impl ClientEvent {
    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Join { .. } => "join",
            ClientEvent::JoinGroup { .. } => "join_group",
            ClientEvent::Leave { .. } => "leave",
            ClientEvent::LeaveGroup { .. } => "leave_group",
            ClientEvent::SendMessage { .. } => "send_message",
            ClientEvent::SendGroupMessage { .. } => "send_group_message",
            ClientEvent::Ping => "ping",
            ClientEvent::Logout => "logout",
        }
    }
}

/// Events the server pushes to a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A direct message was persisted in a room this session joined.
    ReceiveMessage(DirectMessage),
    /// A group message was persisted in a room this session joined.
    ReceiveGroupMessage(GroupMessage),
    /// Acknowledges a join.
    Joined { room: RoomId },
    /// Acknowledges a leave.
    Left { room: RoomId },
    /// A request from this session was rejected.
    Error { code: String, message: String },
    Pong,
}

impl ServerEvent {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn decode_join_event() {
        let raw = r#"{"event":"join","data":{"sender":"alice","receiver":"bob"}}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::Join {
                sender: "alice".to_string(),
                receiver: "bob".to_string(),
            }
        );
        assert_eq!(event.name(), "join");
    }

    #[test]
    fn decode_send_group_message_event() {
        let raw = r#"{"event":"send_group_message","data":{"group_id":4,"sender":"alice","message":"yo"}}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            event,
            ClientEvent::SendGroupMessage { group_id: 4, ref message, .. } if message == "yo"
        ));
    }

    #[test]
    fn decode_ping_without_data() {
        let event: ClientEvent = serde_json::from_str(r#"{"event":"ping"}"#).unwrap();
        assert_eq!(event, ClientEvent::Ping);
    }

    #[test]
    fn unknown_event_is_rejected() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"event":"typing","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn encode_receive_message() {
        let event = ServerEvent::ReceiveMessage(DirectMessage {
            id: 12,
            sender: "alice".to_string(),
            receiver: "bob".to_string(),
            message: "hello".to_string(),
            timestamp: Utc::now(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "receive_message");
        assert_eq!(json["data"]["sender"], "alice");
        assert_eq!(json["data"]["receiver"], "bob");
        assert_eq!(json["data"]["message"], "hello");
        assert!(json["data"]["timestamp"].is_string());
    }

    #[test]
    fn encode_error_event() {
        let json = serde_json::to_value(ServerEvent::error("NOT_A_MEMBER", "nope")).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["code"], "NOT_A_MEMBER");
    }
}
