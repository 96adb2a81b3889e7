//! Defines the WebSocket message protocol between the game client and the API server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent from the client to the server as text frames.
///
/// Binary frames carry raw audio and never pass through this type.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// A typed user utterance for the agent.
    #[serde(rename = "text")]
    Text { text: String },
}

/// Messages streamed from the server to the client while a session is live.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RelayMessage {
    /// One normalized agent event.
    AdkEvent {
        payload: Value,
        #[serde(rename = "turnComplete", skip_serializing_if = "Option::is_none")]
        turn_complete: Option<bool>,
    },
    /// A world change found inside the preceding event.
    WorldPatch { patch: Value },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub message: String,
}

/// Every message the server writes to the client socket.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ServerMessage {
    Relay(RelayMessage),
    /// Reports a fatal session error. Always the last message on a socket.
    Error { error: ErrorBody },
}

impl ServerMessage {
    pub fn event(payload: Value, turn_complete: Option<bool>) -> Self {
        Self::Relay(RelayMessage::AdkEvent {
            payload,
            turn_complete,
        })
    }

    pub fn patch(patch: Value) -> Self {
        Self::Relay(RelayMessage::WorldPatch { patch })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorBody {
                message: message.into(),
            },
        }
    }
}
