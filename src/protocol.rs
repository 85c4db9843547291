use crate::error::HubError;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Frames sent by clients, e.g. `{"event":"send-location","data":{"latitude":1.0,"longitude":2.0}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    SendLocation(Position),
}

/// Frames pushed to clients by the hub
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    ReceiveLocation {
        id: ConnectionId,
        latitude: f64,
        longitude: f64,
    },
    /// Payload is the bare id of the connection that went away
    UserDisconnected(ConnectionId),
}

impl ServerMessage {
    pub fn location(id: ConnectionId, position: Position) -> Self {
        Self::ReceiveLocation {
            id,
            latitude: position.latitude,
            longitude: position.longitude,
        }
    }
}

/// Decode an inbound text frame, rejecting missing fields and non-finite coordinates
pub fn decode(text: &str) -> Result<ClientMessage, HubError> {
    let msg: ClientMessage =
        serde_json::from_str(text).map_err(|e| HubError::MalformedPayload(e.to_string()))?;

    match &msg {
        ClientMessage::SendLocation(position) => {
            if !position.is_valid() {
                return Err(HubError::MalformedPayload(
                    "coordinates must be finite numbers".to_string(),
                ));
            }
        }
    }

    Ok(msg)
}

pub fn encode(msg: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}
