//! WebSocket message dispatch
//!
//! Decodes inbound text frames and forwards them to the hub on behalf of the
//! connection that sent them.

use crate::protocol::{self, ClientMessage};
use crate::state::AppState;

/// Handle a decoded client message
pub async fn handle_message(msg: ClientMessage, id: &str, state: &AppState) {
    match msg {
        ClientMessage::SendLocation(position) => {
            state.hub.on_position_update(id, position).await;
        }
    }
}

/// Handle a raw text frame; malformed frames are dropped and the connection stays open
pub async fn handle_text(text: &str, id: &str, state: &AppState) {
    tracing::debug!(connection = %id, "Received message: {}", text);

    match protocol::decode(text) {
        Ok(msg) => handle_message(msg, id, state).await,
        Err(e) => {
            tracing::warn!(connection = %id, "Dropping frame: {}", e);
        }
    }
}
