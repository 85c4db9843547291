pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::protocol;
use crate::state::AppState;
use crate::types::new_connection_id;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one connection from accept to teardown
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let id = new_connection_id();
    let (outbox, mut outbox_rx) = mpsc::channel(state.outbox_capacity);
    state.hub.on_connect(&id, outbox).await;

    // Every way out of this loop funnels into the single disconnect below
    loop {
        tokio::select! {
            // Events the hub queued for this connection
            outbound = outbox_rx.recv() => {
                let Some(msg) = outbound else {
                    break;
                };
                match protocol::encode(&msg) {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            tracing::debug!(connection = %id, "Write failed");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to serialize event: {}", e);
                    }
                }
            }

            // Frames from the client
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        handlers::handle_text(text.as_str(), &id, &state).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!(connection = %id, "WebSocket closed by client");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(connection = %id, "WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.hub.on_disconnect(&id).await;
}
