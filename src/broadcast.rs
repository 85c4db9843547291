//! Broadcast hub
//!
//! Single source of truth for what happens when a connection joins, reports a
//! position, or goes away. The registry lives behind one lock; recipients and
//! payload are computed while holding it, delivery happens after it is
//! released with a non-blocking `try_send` per recipient.

use crate::error::HubError;
use crate::protocol::ServerMessage;
use crate::state::registry::{Outbox, Registry};
use crate::types::*;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc::error::TrySendError, RwLock};

#[derive(Debug, Default)]
pub struct Hub {
    registry: RwLock<Registry>,
    /// Send the joining connection every known peer position on connect
    sync_on_join: bool,
    dropped: AtomicU64,
}

impl Hub {
    pub fn new(sync_on_join: bool) -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            sync_on_join,
            dropped: AtomicU64::new(0),
        }
    }

    pub async fn on_connect(&self, id: &str, outbox: Outbox) {
        let synced = {
            let mut registry = self.registry.write().await;
            if let Err(e) = registry.register(id.to_string(), outbox.clone()) {
                tracing::error!("Failed to register connection: {}", e);
                return;
            }

            // Catch-up must be queued before any peer update can reach the new outbox
            if self.sync_on_join {
                let targets = [(id.to_string(), outbox)];
                let catch_up = registry.snapshot_others(id);
                for (peer, position) in &catch_up {
                    self.deliver(&targets, ServerMessage::location(peer.clone(), *position));
                }
                catch_up.len()
            } else {
                0
            }
        };

        tracing::info!(connection = %id, synced, "User connected");
    }

    /// Record the position and fan it out to every other open connection
    pub async fn on_position_update(&self, id: &str, position: Position) {
        if !position.is_valid() {
            let e = HubError::MalformedPayload("coordinates must be finite numbers".to_string());
            tracing::warn!(connection = %id, "Dropping update: {}", e);
            return;
        }

        let recipients = {
            let mut registry = self.registry.write().await;
            if let Err(e) = registry.update_position(id, position) {
                tracing::debug!("Ignoring position update: {}", e);
                return;
            }
            registry.recipients(id)
        };

        tracing::debug!(
            connection = %id,
            latitude = position.latitude,
            longitude = position.longitude,
            recipients = recipients.len(),
            "Broadcasting location"
        );

        self.deliver(
            &recipients,
            ServerMessage::location(id.to_string(), position),
        );
    }

    /// Drop the connection and tell everyone still connected
    pub async fn on_disconnect(&self, id: &str) {
        let recipients = {
            let mut registry = self.registry.write().await;
            if let Err(e) = registry.unregister(id) {
                tracing::debug!("Ignoring disconnect: {}", e);
                return;
            }
            registry.recipients(id)
        };

        tracing::info!(connection = %id, remaining = recipients.len(), "User disconnected");

        self.deliver(&recipients, ServerMessage::UserDisconnected(id.to_string()));
    }

    /// Enqueue one copy per recipient, returns how many were accepted
    fn deliver(&self, recipients: &[(ConnectionId, Outbox)], msg: ServerMessage) -> usize {
        let mut delivered = 0;
        for (id, outbox) in recipients {
            match outbox.try_send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::warn!(
                        connection = %id,
                        total_dropped = total,
                        "Outbox full, dropping event"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    // Receiver gone means the connection task is already tearing down
                    let e = HubError::TransportWriteFailure(id.clone());
                    tracing::debug!("{}", e);
                }
            }
        }
        delivered
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.read().await.len()
    }

    pub async fn connection_ids(&self) -> Vec<ConnectionId> {
        self.registry.read().await.ids()
    }

    pub async fn is_connected(&self, id: &str) -> bool {
        self.registry.read().await.contains(id)
    }

    pub async fn last_position(&self, id: &str) -> Option<Position> {
        self.registry
            .read()
            .await
            .get(id)
            .and_then(|r| r.last_position)
    }

    /// Events dropped because a recipient's outbox was full
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
