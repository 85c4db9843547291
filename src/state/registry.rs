//! Connection registry
//!
//! Plain map of open connections. It does no locking itself; the hub owns it
//! behind a single lock so every mutation and snapshot is serialized.

use crate::error::HubError;
use crate::protocol::ServerMessage;
use crate::types::*;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Sending half of a connection's outbound queue
pub type Outbox = mpsc::Sender<ServerMessage>;

#[derive(Debug)]
struct Entry {
    record: ConnectionRecord,
    outbox: Outbox,
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<ConnectionId, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record with no position yet
    pub fn register(&mut self, id: ConnectionId, outbox: Outbox) -> Result<(), HubError> {
        if self.entries.contains_key(&id) {
            return Err(HubError::DuplicateId(id));
        }

        let record = ConnectionRecord::new(id.clone());
        self.entries.insert(id, Entry { record, outbox });
        Ok(())
    }

    pub fn update_position(&mut self, id: &str, position: Position) -> Result<(), HubError> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| HubError::UnknownId(id.to_string()))?;
        entry.record.last_position = Some(position);
        Ok(())
    }

    pub fn unregister(&mut self, id: &str) -> Result<ConnectionRecord, HubError> {
        self.entries
            .remove(id)
            .map(|entry| entry.record)
            .ok_or_else(|| HubError::UnknownId(id.to_string()))
    }

    /// Every other connection that has reported a position
    pub fn snapshot_others(&self, exclude: &str) -> Vec<(ConnectionId, Position)> {
        self.entries
            .values()
            .filter(|e| e.record.id != exclude)
            .filter_map(|e| e.record.last_position.map(|p| (e.record.id.clone(), p)))
            .collect()
    }

    /// Fan-out targets: every other open connection, with or without a position
    pub fn recipients(&self, exclude: &str) -> Vec<(ConnectionId, Outbox)> {
        self.entries
            .values()
            .filter(|e| e.record.id != exclude)
            .map(|e| (e.record.id.clone(), e.outbox.clone()))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&ConnectionRecord> {
        self.entries.get(id).map(|e| &e.record)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
