use serde::{Deserialize, Serialize};

/// Opaque connection identifier (a ULID rendered as a string)
pub type ConnectionId = String;

/// Generate a fresh connection id
pub fn new_connection_id() -> ConnectionId {
    ulid::Ulid::new().to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both coordinates must be finite numbers; no range check is applied
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Last-known state of one open connection
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub last_position: Option<Position>,
}

impl ConnectionRecord {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            last_position: None,
        }
    }
}
