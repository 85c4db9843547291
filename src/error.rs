use crate::types::ConnectionId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HubError {
    #[error("Unknown connection: {0}")]
    UnknownId(ConnectionId),

    /// Ids are freshly generated per accept, so this is an internal invariant violation
    #[error("Connection already registered: {0}")]
    DuplicateId(ConnectionId),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Failed to deliver to connection {0}")]
    TransportWriteFailure(ConnectionId),
}
