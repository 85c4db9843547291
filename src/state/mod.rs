pub mod registry;

use crate::broadcast::Hub;
use crate::config::Config;

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    pub hub: Hub,
    /// Capacity of each connection's outbound queue
    pub outbox_capacity: usize,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            hub: Hub::new(config.sync_on_join),
            outbox_capacity: config.outbox_capacity,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
