//! Server configuration loaded from environment variables

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STATIC_DIR: &str = "public";
const DEFAULT_OUTBOX_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    /// Directory served for every path other than the WebSocket endpoint
    pub static_dir: PathBuf,
    /// Per-connection outbound queue size; events beyond it are dropped
    pub outbox_capacity: usize,
    pub sync_on_join: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            sync_on_join: false,
        }
    }
}

impl Config {
    /// Load config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind = parse_var("LIVETRACK_BIND")?.unwrap_or(defaults.bind);
        let port = parse_var("PORT")?.unwrap_or(defaults.port);

        let static_dir = std::env::var("LIVETRACK_STATIC_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let outbox_capacity: usize =
            parse_var("LIVETRACK_OUTBOX_CAPACITY")?.unwrap_or(defaults.outbox_capacity);
        if outbox_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "LIVETRACK_OUTBOX_CAPACITY",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let sync_on_join = std::env::var("LIVETRACK_SYNC_ON_JOIN")
            .map(|v| v != "0" && v.to_lowercase() != "false")
            .unwrap_or(defaults.sync_on_join);

        let config = Self {
            bind,
            port,
            static_dir,
            outbox_capacity,
            sync_on_join,
        };

        tracing::info!(
            addr = %config.addr(),
            static_dir = %config.static_dir.display(),
            outbox_capacity,
            sync_on_join,
            "Config loaded"
        );

        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Parse an optional env var, treating unset or blank as absent
fn parse_var<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = std::env::var(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        })
}
