//! Server configuration from the environment.

use std::time::Duration;

use impostor_room::RoomConfig;
use impostor_words::OracleConfig;
use serde::{Deserialize, Serialize};

use crate::ImpostorError;

/// Port used when neither `IMPOSTOR_BIND` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 8080;

/// Everything the hosted backend needs to start.
///
/// Deserializes from a partial document: missing fields keep their
/// defaults, nested sections included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// A connection that sends nothing for this long is closed.
    pub idle_timeout: Duration,

    /// Time a new connection has to send its `Handshake`.
    pub handshake_timeout: Duration,

    pub room: RoomConfig,
    pub oracle: OracleConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            idle_timeout: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(5),
            room: RoomConfig::default(),
            oracle: OracleConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the bind address from the process environment.
    ///
    /// `IMPOSTOR_BIND` (a full `host:port`) wins; otherwise `PORT` is
    /// bound on all interfaces, as hosting platforms expect; otherwise
    /// `0.0.0.0:8080`.
    ///
    /// # Errors
    /// [`ImpostorError::Config`] if `PORT` is not a port number.
    pub fn from_env() -> Result<Self, ImpostorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ImpostorError> {
        let bind_addr = match (lookup("IMPOSTOR_BIND"), lookup("PORT")) {
            (Some(bind), _) if !bind.trim().is_empty() => bind.trim().to_string(),
            (_, Some(port)) => {
                let port: u16 = port
                    .trim()
                    .parse()
                    .map_err(|_| ImpostorError::Config(format!("PORT is not a port number: {port:?}")))?;
                format!("0.0.0.0:{port}")
            }
            _ => format!("0.0.0.0:{DEFAULT_PORT}"),
        };
        Ok(Self {
            bind_addr,
            ..Self::default()
        })
    }
}
