//! `ImpostorServer` builder and server loop.
//!
//! This is the entry point for running the hosted backend. It ties
//! together all the layers: transport → protocol → room coordinator.

use std::sync::Arc;
use std::time::Duration;

use impostor_protocol::{Codec, JsonCodec};
use impostor_room::{RoomConfig, RoomCoordinator};
use impostor_store::SessionStore;
use impostor_transport::{Transport, WebSocketTransport};
use impostor_words::{OracleConfig, ResilientOracle, WordOracle};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::resume::ResumeKeys;
use crate::{ImpostorError, ServerConfig};

/// The current protocol version. Clients must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S, O, C> {
    pub(crate) coordinator: Arc<RoomCoordinator<S, O>>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
    pub(crate) handshake_timeout: Duration,
    /// Shared by every connection; locked only around a lookup or insert.
    pub(crate) resume_keys: Mutex<ResumeKeys>,
}

/// Builder for configuring and starting a server.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use impostor::{ImpostorServerBuilder, ServerConfig};
/// use impostor_store::MemoryStore;
/// use impostor_words::WordTable;
///
/// # async fn run() -> Result<(), impostor::ImpostorError> {
/// let server = ImpostorServerBuilder::new()
///     .config(ServerConfig::from_env()?)
///     .build(Arc::new(MemoryStore::new()), WordTable::new())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ImpostorServerBuilder {
    config: ServerConfig,
}

impl ImpostorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the room rules.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    /// Sets the word oracle limits.
    pub fn oracle_config(mut self, config: OracleConfig) -> Self {
        self.config.oracle = config;
        self
    }

    /// Closes connections idle for longer than `timeout`.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Binds the listener and wires the coordinator over `store` and
    /// `oracle`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<S, O>(
        self,
        store: Arc<S>,
        oracle: O,
    ) -> Result<ImpostorServer<S, O, JsonCodec>, ImpostorError>
    where
        S: SessionStore,
        O: WordOracle,
    {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let oracle = ResilientOracle::with_config(oracle, self.config.oracle);
        let coordinator = RoomCoordinator::new(store, oracle, self.config.room);

        let state = Arc::new(ServerState {
            coordinator: Arc::new(coordinator),
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
            handshake_timeout: self.config.handshake_timeout,
            resume_keys: Mutex::new(ResumeKeys::new()),
        });

        Ok(ImpostorServer { transport, state })
    }
}

impl Default for ImpostorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ImpostorServer<S, O, C> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, O, C>>,
}

impl<S, O, C> ImpostorServer<S, O, C>
where
    S: SessionStore,
    O: WordOracle,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ImpostorError> {
        Ok(self.transport.local_addr()?)
    }

    /// The coordinator every connection acts through.
    pub fn coordinator(&self) -> &Arc<RoomCoordinator<S, O>> {
        &self.state.coordinator
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task per connection. Runs until the process is
    /// terminated; a failed accept is logged and skipped.
    pub async fn run(mut self) -> Result<(), ImpostorError> {
        tracing::info!("impostor server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
