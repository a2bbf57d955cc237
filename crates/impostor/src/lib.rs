//! # Impostor Protocol
//!
//! A realtime backend for a social-deduction party game: players in a
//! room get a secret word, except for one or more Impostors who get
//! nothing and must bluff through a round of descriptions before the
//! group votes.
//!
//! This crate wires the layers together:
//!
//! - [`ImpostorServer`] is the hosted backend: a WebSocket server that
//!   turns client intents into room transitions and pushes redacted room
//!   snapshots to every bound connection.
//! - [`LocalGame`] runs the same rules on a single device.
//! - [`ScreenRouter`] tells a client which screen to show and which
//!   [`Cue`] to play as snapshots arrive.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use impostor::prelude::*;
//!
//! # async fn run() -> Result<(), ImpostorError> {
//! impostor::logging::init();
//! let server = ImpostorServerBuilder::new()
//!     .config(ServerConfig::from_env()?)
//!     .build(Arc::new(MemoryStore::new()), WordTable::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod client;
mod config;
mod error;
mod handler;
mod local;
pub mod logging;
mod resume;
mod server;

pub use client::{Cue, CuePlayer, Muted, ScreenRouter};
pub use config::{DEFAULT_PORT, ServerConfig};
pub use error::ImpostorError;
pub use local::{LocalGame, RoleCard};
pub use server::{ImpostorServer, ImpostorServerBuilder, PROTOCOL_VERSION};

/// Everything needed to run a server or a local game.
pub mod prelude {
    pub use crate::{
        Cue, CuePlayer, ImpostorError, ImpostorServer, ImpostorServerBuilder, LocalGame, Muted,
        PROTOCOL_VERSION, RoleCard, ScreenRouter, ServerConfig,
    };
    pub use impostor_protocol::{
        ClientMessage, Difficulty, Envelope, ErrorKind, Intent, Outcome, PlayerId, Reply, Role,
        RoomId, RoomSnapshot, RoomStatus, ServerMessage,
    };
    pub use impostor_room::{GameError, RoomConfig, TieBreak, VotePolicy};
    pub use impostor_session::{
        FileIdentityStore, IdentityStore, MemoryIdentityStore, Recovery, RecoveryConfig,
        RecoveryManager, Resume, Screen,
    };
    pub use impostor_store::{MemoryStore, SessionStore};
    pub use impostor_words::{ResilientOracle, WordOracle, WordTable};
}
