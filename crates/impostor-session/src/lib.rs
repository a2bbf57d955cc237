//! Session recovery for Impostor Protocol.
//!
//! A client that was closed mid-round should be able to come back to the
//! same room, at whatever phase the room is in now. This crate handles
//! that:
//!
//! 1. **Local identity**: remembering `(room_id, player_id)` and the
//!    last display alias across restarts ([`IdentityStore`])
//! 2. **Recovery**: on cold start, checking the remembered identity
//!    against the Session Store and offering to rejoin
//!    ([`RecoveryManager`])
//! 3. **Screen mapping**: turning a room's phase into the screen the
//!    client should land on ([`Screen`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Presentation (above)  ← shows the prompt, renders the resumed screen
//!     ↕
//! Session Layer (this crate)  ← local identity + recovery decisions
//!     ↕
//! Room Layer (below)  ← RoomCoordinator reads, RoomFeed subscriptions
//! ```
//!
//! Recovery is opt-in and fails open: any doubt about the remembered
//! identity (missing room, missing player, store error, timeout) forgets
//! it and starts a fresh session.

#![allow(async_fn_in_trait)]

mod error;
mod identity;
mod recovery;
mod screen;

pub use error::SessionError;
pub use identity::{FileIdentityStore, IdentityStore, LocalState, MemoryIdentityStore, StoredIdentity};
pub use recovery::{Recovery, RecoveryConfig, RecoveryManager, RecoveryPrompt, Resume, Resumed};
pub use screen::Screen;
