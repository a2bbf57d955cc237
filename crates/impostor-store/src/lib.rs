//! The Session Store for Impostor Protocol.
//!
//! The game core never talks to a database directly. It talks to a
//! [`SessionStore`]: persistence for rooms, players, and messages plus a
//! per-room change feed. [`MemoryStore`] is the in-process
//! implementation used by local games, the hosted backend, and tests.
//!
//! # Key types
//!
//! - [`SessionStore`]: the port the room coordinator is generic over
//! - [`ChangeEvent`]: what subscribers are told after each write
//! - [`MemoryStore`]: tables behind one async mutex, broadcast feeds

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{ChangeEvent, NewMessage, NewPlayer, SessionStore};
