//! The game core of Impostor Protocol.
//!
//! A room loops through `LOBBY → ROLE_REVEAL → GAMEPLAY → VOTING →
//! REVEAL → LOBBY`. [`RoomCoordinator`] validates every intent against
//! that graph and writes the result to the Session Store; the store then
//! tells every subscriber, and each [`RoomFeed`] turns that into a fresh
//! full snapshot.
//!
//! # Key types
//!
//! - [`RoomCoordinator`]: the room state machine (host checks, phase
//!   guards, round commits)
//! - [`turns`]: turn rotation and lap detection
//! - [`assign_roles`]: unbiased Impostor draw
//! - [`votes`]: ballot tally, tie-break, and round outcome
//! - [`RoomFeed`]: read-only snapshot stream for one room
//! - [`RoomConfig`]: limits and policies

mod code;
mod config;
mod coordinator;
mod error;
mod feed;
mod roles;
pub mod turns;
pub mod votes;

pub use code::generate_code;
pub use config::{FeedConfig, RoomConfig, TieBreak, VotePolicy};
pub use coordinator::{Departure, MAX_NAME_LEN, OPEN_ROOM_LIMIT, RoomCoordinator, WRITE_ATTEMPTS};
pub use error::GameError;
pub use feed::{FeedStatus, RoomFeed, read_snapshot};
pub use roles::assign_roles;
