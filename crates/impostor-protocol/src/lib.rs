//! Records, identities, and wire protocol for Impostor Protocol.
//!
//! - **Types** ([`PlayerId`], [`RoomId`], [`RoomCode`], [`RoomStatus`], …):
//!   identities and the closed vocabularies of the game.
//! - **Records** ([`Room`], [`Player`], [`Message`], [`RoomSnapshot`]):
//!   what the Session Store persists and what clients render.
//! - **Wire** ([`Envelope`], [`ClientMessage`], [`ServerMessage`],
//!   [`Intent`]): frames exchanged with the hosted backend.
//! - **Codec** ([`Codec`], [`JsonCodec`]): frame (de)serialization.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room coordinator (intents)
//! ```

mod codec;
mod error;
mod records;
mod types;
mod wire;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use records::{Message, Player, Room, RoomListing, RoomSnapshot, RoundOutcome};
pub use types::{Difficulty, MessageId, PlayerId, Role, RoomCode, RoomId, RoomStatus};
pub use wire::{
    ClientMessage, Envelope, ErrorBody, ErrorKind, Intent, Outcome, Reply, ServerMessage,
};
