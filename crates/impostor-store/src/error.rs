//! Error types for the store layer.

use impostor_protocol::{PlayerId, RoomCode, RoomId};

/// Errors a Session Store can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store can't be reached right now. Callers fail closed: no
    /// local state is committed and the intent may be retried.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// A compare-and-set write lost against a newer revision.
    #[error("room {room_id} changed concurrently (expected revision {expected}, found {found})")]
    Conflict {
        room_id: RoomId,
        expected: u64,
        found: u64,
    },

    /// Another active room already uses this code.
    #[error("room code {0} is already taken")]
    CodeTaken(RoomCode),

    /// The room a write refers to does not exist.
    #[error("room {0} not found in store")]
    RoomMissing(RoomId),

    /// The player a write refers to does not exist.
    #[error("player {0} not found in store")]
    PlayerMissing(PlayerId),

    /// A round commit that does not cover the room's whole roster.
    #[error("round commit for room {0} does not match its roster")]
    RosterMismatch(RoomId),

    /// A ballot from a player who already voted this phase.
    #[error("player {0} already cast a ballot")]
    BallotCast(PlayerId),
}
