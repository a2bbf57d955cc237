//! Error types for the room layer.

use impostor_protocol::{ErrorBody, ErrorKind, PlayerId, ProtocolError, RoomId, RoomStatus};
use impostor_store::StoreError;

/// Why an intent was rejected. A rejected intent never changes state.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A host-only action from someone else.
    #[error("player {player_id} is not the host and cannot {action}")]
    PermissionDenied {
        player_id: PlayerId,
        action: &'static str,
    },

    /// `target` is not the successor of the room's current status.
    #[error("room {room_id} cannot move from {from} to {to}")]
    InvalidTransition {
        room_id: RoomId,
        from: RoomStatus,
        to: RoomStatus,
    },

    /// The action only makes sense in another phase.
    #[error("cannot {action} while room {room_id} is in {status}")]
    WrongPhase {
        room_id: RoomId,
        status: RoomStatus,
        action: &'static str,
    },

    /// Someone else changed the room between our read and our write.
    #[error("room {0} changed before the write landed")]
    Stale(RoomId),

    #[error("it is {expected}'s turn, not {player_id}'s")]
    NotYourTurn {
        player_id: PlayerId,
        expected: PlayerId,
    },

    #[error("room {0} not found")]
    RoomNotFound(String),

    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    #[error("player {player_id} is not in room {room_id}")]
    NotInRoom {
        player_id: PlayerId,
        room_id: RoomId,
    },

    #[error("room {room_id} is full ({max} players)")]
    RoomFull { room_id: RoomId, max: usize },

    #[error("{have} players, at least {need} needed")]
    NotEnoughPlayers { have: usize, need: usize },

    #[error("cannot have {requested} impostors among {players} players")]
    InvalidImpostorCount { requested: usize, players: usize },

    #[error("player {0} already voted")]
    AlreadyVoted(PlayerId),

    #[error("invalid vote: {0}")]
    InvalidVote(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),
}

impl GameError {
    /// The wire-level category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::InvalidTransition { .. } | Self::WrongPhase { .. } | Self::Stale(_) => {
                ErrorKind::InvalidTransition
            }
            Self::NotYourTurn { .. } => ErrorKind::NotYourTurn,
            Self::RoomNotFound(_) | Self::PlayerNotFound(_) => ErrorKind::NotFound,
            Self::NotInRoom { .. } => ErrorKind::NotInRoom,
            Self::RoomFull { .. } => ErrorKind::RoomFull,
            Self::NotEnoughPlayers { .. } => ErrorKind::NotEnoughPlayers,
            Self::InvalidImpostorCount { .. } => ErrorKind::InvalidImpostorCount,
            Self::AlreadyVoted(_) => ErrorKind::AlreadyVoted,
            Self::InvalidVote(_) => ErrorKind::InvalidVote,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }

    /// Returns `true` for errors a client should not show, only answer by
    /// re-reading the room (stale clicks, lost races).
    pub fn is_silent(&self) -> bool {
        self.kind() == ErrorKind::InvalidTransition
    }

    /// The error as sent to a client.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
            StoreError::Conflict { room_id, .. } | StoreError::RosterMismatch(room_id) => {
                Self::Stale(room_id)
            }
            StoreError::CodeTaken(code) => {
                Self::StoreUnavailable(format!("room code {code} already taken"))
            }
            StoreError::RoomMissing(room_id) => Self::RoomNotFound(room_id.to_string()),
            StoreError::PlayerMissing(player_id) => Self::PlayerNotFound(player_id),
            StoreError::BallotCast(player_id) => Self::AlreadyVoted(player_id),
        }
    }
}

impl From<ProtocolError> for GameError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidRoomCode(code) => Self::RoomNotFound(code),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}
