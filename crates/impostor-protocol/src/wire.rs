//! Wire format between clients and the hosted backend.
//!
//! Every frame is an [`Envelope`] whose payload is a [`ClientMessage`]
//! (client → server) or a [`ServerMessage`] (server → client). Game
//! actions travel as [`Intent`]s tagged with a client-chosen
//! `request_id`; the server answers each with exactly one `Reply`
//! carrying the same id, and separately pushes a `Snapshot` to every
//! subscriber whenever the room changes.

use serde::{Deserialize, Serialize};

use crate::{Difficulty, PlayerId, RoomCode, RoomId, RoomListing, RoomSnapshot, RoomStatus};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level frame.
///
/// `seq` is a per-sender counter; `timestamp` is milliseconds since the
/// sender started. Neither is interpreted by game logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub seq: u64,
    pub timestamp: u64,
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Wraps a payload.
    pub fn new(seq: u64, timestamp: u64, payload: T) -> Self {
        Self {
            seq,
            timestamp,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Frames a client may send.
///
/// `#[serde(tag = "type")]` gives the internally tagged form
/// `{ "type": "Heartbeat", "client_time": 5 }`, which is the easiest
/// shape to produce from a JavaScript client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Must be the first frame on a connection.
    Handshake { version: u32 },

    /// Keep-alive; echoed back with the server time.
    Heartbeat { client_time: u64 },

    /// A game action.
    Intent { request_id: u64, intent: Intent },

    /// The client is going away.
    Disconnect { reason: String },
}

/// The UI-to-core contract: everything a player can ask for.
///
/// Intents other than `CreateRoom`, `JoinRoom`, `Resume`, and `ListRooms`
/// act on the room and player the connection is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent")]
pub enum Intent {
    /// Create a room and join it as host.
    CreateRoom { name: String, photo: Option<String> },

    /// Join a room by its code. The code is matched case-insensitively.
    JoinRoom {
        code: String,
        name: String,
        photo: Option<String>,
    },

    /// Re-attach to a room after a restart, using a remembered identity.
    /// `token` is the `resume_token` of the original `Joined` reply.
    Resume {
        room_id: RoomId,
        player_id: PlayerId,
        token: String,
    },

    /// List rooms waiting in the lobby.
    ListRooms,

    /// Host only: draw roles and a secret word, enter `ROLE_REVEAL`.
    StartRound {
        topic: String,
        difficulty: Difficulty,
        impostor_count: usize,
    },

    /// Host only: move the room to `target`.
    AdvancePhase { target: RoomStatus },

    /// Give this player's description for the current turn.
    SubmitTurn { text: String },

    /// Vote for a suspected Impostor.
    CastVote { target: PlayerId },

    /// Host only: eliminate `target` directly (host-adjudicated voting).
    Eliminate { target: PlayerId },

    /// Host only: return to `LOBBY`, clearing the round.
    ResetRoom,

    /// Leave the room.
    LeaveRoom,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Frames the server may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    HandshakeAck { server_time: u64 },

    HeartbeatAck { client_time: u64, server_time: u64 },

    /// The answer to the intent with the same `request_id`.
    Reply { request_id: u64, outcome: Outcome },

    /// The full, viewer-redacted state of the bound room.
    Snapshot { snapshot: RoomSnapshot },

    /// The bound room no longer exists (the host left).
    RoomClosed { room_id: RoomId },

    /// A connection-level failure (bad handshake, undecodable frame).
    Error { code: u16, message: String },
}

/// Result of one intent.
///
/// Adjacently tagged: `{ "result": "Ok", "data": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "data")]
pub enum Outcome {
    Ok(Reply),
    Err(ErrorBody),
}

/// Success payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Reply {
    /// The connection is now bound to this room and player.
    /// `resume_token` is what a later `Resume` must present.
    Joined {
        room_id: RoomId,
        player_id: PlayerId,
        code: RoomCode,
        resume_token: String,
    },

    /// Open rooms.
    Rooms { rooms: Vec<RoomListing> },

    /// The turn was recorded. `lap_complete` is `true` when it was the
    /// last turn of the lap and the room moved on to `VOTING`.
    TurnRecorded { lap_complete: bool },

    /// The room moved to `status`.
    Phase { status: RoomStatus },

    /// The intent succeeded and produced nothing further to report.
    Accepted,
}

/// A rejected intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// The closed set of reasons an intent can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    PermissionDenied,
    InvalidTransition,
    NotYourTurn,
    NotFound,
    RoomFull,
    NotEnoughPlayers,
    InvalidImpostorCount,
    AlreadyVoted,
    InvalidVote,
    InvalidInput,
    NotInRoom,
    StoreUnavailable,
}

impl ErrorKind {
    /// HTTP-style status code for logs and simple clients.
    pub fn code(self) -> u16 {
        match self {
            Self::PermissionDenied => 403,
            Self::NotFound => 404,
            Self::InvalidTransition | Self::AlreadyVoted => 409,
            Self::NotYourTurn => 423,
            Self::RoomFull => 429,
            Self::NotEnoughPlayers
            | Self::InvalidImpostorCount
            | Self::InvalidVote
            | Self::InvalidInput
            | Self::NotInRoom => 400,
            Self::StoreUnavailable => 503,
        }
    }
}
