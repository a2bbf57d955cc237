//! The persisted records: rooms, players, and messages.
//!
//! These are the explicit, typed forms of the rows the Session Store
//! holds. A [`RoomSnapshot`] bundles one room with its full roster and
//! the current round's messages; it is the unit every subscriber
//! re-renders from.

use serde::{Deserialize, Serialize};

use crate::{Difficulty, MessageId, PlayerId, Role, RoomCode, RoomId, RoomStatus};

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One game session.
///
/// `status` is only ever changed by the room state machine. `revision` is
/// bumped by the store on every write and used for compare-and-set, so a
/// stale writer's update is rejected instead of silently overwriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub code: RoomCode,
    pub status: RoomStatus,

    /// The secret word of the current round. `None` in `LOBBY`.
    pub secret_word: Option<String>,

    /// Roster index of the player whose turn it is to describe the word.
    /// Meaningful only during `GAMEPLAY`; always `< roster length` then.
    pub current_turn_index: usize,

    /// Roster index the current lap started from. The lap is complete
    /// when rotation comes back around to it.
    pub turn_start_index: usize,

    pub theme: Option<String>,
    pub difficulty: Difficulty,

    /// Round counter, incremented on every round start. Messages are
    /// tagged with it so history can be kept per room without leaking
    /// into the next round's view.
    pub round: u32,

    /// Result of the vote, present only in `REVEAL`.
    pub outcome: Option<RoundOutcome>,

    /// Milliseconds since the Unix epoch.
    pub created_at: u64,

    pub revision: u64,
}

/// What the `REVEAL` phase shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// The eliminated player, or `None` when the vote produced no
    /// elimination (an unresolved tie, or nobody voted).
    pub eliminated: Option<PlayerId>,

    /// `true` when the eliminated player was an Impostor.
    pub caught: bool,

    pub secret_word: String,

    /// Everyone who was an Impostor this round.
    pub impostors: Vec<PlayerId>,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One participant, bound to exactly one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub room_id: RoomId,
    pub name: String,
    pub photo: Option<String>,

    /// `true` for the room's creator only.
    pub is_host: bool,

    /// Unset in the lobby, set for everyone at round start.
    pub role: Option<Role>,

    /// Votes received during the current voting phase.
    pub votes: u32,

    /// Whom this player voted for in the current voting phase.
    pub voted_for: Option<PlayerId>,

    /// Set when the player left during a round. Departed players stay in
    /// the frozen roster until the next reset.
    pub departed: bool,

    /// Store-assigned ordering key; defines the roster order.
    pub joined_at: u64,
}

impl Player {
    /// Returns `true` if the player is an Impostor this round.
    pub fn is_impostor(&self) -> bool {
        self.role == Some(Role::Impostor)
    }

    /// Returns `true` if the player is still taking part in the round.
    pub fn is_present(&self) -> bool {
        !self.departed
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One description given during a turn. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub text: String,
    pub round: u32,
    pub created_at: u64,
}

// ---------------------------------------------------------------------------
// Snapshot / listing
// ---------------------------------------------------------------------------

/// A room together with its full roster (in roster order) and the
/// messages of its current round.
///
/// Subscribers replace their whole local view with each snapshot instead
/// of patching it, so out-of-order change events can never leave a
/// client half-updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room: Room,
    pub players: Vec<Player>,
    pub messages: Vec<Message>,
}

impl RoomSnapshot {
    /// Looks up a player of this room.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// The room's host.
    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    /// The player whose turn it is, while in `GAMEPLAY`.
    pub fn current_speaker(&self) -> Option<&Player> {
        if self.room.status != RoomStatus::Gameplay {
            return None;
        }
        self.players.get(self.room.current_turn_index)
    }

    /// Returns a copy of this snapshot safe to send to `viewer`.
    ///
    /// Before `REVEAL`, other players' roles and ballots are hidden and an
    /// Impostor does not receive the secret word. A viewer outside the
    /// roster sees no roles and no word.
    pub fn redacted_for(&self, viewer: PlayerId) -> RoomSnapshot {
        let mut view = self.clone();
        if view.room.status == RoomStatus::Reveal {
            return view;
        }

        let viewer_role = self.player(viewer).and_then(|p| p.role);
        if viewer_role != Some(Role::Civilian) {
            view.room.secret_word = None;
        }
        for player in view.players.iter_mut().filter(|p| p.id != viewer) {
            player.role = None;
            player.voted_for = None;
        }
        view
    }
}

/// A joinable room, as shown in the open-room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListing {
    pub room_id: RoomId,
    pub code: RoomCode,
    pub player_count: usize,
    pub max_players: usize,
}
