//! The Session Store port.
//!
//! The store is the sole arbiter of consistency: it persists rooms,
//! players, and messages, and broadcasts a [`ChangeEvent`] to every
//! subscriber of a room after each write. It is NOT assumed to support
//! multi-record transactions in general. The two operations that need
//! more than a single-record write ([`SessionStore::commit_round`] and
//! [`SessionStore::record_ballot`]) are separate methods so a backend
//! that can make them atomic does so, and one that can't degrades to
//! sequential writes behind the same signature.
//!
//! Every write scoped to one room is a compare-and-set on that room's
//! `revision`: the caller passes the revision it read, and the store
//! rejects the write with [`StoreError::Conflict`] if anything touched the
//! room or its roster since. Player writes bump the room's revision too,
//! so a round commit can never land on a roster it did not see.

use std::future::Future;

use impostor_protocol::{Message, Player, PlayerId, Room, RoomCode, RoomId, RoomStatus};
use tokio::sync::broadcast;

use crate::StoreError;

/// A player about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    pub room_id: RoomId,
    pub name: String,
    pub photo: Option<String>,
    pub is_host: bool,
}

/// A message about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub text: String,
    pub round: u32,
}

/// What changed in a room.
///
/// Room and roster events deliberately carry no record: a subscriber
/// that receives one re-reads the full snapshot instead of trusting a
/// delta that may have arrived out of order. Messages are immutable, so
/// `MessagePosted` can carry the record itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    RoomUpdated { room_id: RoomId },
    RosterChanged { room_id: RoomId },
    MessagePosted { message: Message },
    RoomClosed { room_id: RoomId },
}

impl ChangeEvent {
    /// The room this event belongs to.
    pub fn room_id(&self) -> RoomId {
        match self {
            Self::RoomUpdated { room_id }
            | Self::RosterChanged { room_id }
            | Self::RoomClosed { room_id } => *room_id,
            Self::MessagePosted { message } => message.room_id,
        }
    }
}

/// Persistence and publish/subscribe for rooms, players, and messages.
///
/// Methods return `impl Future + Send` so the coordinator and the
/// server's per-connection tasks can hold a store behind a generic
/// parameter and still be spawned onto the Tokio runtime. Implementors
/// can write plain `async fn`s.
pub trait SessionStore: Send + Sync + 'static {
    /// Inserts a room in `LOBBY` with the given code.
    ///
    /// # Errors
    /// [`StoreError::CodeTaken`] if another room already uses `code`.
    fn create_room(
        &self,
        code: RoomCode,
    ) -> impl Future<Output = Result<Room, StoreError>> + Send;

    /// Reads a room by id.
    fn room(
        &self,
        id: RoomId,
    ) -> impl Future<Output = Result<Option<Room>, StoreError>> + Send;

    /// Reads a room by its (already normalized) code.
    fn room_by_code(
        &self,
        code: &RoomCode,
    ) -> impl Future<Output = Result<Option<Room>, StoreError>> + Send;

    /// Lists up to `limit` rooms in `status`, oldest first, each with its
    /// player count.
    fn rooms_with_status(
        &self,
        status: RoomStatus,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<(Room, usize)>, StoreError>> + Send;

    /// Writes a room if its `revision` still matches the stored one, and
    /// returns the stored record with the bumped revision.
    ///
    /// # Errors
    /// [`StoreError::Conflict`] if someone else wrote the room first.
    fn update_room(
        &self,
        room: Room,
    ) -> impl Future<Output = Result<Room, StoreError>> + Send;

    /// Deletes a room and all of its players, and tells subscribers the
    /// room is closed. Messages are kept.
    fn delete_room(
        &self,
        id: RoomId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Inserts a player, assigning its id and `joined_at`, if the room is
    /// still at `revision`.
    fn add_player(
        &self,
        player: NewPlayer,
        revision: u64,
    ) -> impl Future<Output = Result<Player, StoreError>> + Send;

    /// Reads a player by id.
    fn player(
        &self,
        id: PlayerId,
    ) -> impl Future<Output = Result<Option<Player>, StoreError>> + Send;

    /// The roster of a room, ordered by `joined_at`.
    fn players(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Player>, StoreError>> + Send;

    /// Overwrites a player record if its room is still at `revision`.
    fn update_player(
        &self,
        player: Player,
        revision: u64,
    ) -> impl Future<Output = Result<Player, StoreError>> + Send;

    /// Deletes a player if its room is still at `revision`.
    fn remove_player(
        &self,
        id: PlayerId,
        revision: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Records `voter`'s ballot for `target`: sets the voter's
    /// `voted_for` and increments the target's `votes`, if the room is
    /// still at `revision`. A ballot read before the vote resolved
    /// therefore never lands after it.
    ///
    /// # Errors
    /// [`StoreError::BallotCast`] if the voter already voted.
    fn record_ballot(
        &self,
        voter: PlayerId,
        target: PlayerId,
        revision: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Writes every player of a round, deletes the `dropped` ones, and
    /// then writes the room, as one unit when the backend supports it.
    ///
    /// The room's revision is checked before anything is written, like
    /// [`SessionStore::update_room`]. `players` and `dropped` together
    /// must be exactly the room's stored roster.
    ///
    /// # Errors
    /// [`StoreError::Conflict`] on a stale revision and
    /// [`StoreError::RosterMismatch`] on a partial roster. Either way
    /// nothing is written.
    fn commit_round(
        &self,
        room: Room,
        players: Vec<Player>,
        dropped: Vec<PlayerId>,
    ) -> impl Future<Output = Result<Room, StoreError>> + Send;

    /// Appends a message if the room is still at `revision`.
    fn post_message(
        &self,
        message: NewMessage,
        revision: u64,
    ) -> impl Future<Output = Result<Message, StoreError>> + Send;

    /// Messages of one round of a room, oldest first.
    fn messages(
        &self,
        room_id: RoomId,
        round: u32,
    ) -> impl Future<Output = Result<Vec<Message>, StoreError>> + Send;

    /// Subscribes to a room's change feed.
    fn subscribe(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<broadcast::Receiver<ChangeEvent>, StoreError>> + Send;
}
