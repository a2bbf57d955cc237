//! In-process [`SessionStore`] with per-room broadcast channels.
//!
//! Used for local (single-device) games, by the hosted backend, and in
//! tests. All tables live behind one async mutex, which makes every
//! method (including `commit_round` and `record_ballot`) atomic. Every
//! write scoped to a room checks and bumps that room's revision under
//! the same lock. Change events are published after the lock is
//! released.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use impostor_protocol::{
    Difficulty, Message, MessageId, Player, PlayerId, Room, RoomCode, RoomId, RoomStatus,
};
use tokio::sync::{Mutex, broadcast};

use crate::{ChangeEvent, NewMessage, NewPlayer, SessionStore, StoreError};

/// Buffered events per room before slow subscribers start lagging.
const FEED_CAPACITY: usize = 64;

#[derive(Default)]
struct Tables {
    rooms: HashMap<RoomId, Room>,
    codes: HashMap<RoomCode, RoomId>,
    players: HashMap<PlayerId, Player>,
    messages: Vec<Message>,
    feeds: HashMap<RoomId, broadcast::Sender<ChangeEvent>>,
    next_room: u64,
    next_player: u64,
    next_message: u64,
    last_stamp: u64,
}

impl Tables {
    /// Strictly increasing millisecond stamp, so two players joining in
    /// the same millisecond still get a total roster order.
    fn stamp(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.last_stamp = now.max(self.last_stamp + 1);
        self.last_stamp
    }

    fn feed(&mut self, room_id: RoomId) -> &broadcast::Sender<ChangeEvent> {
        self.feeds
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
    }

    fn check_revision(&self, room_id: RoomId, revision: u64) -> Result<(), StoreError> {
        let stored = self
            .rooms
            .get(&room_id)
            .ok_or(StoreError::RoomMissing(room_id))?;
        if stored.revision != revision {
            return Err(StoreError::Conflict {
                room_id,
                expected: revision,
                found: stored.revision,
            });
        }
        Ok(())
    }

    /// Marks a room as changed by a player write.
    fn bump(&mut self, room_id: RoomId) {
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.revision += 1;
        }
    }

    fn roster_ids(&self, room_id: RoomId) -> HashSet<PlayerId> {
        self.players
            .values()
            .filter(|p| p.room_id == room_id)
            .map(|p| p.id)
            .collect()
    }

    /// The room of a stored player.
    fn room_of(&self, id: PlayerId) -> Result<RoomId, StoreError> {
        self.players
            .get(&id)
            .map(|p| p.room_id)
            .ok_or(StoreError::PlayerMissing(id))
    }

    fn write_room(&mut self, mut room: Room) -> Room {
        room.revision += 1;
        self.rooms.insert(room.id, room.clone());
        room
    }
}

/// An in-memory Session Store.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a connectivity outage: while offline every call fails
    /// with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        tracing::debug!(offline, "memory store availability changed");
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        Ok(())
    }

    /// Sends an event to the room's subscribers. Having no subscribers
    /// is not an error.
    fn publish(sender: Option<broadcast::Sender<ChangeEvent>>, event: ChangeEvent) {
        if let Some(sender) = sender {
            let _ = sender.send(event);
        }
    }
}

impl SessionStore for MemoryStore {
    async fn create_room(&self, code: RoomCode) -> Result<Room, StoreError> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        if tables.codes.contains_key(&code) {
            return Err(StoreError::CodeTaken(code));
        }

        tables.next_room += 1;
        let id = RoomId(tables.next_room);
        let room = Room {
            id,
            code: code.clone(),
            status: RoomStatus::Lobby,
            secret_word: None,
            current_turn_index: 0,
            turn_start_index: 0,
            theme: None,
            difficulty: Difficulty::default(),
            round: 0,
            outcome: None,
            created_at: tables.stamp(),
            revision: 0,
        };
        tables.codes.insert(code, id);
        tables.rooms.insert(id, room.clone());
        tracing::debug!(room_id = %id, code = %room.code, "room stored");
        Ok(room)
    }

    async fn room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        self.ensure_online()?;
        Ok(self.tables.lock().await.rooms.get(&id).cloned())
    }

    async fn room_by_code(&self, code: &RoomCode) -> Result<Option<Room>, StoreError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .codes
            .get(code)
            .and_then(|id| tables.rooms.get(id))
            .cloned())
    }

    async fn rooms_with_status(
        &self,
        status: RoomStatus,
        limit: usize,
    ) -> Result<Vec<(Room, usize)>, StoreError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        let mut rooms: Vec<&Room> = tables
            .rooms
            .values()
            .filter(|r| r.status == status)
            .collect();
        rooms.sort_by_key(|r| (r.created_at, r.id));

        Ok(rooms
            .into_iter()
            .take(limit)
            .map(|room| {
                let count = tables
                    .players
                    .values()
                    .filter(|p| p.room_id == room.id)
                    .count();
                (room.clone(), count)
            })
            .collect())
    }

    async fn update_room(&self, room: Room) -> Result<Room, StoreError> {
        self.ensure_online()?;
        let (stored, feed) = {
            let mut tables = self.tables.lock().await;
            tables.check_revision(room.id, room.revision)?;
            let stored = tables.write_room(room);
            let feed = tables.feeds.get(&stored.id).cloned();
            (stored, feed)
        };
        Self::publish(feed, ChangeEvent::RoomUpdated { room_id: stored.id });
        Ok(stored)
    }

    async fn delete_room(&self, id: RoomId) -> Result<(), StoreError> {
        self.ensure_online()?;
        let feed = {
            let mut tables = self.tables.lock().await;
            let room = tables.rooms.remove(&id).ok_or(StoreError::RoomMissing(id))?;
            tables.codes.remove(&room.code);
            tables.players.retain(|_, p| p.room_id != id);
            tables.feeds.remove(&id)
        };
        // Dropping the last sender after this closes every receiver.
        Self::publish(feed, ChangeEvent::RoomClosed { room_id: id });
        tracing::debug!(room_id = %id, "room deleted");
        Ok(())
    }

    async fn add_player(&self, new: NewPlayer, revision: u64) -> Result<Player, StoreError> {
        self.ensure_online()?;
        let (player, feed) = {
            let mut tables = self.tables.lock().await;
            tables.check_revision(new.room_id, revision)?;
            tables.bump(new.room_id);
            tables.next_player += 1;
            let player = Player {
                id: PlayerId(tables.next_player),
                room_id: new.room_id,
                name: new.name,
                photo: new.photo,
                is_host: new.is_host,
                role: None,
                votes: 0,
                voted_for: None,
                departed: false,
                joined_at: tables.stamp(),
            };
            tables.players.insert(player.id, player.clone());
            let feed = tables.feeds.get(&player.room_id).cloned();
            (player, feed)
        };
        Self::publish(
            feed,
            ChangeEvent::RosterChanged {
                room_id: player.room_id,
            },
        );
        Ok(player)
    }

    async fn player(&self, id: PlayerId) -> Result<Option<Player>, StoreError> {
        self.ensure_online()?;
        Ok(self.tables.lock().await.players.get(&id).cloned())
    }

    async fn players(&self, room_id: RoomId) -> Result<Vec<Player>, StoreError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        let mut roster: Vec<Player> = tables
            .players
            .values()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect();
        roster.sort_by_key(|p| (p.joined_at, p.id));
        Ok(roster)
    }

    async fn update_player(&self, player: Player, revision: u64) -> Result<Player, StoreError> {
        self.ensure_online()?;
        let feed = {
            let mut tables = self.tables.lock().await;
            let room_id = tables.room_of(player.id)?;
            if room_id != player.room_id {
                return Err(StoreError::PlayerMissing(player.id));
            }
            tables.check_revision(room_id, revision)?;
            tables.bump(room_id);
            tables.players.insert(player.id, player.clone());
            tables.feeds.get(&player.room_id).cloned()
        };
        Self::publish(
            feed,
            ChangeEvent::RosterChanged {
                room_id: player.room_id,
            },
        );
        Ok(player)
    }

    async fn remove_player(&self, id: PlayerId, revision: u64) -> Result<(), StoreError> {
        self.ensure_online()?;
        let (room_id, feed) = {
            let mut tables = self.tables.lock().await;
            let room_id = tables.room_of(id)?;
            tables.check_revision(room_id, revision)?;
            tables.bump(room_id);
            tables.players.remove(&id);
            (room_id, tables.feeds.get(&room_id).cloned())
        };
        Self::publish(feed, ChangeEvent::RosterChanged { room_id });
        Ok(())
    }

    async fn record_ballot(
        &self,
        voter: PlayerId,
        target: PlayerId,
        revision: u64,
    ) -> Result<(), StoreError> {
        self.ensure_online()?;
        let (room_id, feed) = {
            let mut tables = self.tables.lock().await;
            let room_id = tables.room_of(voter)?;
            if tables.room_of(target)? != room_id {
                return Err(StoreError::PlayerMissing(target));
            }
            tables.check_revision(room_id, revision)?;
            if tables
                .players
                .get(&voter)
                .is_some_and(|p| p.voted_for.is_some())
            {
                return Err(StoreError::BallotCast(voter));
            }

            tables.bump(room_id);
            if let Some(ballot) = tables.players.get_mut(&voter) {
                ballot.voted_for = Some(target);
            }
            if let Some(candidate) = tables.players.get_mut(&target) {
                candidate.votes += 1;
            }
            (room_id, tables.feeds.get(&room_id).cloned())
        };
        Self::publish(feed, ChangeEvent::RosterChanged { room_id });
        Ok(())
    }

    async fn commit_round(
        &self,
        room: Room,
        players: Vec<Player>,
        dropped: Vec<PlayerId>,
    ) -> Result<Room, StoreError> {
        self.ensure_online()?;
        let (stored, feed) = {
            let mut tables = self.tables.lock().await;
            tables.check_revision(room.id, room.revision)?;
            let committed: HashSet<PlayerId> = players
                .iter()
                .map(|p| p.id)
                .chain(dropped.iter().copied())
                .collect();
            if committed.len() != players.len() + dropped.len()
                || players.iter().any(|p| p.room_id != room.id)
                || committed != tables.roster_ids(room.id)
            {
                return Err(StoreError::RosterMismatch(room.id));
            }
            for id in dropped {
                tables.players.remove(&id);
            }
            for player in players {
                tables.players.insert(player.id, player);
            }
            let stored = tables.write_room(room);
            let feed = tables.feeds.get(&stored.id).cloned();
            (stored, feed)
        };
        Self::publish(
            feed.clone(),
            ChangeEvent::RosterChanged { room_id: stored.id },
        );
        Self::publish(feed, ChangeEvent::RoomUpdated { room_id: stored.id });
        Ok(stored)
    }

    async fn post_message(&self, new: NewMessage, revision: u64) -> Result<Message, StoreError> {
        self.ensure_online()?;
        let (message, feed) = {
            let mut tables = self.tables.lock().await;
            tables.check_revision(new.room_id, revision)?;
            tables.bump(new.room_id);
            tables.next_message += 1;
            let message = Message {
                id: MessageId(tables.next_message),
                room_id: new.room_id,
                player_id: new.player_id,
                player_name: new.player_name,
                text: new.text,
                round: new.round,
                created_at: tables.stamp(),
            };
            tables.messages.push(message.clone());
            (message.clone(), tables.feeds.get(&message.room_id).cloned())
        };
        Self::publish(
            feed,
            ChangeEvent::MessagePosted {
                message: message.clone(),
            },
        );
        Ok(message)
    }

    async fn messages(&self, room_id: RoomId, round: u32) -> Result<Vec<Message>, StoreError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.room_id == room_id && m.round == round)
            .cloned()
            .collect())
    }

    async fn subscribe(
        &self,
        room_id: RoomId,
    ) -> Result<broadcast::Receiver<ChangeEvent>, StoreError> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        if !tables.rooms.contains_key(&room_id) {
            return Err(StoreError::RoomMissing(room_id));
        }
        Ok(tables.feed(room_id).subscribe())
    }
}
