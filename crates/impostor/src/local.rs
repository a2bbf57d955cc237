//! Local pass-around mode.
//!
//! One device, everyone in the same room. All names are entered up
//! front; the first one is the host. The device is handed from player to
//! player to peek at their role card, then the round runs like an online
//! one with every intent submitted on behalf of whoever holds the device.
//!
//! Under the hood this is the same [`RoomCoordinator`] the hosted backend
//! uses, over a private in-process [`MemoryStore`], so local rounds follow
//! exactly the same rules.

use std::sync::Arc;

use impostor_protocol::{
    Difficulty, Player, PlayerId, Role, Room, RoomId, RoomSnapshot, RoomStatus, RoundOutcome,
};
use impostor_room::{GameError, RoomConfig, RoomCoordinator};
use impostor_store::MemoryStore;
use impostor_words::{ResilientOracle, WordOracle};

/// What one player sees when the device is handed to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCard {
    pub player_id: PlayerId,
    pub name: String,
    pub role: Role,
    /// The secret word; `None` for an Impostor.
    pub secret_word: Option<String>,
}

/// A single-device game.
pub struct LocalGame<O> {
    coordinator: RoomCoordinator<MemoryStore, O>,
    room_id: RoomId,
    host: PlayerId,
    roster: Vec<PlayerId>,
    revealed: usize,
}

impl<O: WordOracle> LocalGame<O> {
    /// Seats `names` in order. `names[0]` hosts.
    pub async fn new(
        names: &[&str],
        oracle: ResilientOracle<O>,
        config: RoomConfig,
    ) -> Result<Self, GameError> {
        let Some((first, rest)) = names.split_first() else {
            return Err(GameError::NotEnoughPlayers {
                have: 0,
                need: config.min_players,
            });
        };

        let coordinator = RoomCoordinator::new(Arc::new(MemoryStore::new()), oracle, config);
        let (room, host) = coordinator.open_room(first, None).await?;
        let mut roster = vec![host.id];
        for name in rest {
            let player = coordinator.add_player(room.id, name, None, false).await?;
            roster.push(player.id);
        }
        tracing::info!(room_id = %room.id, players = roster.len(), "local game seated");

        Ok(Self {
            coordinator,
            room_id: room.id,
            host: host.id,
            roster,
            revealed: 0,
        })
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn host(&self) -> PlayerId {
        self.host
    }

    /// Players in seating order.
    pub fn roster(&self) -> &[PlayerId] {
        &self.roster
    }

    /// The full, unredacted state. Everyone shares the screen, so this is
    /// only for rendering public parts.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, GameError> {
        self.coordinator.snapshot(self.room_id).await
    }

    /// Draws roles and the secret word and starts the hand-around.
    pub async fn start(
        &mut self,
        topic: &str,
        difficulty: Difficulty,
        impostor_count: usize,
    ) -> Result<Room, GameError> {
        let room = self
            .coordinator
            .start_round(self.room_id, self.host, topic, difficulty, impostor_count)
            .await?;
        self.revealed = 0;
        Ok(room)
    }

    /// The role card for the next player in seating order, or `None` once
    /// everyone has seen theirs.
    pub async fn reveal_next(&mut self) -> Result<Option<RoleCard>, GameError> {
        let snapshot = self.snapshot().await?;
        if snapshot.room.status != RoomStatus::RoleReveal {
            return Err(GameError::WrongPhase {
                room_id: self.room_id,
                status: snapshot.room.status,
                action: "reveal a role",
            });
        }
        let Some(&player_id) = self.roster.get(self.revealed) else {
            return Ok(None);
        };
        let player = snapshot
            .player(player_id)
            .ok_or(GameError::PlayerNotFound(player_id))?;
        let role = player
            .role
            .ok_or_else(|| GameError::InvalidInput(format!("{} has no role yet", player.name)))?;

        self.revealed += 1;
        Ok(Some(RoleCard {
            player_id,
            name: player.name.clone(),
            role,
            secret_word: match role {
                Role::Civilian => snapshot.room.secret_word.clone(),
                Role::Impostor => None,
            },
        }))
    }

    /// Ends the hand-around and starts the descriptions.
    ///
    /// # Errors
    /// [`GameError::InvalidInput`] while some player hasn't seen their
    /// card.
    pub async fn begin_descriptions(&self) -> Result<Room, GameError> {
        let hidden = self.roster.len().saturating_sub(self.revealed);
        if hidden > 0 {
            return Err(GameError::InvalidInput(format!(
                "{hidden} role card(s) not revealed yet"
            )));
        }
        self.coordinator
            .advance_phase(self.room_id, self.host, RoomStatus::Gameplay)
            .await
    }

    /// Whoever should describe the word now.
    pub async fn current_speaker(&self) -> Result<Option<Player>, GameError> {
        Ok(self.snapshot().await?.current_speaker().cloned())
    }

    /// Records the current speaker's description.
    pub async fn describe(&self, text: &str) -> Result<Room, GameError> {
        let snapshot = self.snapshot().await?;
        let Some(speaker) = snapshot.current_speaker() else {
            return Err(GameError::WrongPhase {
                room_id: self.room_id,
                status: snapshot.room.status,
                action: "describe the word",
            });
        };
        self.coordinator
            .submit_turn(self.room_id, speaker.id, text)
            .await
    }

    pub async fn vote(&self, voter: PlayerId, target: PlayerId) -> Result<Room, GameError> {
        self.coordinator.cast_vote(self.room_id, voter, target).await
    }

    /// The group agreed on someone; the host eliminates them.
    pub async fn eliminate(&self, target: PlayerId) -> Result<Room, GameError> {
        self.coordinator
            .eliminate(self.room_id, self.host, target)
            .await
    }

    /// Ends voting with the ballots cast so far.
    pub async fn reveal(&self) -> Result<Room, GameError> {
        self.coordinator
            .advance_phase(self.room_id, self.host, RoomStatus::Reveal)
            .await
    }

    /// The result, once in `REVEAL`.
    pub async fn outcome(&self) -> Result<Option<RoundOutcome>, GameError> {
        Ok(self.coordinator.room(self.room_id).await?.outcome)
    }

    /// Back to the lobby with the same players.
    pub async fn play_again(&mut self) -> Result<Room, GameError> {
        let room = self.coordinator.reset_room(self.room_id, self.host).await?;
        self.revealed = 0;
        Ok(room)
    }
}
