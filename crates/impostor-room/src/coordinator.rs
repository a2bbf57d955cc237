//! The Room State Machine.
//!
//! [`RoomCoordinator`] is the only writer of room state. Every intent is
//! a read-validate-write against the Session Store:
//!
//! 1. Read the room and its roster.
//! 2. Check membership, host permission, and the source phase.
//! 3. Write the new state with a compare-and-set on the room revision.
//!
//! A duplicate or stale intent fails step 2 (`InvalidTransition`,
//! `NotYourTurn`); a racing intent that passed step 2 on an outdated read
//! loses step 3 (`Stale`). Either way nothing is written. Player-level
//! intents (join, turn, ballot, leave) then go back to step 1, up to
//! [`WRITE_ATTEMPTS`] times, so a lost race is re-validated against the
//! current room instead of surfacing. Subscribers learn about the change
//! from the store's feed, never from the coordinator directly.

use std::future::Future;
use std::sync::Arc;

use impostor_protocol::{
    Difficulty, Player, PlayerId, Room, RoomCode, RoomId, RoomListing, RoomSnapshot, RoomStatus,
};
use impostor_store::{ChangeEvent, NewMessage, NewPlayer, SessionStore, StoreError};
use impostor_words::{DEFAULT_TOPIC, ResilientOracle, WordOracle};
use tokio::sync::broadcast;

use crate::turns::{self, Rotation};
use crate::{GameError, RoomConfig, RoomFeed, VotePolicy, code, feed, roles, votes};

/// Most rooms [`RoomCoordinator::list_open_rooms`] returns.
pub const OPEN_ROOM_LIMIT: usize = 10;

/// Longest accepted display alias, in characters.
pub const MAX_NAME_LEN: usize = 32;

/// Reads and writes one intent makes before giving up on a busy room.
pub const WRITE_ATTEMPTS: usize = 4;

/// What [`RoomCoordinator::leave_room`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Left the lobby; the player record is deleted.
    Removed,
    /// Left during a round; kept in the frozen roster, skipped from now
    /// on, deleted on the next reset.
    Departed,
    /// The host left; the room and its players are deleted.
    RoomClosed,
}

/// Validates intents and applies them to rooms in a [`SessionStore`].
pub struct RoomCoordinator<S, O> {
    store: Arc<S>,
    oracle: ResilientOracle<O>,
    config: RoomConfig,
}

impl<S: SessionStore, O: WordOracle> RoomCoordinator<S, O> {
    pub fn new(store: Arc<S>, oracle: ResilientOracle<O>, config: RoomConfig) -> Self {
        Self {
            store,
            oracle,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    // -- Lobby ------------------------------------------------------------

    /// Creates an empty room in `LOBBY` with a fresh code.
    pub async fn create_room(&self) -> Result<Room, GameError> {
        for _ in 0..self.config.code_attempts {
            let code = code::generate_code(&mut rand::rng())?;
            match self.bounded(self.store.create_room(code)).await? {
                Ok(room) => {
                    tracing::info!(room_id = %room.id, code = %room.code, "room created");
                    return Ok(room);
                }
                Err(StoreError::CodeTaken(code)) => {
                    tracing::debug!(%code, "room code collision, drawing another");
                }
                Err(error) => return Err(error.into()),
            }
        }
        Err(GameError::StoreUnavailable(format!(
            "no free room code after {} attempts",
            self.config.code_attempts
        )))
    }

    /// Creates a room and joins it as its host.
    ///
    /// If the host can't be added the room is deleted again.
    pub async fn open_room(
        &self,
        name: &str,
        photo: Option<String>,
    ) -> Result<(Room, Player), GameError> {
        validate_name(name)?;
        let room = self.create_room().await?;
        match self.add_player(room.id, name, photo, true).await {
            Ok(host) => Ok((room, host)),
            Err(error) => {
                if let Err(cleanup) = self.call(self.store.delete_room(room.id)).await {
                    tracing::warn!(room_id = %room.id, %cleanup, "could not delete hostless room");
                }
                Err(error)
            }
        }
    }

    /// Joins the room with `code` (case-insensitive) as a regular player.
    pub async fn join_room(
        &self,
        code: &str,
        name: &str,
        photo: Option<String>,
    ) -> Result<(Room, Player), GameError> {
        let code = RoomCode::parse(code)?;
        let room = self
            .call(self.store.room_by_code(&code))
            .await?
            .ok_or_else(|| GameError::RoomNotFound(code.to_string()))?;
        let player = self.add_player(room.id, name, photo, false).await?;
        Ok((room, player))
    }

    /// Adds a player to a room in `LOBBY`.
    ///
    /// The first player of a room must be its host and no room gets a
    /// second one.
    pub async fn add_player(
        &self,
        room_id: RoomId,
        name: &str,
        photo: Option<String>,
        is_host: bool,
    ) -> Result<Player, GameError> {
        let name = validate_name(name)?;
        let mut attempt = 1;
        loop {
            let (room, roster) = self.load(room_id).await?;

            if !room.status.is_joinable() {
                return Err(GameError::WrongPhase {
                    room_id,
                    status: room.status,
                    action: "join",
                });
            }
            if roster.len() >= self.config.max_players {
                return Err(GameError::RoomFull {
                    room_id,
                    max: self.config.max_players,
                });
            }
            let has_host = roster.iter().any(|p| p.is_host);
            if is_host && has_host {
                return Err(GameError::InvalidInput("the room already has a host".into()));
            }
            if !is_host && !has_host {
                return Err(GameError::InvalidInput("the room has no host yet".into()));
            }

            let new = NewPlayer {
                room_id,
                name: name.clone(),
                photo: photo.clone(),
                is_host,
            };
            match self.call(self.store.add_player(new, room.revision)).await {
                Err(GameError::Stale(_)) if attempt < WRITE_ATTEMPTS => {
                    attempt += 1;
                    tracing::debug!(%room_id, attempt, "room changed during join, retrying");
                }
                result => {
                    let player = result?;
                    tracing::info!(%room_id, player_id = %player.id, name = %player.name, is_host, "player joined");
                    return Ok(player);
                }
            }
        }
    }

    /// Rooms waiting in `LOBBY`, oldest first.
    pub async fn list_open_rooms(&self) -> Result<Vec<RoomListing>, GameError> {
        let rooms = self
            .call(self.store.rooms_with_status(RoomStatus::Lobby, OPEN_ROOM_LIMIT))
            .await?;
        Ok(rooms
            .into_iter()
            .map(|(room, player_count)| RoomListing {
                room_id: room.id,
                code: room.code,
                player_count,
                max_players: self.config.max_players,
            })
            .collect())
    }

    // -- Reads ------------------------------------------------------------

    /// The full, unredacted state of a room.
    pub async fn snapshot(&self, room_id: RoomId) -> Result<RoomSnapshot, GameError> {
        self.call(feed::read_snapshot(&*self.store, room_id))
            .await?
            .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))
    }

    /// Reads a room record.
    pub async fn room(&self, room_id: RoomId) -> Result<Room, GameError> {
        self.call(self.store.room(room_id))
            .await?
            .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))
    }

    /// Looks up a player and checks it belongs to `room_id`.
    pub async fn player(&self, room_id: RoomId, player_id: PlayerId) -> Result<Player, GameError> {
        let player = self
            .call(self.store.player(player_id))
            .await?
            .ok_or(GameError::PlayerNotFound(player_id))?;
        if player.room_id != room_id {
            return Err(GameError::NotInRoom { player_id, room_id });
        }
        Ok(player)
    }

    /// Raw change events of a room.
    pub async fn subscribe(
        &self,
        room_id: RoomId,
    ) -> Result<broadcast::Receiver<ChangeEvent>, GameError> {
        self.call(self.store.subscribe(room_id)).await
    }

    /// A snapshot stream for a room.
    pub fn feed(&self, room_id: RoomId) -> RoomFeed {
        RoomFeed::spawn(Arc::clone(&self.store), room_id, self.config.feed.clone())
    }

    // -- Phase transitions ------------------------------------------------

    /// `LOBBY → ROLE_REVEAL`: draws the roles and the secret word.
    ///
    /// Host only. Needs at least `min_players` and `1 <= impostor_count <
    /// players` (capped by `max_impostors`). The roles, the word, the
    /// first speaker, and the new status are written as one round commit.
    pub async fn start_round(
        &self,
        room_id: RoomId,
        host_id: PlayerId,
        topic: &str,
        difficulty: Difficulty,
        impostor_count: usize,
    ) -> Result<Room, GameError> {
        let (room, roster) = self.load(room_id).await?;
        require_host(&roster, room_id, host_id, "start a round")?;
        self.begin_round(room, roster, topic, difficulty, impostor_count)
            .await
    }

    /// Moves the room to `target`, which must be the successor of its
    /// current status. Host only.
    ///
    /// - `ROLE_REVEAL` starts a round with the room's last topic and
    ///   difficulty and one Impostor.
    /// - `VOTING` ends the description turns early.
    /// - `REVEAL` resolves the vote with the ballots cast so far.
    /// - `LOBBY` resets the room, like [`RoomCoordinator::reset_room`].
    pub async fn advance_phase(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        target: RoomStatus,
    ) -> Result<Room, GameError> {
        let (room, roster) = self.load(room_id).await?;
        require_host(&roster, room_id, player_id, "advance the phase")?;
        if !room.status.can_transition_to(target) {
            return Err(GameError::InvalidTransition {
                room_id,
                from: room.status,
                to: target,
            });
        }

        match target {
            RoomStatus::RoleReveal => {
                let topic = room.theme.clone().unwrap_or_else(|| DEFAULT_TOPIC.into());
                let difficulty = room.difficulty;
                self.begin_round(room, roster, &topic, difficulty, 1).await
            }
            RoomStatus::Gameplay => {
                let next = Room {
                    status: RoomStatus::Gameplay,
                    ..room
                };
                let stored = self.call(self.store.update_room(next)).await?;
                log_transition(&stored, RoomStatus::RoleReveal);
                Ok(stored)
            }
            RoomStatus::Voting => self.enter_voting(room, roster).await,
            RoomStatus::Reveal => self.resolve(room, roster, None).await,
            RoomStatus::Lobby => self.reset(room, roster).await,
        }
    }

    /// Records the current speaker's description and passes the turn on.
    ///
    /// When the lap is complete the room moves to `VOTING` instead.
    pub async fn submit_turn(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        text: &str,
    ) -> Result<Room, GameError> {
        let text = self.validate_text(text)?;
        let mut attempt = 1;
        loop {
            let (room, roster) = self.load(room_id).await?;
            let speaker = member(&roster, room_id, player_id)?;
            if room.status != RoomStatus::Gameplay {
                return Err(GameError::WrongPhase {
                    room_id,
                    status: room.status,
                    action: "submit a turn",
                });
            }
            let expected = roster
                .get(room.current_turn_index)
                .map(|p| p.id)
                .ok_or(GameError::Stale(room_id))?;
            if expected != player_id {
                return Err(GameError::NotYourTurn {
                    player_id,
                    expected,
                });
            }

            let message = NewMessage {
                room_id,
                player_id,
                player_name: speaker.name.clone(),
                text: text.clone(),
                round: room.round,
            };
            match self.call(self.store.post_message(message, room.revision)).await {
                Err(GameError::Stale(_)) if attempt < WRITE_ATTEMPTS => attempt += 1,
                Err(error) => return Err(error),
                Ok(_) => {
                    tracing::debug!(%room_id, %player_id, turn = room.current_turn_index, "turn submitted");
                    break;
                }
            }
        }

        self.pass_turn(room_id, player_id).await
    }

    /// Casts `voter`'s ballot for `target`.
    ///
    /// Once every present player has voted the room resolves to
    /// `REVEAL`. Refused under [`VotePolicy::HostDecides`].
    pub async fn cast_vote(
        &self,
        room_id: RoomId,
        voter: PlayerId,
        target: PlayerId,
    ) -> Result<Room, GameError> {
        let mut attempt = 1;
        loop {
            let (room, roster) = self.load(room_id).await?;
            let ballot = member(&roster, room_id, voter)?;
            if !ballot.is_present() {
                return Err(GameError::NotInRoom {
                    player_id: voter,
                    room_id,
                });
            }
            if room.status != RoomStatus::Voting {
                return Err(GameError::WrongPhase {
                    room_id,
                    status: room.status,
                    action: "vote",
                });
            }
            if self.config.vote_policy == VotePolicy::HostDecides {
                return Err(GameError::InvalidVote(
                    "the host decides who is eliminated".into(),
                ));
            }
            if voter == target {
                return Err(GameError::InvalidVote("players cannot vote for themselves".into()));
            }
            if !roster.iter().any(|p| p.id == target) {
                return Err(GameError::InvalidVote(format!("{target} is not in this room")));
            }
            if ballot.voted_for.is_some() {
                return Err(GameError::AlreadyVoted(voter));
            }

            match self
                .call(self.store.record_ballot(voter, target, room.revision))
                .await
            {
                Err(GameError::Stale(_)) if attempt < WRITE_ATTEMPTS => attempt += 1,
                Err(error) => return Err(error),
                Ok(()) => break,
            }
        }
        tracing::debug!(%room_id, %voter, %target, "vote cast");

        self.resolve_when_complete(room_id).await
    }

    /// Host-adjudicated elimination: resolves `VOTING` with `target`
    /// eliminated, whatever the ballots say.
    pub async fn eliminate(
        &self,
        room_id: RoomId,
        host_id: PlayerId,
        target: PlayerId,
    ) -> Result<Room, GameError> {
        let (room, roster) = self.load(room_id).await?;
        require_host(&roster, room_id, host_id, "eliminate a player")?;
        if room.status != RoomStatus::Voting {
            return Err(GameError::InvalidTransition {
                room_id,
                from: room.status,
                to: RoomStatus::Reveal,
            });
        }
        if !roster.iter().any(|p| p.id == target) {
            return Err(GameError::InvalidVote(format!("{target} is not in this room")));
        }
        self.resolve(room, roster, Some(target)).await
    }

    /// `REVEAL → LOBBY`: clears the word, every role, and every ballot,
    /// and deletes players who left during the round. Host only.
    pub async fn reset_room(&self, room_id: RoomId, host_id: PlayerId) -> Result<Room, GameError> {
        let (room, roster) = self.load(room_id).await?;
        require_host(&roster, room_id, host_id, "reset the room")?;
        if room.status != RoomStatus::Reveal {
            return Err(GameError::InvalidTransition {
                room_id,
                from: room.status,
                to: RoomStatus::Lobby,
            });
        }
        self.reset(room, roster).await
    }

    /// Takes a player out of the room.
    ///
    /// The host leaving closes the room. Anyone else is deleted in
    /// `LOBBY` and marked departed during a round; if it was their turn
    /// the turn moves on, and if they were the last ballot outstanding
    /// the vote resolves.
    pub async fn leave_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<Departure, GameError> {
        let mut attempt = 1;
        loop {
            let (room, roster) = self.load(room_id).await?;
            let leaver = member(&roster, room_id, player_id)?.clone();

            if leaver.is_host {
                self.call(self.store.delete_room(room_id)).await?;
                tracing::info!(%room_id, %player_id, "host left, room closed");
                return Ok(Departure::RoomClosed);
            }
            if leaver.departed {
                return Ok(Departure::Departed);
            }

            let written = if room.status == RoomStatus::Lobby {
                self.call(self.store.remove_player(player_id, room.revision))
                    .await
                    .map(|()| Departure::Removed)
            } else {
                let gone = Player {
                    departed: true,
                    ..leaver
                };
                self.call(self.store.update_player(gone, room.revision))
                    .await
                    .map(|_| Departure::Departed)
            };
            match written {
                Err(GameError::Stale(_)) if attempt < WRITE_ATTEMPTS => attempt += 1,
                Err(error) => return Err(error),
                Ok(Departure::Departed) => {
                    tracing::info!(%room_id, %player_id, status = %room.status, "player left mid-round");
                    break;
                }
                Ok(departure) => {
                    tracing::info!(%room_id, %player_id, "player left");
                    return Ok(departure);
                }
            }
        }

        // Their turn moves on; their ballot is no longer awaited.
        let settled = match self.pass_turn(room_id, player_id).await {
            Ok(_) => self.resolve_when_complete(room_id).await.map(drop),
            Err(error) => Err(error),
        };
        match settled {
            Err(error) if !error.is_silent() => Err(error),
            _ => Ok(Departure::Departed),
        }
    }

    // -- Internals --------------------------------------------------------

    async fn begin_round(
        &self,
        mut room: Room,
        mut roster: Vec<Player>,
        topic: &str,
        difficulty: Difficulty,
        impostor_count: usize,
    ) -> Result<Room, GameError> {
        let room_id = room.id;
        self.check_round_start(&room, &roster, impostor_count)?;
        if roster.len() < self.config.recommended_players {
            tracing::info!(%room_id, players = roster.len(), "starting below the recommended player count");
        }

        let topic = match topic.trim() {
            "" => DEFAULT_TOPIC,
            trimmed => trimmed,
        };
        let word = self.oracle.secret_word(topic, difficulty).await;

        // The roster may have changed while the oracle was answering. The
        // commit only lands on the roster the roles were drawn for.
        let mut attempt = 1;
        loop {
            let (next, players) =
                self.draw_round(room, roster, &word, topic, difficulty, impostor_count)?;
            let start = next.current_turn_index;
            match self
                .call(self.store.commit_round(next, players, Vec::new()))
                .await
            {
                Err(GameError::Stale(_)) if attempt < WRITE_ATTEMPTS => {
                    attempt += 1;
                    tracing::debug!(%room_id, attempt, "roster changed before the round commit, redrawing");
                    (room, roster) = self.load(room_id).await?;
                    self.check_round_start(&room, &roster, impostor_count)?;
                }
                result => {
                    let stored = result?;
                    tracing::info!(
                        %room_id,
                        round = stored.round,
                        topic,
                        %difficulty,
                        impostors = impostor_count,
                        first_speaker = start,
                        "round started"
                    );
                    return Ok(stored);
                }
            }
        }
    }

    fn check_round_start(
        &self,
        room: &Room,
        roster: &[Player],
        impostor_count: usize,
    ) -> Result<(), GameError> {
        if room.status != RoomStatus::Lobby {
            return Err(GameError::InvalidTransition {
                room_id: room.id,
                from: room.status,
                to: RoomStatus::RoleReveal,
            });
        }
        if roster.len() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers {
                have: roster.len(),
                need: self.config.min_players,
            });
        }
        if impostor_count == 0
            || impostor_count >= roster.len()
            || impostor_count > self.config.max_impostors
        {
            return Err(GameError::InvalidImpostorCount {
                requested: impostor_count,
                players: roster.len(),
            });
        }
        Ok(())
    }

    /// Draws roles and the first speaker over `roster` and builds the
    /// records of the new round.
    fn draw_round(
        &self,
        room: Room,
        roster: Vec<Player>,
        word: &str,
        topic: &str,
        difficulty: Difficulty,
        impostor_count: usize,
    ) -> Result<(Room, Vec<Player>), GameError> {
        let ids: Vec<PlayerId> = roster.iter().map(|p| p.id).collect();
        let mut rng = rand::rng();
        let assigned = roles::assign_roles(&ids, impostor_count, &mut rng)?;
        let start = turns::first_speaker(ids.len(), self.config.random_first_speaker, &mut rng);

        let players = roster
            .into_iter()
            .zip(assigned)
            .map(|(player, (_, role))| Player {
                role: Some(role),
                votes: 0,
                voted_for: None,
                ..player
            })
            .collect();
        let next = Room {
            status: RoomStatus::RoleReveal,
            secret_word: Some(word.to_string()),
            current_turn_index: start,
            turn_start_index: start,
            theme: Some(topic.to_string()),
            difficulty,
            round: room.round + 1,
            outcome: None,
            ..room
        };
        Ok((next, players))
    }

    /// Moves the turn past `speaker` if it is still theirs.
    async fn pass_turn(&self, room_id: RoomId, speaker: PlayerId) -> Result<Room, GameError> {
        let mut attempt = 1;
        loop {
            let (room, roster) = self.load(room_id).await?;
            let current = roster.get(room.current_turn_index).map(|p| p.id);
            if room.status != RoomStatus::Gameplay || current != Some(speaker) {
                return Ok(room);
            }
            match self.rotate(room, roster).await {
                Err(GameError::Stale(_)) if attempt < WRITE_ATTEMPTS => attempt += 1,
                result => return result,
            }
        }
    }

    /// Resolves `VOTING` once no present player's ballot is outstanding.
    async fn resolve_when_complete(&self, room_id: RoomId) -> Result<Room, GameError> {
        let mut attempt = 1;
        loop {
            let (room, roster) = self.load(room_id).await?;
            if room.status != RoomStatus::Voting || !votes::all_voted(&roster) {
                return Ok(room);
            }
            match self.resolve(room, roster, None).await {
                Err(GameError::Stale(_)) if attempt < WRITE_ATTEMPTS => attempt += 1,
                result => return result,
            }
        }
    }

    async fn rotate(&self, room: Room, roster: Vec<Player>) -> Result<Room, GameError> {
        let present: Vec<bool> = roster.iter().map(Player::is_present).collect();
        match turns::advance(&present, room.current_turn_index, room.turn_start_index) {
            Rotation::Next(index) => {
                let next = Room {
                    current_turn_index: index,
                    ..room
                };
                self.call(self.store.update_room(next)).await
            }
            Rotation::LapComplete => {
                tracing::debug!(room_id = %room.id, "lap complete");
                self.enter_voting(room, roster).await
            }
        }
    }

    async fn enter_voting(&self, room: Room, roster: Vec<Player>) -> Result<Room, GameError> {
        let from = room.status;
        let players = roster
            .into_iter()
            .map(|player| Player {
                votes: 0,
                voted_for: None,
                ..player
            })
            .collect();
        let next = Room {
            status: RoomStatus::Voting,
            ..room
        };
        let stored = self
            .call(self.store.commit_round(next, players, Vec::new()))
            .await?;
        log_transition(&stored, from);
        Ok(stored)
    }

    /// Moves `VOTING → REVEAL`. With no `decided` player the ballots are
    /// tallied.
    async fn resolve(
        &self,
        room: Room,
        roster: Vec<Player>,
        decided: Option<PlayerId>,
    ) -> Result<Room, GameError> {
        let eliminated = decided.or_else(|| votes::tally(&roster, self.config.tie_break));
        let word = room.secret_word.clone().unwrap_or_default();
        let outcome = votes::outcome(&roster, eliminated, &word);
        let caught = outcome.caught;

        let next = Room {
            status: RoomStatus::Reveal,
            outcome: Some(outcome),
            ..room
        };
        let stored = self.call(self.store.update_room(next)).await?;
        tracing::info!(room_id = %stored.id, eliminated = ?eliminated, caught, "round resolved");
        log_transition(&stored, RoomStatus::Voting);
        Ok(stored)
    }

    async fn reset(&self, room: Room, roster: Vec<Player>) -> Result<Room, GameError> {
        let (departed, staying): (Vec<Player>, Vec<Player>) =
            roster.into_iter().partition(|p| p.departed);
        let dropped: Vec<PlayerId> = departed.iter().map(|p| p.id).collect();
        let players = staying
            .into_iter()
            .map(|player| Player {
                role: None,
                votes: 0,
                voted_for: None,
                ..player
            })
            .collect();
        let next = Room {
            status: RoomStatus::Lobby,
            secret_word: None,
            current_turn_index: 0,
            turn_start_index: 0,
            outcome: None,
            ..room
        };

        let stored = self
            .call(self.store.commit_round(next, players, dropped))
            .await?;
        if !departed.is_empty() {
            tracing::info!(room_id = %stored.id, removed = departed.len(), "departed players deleted");
        }
        log_transition(&stored, RoomStatus::Reveal);
        Ok(stored)
    }

    async fn load(&self, room_id: RoomId) -> Result<(Room, Vec<Player>), GameError> {
        let room = self.room(room_id).await?;
        let roster = self.call(self.store.players(room_id)).await?;
        Ok((room, roster))
    }

    /// Runs a store call under `store_timeout`. The outer error is the
    /// timeout; the inner result is the store's own.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<Result<T, StoreError>, GameError> {
        tokio::time::timeout(self.config.store_timeout, op)
            .await
            .map_err(|_| {
                tracing::warn!(timeout = ?self.config.store_timeout, "session store call timed out");
                GameError::StoreUnavailable(format!(
                    "no answer within {:?}",
                    self.config.store_timeout
                ))
            })
    }

    async fn call<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, GameError> {
        Ok(self.bounded(op).await??)
    }

    fn validate_text(&self, text: &str) -> Result<String, GameError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::InvalidInput("the description is empty".into()));
        }
        let len = text.chars().count();
        if len > self.config.max_message_len {
            return Err(GameError::InvalidInput(format!(
                "the description has {len} characters (max {})",
                self.config.max_message_len
            )));
        }
        Ok(text.to_string())
    }
}

fn validate_name(name: &str) -> Result<String, GameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::InvalidInput("the name is empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(GameError::InvalidInput(format!(
            "the name is longer than {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn member(roster: &[Player], room_id: RoomId, player_id: PlayerId) -> Result<&Player, GameError> {
    roster
        .iter()
        .find(|p| p.id == player_id)
        .ok_or(GameError::NotInRoom { player_id, room_id })
}

fn require_host(
    roster: &[Player],
    room_id: RoomId,
    player_id: PlayerId,
    action: &'static str,
) -> Result<(), GameError> {
    if member(roster, room_id, player_id)?.is_host {
        Ok(())
    } else {
        Err(GameError::PermissionDenied { player_id, action })
    }
}

fn log_transition(room: &Room, from: RoomStatus) {
    tracing::info!(room_id = %room.id, %from, to = %room.status, round = room.round, "phase changed");
}
