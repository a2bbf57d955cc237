//! Cold-start recovery.
//!
//! The flow has three steps, and the caller (the presentation layer)
//! sits between each of them:
//!
//! ```text
//! check() ──→ Prompt{room, player} ──→ confirm() ──→ Resumed{screen, snapshot, feed}
//!    │                 │                   │
//!    ▼                 ▼                   ▼
//!  Fresh           decline()             Fresh   (room vanished in between)
//!                      │
//!                      ▼
//!                    Fresh
//! ```
//!
//! Recovery never rejoins on its own: `check` only reports what it found.
//! It also never leaves the caller waiting on a broken store; every
//! lookup is bounded by [`RecoveryConfig::lookup_timeout`], and a failure
//! of any kind is handled exactly like "not found".

use std::sync::Arc;
use std::time::Duration;

use impostor_protocol::{Player, Room, RoomSnapshot};
use impostor_room::{GameError, RoomCoordinator, RoomFeed};
use impostor_store::SessionStore;
use impostor_words::WordOracle;
use serde::{Deserialize, Serialize};

use crate::{IdentityStore, Screen, StoredIdentity};

/// Recovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Upper bound on each Session Store lookup.
    pub lookup_timeout: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

/// What [`RecoveryManager::check`] found.
#[derive(Debug, Clone, PartialEq)]
pub enum Recovery {
    /// Nothing to recover; start at mode selection.
    Fresh,
    /// The remembered room and player both still exist. Ask the user.
    Prompt(RecoveryPrompt),
}

/// The room and player a client can rejoin.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryPrompt {
    pub room: Room,
    pub player: Player,
    /// Carried over from the remembered identity.
    pub resume_token: Option<String>,
}

impl RecoveryPrompt {
    fn identity(&self) -> StoredIdentity {
        StoredIdentity {
            room_id: self.room.id,
            player_id: self.player.id,
            resume_token: self.resume_token.clone(),
        }
    }
}

/// What [`RecoveryManager::confirm`] produced.
pub enum Resume {
    /// Back in the room.
    Resumed(Box<Resumed>),
    /// The room or player disappeared after the prompt; start fresh.
    Fresh,
}

/// A rejoined session.
pub struct Resumed {
    /// Where the client should land: the room's current phase.
    pub screen: Screen,
    /// The current state, redacted for the rejoining player.
    pub snapshot: RoomSnapshot,
    /// Live updates for the room from here on.
    pub feed: RoomFeed,
    pub identity: StoredIdentity,
}

/// Decides whether a restarted client can rejoin its last room.
pub struct RecoveryManager<I, S, O> {
    identity: Arc<I>,
    coordinator: Arc<RoomCoordinator<S, O>>,
    config: RecoveryConfig,
}

impl<I, S, O> RecoveryManager<I, S, O>
where
    I: IdentityStore,
    S: SessionStore,
    O: WordOracle,
{
    pub fn new(
        identity: Arc<I>,
        coordinator: Arc<RoomCoordinator<S, O>>,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            identity,
            coordinator,
            config,
        }
    }

    /// The identity port this manager reads and clears.
    pub fn identity_store(&self) -> &Arc<I> {
        &self.identity
    }

    /// Looks up the remembered identity.
    ///
    /// Returns [`Recovery::Prompt`] only if both the room and an active
    /// player record exist. Anything else, including a store error or a
    /// timeout, forgets the identity and returns [`Recovery::Fresh`].
    pub async fn check(&self) -> Recovery {
        let identity = match self.identity.identity().await {
            Ok(Some(identity)) => identity,
            Ok(None) => return Recovery::Fresh,
            Err(error) => {
                tracing::warn!(%error, "could not read local identity, starting fresh");
                self.discard().await;
                return Recovery::Fresh;
            }
        };

        let lookup = tokio::time::timeout(self.config.lookup_timeout, self.lookup(&identity)).await;
        match lookup {
            Ok(Ok((room, player))) => {
                tracing::info!(
                    room_id = %room.id,
                    player_id = %player.id,
                    status = ?room.status,
                    "previous session found, offering to rejoin"
                );
                Recovery::Prompt(RecoveryPrompt {
                    room,
                    player,
                    resume_token: identity.resume_token,
                })
            }
            Ok(Err(error)) => {
                tracing::info!(
                    room_id = %identity.room_id,
                    player_id = %identity.player_id,
                    %error,
                    "previous session is gone, starting fresh"
                );
                self.discard().await;
                Recovery::Fresh
            }
            Err(_) => {
                tracing::warn!(
                    room_id = %identity.room_id,
                    timeout = ?self.config.lookup_timeout,
                    "session lookup timed out, starting fresh"
                );
                self.discard().await;
                Recovery::Fresh
            }
        }
    }

    /// The user chose not to rejoin.
    pub async fn decline(&self, prompt: RecoveryPrompt) {
        tracing::info!(
            room_id = %prompt.room.id,
            player_id = %prompt.player.id,
            "rejoin declined"
        );
        self.discard().await;
    }

    /// The user chose to rejoin.
    ///
    /// Subscribes to the room and re-reads it, so the client lands on the
    /// room's phase as of now rather than as of the prompt.
    pub async fn confirm(&self, prompt: RecoveryPrompt) -> Resume {
        let identity = prompt.identity();
        let feed = self.coordinator.feed(identity.room_id);

        let read = tokio::time::timeout(
            self.config.lookup_timeout,
            self.coordinator.snapshot(identity.room_id),
        )
        .await;
        let snapshot = match read {
            Ok(Ok(snapshot))
                if snapshot
                    .player(identity.player_id)
                    .is_some_and(Player::is_present) =>
            {
                snapshot
            }
            Ok(Ok(_)) => {
                tracing::info!(room_id = %identity.room_id, player_id = %identity.player_id, "player left before rejoin, starting fresh");
                self.discard().await;
                return Resume::Fresh;
            }
            Ok(Err(error)) => {
                tracing::info!(room_id = %identity.room_id, %error, "room gone before rejoin, starting fresh");
                self.discard().await;
                return Resume::Fresh;
            }
            Err(_) => {
                tracing::warn!(room_id = %identity.room_id, "rejoin read timed out, starting fresh");
                self.discard().await;
                return Resume::Fresh;
            }
        };

        let screen = Screen::for_status(snapshot.room.status);
        tracing::info!(
            room_id = %identity.room_id,
            player_id = %identity.player_id,
            ?screen,
            "session resumed"
        );
        Resume::Resumed(Box::new(Resumed {
            screen,
            snapshot: snapshot.redacted_for(identity.player_id),
            feed,
            identity,
        }))
    }

    async fn lookup(&self, identity: &StoredIdentity) -> Result<(Room, Player), GameError> {
        let room = self.coordinator.room(identity.room_id).await?;
        let player = self
            .coordinator
            .player(identity.room_id, identity.player_id)
            .await?;
        if !player.is_present() {
            return Err(GameError::NotInRoom {
                player_id: player.id,
                room_id: room.id,
            });
        }
        Ok((room, player))
    }

    async fn discard(&self) {
        if let Err(error) = self.identity.forget().await {
            tracing::warn!(%error, "could not clear local identity");
        }
    }
}
