//! Resume tokens for hosted connections.
//!
//! Room and player ids are small sequential numbers that every member of
//! a room can see, so they cannot prove who is reconnecting. Binding
//! through `CreateRoom` or `JoinRoom` issues a random token, and a
//! `Resume` is only honored with the token issued to that player.

use std::collections::HashMap;

use impostor_protocol::{PlayerId, RoomId};
use rand::Rng;

struct Key {
    room_id: RoomId,
    token: String,
}

/// Issued tokens, one per player.
#[derive(Default)]
pub(crate) struct ResumeKeys {
    keys: HashMap<PlayerId, Key>,
}

impl ResumeKeys {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh token for `player_id`, replacing any earlier one.
    pub(crate) fn issue(&mut self, room_id: RoomId, player_id: PlayerId) -> String {
        let token = generate_token();
        self.keys.insert(
            player_id,
            Key {
                room_id,
                token: token.clone(),
            },
        );
        tracing::debug!(%room_id, %player_id, "resume token issued");
        token
    }

    /// Whether `token` is the one issued to `player_id` in `room_id`.
    pub(crate) fn verify(&self, room_id: RoomId, player_id: PlayerId, token: &str) -> bool {
        self.keys
            .get(&player_id)
            .is_some_and(|key| key.room_id == room_id && key.token == token)
    }

    /// Forgets the player's token; later resumes are refused.
    pub(crate) fn revoke(&mut self, player_id: PlayerId) {
        if self.keys.remove(&player_id).is_some() {
            tracing::debug!(%player_id, "resume token revoked");
        }
    }
}

/// 16 random bytes as 32 lowercase hex characters.
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
