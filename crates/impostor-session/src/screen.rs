//! Screens a client can show.

use impostor_protocol::RoomStatus;
use serde::{Deserialize, Serialize};

/// A top-level screen of the client.
///
/// `ModeSelection` and `Setup` come before any room exists (choosing
/// online or local play, then entering names or a room code). Every
/// other screen corresponds to exactly one [`RoomStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    ModeSelection,
    Setup,
    Lobby,
    RoleReveal,
    Gameplay,
    Voting,
    Reveal,
}

impl Screen {
    /// The screen for a room in `status`.
    pub fn for_status(status: RoomStatus) -> Self {
        match status {
            RoomStatus::Lobby => Self::Lobby,
            RoomStatus::RoleReveal => Self::RoleReveal,
            RoomStatus::Gameplay => Self::Gameplay,
            RoomStatus::Voting => Self::Voting,
            RoomStatus::Reveal => Self::Reveal,
        }
    }

    /// The room status this screen shows, or `None` outside a room.
    pub fn status(self) -> Option<RoomStatus> {
        match self {
            Self::ModeSelection | Self::Setup => None,
            Self::Lobby => Some(RoomStatus::Lobby),
            Self::RoleReveal => Some(RoomStatus::RoleReveal),
            Self::Gameplay => Some(RoomStatus::Gameplay),
            Self::Voting => Some(RoomStatus::Voting),
            Self::Reveal => Some(RoomStatus::Reveal),
        }
    }
}

impl From<RoomStatus> for Screen {
    fn from(status: RoomStatus) -> Self {
        Self::for_status(status)
    }
}
