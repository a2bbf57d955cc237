//! Identity types and the small closed vocabularies of the game.
//!
//! Everything here is cheap to copy or clone and travels inside the
//! records of [`crate::records`] and the wire messages of [`crate::wire`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier of a player, assigned by the Session Store on join.
///
/// A newtype around `u64` so a `RoomId` can never be passed where a
/// `PlayerId` is expected. `#[serde(transparent)]` keeps the JSON form a
/// plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Opaque identifier of a room, assigned by the Session Store on creation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Identifier of a chat/description message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// The short, human-shareable join code of a room.
///
/// Always exactly [`RoomCode::LEN`] uppercase ASCII letters or digits.
/// Parsing is case-insensitive and trims surrounding whitespace, so
/// `" abc123 "` and `"ABC123"` name the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in every room code.
    pub const LEN: usize = 6;

    /// Alphabet room codes are drawn from.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Normalizes and validates user input into a room code.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let normalized = input.trim().to_ascii_uppercase();
        let valid = normalized.len() == Self::LEN
            && normalized.bytes().all(|b| b.is_ascii_alphanumeric());
        if !valid {
            return Err(ProtocolError::InvalidRoomCode(input.to_string()));
        }
        Ok(Self(normalized))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// Role / Difficulty
// ---------------------------------------------------------------------------

/// The secret role of a player for one round.
///
/// The wire names follow the original game (`"Civil"`, `"Impostor"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Civil")]
    Civilian,
    Impostor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Civilian => write!(f, "Civilian"),
            Self::Impostor => write!(f, "Impostor"),
        }
    }
}

/// Difficulty tier chosen by the host before a round.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Difficulty {
    #[default]
    #[serde(rename = "Fácil", alias = "Easy")]
    Easy,
    #[serde(rename = "Medio", alias = "Medium")]
    Medium,
    #[serde(rename = "Difícil", alias = "Hard")]
    Hard,
}

impl Difficulty {
    /// Zero-based tier index (`Easy` = 0).
    pub fn tier(self) -> usize {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "Fácil"),
            Self::Medium => write!(f, "Medio"),
            Self::Hard => write!(f, "Difícil"),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The phase of a room: the states of the room state machine.
///
/// The graph is a single loop with no terminal state; a room is reused
/// round after round until abandoned:
///
/// ```text
/// Lobby → RoleReveal → Gameplay → Voting → Reveal ─┐
///   ↑                                              │
///   └──────────────────────────────────────────────┘
/// ```
///
/// Because the graph is a loop, every status has exactly one successor
/// and [`RoomStatus::can_transition_to`] is a single comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Lobby,
    RoleReveal,
    Gameplay,
    Voting,
    Reveal,
}

impl RoomStatus {
    /// Every status, in graph order.
    pub const ALL: [Self; 5] = [
        Self::Lobby,
        Self::RoleReveal,
        Self::Gameplay,
        Self::Voting,
        Self::Reveal,
    ];

    /// The single status reachable from `self`.
    pub fn next(self) -> Self {
        match self {
            Self::Lobby => Self::RoleReveal,
            Self::RoleReveal => Self::Gameplay,
            Self::Gameplay => Self::Voting,
            Self::Voting => Self::Reveal,
            Self::Reveal => Self::Lobby,
        }
    }

    /// Returns `true` if `target` is directly reachable from `self`.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == target
    }

    /// Returns `true` if players may join a room in this status.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` while a round is underway (roster frozen).
    pub fn in_round(self) -> bool {
        !matches!(self, Self::Lobby)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "LOBBY",
            Self::RoleReveal => "ROLE_REVEAL",
            Self::Gameplay => "GAMEPLAY",
            Self::Voting => "VOTING",
            Self::Reveal => "REVEAL",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_ids_display_with_prefix() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(RoomId(3).to_string(), "R-3");
        assert_eq!(MessageId(9).to_string(), "M-9");
    }

    #[test]
    fn test_room_code_parse_normalizes_case_and_whitespace() {
        let code = RoomCode::parse("  abc123 ").unwrap();
        assert_eq!(code.as_str(), "ABC123");
        assert_eq!(code, "ABC123".parse().unwrap());
    }

    #[test]
    fn test_room_code_parse_rejects_wrong_length() {
        assert!(RoomCode::parse("ABC12").is_err());
        assert!(RoomCode::parse("ABC1234").is_err());
        assert!(RoomCode::parse("").is_err());
    }

    #[test]
    fn test_room_code_parse_rejects_non_alphanumeric() {
        assert!(RoomCode::parse("AB-123").is_err());
        assert!(RoomCode::parse("ÁBC123").is_err());
    }

    #[test]
    fn test_room_code_deserialize_validates() {
        let code: RoomCode = serde_json::from_str("\"xyz789\"").unwrap();
        assert_eq!(code.as_str(), "XYZ789");
        let bad: Result<RoomCode, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_role_wire_names_match_original_game() {
        assert_eq!(serde_json::to_string(&Role::Civilian).unwrap(), "\"Civil\"");
        assert_eq!(serde_json::to_string(&Role::Impostor).unwrap(), "\"Impostor\"");
    }

    #[test]
    fn test_difficulty_accepts_spanish_and_english_names() {
        let d: Difficulty = serde_json::from_str("\"Difícil\"").unwrap();
        assert_eq!(d, Difficulty::Hard);
        let d: Difficulty = serde_json::from_str("\"Medium\"").unwrap();
        assert_eq!(d, Difficulty::Medium);
        assert_eq!(serde_json::to_string(&Difficulty::Easy).unwrap(), "\"Fácil\"");
    }

    #[test]
    fn test_room_status_next_is_a_single_loop() {
        let mut status = RoomStatus::Lobby;
        for expected in [
            RoomStatus::RoleReveal,
            RoomStatus::Gameplay,
            RoomStatus::Voting,
            RoomStatus::Reveal,
            RoomStatus::Lobby,
        ] {
            status = status.next();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_room_status_can_transition_to_only_successor() {
        assert!(RoomStatus::Lobby.can_transition_to(RoomStatus::RoleReveal));
        assert!(!RoomStatus::Lobby.can_transition_to(RoomStatus::Reveal));
        assert!(!RoomStatus::Voting.can_transition_to(RoomStatus::Lobby));
        assert!(RoomStatus::Reveal.can_transition_to(RoomStatus::Lobby));
        for status in RoomStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_room_status_wire_names() {
        let json = serde_json::to_string(&RoomStatus::RoleReveal).unwrap();
        assert_eq!(json, "\"ROLE_REVEAL\"");
        assert_eq!(RoomStatus::RoleReveal.to_string(), "ROLE_REVEAL");
    }

    #[test]
    fn test_room_status_is_joinable_only_in_lobby() {
        assert!(RoomStatus::Lobby.is_joinable());
        assert!(!RoomStatus::Gameplay.is_joinable());
        assert!(!RoomStatus::Reveal.is_joinable());
    }
}
