//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// How the `VOTING` phase is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VotePolicy {
    /// Every present player casts one ballot. The phase resolves once all
    /// of them have voted, or when the host forces it.
    #[default]
    Ballot,

    /// The host eliminates one player directly; ballots are refused.
    HostDecides,
}

/// What happens when several players share the highest vote count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TieBreak {
    /// Nobody is eliminated and the Impostors are not caught.
    #[default]
    NoElimination,

    /// The tied player who joined first is eliminated.
    EarliestJoined,
}

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Rules and limits shared by every room a coordinator manages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Fewest players a round can start with.
    pub min_players: usize,

    /// Player count the lobby suggests waiting for. Starting below it is
    /// allowed and only logged.
    pub recommended_players: usize,

    /// Most players a room accepts.
    pub max_players: usize,

    /// Most Impostors a host may ask for (still always fewer than the
    /// number of players).
    pub max_impostors: usize,

    /// Start each lap at a random roster index instead of index 0.
    pub random_first_speaker: bool,

    pub vote_policy: VotePolicy,
    pub tie_break: TieBreak,

    /// Upper bound on every Session Store call.
    pub store_timeout: Duration,

    /// Longest accepted turn description, in characters.
    pub max_message_len: usize,

    /// Attempts at finding an unused room code before giving up.
    pub code_attempts: usize,

    pub feed: FeedConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            recommended_players: 3,
            max_players: 8,
            max_impostors: 3,
            random_first_speaker: true,
            vote_policy: VotePolicy::default(),
            tie_break: TieBreak::default(),
            store_timeout: Duration::from_secs(5),
            max_message_len: 280,
            code_attempts: 8,
            feed: FeedConfig::default(),
        }
    }
}

/// Reconnect behavior of a [`crate::RoomFeed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// First delay before re-subscribing after the store dropped out.
    pub retry_initial: Duration,

    /// The delay doubles on each failure up to this cap.
    pub retry_max: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            retry_initial: Duration::from_millis(250),
            retry_max: Duration::from_secs(5),
        }
    }
}
