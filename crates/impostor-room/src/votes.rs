//! Vote tally and round outcome.

use impostor_protocol::{Player, PlayerId, RoundOutcome};

use crate::TieBreak;

/// Picks the player to eliminate from the ballots in `roster`.
///
/// The player with strictly the most votes is eliminated. A tie for the
/// most votes is settled by `tie_break`. Nobody is eliminated when no
/// votes were cast. `roster` must be in roster order for
/// [`TieBreak::EarliestJoined`] to mean what it says.
pub fn tally(roster: &[Player], tie_break: TieBreak) -> Option<PlayerId> {
    let top = roster.iter().map(|p| p.votes).max().filter(|&v| v > 0)?;
    let mut leaders = roster.iter().filter(|p| p.votes == top);
    let first = leaders.next()?;
    let tied = leaders.next().is_some();

    match (tied, tie_break) {
        (false, _) | (true, TieBreak::EarliestJoined) => Some(first.id),
        (true, TieBreak::NoElimination) => None,
    }
}

/// Returns `true` once every present player has cast a ballot.
pub fn all_voted(roster: &[Player]) -> bool {
    roster
        .iter()
        .filter(|p| p.is_present())
        .all(|p| p.voted_for.is_some())
}

/// What `REVEAL` shows for a round.
pub fn outcome(roster: &[Player], eliminated: Option<PlayerId>, secret_word: &str) -> RoundOutcome {
    let caught = eliminated
        .and_then(|id| roster.iter().find(|p| p.id == id))
        .is_some_and(Player::is_impostor);

    RoundOutcome {
        eliminated,
        caught,
        secret_word: secret_word.to_string(),
        impostors: roster
            .iter()
            .filter(|p| p.is_impostor())
            .map(|p| p.id)
            .collect(),
    }
}
