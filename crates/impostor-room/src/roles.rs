//! Role assignment.

use impostor_protocol::{PlayerId, Role};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::GameError;

/// Draws `impostor_count` Impostors from `roster`; everyone else is a
/// Civilian.
///
/// The roster is shuffled with an unbiased Fisher–Yates shuffle and the
/// first `impostor_count` entries become Impostors, so each player is
/// picked with probability `k / N` independently of earlier rounds.
/// Returns the roles in roster order.
///
/// # Errors
/// [`GameError::InvalidImpostorCount`] unless `1 <= impostor_count < N`.
pub fn assign_roles<R: Rng + ?Sized>(
    roster: &[PlayerId],
    impostor_count: usize,
    rng: &mut R,
) -> Result<Vec<(PlayerId, Role)>, GameError> {
    if impostor_count == 0 || impostor_count >= roster.len() {
        return Err(GameError::InvalidImpostorCount {
            requested: impostor_count,
            players: roster.len(),
        });
    }

    let mut shuffled = roster.to_vec();
    shuffled.shuffle(rng);
    let impostors = &shuffled[..impostor_count];

    Ok(roster
        .iter()
        .map(|id| {
            let role = if impostors.contains(id) {
                Role::Impostor
            } else {
                Role::Civilian
            };
            (*id, role)
        })
        .collect())
}
