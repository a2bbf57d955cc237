//! Turn rotation over the frozen roster.
//!
//! The roster order is the store's `joined_at` order. A lap starts at
//! `turn_start_index` and is complete when rotation comes back around to
//! it, so every present player speaks exactly once per lap whatever the
//! start index. Departed players keep their roster slot and are skipped.

use rand::Rng;

/// Where rotation goes after the current speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// The player at this roster index speaks next.
    Next(usize),
    /// Every present player has spoken; the room moves to `VOTING`.
    LapComplete,
}

/// Picks the index the lap starts from.
pub fn first_speaker<R: Rng + ?Sized>(roster_len: usize, random: bool, rng: &mut R) -> usize {
    if random && roster_len > 0 {
        rng.random_range(0..roster_len)
    } else {
        0
    }
}

/// Advances past `current` in a lap that started at `start`.
///
/// `present[i]` tells whether roster entry `i` is still playing.
pub fn advance(present: &[bool], current: usize, start: usize) -> Rotation {
    let len = present.len();
    for step in 1..len {
        let index = (current + step) % len;
        if index == start {
            return Rotation::LapComplete;
        }
        if present[index] {
            return Rotation::Next(index);
        }
    }
    Rotation::LapComplete
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    /// Speaking order of one full lap.
    fn lap(present: &[bool], start: usize) -> Vec<usize> {
        let mut order = vec![start];
        let mut current = start;
        while let Rotation::Next(next) = advance(present, current, start) {
            order.push(next);
            current = next;
        }
        order
    }

    #[test]
    fn test_advance_three_players_from_zero_visits_in_order() {
        assert_eq!(lap(&[true; 3], 0), vec![0, 1, 2]);
        assert_eq!(advance(&[true; 3], 2, 0), Rotation::LapComplete);
    }

    #[test]
    fn test_advance_random_start_wraps_and_visits_each_once() {
        for start in 0..5 {
            let mut order = lap(&[true; 5], start);
            assert_eq!(order[0], start);
            assert!(order.iter().all(|&i| i < 5));
            order.sort();
            assert_eq!(order, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_advance_skips_departed_players() {
        let present = [true, false, true, true];
        assert_eq!(lap(&present, 0), vec![0, 2, 3]);
    }

    #[test]
    fn test_advance_departed_start_still_ends_lap() {
        // The first speaker left after speaking.
        let present = [false, true, true];
        assert_eq!(advance(&present, 0, 0), Rotation::Next(1));
        assert_eq!(advance(&present, 2, 0), Rotation::LapComplete);
    }

    #[test]
    fn test_advance_single_player_completes_immediately() {
        assert_eq!(advance(&[true], 0, 0), Rotation::LapComplete);
    }

    #[test]
    fn test_first_speaker_fixed_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(first_speaker(5, false, &mut rng), 0);
    }

    #[test]
    fn test_first_speaker_random_within_roster() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert!(first_speaker(4, true, &mut rng) < 4);
        }
    }
}
