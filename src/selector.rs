//! Weighted choice of the next key to fire.
//!
//! Every eligible candidate contributes `max(1, weight² / 100)` slots to a
//! pool and one slot is drawn uniformly. The squared weight deliberately
//! favours high-priority keys more than proportionally. The pool is never
//! materialized: a single draw in `[0, total)` is walked across the
//! cumulative slot counts, which yields the same distribution.
//!
//! When every candidate is on cooldown the selector falls back to the
//! highest-weight candidate (first in profile order on ties) and ignores
//! the cooldown, so a profile with at least one usable key never idles.

use crate::cooldown::CooldownTracker;
use crate::profile::Action;
use rand::Rng;

/// Which path produced a [`Selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    /// Drawn from the weighted pool of eligible keys.
    Pool,
    /// Every key was on cooldown; the heaviest one was picked anyway.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub code: u32,
    pub source: SelectionSource,
}

/// Pick the next key at time `now` given the current cooldowns.
///
/// Returns `None` only when the actions hold no enabled keyboard candidate.
pub fn select<R>(
    actions: &[Action],
    now: u64,
    cooldowns: &CooldownTracker<u32>,
    rng: &mut R,
) -> Option<Selection>
where
    R: Rng + ?Sized,
{
    select_with(
        actions,
        |action| cooldowns.is_eligible(action.code, now, action.min_interval),
        rng,
    )
}

/// Same decision as [`select`] with eligibility supplied by the caller.
///
/// The preview uses this with a step-based predicate.
pub fn select_with<R, F>(actions: &[Action], is_eligible: F, rng: &mut R) -> Option<Selection>
where
    R: Rng + ?Sized,
    F: Fn(&Action) -> bool,
{
    let eligible: Vec<&Action> = actions
        .iter()
        .filter(|action| action.is_smart_candidate() && is_eligible(action))
        .collect();

    let pool_size: u64 = eligible.iter().map(|action| action.pool_entries()).sum();
    if pool_size > 0 {
        let mut slot = rng.gen_range(0..pool_size);
        for action in &eligible {
            let entries = action.pool_entries();
            if slot < entries {
                return Some(Selection {
                    code: action.code,
                    source: SelectionSource::Pool,
                });
            }
            slot -= entries;
        }
    }

    fallback(actions).map(|code| Selection {
        code,
        source: SelectionSource::Fallback,
    })
}

/// Highest-weight candidate regardless of cooldown; ties go to the earliest.
pub fn fallback(actions: &[Action]) -> Option<u32> {
    actions
        .iter()
        .filter(|action| action.is_smart_candidate())
        .fold(None, |best: Option<&Action>, action| match best {
            Some(current) if current.weight >= action.weight => Some(current),
            _ => Some(action),
        })
        .map(|action| action.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Action;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn tally(actions: &[Action], draws: usize, seed: u64) -> HashMap<u32, usize> {
        let cooldowns = CooldownTracker::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut counts = HashMap::new();
        for _ in 0..draws {
            let selection = select(actions, 0, &cooldowns, &mut rng).unwrap();
            assert_eq!(selection.source, SelectionSource::Pool);
            *counts.entry(selection.code).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_squared_weight_ratio() {
        let actions = vec![
            Action::keyboard(0x31, 50, 50, 1000),
            Action::keyboard(0x32, 100, 50, 1000),
        ];
        let counts = tally(&actions, 10_000, 7);
        let ones = counts[&0x31] as f64;
        let twos = counts[&0x32] as f64;
        let ratio = twos / ones;
        assert!((3.5..4.6).contains(&ratio), "ratio was {}", ratio);
    }

    #[test]
    fn test_heavier_key_wins_more_often() {
        let actions = vec![
            Action::keyboard(0x41, 30, 50, 1000),
            Action::keyboard(0x42, 60, 50, 1000),
            Action::keyboard(0x43, 90, 50, 1000),
        ];
        let counts = tally(&actions, 30_000, 11);
        assert!(counts[&0x43] > counts[&0x42]);
        assert!(counts[&0x42] > counts[&0x41]);

        // 81 : 36 : 9 slots
        let ratio = counts[&0x43] as f64 / counts[&0x41] as f64;
        assert!((7.0..11.5).contains(&ratio), "ratio was {}", ratio);
    }

    #[test]
    fn test_key_on_cooldown_is_not_drawn() {
        let actions = vec![
            Action::keyboard(0x31, 100, 500, 1000),
            Action::keyboard(0x32, 10, 50, 1000),
        ];
        let mut cooldowns = CooldownTracker::new();
        cooldowns.record_fire(0x31, 1_000);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..500 {
            let selection = select(&actions, 1_200, &cooldowns, &mut rng).unwrap();
            assert_eq!(selection.code, 0x32);
            assert_eq!(selection.source, SelectionSource::Pool);
        }
    }

    #[test]
    fn test_fallback_picks_heaviest_first_on_tie() {
        let actions = vec![
            Action::keyboard(0x31, 40, 500, 1000),
            Action::keyboard(0x32, 80, 500, 1000),
            Action::keyboard(0x33, 80, 500, 1000),
        ];
        let mut cooldowns = CooldownTracker::new();
        for code in [0x31, 0x32, 0x33] {
            cooldowns.record_fire(code, 0);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let selection = select(&actions, 100, &cooldowns, &mut rng).unwrap();
        assert_eq!(
            selection,
            Selection {
                code: 0x32,
                source: SelectionSource::Fallback
            }
        );
    }

    #[test]
    fn test_fallback_ignores_disabled_and_mouse() {
        let actions = vec![
            Action::keyboard(0x31, 100, 50, 1000).with_enabled(false),
            Action::mouse_left(500),
            Action::keyboard(0x32, 20, 50, 1000),
        ];
        assert_eq!(fallback(&actions), Some(0x32));
    }

    #[test]
    fn test_no_keyboard_candidates() {
        let actions = vec![
            Action::mouse_left(500),
            Action::mouse_right(800),
            Action::keyboard(0x31, 50, 50, 1000).with_enabled(false),
            Action::keyboard(0x32, 50, 900, 100),
        ];
        let cooldowns = CooldownTracker::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(select(&actions, 0, &cooldowns, &mut rng), None);
        assert_eq!(select(&[], 0, &cooldowns, &mut rng), None);
    }

    #[test]
    fn test_duplicate_codes_share_cooldown() {
        let actions = vec![
            Action::keyboard(0x31, 90, 500, 1000),
            Action::keyboard(0x31, 10, 50, 1000),
            Action::keyboard(0x32, 5, 50, 1000),
        ];
        let mut cooldowns = CooldownTracker::new();
        cooldowns.record_fire(0x31, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        // one shared entry: it blocks the heavy duplicate (min 500) while the
        // light duplicate (min 50) is already past it
        for _ in 0..200 {
            let selection = select(&actions, 100, &cooldowns, &mut rng).unwrap();
            assert_eq!(selection.source, SelectionSource::Pool);
            assert!(selection.code == 0x31 || selection.code == 0x32);
        }
    }

    #[test]
    fn test_same_seed_same_choices() {
        let actions = vec![
            Action::keyboard(0x31, 50, 50, 1000),
            Action::keyboard(0x32, 70, 50, 1000),
            Action::keyboard(0x33, 90, 50, 1000),
        ];
        let cooldowns = CooldownTracker::new();
        let mut a = ChaCha8Rng::seed_from_u64(99);
        let mut b = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..100 {
            assert_eq!(
                select(&actions, 0, &cooldowns, &mut a),
                select(&actions, 0, &cooldowns, &mut b)
            );
        }
    }

    proptest! {
        #[test]
        fn prop_pool_never_returns_cooling_key(
            keys in prop::collection::vec((1u32..=100, any::<bool>()), 1..8),
            seed in any::<u64>(),
        ) {
            let actions: Vec<Action> = keys
                .iter()
                .enumerate()
                .map(|(i, (weight, _))| Action::keyboard(0x41 + i as u32, *weight, 500, 1000))
                .collect();
            let mut cooldowns = CooldownTracker::new();
            for (action, (_, cooling)) in actions.iter().zip(&keys) {
                if *cooling {
                    cooldowns.record_fire(action.code, 1_000);
                }
            }

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let selection = select(&actions, 1_100, &cooldowns, &mut rng).unwrap();
            let chosen_cooling = keys[(selection.code - 0x41) as usize].1;

            match selection.source {
                SelectionSource::Pool => prop_assert!(!chosen_cooling),
                SelectionSource::Fallback => {
                    prop_assert!(keys.iter().all(|(_, cooling)| *cooling));
                    prop_assert_eq!(Some(selection.code), fallback(&actions));
                }
            }
        }
    }
}
