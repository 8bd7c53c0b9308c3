//! Classic mode: every action on its own fixed timer.
//!
//! Slots are keyed by position in the profile because mouse actions all
//! carry code 0. A slot is due once `interval` ms have passed since the run
//! started or since it last fired. At most one slot fires per tick: the most
//! overdue one, earliest in profile order on ties.

use crate::cooldown::CooldownTracker;
use crate::profile::Action;

/// Seed every classic slot with the run start so the first fire happens one
/// interval in, like a freshly started timer.
pub fn arm(actions: &[Action], started_at: u64, timers: &mut CooldownTracker<usize>) {
    timers.reset();
    for (slot, action) in actions.iter().enumerate() {
        if action.is_classic_candidate() {
            timers.record_fire(slot, started_at);
        }
    }
}

/// Index of the action that should fire at `now`, if any.
pub fn next_due(actions: &[Action], now: u64, timers: &CooldownTracker<usize>) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (slot, action) in actions.iter().enumerate() {
        if !action.is_classic_candidate() || !timers.is_eligible(slot, now, action.interval) {
            continue;
        }
        let last = timers.last_fired(slot).unwrap_or(0);
        let overdue = now
            .saturating_sub(last)
            .saturating_sub(u64::from(action.interval));
        match best {
            Some((_, most)) if most >= overdue => {}
            _ => best = Some((slot, overdue)),
        }
    }
    best.map(|(slot, _)| slot)
}
