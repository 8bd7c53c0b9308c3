//! Side-effect-free preview of the smart sequence.
//!
//! The preview walks a synthetic clock one tick per step and runs the same
//! selection as the live scheduler, with cooldowns expressed in whole ticks.

use crate::keys::preview_symbol;
use crate::profile::Profile;
use crate::scheduler::DEFAULT_TICK_PERIOD;
use crate::selector::select_with;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Last-used step assumed for keys that have not fired yet.
pub const NEVER_FIRED_STEP: i64 = -1000;

const MAX_CAPACITY_HINT: usize = 4096;

/// Result of [`PreviewGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// One symbol per step that fired a key.
    Sequence(String),
    /// The profile has no enabled keyboard action to schedule.
    NoActionsConfigured,
}

impl Preview {
    pub fn sequence(&self) -> Option<&str> {
        match self {
            Preview::Sequence(symbols) => Some(symbols),
            Preview::NoActionsConfigured => None,
        }
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preview::Sequence(symbols) => f.write_str(symbols),
            Preview::NoActionsConfigured => f.write_str("No actions configured"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PreviewGenerator {
    tick_millis: u64,
}

impl Default for PreviewGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_PERIOD)
    }
}

impl PreviewGenerator {
    /// `tick_period` should match the scheduler's tick.
    pub fn new(tick_period: Duration) -> Self {
        Self {
            tick_millis: (tick_period.as_millis() as u64).max(1),
        }
    }

    /// Cooldown of `min_interval` ms expressed in whole steps.
    pub fn min_gap(&self, min_interval: u32) -> i64 {
        (u64::from(min_interval) / self.tick_millis) as i64
    }

    pub fn generate<R>(&self, profile: &Profile, steps: usize, rng: &mut R) -> Preview
    where
        R: Rng + ?Sized,
    {
        if !profile.has_smart_candidates() {
            return Preview::NoActionsConfigured;
        }

        let mut last_step: HashMap<u32, i64> = HashMap::new();
        let mut symbols = sequence_buffer(steps);
        let steps = i64::try_from(steps).unwrap_or(i64::MAX);

        for step in 0..steps {
            let selection = select_with(
                &profile.actions,
                |action| {
                    let last = last_step
                        .get(&action.code)
                        .copied()
                        .unwrap_or(NEVER_FIRED_STEP);
                    step - last >= self.min_gap(action.min_interval)
                },
                rng,
            );

            if let Some(selection) = selection {
                last_step.insert(selection.code, step);
                symbols.push(preview_symbol(selection.code));
            }
        }

        Preview::Sequence(symbols)
    }

    /// [`generate`](Self::generate) with a fresh generator seeded by `seed`.
    pub fn generate_seeded(&self, profile: &Profile, steps: usize, seed: u64) -> Preview {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.generate(profile, steps, &mut rng)
    }
}

// `steps` comes straight from the command line.
fn sequence_buffer(steps: usize) -> String {
    String::with_capacity(steps.min(MAX_CAPACITY_HINT))
}
