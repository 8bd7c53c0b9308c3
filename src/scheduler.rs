//! The tick-driven simulation loop.
//!
//! [`TickScheduler`] holds the active profile snapshot and its cooldowns
//! behind a single mutex. `start`, `stop` and `tick` all take that lock and
//! the actuator is called while it is held, so once `stop` returns no
//! further input is sent. [`TickScheduler::spawn_ticker`] drives `tick` from
//! a tokio interval.

use crate::actuator::{perform, Actuator};
use crate::clock::{Clock, MonotonicClock};
use crate::cooldown::CooldownTracker;
use crate::error::SksError;
use crate::interval;
use crate::keys::key_name;
use crate::profile::{InputKind, Profile};
use crate::selector::select;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(50);

/// Shortest period the live ticker runs at; a zero period is raised to this.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

const EVENT_CAPACITY: usize = 16;

/// How the scheduler decides what to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Weighted random choice among keys whose cooldown has elapsed.
    #[default]
    Smart,
    /// Every action on its own fixed interval.
    Classic,
}

impl FromStr for SimulationMode {
    type Err = SksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smart" => Ok(Self::Smart),
            "classic" => Ok(Self::Classic),
            other => Err(SksError::config_validation(format!(
                "unknown mode '{}', expected 'smart' or 'classic'",
                other
            ))),
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smart => f.write_str("smart"),
            Self::Classic => f.write_str("classic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub tick_period: Duration,
    pub mode: SimulationMode,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            mode: SimulationMode::Smart,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Lifecycle notifications for UI-side subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    Started { profile: String },
    Stopped,
}

/// What a single [`TickScheduler::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The scheduler is not running.
    Idle,
    /// Running, but nothing to fire this tick.
    NoEligibleAction,
    Fired { kind: InputKind, code: u32, at: u64 },
    /// The actuator refused the input; the schedule carries on.
    Failed { kind: InputKind, code: u32, reason: String },
}

struct Run {
    profile: Profile,
    /// Smart mode, keyed by virtual-key code.
    cooldowns: CooldownTracker<u32>,
    /// Classic mode, keyed by action index.
    timers: CooldownTracker<usize>,
}

struct Inner<R> {
    run: Option<Run>,
    rng: R,
}

pub struct TickScheduler<A, R = ChaCha8Rng> {
    actuator: A,
    clock: Arc<dyn Clock>,
    options: SchedulerOptions,
    inner: Mutex<Inner<R>>,
    events: broadcast::Sender<SchedulerEvent>,
}

impl<A: Actuator> TickScheduler<A, ChaCha8Rng> {
    /// Real clock, entropy-seeded generator.
    pub fn new(actuator: A, options: SchedulerOptions) -> Self {
        Self::with_parts(
            actuator,
            Arc::new(MonotonicClock::new()),
            ChaCha8Rng::from_entropy(),
            options,
        )
    }

    /// Real clock, reproducible generator.
    pub fn seeded(actuator: A, options: SchedulerOptions, seed: u64) -> Self {
        Self::with_parts(
            actuator,
            Arc::new(MonotonicClock::new()),
            ChaCha8Rng::seed_from_u64(seed),
            options,
        )
    }
}

impl<A: Actuator, R: Rng + Send> TickScheduler<A, R> {
    pub fn with_parts(
        actuator: A,
        clock: Arc<dyn Clock>,
        rng: R,
        mut options: SchedulerOptions,
    ) -> Self {
        if options.tick_period.is_zero() {
            warn!(
                min = ?MIN_TICK_PERIOD,
                "Tick period of zero requested, using the minimum instead"
            );
            options.tick_period = MIN_TICK_PERIOD;
        }
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            actuator,
            clock,
            options,
            inner: Mutex::new(Inner { run: None, rng }),
            events,
        }
    }

    // Every critical section leaves `Inner` consistent, so a poisoned lock
    // is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, Inner<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SchedulerEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SchedulerState {
        if self.lock().run.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Name of the profile currently running.
    pub fn active_profile(&self) -> Option<String> {
        self.lock().run.as_ref().map(|run| run.profile.name.clone())
    }

    /// Begin running `profile`, replacing any run in progress.
    pub fn start(&self, profile: Profile) {
        let now = self.clock.now_millis();
        let mut inner = self.lock();

        if inner.run.take().is_some() {
            info!("Simulation stopped for restart");
            self.emit(SchedulerEvent::Stopped);
        }

        let mut timers = CooldownTracker::new();
        if self.options.mode == SimulationMode::Classic {
            interval::arm(&profile.actions, now, &mut timers);
        }

        info!(
            profile = %profile.name,
            mode = %self.options.mode,
            actions = profile.actions.len(),
            "Simulation started"
        );
        let name = profile.name.clone();
        inner.run = Some(Run {
            profile,
            cooldowns: CooldownTracker::new(),
            timers,
        });
        self.emit(SchedulerEvent::Started { profile: name });
    }

    /// Stop the current run and drop its cooldowns. No-op while idle.
    pub fn stop(&self) {
        let mut inner = self.lock();
        if inner.run.take().is_some() {
            info!("Simulation stopped");
            self.emit(SchedulerEvent::Stopped);
        }
    }

    /// One decide-and-actuate step. Fires at most one input.
    pub fn tick(&self) -> TickOutcome {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let Some(run) = inner.run.as_mut() else {
            return TickOutcome::Idle;
        };
        let now = self.clock.now_millis();

        match self.options.mode {
            SimulationMode::Smart => {
                let selection = select(&run.profile.actions, now, &run.cooldowns, &mut inner.rng);
                let Some(selection) = selection else {
                    trace!("No eligible action this tick");
                    return TickOutcome::NoEligibleAction;
                };

                match self.actuator.press_key(selection.code) {
                    Ok(()) => {
                        run.cooldowns.record_fire(selection.code, now);
                        debug!(
                            key = %key_name(selection.code),
                            source = ?selection.source,
                            at = now,
                            "Key fired"
                        );
                        TickOutcome::Fired {
                            kind: InputKind::Keyboard,
                            code: selection.code,
                            at: now,
                        }
                    }
                    Err(e) => {
                        warn!(key = %key_name(selection.code), error = %e, "Key press failed");
                        TickOutcome::Failed {
                            kind: InputKind::Keyboard,
                            code: selection.code,
                            reason: e.to_string(),
                        }
                    }
                }
            }
            SimulationMode::Classic => {
                let Some(slot) = interval::next_due(&run.profile.actions, now, &run.timers) else {
                    return TickOutcome::NoEligibleAction;
                };
                let action = &run.profile.actions[slot];
                let (kind, code) = (action.kind, action.code);
                let result = perform(&self.actuator, action);
                // the timer restarts whether or not the OS took the input
                run.timers.record_fire(slot, now);

                match result {
                    Ok(()) => {
                        debug!(action = %action.label(), at = now, "Action fired");
                        TickOutcome::Fired { kind, code, at: now }
                    }
                    Err(e) => {
                        warn!(action = %action.label(), error = %e, "Action failed");
                        TickOutcome::Failed {
                            kind,
                            code,
                            reason: e.to_string(),
                        }
                    }
                }
            }
        }
    }
}

impl<A, R> TickScheduler<A, R>
where
    A: Actuator + 'static,
    R: Rng + Send + 'static,
{
    /// Tick on a tokio interval until `shutdown` flips to `true` or its
    /// sender is dropped, then stop the scheduler.
    ///
    /// Late ticks are delayed rather than bunched up.
    pub fn spawn_ticker(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.options.tick_period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        scheduler.tick();
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            scheduler.stop();
            debug!("Ticker shut down");
        })
    }
}
