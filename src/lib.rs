//! # Smart Key Sender
//!
//! Replays configured key and mouse actions on a fixed tick. In smart mode
//! each tick fires exactly one key, drawn from the keys whose cooldown has
//! elapsed with a bias towards higher weights. In classic mode every action
//! runs on its own interval.
//!
//! ## Features
//!
//! - Weighted selection with squared-weight bias and per-key cooldowns
//! - Highest-weight fallback so a usable profile never idles
//! - Deterministic sequence preview with no side effects
//! - Pluggable input injection via the [`Actuator`] trait
//! - Global start/stop hotkeys and JSON configuration for the CLI
//!
//! ## Example
//!
//! ```
//! use smart_key_sender::{Action, PreviewGenerator, Profile};
//!
//! let profile = Profile::new("Wizard")
//!     .with_action(Action::keyboard(0x31, 50, 50, 1000))
//!     .with_action(Action::keyboard(0x32, 100, 50, 1000));
//!
//! let preview = PreviewGenerator::default().generate_seeded(&profile, 20, 7);
//! assert_eq!(preview.to_string().len(), 20);
//! ```
//!
//! ## Configuration
//!
//! ```json
//! {
//!   "profiles": [
//!     {
//!       "name": "Wizard",
//!       "actions": [
//!         {"key": "1", "weight": 50, "min_interval": 500, "max_interval": 1000},
//!         {"kind": "mouse_right", "interval": 800}
//!       ]
//!     }
//!   ],
//!   "start_hotkey": "F5",
//!   "stop_hotkey": "F6",
//!   "tick_period": "50ms",
//!   "mode": "smart"
//! }
//! ```

pub mod actuator;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod hotkeys;
pub mod interval;
pub mod keys;
pub mod preview;
pub mod profile;
pub mod scheduler;
pub mod selector;

pub use actuator::{Actuator, DryRunActuator, MouseButton, RecordingActuator};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::Config;
pub use cooldown::CooldownTracker;
pub use error::{Result, SksError};
pub use hotkeys::{HotkeyCommand, HotkeyManager};
pub use preview::{Preview, PreviewGenerator};
pub use profile::{Action, InputKind, Profile};
pub use scheduler::{
    SchedulerEvent, SchedulerOptions, SchedulerState, SimulationMode, TickOutcome, TickScheduler,
};
pub use selector::{select, Selection, SelectionSource};

#[cfg(windows)]
pub use actuator::SendInputActuator;
