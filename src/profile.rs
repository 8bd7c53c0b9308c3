//! Actions and profiles: the data the scheduler consumes.
//!
//! A [`Profile`] is an ordered list of [`Action`]s. The scheduler takes a
//! snapshot of it at start and never mutates it.

use crate::error::{Result, SksError};
use crate::keys::{is_valid_code, key_name, serde_key, MAX_KEY_CODE};
use serde::{Deserialize, Serialize};

/// Upper bound of the weight range; also the divisor of the pool scaling.
pub const MAX_WEIGHT: u32 = 100;

/// The three kinds of input an action can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    Keyboard,
    MouseLeft,
    MouseRight,
}

/// One configured automated input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub kind: InputKind,

    /// Virtual-key code; 0 for mouse actions.
    #[serde(default, rename = "key", with = "serde_key")]
    pub code: u32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Minimum milliseconds between two fires of this key in smart mode.
    #[serde(default = "default_min_interval")]
    pub min_interval: u32,

    #[serde(default = "default_max_interval")]
    pub max_interval: u32,

    /// Fixed period in classic mode, in milliseconds.
    #[serde(default = "default_interval")]
    pub interval: u32,
}

fn default_enabled() -> bool {
    true
}

fn default_weight() -> u32 {
    50
}

fn default_min_interval() -> u32 {
    50
}

fn default_max_interval() -> u32 {
    1000
}

fn default_interval() -> u32 {
    1000
}

impl Action {
    /// A keyboard action with the given smart-mode parameters.
    pub fn keyboard(code: u32, weight: u32, min_interval: u32, max_interval: u32) -> Self {
        Self {
            kind: InputKind::Keyboard,
            code,
            enabled: true,
            weight,
            min_interval,
            max_interval,
            interval: default_interval(),
        }
    }

    /// A keyboard action that only carries a classic interval.
    pub fn key_every(code: u32, interval: u32) -> Self {
        Self::keyboard(code, default_weight(), default_min_interval(), default_max_interval())
            .with_interval(interval)
    }

    pub fn mouse_left(interval: u32) -> Self {
        Self::mouse(InputKind::MouseLeft, interval)
    }

    pub fn mouse_right(interval: u32) -> Self {
        Self::mouse(InputKind::MouseRight, interval)
    }

    fn mouse(kind: InputKind, interval: u32) -> Self {
        Self {
            kind,
            code: 0,
            enabled: true,
            weight: default_weight(),
            min_interval: default_min_interval(),
            max_interval: default_max_interval(),
            interval,
        }
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check the invariants the profile editor enforces.
    pub fn validate(&self) -> Result<()> {
        if self.kind == InputKind::Keyboard && self.code == 0 {
            return Err(SksError::config_validation("keyboard actions need a key"));
        }
        if self.kind == InputKind::Keyboard && !is_valid_code(self.code) {
            return Err(SksError::config_validation(format!(
                "key code {} is outside the virtual-key range 1..={:#04X}",
                self.code, MAX_KEY_CODE
            )));
        }
        if !(1..=MAX_WEIGHT).contains(&self.weight) {
            return Err(SksError::config_validation(format!(
                "weight {} of {} must be between 1 and {}",
                self.weight,
                self.label(),
                MAX_WEIGHT
            )));
        }
        if self.min_interval >= self.max_interval {
            return Err(SksError::config_validation(format!(
                "min_interval ({}ms) of {} must be less than max_interval ({}ms)",
                self.min_interval,
                self.label(),
                self.max_interval
            )));
        }
        if self.interval == 0 {
            return Err(SksError::config_validation(format!(
                "interval of {} must be greater than zero",
                self.label()
            )));
        }
        Ok(())
    }

    /// Enabled, well-formed keyboard action: the only kind smart mode weighs.
    ///
    /// Malformed actions are skipped instead of failing the run.
    pub fn is_smart_candidate(&self) -> bool {
        self.enabled
            && self.kind == InputKind::Keyboard
            && is_valid_code(self.code)
            && (1..=MAX_WEIGHT).contains(&self.weight)
            && self.min_interval < self.max_interval
    }

    /// Enabled action that classic mode can put on a timer.
    pub fn is_classic_candidate(&self) -> bool {
        self.enabled
            && self.interval > 0
            && (self.kind != InputKind::Keyboard || is_valid_code(self.code))
    }

    /// Number of logical slots this action occupies in the weighted pool.
    pub fn pool_entries(&self) -> u64 {
        let weight = u64::from(self.weight);
        (weight * weight / u64::from(MAX_WEIGHT)).max(1)
    }

    /// Short human-readable description, e.g. `key 2` or `left click`.
    pub fn label(&self) -> String {
        match self.kind {
            InputKind::Keyboard => format!("key {}", key_name(self.code)),
            InputKind::MouseLeft => "left click".to_string(),
            InputKind::MouseRight => "right click".to_string(),
        }
    }
}

/// Named ordered collection of actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Whether a controller should agree to start this profile.
    pub fn is_runnable(&self) -> bool {
        self.enabled && !self.actions.is_empty()
    }

    /// Whether smart mode has anything to choose from.
    pub fn has_smart_candidates(&self) -> bool {
        self.actions.iter().any(Action::is_smart_candidate)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SksError::config_validation("profile name cannot be empty"));
        }
        for action in &self.actions {
            action.validate().map_err(|e| match e {
                SksError::ConfigValidation(message) => {
                    SksError::config_validation(format!("profile '{}': {}", self.name, message))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// The five class profiles shipped with a fresh configuration.
    pub fn builtin() -> Vec<Profile> {
        vec![
            Profile::new("Barbarian - Basic")
                .with_action(Action::key_every(0x32, 200))
                .with_action(Action::key_every(0x33, 300))
                .with_action(Action::key_every(0x34, 400)),
            Profile::new("Wizard - Combo")
                .with_action(Action::key_every(0x31, 150))
                .with_action(Action::key_every(0x32, 200))
                .with_action(Action::key_every(0x33, 250))
                .with_action(Action::key_every(0x34, 300))
                .with_action(Action::mouse_right(100)),
            Profile::new("Demon Hunter - Rapid")
                .with_action(Action::mouse_left(500))
                .with_action(Action::key_every(0x32, 1800))
                .with_action(Action::key_every(0x33, 2200))
                .with_action(Action::mouse_right(800)),
            Profile::new("Monk - Balanced")
                .with_action(Action::key_every(0x31, 1200))
                .with_action(Action::key_every(0x32, 1800))
                .with_action(Action::key_every(0x33, 2400))
                .with_action(Action::key_every(0x34, 3600)),
            Profile::new("Necromancer - Pet Build")
                .with_action(Action::key_every(0x31, 5000))
                .with_action(Action::key_every(0x32, 3000))
                .with_action(Action::key_every(0x33, 8000))
                .with_action(Action::mouse_right(1500)),
        ]
    }
}
