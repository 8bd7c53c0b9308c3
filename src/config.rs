//! JSON configuration: profiles plus application settings.
//!
//! Durations are written human-style (`"50ms"`, `"2s"`, `"1m"`) and a bare
//! number means milliseconds.

use crate::error::{Result, SksError};
use crate::profile::Profile;
use crate::scheduler::{SchedulerOptions, SimulationMode, DEFAULT_TICK_PERIOD};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Profile::builtin")]
    pub profiles: Vec<Profile>,

    #[serde(default = "default_start_hotkey")]
    pub start_hotkey: String,

    #[serde(default = "default_stop_hotkey")]
    pub stop_hotkey: String,

    /// Index into `profiles` used when no profile is named explicitly.
    #[serde(default)]
    pub current_profile: usize,

    #[serde(default = "default_tick_period", with = "duration_str")]
    pub tick_period: Duration,

    #[serde(default)]
    pub mode: SimulationMode,
}

fn default_start_hotkey() -> String {
    "F5".to_string()
}

fn default_stop_hotkey() -> String {
    "F6".to_string()
}

fn default_tick_period() -> Duration {
    DEFAULT_TICK_PERIOD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profiles: Profile::builtin(),
            start_hotkey: default_start_hotkey(),
            stop_hotkey: default_stop_hotkey(),
            current_profile: 0,
            tick_period: default_tick_period(),
            mode: SimulationMode::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| SksError::config_load(path, e.to_string()))?;
        let mut config: Config =
            serde_json::from_str(&content).map_err(|e| SksError::config_load(path, e.to_string()))?;
        config.normalize();
        info!(path, profiles = config.profiles.len(), "Configuration loaded");
        Ok(config)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| SksError::config_save(path, e.to_string()))?;
        info!(path, "Configuration saved");
        Ok(())
    }

    /// Repair what a hand-edited file can get wrong without being invalid:
    /// no profiles at all, or a current index past the end.
    pub fn normalize(&mut self) {
        if self.profiles.is_empty() {
            debug!("No profiles configured, falling back to built-in set");
            self.profiles = Profile::builtin();
        }
        if self.current_profile >= self.profiles.len() {
            self.current_profile = 0;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.profiles.is_empty() {
            return Err(SksError::config_validation("at least one profile is required"));
        }
        for profile in &self.profiles {
            profile.validate()?;
        }
        if self.tick_period.is_zero() {
            return Err(SksError::config_validation("tick_period must be greater than zero"));
        }
        if self.start_hotkey.trim().is_empty() || self.stop_hotkey.trim().is_empty() {
            return Err(SksError::config_validation("hotkeys cannot be empty"));
        }
        if self.start_hotkey.eq_ignore_ascii_case(&self.stop_hotkey) {
            return Err(SksError::config_validation("start and stop hotkeys must differ"));
        }
        Ok(())
    }

    /// Find a profile by index or by case-insensitive name.
    pub fn profile(&self, selector: &str) -> Result<&Profile> {
        if let Ok(index) = selector.trim().parse::<usize>() {
            if let Some(profile) = self.profiles.get(index) {
                return Ok(profile);
            }
        }
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(selector.trim()))
            .ok_or_else(|| SksError::profile_not_found(selector))
    }

    pub fn current(&self) -> Option<&Profile> {
        self.profiles.get(self.current_profile)
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            tick_period: self.tick_period,
            mode: self.mode,
        }
    }
}

/// Parse `"500ms"`, `"2s"`, `"1m"` or a bare millisecond count.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let s = value.trim().to_lowercase();
    if s.is_empty() {
        return Err(SksError::invalid_duration(value, "empty duration"));
    }

    let (number, unit_ms) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else {
        (s.as_str(), 1)
    };

    let amount: u64 = number
        .trim()
        .parse()
        .map_err(|_| SksError::invalid_duration(value, "expected a non-negative whole number"))?;

    amount
        .checked_mul(unit_ms)
        .map(Duration::from_millis)
        .ok_or_else(|| SksError::invalid_duration(value, "duration too large"))
}

/// [`parse_duration`] for a tick period, which must not be zero.
pub fn parse_tick_period(value: &str) -> Result<Duration> {
    let period = parse_duration(value)?;
    if period.is_zero() {
        return Err(SksError::config_validation(format!(
            "tick period '{}' must be greater than zero",
            value.trim()
        )));
    }
    Ok(period)
}

/// Inverse of [`parse_duration`] using the largest exact unit.
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms != 0 && ms % 60_000 == 0 {
        format!("{}m", ms / 60_000)
    } else if ms != 0 && ms % 1_000 == 0 {
        format!("{}s", ms / 1_000)
    } else {
        format!("{}ms", ms)
    }
}

mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DurationRepr {
        Millis(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match DurationRepr::deserialize(deserializer)? {
            DurationRepr::Millis(ms) => Ok(Duration::from_millis(ms)),
            DurationRepr::Text(text) => {
                super::parse_duration(&text).map_err(serde::de::Error::custom)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Action;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("50ms").unwrap(), Duration::from_millis(50));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("1M").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration(" 750 ").unwrap(), Duration::from_millis(750));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-5ms").is_err());
        assert!(parse_duration("10h").is_err());
    }

    #[test]
    fn test_tick_period_rejects_zero() {
        assert_eq!(parse_tick_period("20ms").unwrap(), Duration::from_millis(20));
        assert!(matches!(
            parse_tick_period("0ms"),
            Err(SksError::ConfigValidation(_))
        ));
        assert!(parse_tick_period("0").is_err());
        assert!(matches!(
            parse_tick_period("soon"),
            Err(SksError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
        assert_eq!(format_duration(Duration::from_millis(2_000)), "2s");
        assert_eq!(format_duration(Duration::from_secs(120)), "2m");
        assert_eq!(format_duration(Duration::ZERO), "0ms");
    }

    #[test]
    fn test_defaults_from_minimal_json() {
        let mut config: Config = serde_json::from_str("{}").unwrap();
        config.normalize();
        assert_eq!(config.profiles.len(), 5);
        assert_eq!(config.start_hotkey, "F5");
        assert_eq!(config.stop_hotkey, "F6");
        assert_eq!(config.tick_period, Duration::from_millis(50));
        assert_eq!(config.mode, SimulationMode::Smart);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_normalize_repairs_bad_index_and_empty_profiles() {
        let mut config: Config =
            serde_json::from_str(r#"{ "profiles": [], "current_profile": 9 }"#).unwrap();
        config.normalize();
        assert_eq!(config.profiles.len(), 5);
        assert_eq!(config.current_profile, 0);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.stop_hotkey = "f5".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tick_period = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.profiles[0]
            .actions
            .push(Action::keyboard(0x31, 50, 900, 100));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Barbarian"));
    }

    #[test]
    fn test_profile_lookup() {
        let config = Config::default();
        assert_eq!(config.profile("1").unwrap().name, "Wizard - Combo");
        assert_eq!(config.profile("monk - balanced").unwrap().name, "Monk - Balanced");
        assert!(matches!(
            config.profile("Paladin"),
            Err(SksError::ProfileNotFound(_))
        ));
        assert_eq!(config.current().unwrap().name, "Barbarian - Basic");
    }
}
