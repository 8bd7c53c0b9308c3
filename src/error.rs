//! Error type shared by the library.
//!
//! The binary wraps these in `anyhow` for context; inside the crate every
//! fallible operation returns [`Result`].

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SksError {
    /// A key name or code that does not map to a virtual key.
    #[error("unknown key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// A profile, action or setting that breaks a configuration rule.
    #[error("invalid configuration: {0}")]
    ConfigValidation(String),

    #[error("cannot read config '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    #[error("cannot write config '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    #[error("bad duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// No profile matched the requested name or index.
    #[error("no profile named '{0}'")]
    ProfileNotFound(String),

    /// Input injection is not available on this OS.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("hotkey: {0}")]
    Hotkey(String),

    /// The OS refused an injected key press or mouse click.
    #[error("failed to send {input}: {reason}")]
    ActuationFailed { input: String, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SksError>;

impl SksError {
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// `selector` is whatever the user typed: a name or an index.
    pub fn profile_not_found(selector: impl Into<String>) -> Self {
        Self::ProfileNotFound(selector.into())
    }

    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform(message.into())
    }

    pub fn hotkey(message: impl Into<String>) -> Self {
        Self::Hotkey(message.into())
    }

    /// `input` describes what was being sent, e.g. `key '2'` or `left click`.
    pub fn actuation_failed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActuationFailed {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
