//! Input injection: the boundary between the scheduler and the OS.
//!
//! The scheduler only knows the [`Actuator`] trait. [`DryRunActuator`] logs
//! instead of pressing, [`RecordingActuator`] keeps what it was asked to do,
//! and [`SendInputActuator`] talks to Win32 `SendInput`.

use crate::error::Result;
use crate::keys::key_name;
use crate::profile::{Action, InputKind};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// OS-level input injection. Each call is a full press-then-release pair.
pub trait Actuator: Send + Sync {
    fn press_key(&self, code: u32) -> Result<()>;
    fn click_mouse(&self, button: MouseButton) -> Result<()>;
}

impl<A: Actuator + ?Sized> Actuator for Arc<A> {
    fn press_key(&self, code: u32) -> Result<()> {
        (**self).press_key(code)
    }

    fn click_mouse(&self, button: MouseButton) -> Result<()> {
        (**self).click_mouse(button)
    }
}

/// Deliver one action through `actuator`.
pub fn perform<A: Actuator + ?Sized>(actuator: &A, action: &Action) -> Result<()> {
    match action.kind {
        InputKind::Keyboard => actuator.press_key(action.code),
        InputKind::MouseLeft => actuator.click_mouse(MouseButton::Left),
        InputKind::MouseRight => actuator.click_mouse(MouseButton::Right),
    }
}

/// Logs every input instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunActuator;

impl Actuator for DryRunActuator {
    fn press_key(&self, code: u32) -> Result<()> {
        info!(key = %key_name(code), "dry-run key press");
        Ok(())
    }

    fn click_mouse(&self, button: MouseButton) -> Result<()> {
        info!(?button, "dry-run mouse click");
        Ok(())
    }
}

/// What a [`RecordingActuator`] was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    Key(u32),
    Click(MouseButton),
}

/// Collects actuations in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    log: Arc<Mutex<Vec<Actuation>>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actuations(&self) -> Vec<Actuation> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, actuation: Actuation) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(actuation);
    }
}

impl Actuator for RecordingActuator {
    fn press_key(&self, code: u32) -> Result<()> {
        self.push(Actuation::Key(code));
        Ok(())
    }

    fn click_mouse(&self, button: MouseButton) -> Result<()> {
        self.push(Actuation::Click(button));
        Ok(())
    }
}

#[cfg(windows)]
pub use self::windows::SendInputActuator;

#[cfg(windows)]
mod windows {
    use super::{Actuator, MouseButton};
    use crate::error::{Result, SksError};
    use crate::keys::{is_valid_code, key_name};
    use std::mem;
    use winapi::um::winuser::{
        SendInput, INPUT, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYEVENTF_KEYUP,
        MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP,
        MOUSEINPUT,
    };

    /// Injects input system-wide through `SendInput`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SendInputActuator;

    fn key_input(code: u32, key_up: bool) -> INPUT {
        unsafe {
            let mut input: INPUT = mem::zeroed();
            input.type_ = INPUT_KEYBOARD;
            *input.u.ki_mut() = KEYBDINPUT {
                wVk: code as u16,
                wScan: 0,
                dwFlags: if key_up { KEYEVENTF_KEYUP } else { 0 },
                time: 0,
                dwExtraInfo: 0,
            };
            input
        }
    }

    fn mouse_input(flags: u32) -> INPUT {
        unsafe {
            let mut input: INPUT = mem::zeroed();
            input.type_ = INPUT_MOUSE;
            *input.u.mi_mut() = MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            };
            input
        }
    }

    fn send(inputs: &mut [INPUT], what: impl FnOnce() -> String) -> Result<()> {
        let sent = unsafe {
            SendInput(
                inputs.len() as u32,
                inputs.as_mut_ptr(),
                mem::size_of::<INPUT>() as i32,
            )
        };
        if sent as usize != inputs.len() {
            return Err(SksError::actuation_failed(
                what(),
                format!("SendInput accepted {} of {} events", sent, inputs.len()),
            ));
        }
        Ok(())
    }

    impl Actuator for SendInputActuator {
        fn press_key(&self, code: u32) -> Result<()> {
            if !is_valid_code(code) {
                return Err(SksError::actuation_failed(
                    format!("key code {}", code),
                    "not a virtual-key code",
                ));
            }
            let mut inputs = [key_input(code, false), key_input(code, true)];
            send(&mut inputs, || format!("key '{}'", key_name(code)))
        }

        fn click_mouse(&self, button: MouseButton) -> Result<()> {
            let (down, up) = match button {
                MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
                MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
            };
            let mut inputs = [mouse_input(down), mouse_input(up)];
            send(&mut inputs, || format!("{:?} click", button).to_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perform_dispatches_by_kind() {
        let actuator = RecordingActuator::new();
        perform(&actuator, &Action::keyboard(0x31, 50, 50, 1000)).unwrap();
        perform(&actuator, &Action::mouse_left(500)).unwrap();
        perform(&actuator, &Action::mouse_right(500)).unwrap();
        assert_eq!(
            actuator.actuations(),
            vec![
                Actuation::Key(0x31),
                Actuation::Click(MouseButton::Left),
                Actuation::Click(MouseButton::Right),
            ]
        );
    }

    #[test]
    fn test_recording_clones_share_log() {
        let actuator = RecordingActuator::new();
        let clone = actuator.clone();
        clone.press_key(0x41).unwrap();
        assert_eq!(actuator.len(), 1);
        assert!(!actuator.is_empty());
    }

    #[test]
    fn test_dry_run_never_fails() {
        assert!(DryRunActuator.press_key(0x20).is_ok());
        assert!(DryRunActuator.click_mouse(MouseButton::Right).is_ok());
    }
}
