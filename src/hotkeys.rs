use crate::error::{Result, SksError};
use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// What a registered hotkey asks the scheduler to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyCommand {
    Start,
    Stop,
}

/// Which hotkeys are registered and what they trigger. Each command and
/// each key combination can be bound once.
#[derive(Debug, Clone, Default)]
struct Bindings(Vec<(HotKey, HotkeyCommand)>);

impl Bindings {
    fn is_registered(&self, command: HotkeyCommand) -> bool {
        self.0.iter().any(|(_, bound)| *bound == command)
    }

    fn ensure_free(&self, hotkey_str: &str, hotkey: &HotKey, command: HotkeyCommand) -> Result<()> {
        if self.is_registered(command) {
            return Err(SksError::hotkey(format!("{:?} is already bound", command)));
        }
        if let Some((_, other)) = self.0.iter().find(|(bound, _)| bound.id() == hotkey.id()) {
            return Err(SksError::hotkey(format!(
                "'{}' is already bound to {:?}",
                hotkey_str, other
            )));
        }
        Ok(())
    }

    fn insert(&mut self, hotkey: HotKey, command: HotkeyCommand) {
        self.0.push((hotkey, command));
    }

    fn command_for(&self, id: u32) -> Option<HotkeyCommand> {
        self.0
            .iter()
            .find(|(hotkey, _)| hotkey.id() == id)
            .map(|(_, command)| *command)
    }
}

/// Owns the OS hotkey registrations; they are released on drop.
pub struct HotkeyManager {
    manager: GlobalHotKeyManager,
    bindings: Bindings,
}

impl HotkeyManager {
    pub fn new() -> Result<Self> {
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| SksError::hotkey(format!("cannot create hotkey manager: {}", e)))?;

        Ok(Self {
            manager,
            bindings: Bindings::default(),
        })
    }

    /// Bind `hotkey_str` to `command`. Fails if either is already bound.
    pub fn register(&mut self, hotkey_str: &str, command: HotkeyCommand) -> Result<()> {
        let hotkey = parse_hotkey(hotkey_str)?;
        self.bindings.ensure_free(hotkey_str, &hotkey, command)?;

        self.manager
            .register(hotkey)
            .map_err(|e| SksError::hotkey(format!("cannot register '{}': {}", hotkey_str, e)))?;

        info!(hotkey = hotkey_str, ?command, "Global hotkey registered");
        self.bindings.insert(hotkey, command);
        Ok(())
    }

    pub fn unregister_all(&mut self) {
        for (hotkey, _) in self.bindings.0.drain(..) {
            if let Err(e) = self.manager.unregister(hotkey) {
                warn!("Failed to unregister hotkey: {}", e);
            }
        }
    }

    /// Forward hotkey presses as commands until the receiver is dropped.
    pub fn listen(&self) -> mpsc::UnboundedReceiver<HotkeyCommand> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let bindings = self.bindings.clone();
        let events = GlobalHotKeyEvent::receiver();

        tokio::task::spawn_blocking(move || {
            while !sender.is_closed() {
                if let Ok(event) = events.try_recv() {
                    if event.state == HotKeyState::Pressed {
                        if let Some(command) = bindings.command_for(event.id) {
                            if sender.send(command).is_err() {
                                break;
                            }
                        }
                    }
                }

                // polled until the command receiver is dropped
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
        });

        receiver
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        self.unregister_all();
    }
}

/// Parse strings like `"F5"`, `"ctrl+alt+r"` or `"shift+2"`.
pub fn parse_hotkey(hotkey_str: &str) -> Result<HotKey> {
    let normalized = hotkey_str
        .split('+')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("+");

    if normalized.is_empty() {
        return Err(SksError::hotkey("empty hotkey string"));
    }

    normalized
        .parse::<HotKey>()
        .map_err(|e| SksError::hotkey(format!("unsupported hotkey '{}': {}", hotkey_str, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use global_hotkey::hotkey::{Code, Modifiers};

    #[test]
    fn test_parse_function_key() {
        let hotkey = parse_hotkey("F5").unwrap();
        assert_eq!(hotkey, HotKey::new(None, Code::F5));
    }

    #[test]
    fn test_parse_with_modifiers() {
        let hotkey = parse_hotkey("ctrl + alt + r").unwrap();
        assert_eq!(
            hotkey,
            HotKey::new(Some(Modifiers::CONTROL | Modifiers::ALT), Code::KeyR)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_hotkey(""), Err(SksError::Hotkey(_))));
        assert!(parse_hotkey(" + ").is_err());
        assert!(matches!(parse_hotkey("ctrl+notakey"), Err(SksError::Hotkey(_))));
    }

    #[test]
    fn test_bindings_refuse_double_registration() {
        let f5 = parse_hotkey("F5").unwrap();
        let f6 = parse_hotkey("F6").unwrap();
        let mut bindings = Bindings::default();

        assert!(!bindings.is_registered(HotkeyCommand::Start));
        bindings.ensure_free("F5", &f5, HotkeyCommand::Start).unwrap();
        bindings.insert(f5, HotkeyCommand::Start);
        assert!(bindings.is_registered(HotkeyCommand::Start));

        // same command twice
        let err = bindings.ensure_free("F6", &f6, HotkeyCommand::Start).unwrap_err();
        assert!(err.to_string().contains("already bound"));
        // same key for a different command
        assert!(bindings.ensure_free("f5", &f5, HotkeyCommand::Stop).is_err());

        bindings.ensure_free("F6", &f6, HotkeyCommand::Stop).unwrap();
        bindings.insert(f6, HotkeyCommand::Stop);
        assert_eq!(bindings.command_for(f5.id()), Some(HotkeyCommand::Start));
        assert_eq!(bindings.command_for(f6.id()), Some(HotkeyCommand::Stop));
        assert_eq!(bindings.command_for(u32::MAX), None);
    }
}
