//! Command dispatch to the presentation host
//!
//! Dispatch is fire-and-forget: the controller never checks what a command
//! did to the host application. Failures are logged and the run continues.

use tracing::info;

use crate::command::{KeyChord, PresentationCommand};

/// Errors raised by a command sink
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Keystroke backend unavailable: {0}")]
    Unavailable(String),

    #[error("Key not supported by this backend: {0}")]
    UnsupportedKey(String),

    #[error("Failed to send {chord}: {message}")]
    SendFailed { chord: String, message: String },
}

/// Receiver of authorised commands
pub trait CommandSink {
    /// Short backend name for log output
    fn name(&self) -> &'static str;

    /// Deliver a command bound to `chord`
    fn dispatch(
        &mut self,
        command: PresentationCommand,
        chord: &KeyChord,
    ) -> Result<(), DispatchError>;
}

/// Sink that only logs commands
///
/// Used for dry runs and on machines without keystroke injection.
#[derive(Debug, Default)]
pub struct LogSink {
    dispatched: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

impl CommandSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn dispatch(
        &mut self,
        command: PresentationCommand,
        chord: &KeyChord,
    ) -> Result<(), DispatchError> {
        self.dispatched += 1;
        info!("{} [{}] (dry run)", command.description(), chord);
        Ok(())
    }
}

#[cfg(feature = "keystrokes")]
pub use keystrokes::KeystrokeSink;

#[cfg(feature = "keystrokes")]
mod keystrokes {
    use enigo::{Direction, Enigo, Key, Keyboard, Settings};

    use tracing::{debug, info};

    use super::{CommandSink, DispatchError};
    use crate::command::{KeyChord, KeyName, Modifier, PresentationCommand};

    /// Sink that presses the bound key chord via enigo
    pub struct KeystrokeSink {
        enigo: Enigo,
    }

    impl KeystrokeSink {
        pub fn new() -> Result<Self, DispatchError> {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| DispatchError::Unavailable(e.to_string()))?;
            Ok(Self { enigo })
        }

        fn press(&mut self, chord: &KeyChord) -> Result<(), DispatchError> {
            let key = map_key(chord.key)?;
            let modifiers: Vec<Key> = chord.modifiers.iter().map(|m| map_modifier(*m)).collect();
            let send_failed = |e: enigo::InputError| DispatchError::SendFailed {
                chord: chord.to_string(),
                message: e.to_string(),
            };

            for modifier in &modifiers {
                self.enigo
                    .key(*modifier, Direction::Press)
                    .map_err(send_failed)?;
            }

            let result = self.enigo.key(key, Direction::Click).map_err(send_failed);

            // Release modifiers even when the click failed
            for modifier in modifiers.iter().rev() {
                if let Err(e) = self.enigo.key(*modifier, Direction::Release) {
                    debug!("Failed to release {:?}: {}", modifier, e);
                }
            }

            result
        }
    }

    impl CommandSink for KeystrokeSink {
        fn name(&self) -> &'static str {
            "keystrokes"
        }

        fn dispatch(
            &mut self,
            command: PresentationCommand,
            chord: &KeyChord,
        ) -> Result<(), DispatchError> {
            self.press(chord)?;
            info!("{} [{}]", command.description(), chord);
            Ok(())
        }
    }

    fn map_modifier(modifier: Modifier) -> Key {
        match modifier {
            Modifier::Ctrl => Key::Control,
            Modifier::Shift => Key::Shift,
            Modifier::Alt => Key::Alt,
            Modifier::Meta => Key::Meta,
        }
    }

    fn map_key(key: KeyName) -> Result<Key, DispatchError> {
        let mapped = match key {
            KeyName::Space => Key::Space,
            KeyName::Left => Key::LeftArrow,
            KeyName::Right => Key::RightArrow,
            KeyName::Up => Key::UpArrow,
            KeyName::Down => Key::DownArrow,
            KeyName::Escape => Key::Escape,
            KeyName::Enter => Key::Return,
            KeyName::Tab => Key::Tab,
            KeyName::PageUp => Key::PageUp,
            KeyName::PageDown => Key::PageDown,
            KeyName::Home => Key::Home,
            KeyName::End => Key::End,
            KeyName::Plus => Key::Unicode('+'),
            KeyName::Minus => Key::Unicode('-'),
            KeyName::Char(c) => Key::Unicode(c),
            KeyName::F(n) => function_key(n)
                .ok_or_else(|| DispatchError::UnsupportedKey(format!("f{}", n)))?,
        };
        Ok(mapped)
    }

    fn function_key(n: u8) -> Option<Key> {
        const KEYS: [Key; 20] = [
            Key::F1,
            Key::F2,
            Key::F3,
            Key::F4,
            Key::F5,
            Key::F6,
            Key::F7,
            Key::F8,
            Key::F9,
            Key::F10,
            Key::F11,
            Key::F12,
            Key::F13,
            Key::F14,
            Key::F15,
            Key::F16,
            Key::F17,
            Key::F18,
            Key::F19,
            Key::F20,
        ];
        KEYS.get(usize::from(n).checked_sub(1)?).copied()
    }
}
