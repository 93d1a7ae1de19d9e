//! Presentation commands and the key chords that trigger them
//!
//! The gesture-to-command mapping is fixed; which keys a command presses in
//! the host application is configurable through [`KeyChord`] strings such as
//! `"space"` or `"ctrl+plus"`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gesture::GestureLabel;

/// A command understood by the presentation host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationCommand {
    PlayPause,
    Stop,
    Next,
    Previous,
    ZoomIn,
    TogglePointer,
}

impl PresentationCommand {
    pub const ALL: [PresentationCommand; 6] = [
        PresentationCommand::PlayPause,
        PresentationCommand::Stop,
        PresentationCommand::Next,
        PresentationCommand::Previous,
        PresentationCommand::ZoomIn,
        PresentationCommand::TogglePointer,
    ];

    /// Command bound to a gesture, if any
    pub fn for_gesture(label: GestureLabel) -> Option<Self> {
        match label {
            GestureLabel::OpenPalm => Some(Self::PlayPause),
            GestureLabel::ClosedFist => Some(Self::Stop),
            GestureLabel::PointingUp | GestureLabel::SwipeRight => Some(Self::Next),
            GestureLabel::PointingDown | GestureLabel::SwipeLeft => Some(Self::Previous),
            GestureLabel::ThumbsUp => Some(Self::ZoomIn),
            GestureLabel::PeaceSign => Some(Self::TogglePointer),
            GestureLabel::None | GestureLabel::PinkyUp => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayPause => "play_pause",
            Self::Stop => "stop",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::ZoomIn => "zoom_in",
            Self::TogglePointer => "toggle_pointer",
        }
    }

    /// Human-readable description for log output
    pub fn description(&self) -> &'static str {
        match self {
            Self::PlayPause => "Play/Pause",
            Self::Stop => "Stop presentation",
            Self::Next => "Next slide",
            Self::Previous => "Previous slide",
            Self::ZoomIn => "Zoom in",
            Self::TogglePointer => "Toggle pointer",
        }
    }
}

impl fmt::Display for PresentationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modifier held for the duration of a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Meta,
}

/// The non-modifier key of a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyName {
    Space,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Enter,
    Tab,
    PageUp,
    PageDown,
    Home,
    End,
    Plus,
    Minus,
    /// Function key F1..F24
    F(u8),
    /// Any other single printable character
    Char(char),
}

/// Errors from parsing a key chord string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyChordError {
    #[error("Empty key chord")]
    Empty,

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Key chord has no main key: {0}")]
    MissingKey(String),

    #[error("Key chord has more than one main key: {0}")]
    MultipleKeys(String),
}

/// Modifiers plus one key, e.g. `ctrl+plus`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub modifiers: Vec<Modifier>,
    pub key: KeyName,
}

impl KeyChord {
    /// Parse a `+`-separated chord, case-insensitive
    ///
    /// `"+"` on its own means the plus key, so `"ctrl++"` is also accepted.
    pub fn parse(s: &str) -> Result<Self, KeyChordError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(KeyChordError::Empty);
        }
        if trimmed == "+" {
            return Ok(Self {
                modifiers: Vec::new(),
                key: KeyName::Plus,
            });
        }

        let normalised = trimmed.replace("++", "+plus");
        let mut modifiers = Vec::new();
        let mut key = None;

        for part in normalised.split('+') {
            let token = part.trim().to_lowercase();
            if token.is_empty() {
                return Err(KeyChordError::MissingKey(trimmed.to_string()));
            }

            if let Some(modifier) = parse_modifier(&token) {
                if !modifiers.contains(&modifier) {
                    modifiers.push(modifier);
                }
                continue;
            }

            let parsed =
                parse_key(&token).ok_or_else(|| KeyChordError::UnknownKey(token.clone()))?;
            if key.replace(parsed).is_some() {
                return Err(KeyChordError::MultipleKeys(trimmed.to_string()));
            }
        }

        let key = key.ok_or_else(|| KeyChordError::MissingKey(trimmed.to_string()))?;
        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            let name = match modifier {
                Modifier::Ctrl => "ctrl",
                Modifier::Shift => "shift",
                Modifier::Alt => "alt",
                Modifier::Meta => "meta",
            };
            write!(f, "{}+", name)?;
        }
        match self.key {
            KeyName::Space => f.write_str("space"),
            KeyName::Left => f.write_str("left"),
            KeyName::Right => f.write_str("right"),
            KeyName::Up => f.write_str("up"),
            KeyName::Down => f.write_str("down"),
            KeyName::Escape => f.write_str("escape"),
            KeyName::Enter => f.write_str("enter"),
            KeyName::Tab => f.write_str("tab"),
            KeyName::PageUp => f.write_str("pageup"),
            KeyName::PageDown => f.write_str("pagedown"),
            KeyName::Home => f.write_str("home"),
            KeyName::End => f.write_str("end"),
            KeyName::Plus => f.write_str("plus"),
            KeyName::Minus => f.write_str("minus"),
            KeyName::F(n) => write!(f, "f{}", n),
            KeyName::Char(c) => write!(f, "{}", c),
        }
    }
}

fn parse_modifier(token: &str) -> Option<Modifier> {
    match token {
        "ctrl" | "control" => Some(Modifier::Ctrl),
        "shift" => Some(Modifier::Shift),
        "alt" | "option" => Some(Modifier::Alt),
        "meta" | "cmd" | "command" | "super" | "win" => Some(Modifier::Meta),
        _ => None,
    }
}

fn parse_key(token: &str) -> Option<KeyName> {
    let key = match token {
        "space" => KeyName::Space,
        "left" => KeyName::Left,
        "right" => KeyName::Right,
        "up" => KeyName::Up,
        "down" => KeyName::Down,
        "escape" | "esc" => KeyName::Escape,
        "enter" | "return" => KeyName::Enter,
        "tab" => KeyName::Tab,
        "pageup" => KeyName::PageUp,
        "pagedown" => KeyName::PageDown,
        "home" => KeyName::Home,
        "end" => KeyName::End,
        "plus" => KeyName::Plus,
        "minus" | "-" => KeyName::Minus,
        _ => {
            if let Some(n) = token.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                if (1..=24).contains(&n) {
                    return Some(KeyName::F(n));
                }
                return None;
            }
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !c.is_whitespace() => KeyName::Char(c),
                _ => return None,
            }
        }
    };
    Some(key)
}
