//! Keyboard input vocabulary
//!
//! Hosts translate their native key events into [`KeyEvent`]s. The textual
//! form accepted by [`KeyEvent::from_str`] (`"w"`, `"shift+space"`,
//! `"ctrl+alt+3:release"`) is what the CLI uses to script input.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use thiserror::Error;

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum KeyCode {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    /// Space bar
    Space,
    /// Enter / Return
    Enter,
    /// Escape
    Escape,
    Up,
    Down,
    Left,
    Right,
}

impl KeyCode {
    const LETTERS: [Self; 26] = [
        Self::A, Self::B, Self::C, Self::D, Self::E, Self::F, Self::G, Self::H, Self::I,
        Self::J, Self::K, Self::L, Self::M, Self::N, Self::O, Self::P, Self::Q, Self::R,
        Self::S, Self::T, Self::U, Self::V, Self::W, Self::X, Self::Y, Self::Z,
    ];

    const DIGITS: [Self; 10] = [
        Self::Num0, Self::Num1, Self::Num2, Self::Num3, Self::Num4,
        Self::Num5, Self::Num6, Self::Num7, Self::Num8, Self::Num9,
    ];

    /// Key for a letter or digit character, case-insensitive
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() {
            Some(Self::LETTERS[(c as u8 - b'a') as usize])
        } else if c.is_ascii_digit() {
            Some(Self::DIGITS[(c as u8 - b'0') as usize])
        } else if c == ' ' {
            Some(Self::Space)
        } else {
            None
        }
    }

    /// Key by name: a single character, or `space`, `enter`, `escape`/`esc`,
    /// `up`, `down`, `left`, `right`
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Self::from_char(c);
        }
        match name.to_ascii_lowercase().as_str() {
            "space" => Some(Self::Space),
            "enter" | "return" => Some(Self::Enter),
            "escape" | "esc" => Some(Self::Escape),
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(i) = Self::LETTERS.iter().position(|k| k == self) {
            return write!(f, "{}", char::from(b'a' + i as u8));
        }
        if let Some(i) = Self::DIGITS.iter().position(|k| k == self) {
            return write!(f, "{i}");
        }
        let name = match self {
            Self::Space => "space",
            Self::Enter => "enter",
            Self::Escape => "escape",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            _ => "right",
        };
        f.write_str(name)
    }
}

/// What happened to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyAction {
    /// Key went down
    #[default]
    Press,
    /// Key is held and auto-repeating
    Repeat,
    /// Key went up
    Release,
}

impl KeyAction {
    /// Press or repeat
    #[must_use]
    pub const fn is_down(self) -> bool {
        matches!(self, Self::Press | Self::Repeat)
    }
}

bitflags! {
    /// Modifier keys held during a key event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Either shift key
        const SHIFT = 1 << 0;
        /// Either control key
        const CONTROL = 1 << 1;
        /// Either alt key
        const ALT = 1 << 2;
    }
}

/// A key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// Key
    pub key: KeyCode,
    /// Action
    pub action: KeyAction,
    /// Held modifiers
    pub mods: Modifiers,
}

impl KeyEvent {
    /// Press of `key` without modifiers
    #[must_use]
    pub const fn press(key: KeyCode) -> Self {
        Self {
            key,
            action: KeyAction::Press,
            mods: Modifiers::empty(),
        }
    }

    /// Same event with `mods` held
    #[must_use]
    pub const fn with_mods(mut self, mods: Modifiers) -> Self {
        self.mods = mods;
        self
    }
}

/// Malformed key event text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    /// Unknown key name
    #[error("Unknown key '{0}'")]
    UnknownKey(String),
    /// Unknown modifier name
    #[error("Unknown modifier '{0}'")]
    UnknownModifier(String),
    /// Unknown action name
    #[error("Unknown key action '{0}'")]
    UnknownAction(String),
}

impl FromStr for KeyEvent {
    type Err = KeyParseError;

    /// `[mod+]...key[:press|repeat|release]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (combo, action) = match s.rsplit_once(':') {
            Some((combo, action)) => (combo, Some(action)),
            None => (s, None),
        };
        let action = match action.map(str::to_ascii_lowercase).as_deref() {
            None | Some("press") => KeyAction::Press,
            Some("repeat") => KeyAction::Repeat,
            Some("release") => KeyAction::Release,
            Some(other) => return Err(KeyParseError::UnknownAction(other.to_string())),
        };

        let mut parts: Vec<&str> = combo.split('+').collect();
        let key_name = parts.pop().unwrap_or_default();
        let key = KeyCode::from_name(key_name).ok_or_else(|| KeyParseError::UnknownKey(key_name.to_string()))?;

        let mut mods = Modifiers::empty();
        for part in parts {
            mods |= match part.to_ascii_lowercase().as_str() {
                "shift" => Modifiers::SHIFT,
                "ctrl" | "control" => Modifiers::CONTROL,
                "alt" => Modifiers::ALT,
                _ => return Err(KeyParseError::UnknownModifier(part.to_string())),
            };
        }

        Ok(Self { key, action, mods })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(KeyCode::from_name("W"), Some(KeyCode::W));
        assert_eq!(KeyCode::from_name("7"), Some(KeyCode::Num7));
        assert_eq!(KeyCode::from_name("esc"), Some(KeyCode::Escape));
        assert_eq!(KeyCode::from_name("Space"), Some(KeyCode::Space));
        assert_eq!(KeyCode::from_name("tab"), None);
        assert_eq!(KeyCode::Q.to_string(), "q");
        assert_eq!(KeyCode::Num3.to_string(), "3");
    }

    #[test]
    fn test_parse_key_events() {
        assert_eq!("a".parse(), Ok(KeyEvent::press(KeyCode::A)));
        assert_eq!(
            "shift+j".parse(),
            Ok(KeyEvent::press(KeyCode::J).with_mods(Modifiers::SHIFT))
        );
        let event: KeyEvent = "ctrl+alt+space:release".parse().unwrap();
        assert_eq!(event.key, KeyCode::Space);
        assert_eq!(event.action, KeyAction::Release);
        assert_eq!(event.mods, Modifiers::CONTROL | Modifiers::ALT);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "hyper+a".parse::<KeyEvent>(),
            Err(KeyParseError::UnknownModifier("hyper".to_string()))
        );
        assert!(matches!("a:hold".parse::<KeyEvent>(), Err(KeyParseError::UnknownAction(_))));
        assert!(matches!("shift+".parse::<KeyEvent>(), Err(KeyParseError::UnknownKey(_))));
    }
}
