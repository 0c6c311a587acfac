// keys/src/event.rs
//
// Key events and key sequences in the engine's text form.
//
// A key event is written as modifiers and a key name joined by `+`, e.g.
// `Control+Shift+Return` or `Release+a`. A key sequence is plain printable
// text, one key per character, with any other key written in braces:
// `ni{space}`, `{Control+a}{BackSpace}`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::KeyError;
use crate::keycode::{self, keycode_for_char, lookup_keycode};
use crate::modifier::{lookup_modifier, KeyModifier, KeyModifiers};

/// One key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub keycode: i32,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    pub fn new(keycode: i32, modifiers: KeyModifiers) -> Self {
        Self { keycode, modifiers }
    }

    /// A key with no modifiers.
    pub fn plain(keycode: i32) -> Self {
        Self::new(keycode, KeyModifiers::NONE)
    }

    pub fn is_release(&self) -> bool {
        self.modifiers.contains(KeyModifier::Release)
    }

    /// Parse `Modifier+...+KeyName`. A trailing `+` names the plus key, so
    /// `Control++` is Control with `+`.
    pub fn parse(repr: &str) -> Result<Self, KeyError> {
        if repr.is_empty() {
            return Err(KeyError::Empty);
        }
        let (prefix, key_name) = match repr.strip_suffix("++") {
            Some(rest) => (Some(rest), "+"),
            None if repr == "+" => (None, "+"),
            None => match repr.rsplit_once('+') {
                Some((mods, key)) => (Some(mods), key),
                None => (None, repr),
            },
        };

        let mut modifiers = KeyModifiers::NONE;
        for name in prefix.into_iter().flat_map(|p| p.split('+')) {
            match lookup_modifier(name) {
                Some(modifier) => modifiers.insert(modifier),
                None => return Err(KeyError::UnknownModifier(name.to_string())),
            }
        }
        if key_name.is_empty() {
            return Err(KeyError::Empty);
        }
        let keycode =
            lookup_keycode(key_name).ok_or_else(|| KeyError::UnknownKey(key_name.to_string()))?;
        Ok(Self::new(keycode, modifiers))
    }

    /// The character this event is written as in a sequence, if it needs no braces.
    fn bare_char(&self) -> Option<char> {
        if !self.modifiers.is_empty() {
            return None;
        }
        let c = u32::try_from(self.keycode).ok().and_then(char::from_u32)?;
        match c {
            '{' | '}' | ' ' => None,
            c if c.is_ascii_graphic() => Some(c),
            _ => None,
        }
    }
}

impl FromStr for KeyEvent {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.modifiers.is_empty() {
            write!(f, "{}+", self.modifiers)?;
        }
        match keycode::keycode_name(self.keycode) {
            Some(name) => f.write_str(&name),
            None => write!(f, "0x{:x}", self.keycode),
        }
    }
}

// `{...}` is one named key; anything else is one character.
static SEQUENCE_TOKEN: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"(?s)\{([^{}]+)\}|(.)"));

/// An ordered list of key events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySequence(Vec<KeyEvent>);

impl KeySequence {
    pub fn parse(text: &str) -> Result<Self, KeyError> {
        if text.contains('\0') {
            return Err(KeyError::InteriorNul);
        }
        let token = SEQUENCE_TOKEN
            .as_ref()
            .map_err(|e| KeyError::Pattern(e.to_string()))?;
        let mut events = Vec::new();
        for caps in token.captures_iter(text) {
            if let Some(name) = caps.get(1) {
                events.push(KeyEvent::parse(name.as_str())?);
            } else if let Some(c) = caps.get(2).and_then(|m| m.as_str().chars().next()) {
                let keycode = keycode_for_char(c).ok_or(KeyError::UnsupportedChar(c))?;
                events.push(KeyEvent::plain(keycode));
            }
        }
        Ok(Self(events))
    }

    pub fn events(&self) -> &[KeyEvent] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KeyEvent> {
        self.0.iter()
    }
}

impl From<Vec<KeyEvent>> for KeySequence {
    fn from(events: Vec<KeyEvent>) -> Self {
        Self(events)
    }
}

impl<'a> IntoIterator for &'a KeySequence {
    type Item = &'a KeyEvent;
    type IntoIter = std::slice::Iter<'a, KeyEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromStr for KeySequence {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The text form the engine's key-sequence simulator accepts.
impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.0 {
            match event.bare_char() {
                Some(c) => write!(f, "{c}")?,
                None => write!(f, "{{{event}}}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_event() {
        let event = KeyEvent::parse("Control+Shift+Return").unwrap();
        assert_eq!(event.keycode, 0xff0d);
        assert_eq!(event.modifiers, KeyModifier::Control | KeyModifier::Shift);
        assert_eq!(event.to_string(), "Shift+Control+Return");

        let release = KeyEvent::parse("Release+a").unwrap();
        assert!(release.is_release());
        assert_eq!(release.keycode, 'a' as i32);
    }

    #[test]
    fn test_plus_key() {
        assert_eq!(KeyEvent::parse("+").unwrap(), KeyEvent::plain('+' as i32));
        let event = KeyEvent::parse("Control++").unwrap();
        assert_eq!(event.keycode, '+' as i32);
        assert!(event.modifiers.contains(KeyModifier::Control));
        assert_eq!(event.to_string(), "Control+plus");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(KeyEvent::parse(""), Err(KeyError::Empty));
        assert_eq!(KeyEvent::parse("Control+"), Err(KeyError::Empty));
        assert_eq!(
            KeyEvent::parse("Ctrl+a"),
            Err(KeyError::UnknownModifier("Ctrl".to_string()))
        );
        assert_eq!(
            KeyEvent::parse("Shift+Nope"),
            Err(KeyError::UnknownKey("Nope".to_string()))
        );
    }

    #[test]
    fn test_parse_sequence() {
        let seq = KeySequence::parse("ni{space}{Control+a}{BackSpace}").unwrap();
        let codes: Vec<i32> = seq.iter().map(|e| e.keycode).collect();
        assert_eq!(codes, vec![0x6e, 0x69, 0x20, 0x61, 0xff08]);
        assert!(seq.events()[3].modifiers.contains(KeyModifier::Control));
        assert_eq!(seq.to_string(), "ni{space}{Control+a}{BackSpace}");
    }

    #[test]
    fn test_sequence_edge_cases() {
        assert!(KeySequence::parse("").unwrap().is_empty());
        // an unmatched brace is just a character
        let seq = KeySequence::parse("a{").unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.to_string(), "a{braceleft}");
        assert_eq!(
            KeySequence::parse("你好"),
            Err(KeyError::UnsupportedChar('你'))
        );
        assert_eq!(KeySequence::parse("a\0b"), Err(KeyError::InteriorNul));
        assert_eq!(
            KeySequence::parse("{Hyperr+x}"),
            Err(KeyError::UnknownModifier("Hyperr".to_string()))
        );
    }

    #[test]
    fn test_display_reparses() {
        let seq = KeySequence::parse("a b{Escape}").unwrap();
        assert_eq!(seq.to_string(), "a{space}b{Escape}");
        assert_eq!(KeySequence::parse(&seq.to_string()).unwrap(), seq);
    }
}
