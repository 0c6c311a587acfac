// keys/src/modifier.rs
//
// Modifier mask bits, as the engine's key table defines them. Bits 13..23
// are unused; `Handled` and `Ignored` are never produced by a keyboard, the
// engine sets them on events it has already dealt with.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use phf::phf_map;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum KeyModifier {
    Shift = 1 << 0,
    Lock = 1 << 1,
    Control = 1 << 2,
    Alt = 1 << 3,
    Mod2 = 1 << 4,
    Mod3 = 1 << 5,
    Mod4 = 1 << 6,
    Mod5 = 1 << 7,
    Button1 = 1 << 8,
    Button2 = 1 << 9,
    Button3 = 1 << 10,
    Button4 = 1 << 11,
    Button5 = 1 << 12,
    Handled = 1 << 24,
    Ignored = 1 << 25,
    Super = 1 << 26,
    Hyper = 1 << 27,
    Meta = 1 << 28,
    Release = 1 << 30,
}

impl KeyModifier {
    /// Every modifier, lowest bit first.
    pub const ALL: [KeyModifier; 19] = [
        KeyModifier::Shift,
        KeyModifier::Lock,
        KeyModifier::Control,
        KeyModifier::Alt,
        KeyModifier::Mod2,
        KeyModifier::Mod3,
        KeyModifier::Mod4,
        KeyModifier::Mod5,
        KeyModifier::Button1,
        KeyModifier::Button2,
        KeyModifier::Button3,
        KeyModifier::Button4,
        KeyModifier::Button5,
        KeyModifier::Handled,
        KeyModifier::Ignored,
        KeyModifier::Super,
        KeyModifier::Hyper,
        KeyModifier::Meta,
        KeyModifier::Release,
    ];

    pub fn bit(self) -> u32 {
        self as u32
    }

    /// Name used in key representations such as `Control+a`.
    pub fn name(self) -> &'static str {
        match self {
            KeyModifier::Shift => "Shift",
            KeyModifier::Lock => "Lock",
            KeyModifier::Control => "Control",
            KeyModifier::Alt => "Alt",
            KeyModifier::Mod2 => "Mod2",
            KeyModifier::Mod3 => "Mod3",
            KeyModifier::Mod4 => "Mod4",
            KeyModifier::Mod5 => "Mod5",
            KeyModifier::Button1 => "Button1",
            KeyModifier::Button2 => "Button2",
            KeyModifier::Button3 => "Button3",
            KeyModifier::Button4 => "Button4",
            KeyModifier::Button5 => "Button5",
            KeyModifier::Handled => "Handled",
            KeyModifier::Ignored => "Ignored",
            KeyModifier::Super => "Super",
            KeyModifier::Hyper => "Hyper",
            KeyModifier::Meta => "Meta",
            KeyModifier::Release => "Release",
        }
    }
}

// `Mod1` and `Forward` are the engine's older spellings.
static MODIFIER_NAMES: phf::Map<&'static str, KeyModifier> = phf_map! {
    "Shift" => KeyModifier::Shift,
    "Lock" => KeyModifier::Lock,
    "Control" => KeyModifier::Control,
    "Alt" => KeyModifier::Alt,
    "Mod1" => KeyModifier::Alt,
    "Mod2" => KeyModifier::Mod2,
    "Mod3" => KeyModifier::Mod3,
    "Mod4" => KeyModifier::Mod4,
    "Mod5" => KeyModifier::Mod5,
    "Button1" => KeyModifier::Button1,
    "Button2" => KeyModifier::Button2,
    "Button3" => KeyModifier::Button3,
    "Button4" => KeyModifier::Button4,
    "Button5" => KeyModifier::Button5,
    "Handled" => KeyModifier::Handled,
    "Ignored" => KeyModifier::Ignored,
    "Forward" => KeyModifier::Ignored,
    "Super" => KeyModifier::Super,
    "Hyper" => KeyModifier::Hyper,
    "Meta" => KeyModifier::Meta,
    "Release" => KeyModifier::Release,
};

/// Look up a modifier by name.
pub fn lookup_modifier(name: &str) -> Option<KeyModifier> {
    MODIFIER_NAMES.get(name).copied()
}

/// Mask bit of the modifier called `name`; `0` for unknown names.
pub fn modifier_by_name(name: &str) -> u32 {
    lookup_modifier(name).map_or(0, KeyModifier::bit)
}

/// A set of modifiers, stored as the engine's mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyModifiers(u32);

impl KeyModifiers {
    pub const NONE: KeyModifiers = KeyModifiers(0);

    /// Keep only bits that name a modifier.
    pub fn from_bits_truncate(bits: u32) -> Self {
        let known = KeyModifier::ALL.iter().fold(0, |acc, m| acc | m.bit());
        KeyModifiers(bits & known)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// The mask as the engine's `process_key` takes it.
    pub fn mask(self) -> i32 {
        // Release is bit 30, so every valid mask fits
        self.0 as i32
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, modifier: KeyModifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    pub fn insert(&mut self, modifier: KeyModifier) {
        self.0 |= modifier.bit();
    }

    pub fn remove(&mut self, modifier: KeyModifier) {
        self.0 &= !modifier.bit();
    }

    pub fn with(mut self, modifier: KeyModifier) -> Self {
        self.insert(modifier);
        self
    }

    pub fn iter(self) -> impl Iterator<Item = KeyModifier> {
        KeyModifier::ALL.into_iter().filter(move |m| self.contains(*m))
    }
}

impl From<KeyModifier> for KeyModifiers {
    fn from(modifier: KeyModifier) -> Self {
        KeyModifiers(modifier.bit())
    }
}

impl BitOr for KeyModifiers {
    type Output = KeyModifiers;

    fn bitor(self, rhs: KeyModifiers) -> KeyModifiers {
        KeyModifiers(self.0 | rhs.0)
    }
}

impl BitOr<KeyModifier> for KeyModifiers {
    type Output = KeyModifiers;

    fn bitor(self, rhs: KeyModifier) -> KeyModifiers {
        self.with(rhs)
    }
}

impl BitOr for KeyModifier {
    type Output = KeyModifiers;

    fn bitor(self, rhs: KeyModifier) -> KeyModifiers {
        KeyModifiers::from(self).with(rhs)
    }
}

impl BitOrAssign<KeyModifier> for KeyModifiers {
    fn bitor_assign(&mut self, rhs: KeyModifier) {
        self.insert(rhs);
    }
}

impl fmt::Display for KeyModifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for modifier in self.iter() {
            if !first {
                f.write_str("+")?;
            }
            f.write_str(modifier.name())?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_match_engine_table() {
        assert_eq!(modifier_by_name("Shift"), 1);
        assert_eq!(modifier_by_name("Control"), 4);
        assert_eq!(modifier_by_name("Mod1"), modifier_by_name("Alt"));
        assert_eq!(modifier_by_name("Forward"), 1 << 25);
        assert_eq!(modifier_by_name("Release"), 1 << 30);
        assert_eq!(modifier_by_name("control"), 0);
        assert_eq!(modifier_by_name(""), 0);
    }

    #[test]
    fn test_set_operations() {
        let mut mods = KeyModifier::Control | KeyModifier::Shift;
        assert!(mods.contains(KeyModifier::Shift));
        assert!(!mods.contains(KeyModifier::Alt));
        assert_eq!(mods.bits(), 0b101);
        mods.remove(KeyModifier::Shift);
        mods |= KeyModifier::Release;
        assert_eq!(mods.to_string(), "Control+Release");
        assert!(KeyModifiers::NONE.is_empty());
    }

    #[test]
    fn test_truncate_drops_unused_bits() {
        let mods = KeyModifiers::from_bits_truncate(1 | (1 << 13) | (1 << 31));
        assert_eq!(mods, KeyModifiers::from(KeyModifier::Shift));
    }
}
