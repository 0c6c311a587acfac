// keys/src/keycode.rs
//
// X11 keysym names accepted by the engine. Letters and digits are not listed:
// a single printable ASCII character is its own name and its own keysym.

use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use phf::phf_map;

pub use rime_bridge_core::session::VOID_SYMBOL;

static KEY_NAMES: phf::Map<&'static str, i32> = phf_map! {
    "space" => 0x0020,
    "exclam" => 0x0021,
    "quotedbl" => 0x0022,
    "numbersign" => 0x0023,
    "dollar" => 0x0024,
    "percent" => 0x0025,
    "ampersand" => 0x0026,
    "apostrophe" => 0x0027,
    "parenleft" => 0x0028,
    "parenright" => 0x0029,
    "asterisk" => 0x002a,
    "plus" => 0x002b,
    "comma" => 0x002c,
    "minus" => 0x002d,
    "period" => 0x002e,
    "slash" => 0x002f,
    "colon" => 0x003a,
    "semicolon" => 0x003b,
    "less" => 0x003c,
    "equal" => 0x003d,
    "greater" => 0x003e,
    "question" => 0x003f,
    "at" => 0x0040,
    "bracketleft" => 0x005b,
    "backslash" => 0x005c,
    "bracketright" => 0x005d,
    "asciicircum" => 0x005e,
    "underscore" => 0x005f,
    "grave" => 0x0060,
    "braceleft" => 0x007b,
    "bar" => 0x007c,
    "braceright" => 0x007d,
    "asciitilde" => 0x007e,

    "BackSpace" => 0xff08,
    "Tab" => 0xff09,
    "Linefeed" => 0xff0a,
    "Clear" => 0xff0b,
    "Return" => 0xff0d,
    "Pause" => 0xff13,
    "Scroll_Lock" => 0xff14,
    "Sys_Req" => 0xff15,
    "Escape" => 0xff1b,
    "Home" => 0xff50,
    "Left" => 0xff51,
    "Up" => 0xff52,
    "Right" => 0xff53,
    "Down" => 0xff54,
    "Page_Up" => 0xff55,
    "Page_Down" => 0xff56,
    "End" => 0xff57,
    "Begin" => 0xff58,
    "Select" => 0xff60,
    "Print" => 0xff61,
    "Execute" => 0xff62,
    "Insert" => 0xff63,
    "Undo" => 0xff65,
    "Redo" => 0xff66,
    "Menu" => 0xff67,
    "Find" => 0xff68,
    "Cancel" => 0xff69,
    "Help" => 0xff6a,
    "Break" => 0xff6b,
    "Mode_switch" => 0xff7e,
    "Num_Lock" => 0xff7f,
    "KP_Space" => 0xff80,
    "KP_Tab" => 0xff89,
    "KP_Enter" => 0xff8d,
    "KP_Home" => 0xff95,
    "KP_Left" => 0xff96,
    "KP_Up" => 0xff97,
    "KP_Right" => 0xff98,
    "KP_Down" => 0xff99,
    "KP_Page_Up" => 0xff9a,
    "KP_Page_Down" => 0xff9b,
    "KP_End" => 0xff9c,
    "KP_Insert" => 0xff9e,
    "KP_Delete" => 0xff9f,
    "KP_Multiply" => 0xffaa,
    "KP_Add" => 0xffab,
    "KP_Separator" => 0xffac,
    "KP_Subtract" => 0xffad,
    "KP_Decimal" => 0xffae,
    "KP_Divide" => 0xffaf,
    "KP_0" => 0xffb0,
    "KP_1" => 0xffb1,
    "KP_2" => 0xffb2,
    "KP_3" => 0xffb3,
    "KP_4" => 0xffb4,
    "KP_5" => 0xffb5,
    "KP_6" => 0xffb6,
    "KP_7" => 0xffb7,
    "KP_8" => 0xffb8,
    "KP_9" => 0xffb9,
    "KP_Equal" => 0xffbd,
    "F1" => 0xffbe,
    "F2" => 0xffbf,
    "F3" => 0xffc0,
    "F4" => 0xffc1,
    "F5" => 0xffc2,
    "F6" => 0xffc3,
    "F7" => 0xffc4,
    "F8" => 0xffc5,
    "F9" => 0xffc6,
    "F10" => 0xffc7,
    "F11" => 0xffc8,
    "F12" => 0xffc9,
    "Shift_L" => 0xffe1,
    "Shift_R" => 0xffe2,
    "Control_L" => 0xffe3,
    "Control_R" => 0xffe4,
    "Caps_Lock" => 0xffe5,
    "Shift_Lock" => 0xffe6,
    "Meta_L" => 0xffe7,
    "Meta_R" => 0xffe8,
    "Alt_L" => 0xffe9,
    "Alt_R" => 0xffea,
    "Super_L" => 0xffeb,
    "Super_R" => 0xffec,
    "Hyper_L" => 0xffed,
    "Hyper_R" => 0xffee,
    "Delete" => 0xffff,
    "VoidSymbol" => 0x00ff_ffff,
};

// Alternative spellings; lookups accept them, `keycode_name` never returns them.
static KEY_ALIASES: phf::Map<&'static str, &'static str> = phf_map! {
    "Prior" => "Page_Up",
    "Next" => "Page_Down",
    "KP_Prior" => "KP_Page_Up",
    "KP_Next" => "KP_Page_Down",
    "Enter" => "Return",
    "Esc" => "Escape",
};

static KEYSYM_NAMES: Lazy<HashMap<i32, &'static str>> = Lazy::new(|| {
    KEY_NAMES
        .entries()
        .map(|(name, code)| (*code, *name))
        .collect()
});

fn printable(c: char) -> bool {
    c.is_ascii_graphic()
}

/// Keysym of a named key, or `None` for unknown names.
pub fn lookup_keycode(name: &str) -> Option<i32> {
    if let Some(code) = KEY_NAMES.get(name) {
        return Some(*code);
    }
    if let Some(canonical) = KEY_ALIASES.get(name) {
        return KEY_NAMES.get(*canonical).copied();
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if printable(c) => Some(c as i32),
        _ => None,
    }
}

/// Keysym of a named key; `VOID_SYMBOL` for unknown names.
pub fn keycode_by_name(name: &str) -> i32 {
    lookup_keycode(name).unwrap_or(VOID_SYMBOL)
}

/// Canonical name of a keysym, e.g. `Return` for `0xff0d` and `a` for `0x61`.
pub fn keycode_name(keycode: i32) -> Option<Cow<'static, str>> {
    if let Some(name) = KEYSYM_NAMES.get(&keycode) {
        return Some(Cow::Borrowed(*name));
    }
    u32::try_from(keycode)
        .ok()
        .and_then(char::from_u32)
        .filter(|c| printable(*c))
        .map(|c| Cow::Owned(c.to_string()))
}

/// Keysym typed by `c` without modifiers, for printable ASCII.
pub fn keycode_for_char(c: char) -> Option<i32> {
    if c == ' ' || printable(c) {
        Some(c as i32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_single_char_keys() {
        assert_eq!(keycode_by_name("Return"), 0xff0d);
        assert_eq!(keycode_by_name("space"), 0x20);
        assert_eq!(keycode_by_name("a"), 0x61);
        assert_eq!(keycode_by_name("Z"), 0x5a);
        assert_eq!(keycode_by_name("7"), 0x37);
        assert_eq!(keycode_by_name("Prior"), keycode_by_name("Page_Up"));
    }

    #[test]
    fn test_unknown_names_are_void() {
        assert_eq!(keycode_by_name("NoSuchKey"), VOID_SYMBOL);
        assert_eq!(keycode_by_name(""), VOID_SYMBOL);
        assert_eq!(keycode_by_name("你"), VOID_SYMBOL);
        assert!(lookup_keycode("return").is_none());
    }

    #[test]
    fn test_names_of_keysyms() {
        assert_eq!(keycode_name(0xff56).as_deref(), Some("Page_Down"));
        assert_eq!(keycode_name(0x2c).as_deref(), Some("comma"));
        assert_eq!(keycode_name(0x71).as_deref(), Some("q"));
        assert_eq!(keycode_name(VOID_SYMBOL).as_deref(), Some("VoidSymbol"));
        assert!(keycode_name(0x1234).is_none());
        assert!(keycode_name(-1).is_none());
    }

    #[test]
    fn test_chars() {
        assert_eq!(keycode_for_char(' '), Some(0x20));
        assert_eq!(keycode_for_char('{'), Some(0x7b));
        assert_eq!(keycode_for_char('\n'), None);
        assert_eq!(keycode_for_char('é'), None);
    }
}
