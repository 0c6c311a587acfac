//! rime-keys crate root
//!
//! The engine's key table and key text forms, for hosts that start from key
//! names rather than raw keysyms.
//!
//! Public API exported here:
//! - `KeyModifier`, `KeyModifiers` and `modifier_by_name` from `modifier`
//! - `keycode_by_name`, `keycode_name` from `keycode`
//! - `KeyEvent`, `KeySequence` from `event`
//! - `KeySender`, which feeds parsed keys to an `EngineSession`

pub mod error;
pub mod event;
pub mod keycode;
pub mod modifier;
pub mod sender;

pub use error::KeyError;
pub use event::{KeyEvent, KeySequence};
pub use keycode::{keycode_by_name, keycode_name, lookup_keycode, VOID_SYMBOL};
pub use modifier::{lookup_modifier, modifier_by_name, KeyModifier, KeyModifiers};
pub use sender::KeySender;
