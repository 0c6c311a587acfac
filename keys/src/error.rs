use thiserror::Error;

/// A key representation that cannot be turned into key events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("empty key representation")]
    Empty,
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("unknown key name `{0}`")]
    UnknownKey(String),
    #[error("character {0:?} has no keysym, spell it as a braced key name")]
    UnsupportedChar(char),
    #[error("key sequence contains a NUL byte")]
    InteriorNul,
    #[error("key sequence pattern: {0}")]
    Pattern(String),
}
