// keys/src/sender.rs
//
// Typed key input for a running session.

use rime_bridge_core::{EngineSession, RimeApi};

use crate::error::KeyError;
use crate::event::{KeyEvent, KeySequence};

pub trait KeySender {
    /// Feed one event. `false` when the engine did not consume it.
    fn send_key(&self, event: &KeyEvent) -> bool;

    /// Parse `sequence` and feed every event in order.
    ///
    /// Nothing is sent if the sequence does not parse. Returns `false` when
    /// the engine is not running, otherwise `true` whether or not each key
    /// was consumed.
    fn send_sequence(&self, sequence: &str) -> Result<bool, KeyError>;
}

impl<A: RimeApi> KeySender for EngineSession<A> {
    fn send_key(&self, event: &KeyEvent) -> bool {
        self.process_key(event.keycode, event.modifiers.mask())
    }

    fn send_sequence(&self, sequence: &str) -> Result<bool, KeyError> {
        let keys = KeySequence::parse(sequence)?;
        if !self.is_running() {
            return Ok(false);
        }
        let mut passed = 0usize;
        for event in &keys {
            if !self.send_key(event) {
                passed += 1;
            }
        }
        if passed > 0 {
            tracing::debug!(passed, total = keys.len(), "keys not consumed by engine");
        }
        Ok(true)
    }
}
