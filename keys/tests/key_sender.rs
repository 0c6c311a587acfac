// keys/tests/key_sender.rs
//
// Integration tests for typed key input against the in-memory engine.

use std::path::Path;

use rime_bridge_core::testing::MemoryRime;
use rime_bridge_core::{Config, EngineSession};
use rime_keys::{keycode_by_name, KeyError, KeyEvent, KeySender};

fn started() -> EngineSession<MemoryRime> {
    let mut session = EngineSession::new(MemoryRime::with_sample_data(), Config::default());
    session
        .startup(Path::new("/usr/share/rime-data"), Path::new("/tmp/rime"), false)
        .unwrap();
    session
}

#[test]
fn test_sequence_commits() {
    let s = started();
    assert!(s.send_sequence("nihao{space}").unwrap());
    assert_eq!(s.get_commit().unwrap().text, "你好");

    assert!(s.send_sequence("hao{Return}").unwrap());
    assert_eq!(s.get_commit().unwrap().text, "hao");
}

#[test]
fn test_named_keys_edit_input() {
    let s = started();
    s.send_sequence("nix{BackSpace}").unwrap();
    assert_eq!(s.raw_input().as_deref(), Some("ni"));
    assert!(s.send_key(&KeyEvent::parse("Escape").unwrap()));
    assert_eq!(s.raw_input().as_deref(), Some(""));
}

#[test]
fn test_modified_keys_pass_through() {
    let s = started();
    let copy = KeyEvent::parse("Control+c").unwrap();
    assert!(!s.send_key(&copy));
    assert!(s.send_sequence("{Control+c}").unwrap());
    assert_eq!(s.raw_input().as_deref(), Some(""));
}

#[test]
fn test_bad_sequence_sends_nothing() {
    let s = started();
    assert_eq!(
        s.send_sequence("ni{Nope}"),
        Err(KeyError::UnknownKey("Nope".to_string()))
    );
    assert_eq!(s.api().call_count("process_key"), 0);
}

#[test]
fn test_not_running() {
    let s = EngineSession::new(MemoryRime::with_sample_data(), Config::default());
    assert!(!s.send_sequence("ni").unwrap());
    assert!(!s.send_key(&KeyEvent::plain(keycode_by_name("n"))));
    assert!(s.send_sequence("{Bogus}").is_err());
}
