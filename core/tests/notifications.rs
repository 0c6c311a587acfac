// core/tests/notifications.rs
//
// Integration tests for engine notifications reaching the host.
//
// Tests cover:
// - Option, property and schema events from the caller's thread
// - Events raised on a foreign engine thread
// - Drops while no session is active, including deployer events
// - The dispatcher thread and its shutdown

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rime_bridge_core::notification::Delivery;
use rime_bridge_core::testing::MemoryRime;
use rime_bridge_core::{Config, DeployState, EngineSession, Notification, NotificationEvent};

const TIMEOUT: Duration = Duration::from_secs(2);

fn start(s: &mut EngineSession<MemoryRime>) {
    s.startup(Path::new("/usr/share/rime-data"), Path::new("/tmp/rime"), false)
        .unwrap();
}

fn started() -> EngineSession<MemoryRime> {
    let mut session = EngineSession::new(MemoryRime::with_sample_data(), Config::default());
    start(&mut session);
    session
}

#[test]
fn test_option_toggle_is_delivered() {
    let s = started();
    let notifications = s.notifications();
    s.set_option("ascii_mode", true);
    s.set_option("ascii_mode", false);

    let events = notifications.drain();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].session_id, s.session_id());
    assert_eq!(
        events[0].parse(),
        Notification::Option {
            name: "ascii_mode".to_string(),
            enabled: true
        }
    );
    assert_eq!(
        events[1].parse(),
        Notification::Option {
            name: "ascii_mode".to_string(),
            enabled: false
        }
    );
}

#[test]
fn test_schema_and_property_events() {
    let s = started();
    let notifications = s.notifications();
    assert!(s.select_schema("cangjie5"));
    s.set_property("client_app", "org.example.editor").unwrap();

    let schema = notifications.try_recv().unwrap();
    assert_eq!(
        schema.parse(),
        Notification::Schema {
            id: "cangjie5".to_string(),
            name: "倉頡五代".to_string()
        }
    );
    let property = notifications.try_recv().unwrap();
    assert_eq!(
        property.parse(),
        Notification::Property {
            name: "client_app".to_string(),
            value: "org.example.editor".to_string()
        }
    );
    assert!(notifications.is_empty());
}

#[test]
fn test_foreign_thread_event_reaches_queue() {
    let s = started();
    let notifications = s.notifications();
    s.api()
        .emit_from_thread(0, "deploy", "success")
        .join()
        .unwrap();

    let event = notifications.recv_timeout(TIMEOUT).unwrap();
    assert!(event.session_id.is_none());
    assert_eq!(event.parse(), Notification::Deploy(DeployState::Success));
}

#[test]
fn test_dropped_without_active_session() {
    let mut s = EngineSession::new(MemoryRime::with_sample_data(), Config::default());
    assert_eq!(s.bridge().deliver(1, "option", "ascii_mode"), Delivery::NoActiveSession);

    start(&mut s);
    let bridge = Arc::clone(s.bridge());
    s.shutdown();
    assert_eq!(bridge.deliver(1, "option", "ascii_mode"), Delivery::NoActiveSession);
    assert!(s.notifications().is_empty());
    assert_eq!(bridge.dropped(), 2);
}

#[test]
fn test_deployer_events_dropped_during_redeploy() {
    let mut s = started();
    let dropped_before = s.bridge().dropped();
    assert!(s.deploy().unwrap());
    assert_eq!(s.bridge().dropped() - dropped_before, 2);
    assert!(s.notifications().is_empty());
}

#[test]
fn test_full_queue_drops_instead_of_blocking() {
    let config = Config {
        notification_capacity: 2,
        ..Config::default()
    };
    let mut s = EngineSession::new(MemoryRime::with_sample_data(), config);
    start(&mut s);
    for _ in 0..5 {
        s.set_option("ascii_mode", true);
    }
    assert_eq!(s.notifications().len(), 2);
    assert_eq!(s.bridge().dropped(), 3);
}

#[test]
fn test_dispatcher_sees_events_and_exits_with_session() {
    let s = started();
    let seen: Arc<Mutex<Vec<NotificationEvent>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let dispatcher = s
        .notifications()
        .spawn_dispatcher(move |event: &NotificationEvent| {
            sink.lock().unwrap().push(event.clone());
        })
        .unwrap();

    s.set_option("full_shape", true);
    s.api().emit_from_thread(0, "deploy", "start").join().unwrap();
    drop(s);

    dispatcher.join().unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].message_type, "deploy");
}
