// core/src/notification.rs
//
// Delivery of engine-originated notifications to the host.
//
// The engine calls its notification handler from whatever thread it happens
// to be running on: the caller's thread for option and schema changes, its
// own deployer thread for maintenance. The handler installed here never runs
// host code. It only enqueues a `NotificationEvent` on a bounded channel; the
// host drains the channel on a thread it owns, either by polling
// `NotificationReceiver` or through `spawn_dispatcher`.
//
// Events are dropped, never blocked on, when
// - no session is active (before the first session or after shutdown),
// - the queue is full,
// - the receiving side has gone away.

use std::ffi::{c_char, c_void, CStr};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};

use crate::api::{NotificationHandler, SessionId};

/// The session id currently owned by the session handle, readable from any
/// thread. Only the session handle writes it.
#[derive(Debug, Clone, Default)]
pub struct ActiveSession(Arc<AtomicUsize>);

impl ActiveSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<SessionId> {
        SessionId::from_raw(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, session: Option<SessionId>) {
        self.0
            .store(session.map(SessionId::get).unwrap_or(0), Ordering::Release);
    }
}

/// One notification as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// Session the engine attributed the event to; deployer events carry none.
    pub session_id: Option<SessionId>,
    pub message_type: String,
    pub value: String,
}

impl NotificationEvent {
    pub fn new(session_id: usize, message_type: &str, value: &str) -> Self {
        Self {
            session_id: SessionId::from_raw(session_id),
            message_type: message_type.to_string(),
            value: value.to_string(),
        }
    }

    /// Interpret the event by its message type.
    pub fn parse(&self) -> Notification {
        match self.message_type.as_str() {
            "schema" => {
                let (id, name) = match self.value.split_once('/') {
                    Some((id, name)) => (id, name),
                    None => (self.value.as_str(), self.value.as_str()),
                };
                Notification::Schema {
                    id: id.to_string(),
                    name: name.to_string(),
                }
            }
            "option" => match self.value.strip_prefix('!') {
                Some(name) => Notification::Option {
                    name: name.to_string(),
                    enabled: false,
                },
                None => Notification::Option {
                    name: self.value.clone(),
                    enabled: true,
                },
            },
            "property" => {
                let (name, value) = self.value.split_once('=').unwrap_or((self.value.as_str(), ""));
                Notification::Property {
                    name: name.to_string(),
                    value: value.to_string(),
                }
            }
            "deploy" => Notification::Deploy(DeployState::from(self.value.as_str())),
            _ => Notification::Unknown {
                message_type: self.message_type.clone(),
                value: self.value.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployState {
    Start,
    Success,
    Failure,
    Other(String),
}

impl From<&str> for DeployState {
    fn from(value: &str) -> Self {
        match value {
            "start" => DeployState::Start,
            "success" => DeployState::Success,
            "failure" => DeployState::Failure,
            other => DeployState::Other(other.to_string()),
        }
    }
}

/// Typed view of a `NotificationEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Schema switched; value `id/name`.
    Schema { id: String, name: String },
    /// Option toggled; value `name` or `!name`.
    Option { name: String, enabled: bool },
    /// Property changed; value `name=value`.
    Property { name: String, value: String },
    /// Deployer progress.
    Deploy(DeployState),
    Unknown { message_type: String, value: String },
}

/// Outcome of one engine callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    NoActiveSession,
    QueueFull,
    Disconnected,
}

/// Sending half, shared with the engine through its notification handler.
#[derive(Debug)]
pub struct NotificationBridge {
    sender: Sender<NotificationEvent>,
    active: ActiveSession,
    dropped: AtomicU64,
}

/// Create a bridge and its receiver. `capacity` is clamped to at least one.
pub fn channel(capacity: usize, active: ActiveSession) -> (Arc<NotificationBridge>, NotificationReceiver) {
    let (sender, receiver) = bounded(capacity.max(1));
    let bridge = Arc::new(NotificationBridge {
        sender,
        active,
        dropped: AtomicU64::new(0),
    });
    (bridge, NotificationReceiver { receiver })
}

impl NotificationBridge {
    /// Enqueue one event reported by the engine. Never blocks.
    pub fn deliver(&self, session_id: usize, message_type: &str, value: &str) -> Delivery {
        if self.active.get().is_none() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(message_type, value, "no active session, notification dropped");
            return Delivery::NoActiveSession;
        }

        let event = NotificationEvent::new(session_id, message_type, value);
        match self.sender.try_send(event) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    message_type = %event.message_type,
                    value = %event.value,
                    "notification queue full, event dropped"
                );
                Delivery::QueueFull
            }
            Err(TrySendError::Disconnected(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    message_type = %event.message_type,
                    "notification receiver gone, event dropped"
                );
                Delivery::Disconnected
            }
        }
    }

    /// Handler suitable for `RimeApi::set_notification_handler`.
    pub fn handler(self: &Arc<Self>) -> NotificationHandler {
        let bridge = Arc::clone(self);
        Arc::new(move |session_id: usize, message_type: &str, value: &str| {
            bridge.deliver(session_id, message_type, value);
        })
    }

    /// Events discarded since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Opaque pointer for native bindings that register `on_message` with a
    /// context object. Valid while the returned `Arc` clone is alive.
    pub fn context_object(self: &Arc<Self>) -> *mut c_void {
        Arc::as_ptr(self) as *mut c_void
    }
}

/// C ABI entry point matching the engine's notification handler signature.
///
/// # Safety
///
/// `context_object` must be null or a pointer obtained from
/// [`NotificationBridge::context_object`] whose bridge is still alive.
/// `message_type` and `message_value` must be null or point to
/// NUL-terminated strings valid for the duration of the call.
pub unsafe extern "C" fn on_message(
    context_object: *mut c_void,
    session_id: usize,
    message_type: *const c_char,
    message_value: *const c_char,
) {
    if context_object.is_null() || message_type.is_null() || message_value.is_null() {
        tracing::debug!("notification with null argument dropped");
        return;
    }
    let bridge = unsafe { &*(context_object as *const NotificationBridge) };
    let message_type = unsafe { CStr::from_ptr(message_type) }.to_string_lossy();
    let message_value = unsafe { CStr::from_ptr(message_value) }.to_string_lossy();
    bridge.deliver(session_id, &message_type, &message_value);
}

/// Consumer of notifications on a host-owned thread.
pub trait NotificationSink: Send {
    fn notify(&mut self, event: &NotificationEvent);
}

impl<F> NotificationSink for F
where
    F: FnMut(&NotificationEvent) + Send,
{
    fn notify(&mut self, event: &NotificationEvent) {
        self(event)
    }
}

/// Receiving half, owned by the host.
#[derive(Debug, Clone)]
pub struct NotificationReceiver {
    receiver: Receiver<NotificationEvent>,
}

impl NotificationReceiver {
    /// Block until an event arrives. `None` once every sender is gone.
    pub fn recv(&self) -> Option<NotificationEvent> {
        self.receiver.recv().ok()
    }

    pub fn try_recv(&self) -> Option<NotificationEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<NotificationEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Everything currently queued, without waiting.
    pub fn drain(&self) -> Vec<NotificationEvent> {
        self.receiver.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Run `sink` for every event on a dedicated thread. The thread exits when
    /// every sender has been dropped.
    pub fn spawn_dispatcher<S>(self, mut sink: S) -> std::io::Result<JoinHandle<()>>
    where
        S: NotificationSink + 'static,
    {
        std::thread::Builder::new()
            .name("rime-notify".to_string())
            .spawn(move || {
                for event in self.receiver.iter() {
                    sink.notify(&event);
                }
                tracing::debug!("notification dispatcher finished");
            })
    }
}
