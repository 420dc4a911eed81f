//! Window-level event dispatch.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::dom::NodeId;
use super::value::JsValue;
use crate::sync::lock;

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub message: String,
    pub filename: String,
    pub lineno: u32,
    pub colno: u32,
    pub error: Option<JsValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectionEvent {
    pub reason: JsValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent {
    Click { target: NodeId },
    KeyDown { target: NodeId, key: String },
    Change { target: NodeId },
    Submit { target: NodeId },
    Input { target: NodeId },
    PageShow,
    Error(ErrorEvent),
    UnhandledRejection(RejectionEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyDown,
    Change,
    Submit,
    Input,
    PageShow,
    Error,
    UnhandledRejection,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::KeyDown => "keydown",
            Self::Change => "change",
            Self::Submit => "submit",
            Self::Input => "input",
            Self::PageShow => "pageshow",
            Self::Error => "error",
            Self::UnhandledRejection => "unhandledrejection",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DomEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Click { .. } => EventKind::Click,
            Self::KeyDown { .. } => EventKind::KeyDown,
            Self::Change { .. } => EventKind::Change,
            Self::Submit { .. } => EventKind::Submit,
            Self::Input { .. } => EventKind::Input,
            Self::PageShow => EventKind::PageShow,
            Self::Error(_) => EventKind::Error,
            Self::UnhandledRejection(_) => EventKind::UnhandledRejection,
        }
    }

    pub fn target(&self) -> Option<NodeId> {
        match self {
            Self::Click { target }
            | Self::KeyDown { target, .. }
            | Self::Change { target }
            | Self::Submit { target }
            | Self::Input { target } => Some(*target),
            _ => None,
        }
    }
}

pub type EventListener = Arc<dyn Fn(&DomEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub struct EventListeners {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, EventKind, EventListener)>>,
}

impl EventListeners {
    pub fn add(&self, kind: EventKind, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, kind, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _, _)| *existing != id);
        listeners.len() != before
    }

    pub fn count(&self, kind: EventKind) -> usize {
        lock(&self.listeners).iter().filter(|(_, k, _)| *k == kind).count()
    }

    /// Invoke every listener registered for the event's kind, in
    /// registration order. Returns how many ran.
    pub fn dispatch(&self, event: &DomEvent) -> usize {
        let kind = event.kind();
        // Snapshot so listeners may add/remove listeners while running.
        let matching: Vec<EventListener> = lock(&self.listeners)
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, listener)| listener.clone())
            .collect();
        for listener in &matching {
            listener(event);
        }
        matching.len()
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("count", &lock(&self.listeners).len())
            .finish()
    }
}
