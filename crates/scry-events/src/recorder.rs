//! Interaction recorder

use scry_core::endpoints;
use scry_core::host::{DomEvent, EventKind, HistoryApi, ListenerId, Window};
use scry_core::sync::lock;
use scry_core::{
    flush_buffer, CaptureError, CaptureResult, CaptureStream, Envelope, EventBuffer, FlushOutcome,
    FlushPolicy, FlushTarget, HttpMethod, Interceptor, MaskingLevel, RecurringTask, SessionId,
    SessionSlot, Transport,
};
use scry_privacy::{resolve_text, sanitize_query_pairs};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::{debug, error};

use crate::extract::{self, is_captured_tag};
use crate::types::{InteractionEvent, InteractionType};

pub const UI_EVENTS_TARGET: FlushTarget = FlushTarget {
    stream: "ui events",
    method: HttpMethod::Post,
    endpoint: endpoints::ui_events,
    policy: FlushPolicy::DropOnFailure,
    envelope: Envelope::Array,
    expected_status: Some(201),
};

const LISTENED: [EventKind; 4] = [
    EventKind::Click,
    EventKind::KeyDown,
    EventKind::Change,
    EventKind::PageShow,
];

struct Inner {
    window: Arc<Window>,
    transport: Arc<dyn Transport>,
    masking_level: MaskingLevel,
    flush_interval: Duration,
    buffer: EventBuffer<InteractionEvent>,
    session: SessionSlot,
    running: AtomicBool,
    history: Interceptor<dyn HistoryApi>,
    listeners: Mutex<Vec<ListenerId>>,
    flush_task: Mutex<Option<RecurringTask>>,
}

/// Records clicks, key presses and selections on form controls, buttons and
/// links, and a page view on every navigation.
#[derive(Clone)]
pub struct EventRecorder {
    inner: Arc<Inner>,
}

impl EventRecorder {
    pub fn new(
        window: Arc<Window>,
        transport: Arc<dyn Transport>,
        masking_level: MaskingLevel,
        flush_interval: Duration,
    ) -> Self {
        let history = Interceptor::capture(window.history.clone());
        Self {
            inner: Arc::new(Inner {
                window,
                transport,
                masking_level,
                flush_interval,
                buffer: EventBuffer::new(),
                session: SessionSlot::new(),
                running: AtomicBool::new(false),
                history,
                listeners: Mutex::new(Vec::new()),
                flush_task: Mutex::new(None),
            }),
        }
    }

    /// Record one DOM event. Events on elements outside the captured tag set
    /// are ignored, as is everything while stopped.
    pub fn record_dom_event(&self, event: &DomEvent) {
        self.inner.handle_event(event);
    }

    /// Record a navigation to `url` (resolved against the current location).
    pub fn record_page_view(&self, url: &str) {
        self.inner.handle_page_view(url);
    }

    pub async fn flush(&self) -> FlushOutcome {
        self.inner.flush().await
    }

    pub fn buffered(&self) -> Vec<InteractionEvent> {
        self.inner.buffer.snapshot()
    }
}

impl CaptureStream for EventRecorder {
    fn name(&self) -> &'static str {
        "interaction"
    }

    fn start(&self) {
        let inner = &self.inner;
        if inner.running.swap(true, Ordering::SeqCst) {
            return;
        }
        inner.buffer.clear();

        let weak = Arc::downgrade(inner);
        inner.history.install(Arc::new(RecordingHistory {
            original: inner.history.original(),
            recorder: weak.clone(),
        }));

        let mut listeners = lock(&inner.listeners);
        for kind in LISTENED {
            let weak = weak.clone();
            let id = inner.window.add_event_listener(
                kind,
                Arc::new(move |event: &DomEvent| {
                    if let Some(inner) = weak.upgrade() {
                        inner.handle_event(event);
                    }
                }),
            );
            listeners.push(id);
        }
        drop(listeners);

        let task = RecurringTask::spawn("ui events flush", inner.flush_interval, move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.flush().await;
                }
            }
        });
        match task {
            Ok(task) => *lock(&inner.flush_task) = Some(task),
            Err(e) => error!("Failed to schedule ui events flush: {}", e),
        }
        debug!("Interaction recorder started");
    }

    fn stop(&self) {
        let inner = &self.inner;
        inner.running.store(false, Ordering::SeqCst);
        for id in lock(&inner.listeners).drain(..) {
            inner.window.remove_event_listener(id);
        }
        inner.history.uninstall();
        if let Some(task) = lock(&inner.flush_task).take() {
            task.cancel();
        }
    }

    fn set_session_id(&self, id: SessionId) {
        self.inner.session.set(id);
    }

    fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }
}

impl Inner {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn flush(&self) -> FlushOutcome {
        flush_buffer(&UI_EVENTS_TARGET, &self.buffer, &self.session, self.transport.as_ref()).await
    }

    fn handle_event(&self, event: &DomEvent) {
        if !self.is_running() {
            return;
        }
        if event.kind() == EventKind::PageShow {
            let href = self.window.href();
            self.handle_page_view(&href);
            return;
        }
        match self.capture(event) {
            Ok(Some(captured)) => {
                self.buffer.push(captured);
            }
            Ok(None) => {}
            Err(e) => error!("Failed to capture event: {}", e),
        }
    }

    fn capture(&self, event: &DomEvent) -> CaptureResult<Option<InteractionEvent>> {
        let Some(target) = event.target() else {
            return Ok(None);
        };
        let doc = self.window.document();
        let tag = doc.tag_name(target).ok_or(CaptureError::NotAnElement(target))?;
        if !is_captured_tag(tag) {
            return Ok(None);
        }
        let tag = tag.to_string();
        let role = extract::element_role(&doc, target)?;

        let location = self.window.location();
        let mut captured = InteractionEvent {
            event_type: InteractionType::Click,
            tag_name: Some(tag),
            timestamp: self.window.now_millis(),
            host: location.host_str().unwrap_or_default().to_string(),
            path: location.path().to_string(),
            text: None,
            dom_context: Some(extract::dom_context(&doc, target)),
            query_params: None,
            key: None,
        };

        let raw = match event {
            DomEvent::Click { .. } => extract::click_text(&doc, target, &role, &location),
            DomEvent::KeyDown { key, .. } => {
                captured.event_type = InteractionType::KeyDown;
                captured.key = Some(key.clone());
                extract::keydown_text(&doc, target, &role)
            }
            DomEvent::Change { .. } => {
                captured.event_type = InteractionType::Change;
                extract::change_text(&doc, target, &role)
            }
            DomEvent::Submit { .. } => {
                captured.event_type = InteractionType::Submit;
                None
            }
            DomEvent::Input { .. } => {
                captured.event_type = InteractionType::Input;
                None
            }
            _ => return Ok(None),
        };
        captured.text = resolve_text(self.masking_level, &role, raw);
        Ok(Some(captured))
    }

    fn handle_page_view(&self, url: &str) {
        if !self.is_running() {
            return;
        }
        match self.page_view(url) {
            Ok(event) => {
                self.buffer.push(event);
            }
            Err(e) => error!("Failed to capture URL change event: {}", e),
        }
    }

    fn page_view(&self, url: &str) -> CaptureResult<InteractionEvent> {
        let resolved = self.window.location().join(url)?;
        let query_params = sanitize_query_pairs(&resolved);
        let path = resolved.path().to_string();
        Ok(InteractionEvent {
            event_type: InteractionType::PageView,
            tag_name: None,
            timestamp: self.window.now_millis(),
            host: resolved.host_str().unwrap_or_default().to_string(),
            text: Some(path.clone()),
            path,
            dom_context: None,
            query_params: (!query_params.is_empty()).then_some(query_params),
            key: None,
        })
    }
}

/// History wrapper that records a page view, then pushes.
struct RecordingHistory {
    original: Arc<dyn HistoryApi>,
    recorder: Weak<Inner>,
}

impl HistoryApi for RecordingHistory {
    fn push_state(&self, state: Value, url: Option<&str>) {
        if let Some(inner) = self.recorder.upgrade() {
            inner.handle_page_view(url.unwrap_or_default());
        }
        self.original.push_state(state, url);
    }
}
