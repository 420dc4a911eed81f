//! Error recorder

use scry_core::endpoints;
use scry_core::host::{
    ConsoleLevel, ConsoleMethod, DomEvent, ErrorEvent, EventKind, JsValue, ListenerId,
    RejectionEvent, Window,
};
use scry_core::sync::lock;
use scry_core::{
    flush_buffer, CaptureResult, CaptureStream, Envelope, EventBuffer, FlushOutcome, FlushPolicy,
    FlushTarget, HttpMethod, Interceptor, RecurringTask, SessionId, SessionSlot, Transport,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::{debug, error};

use crate::types::{ConsoleError, ErrorType};

pub const CONSOLE_ERRORS_TARGET: FlushTarget = FlushTarget {
    stream: "console errors",
    method: HttpMethod::Post,
    endpoint: endpoints::console_errors,
    policy: FlushPolicy::DropOnFailure,
    envelope: Envelope::Array,
    expected_status: None,
};

/// Text of one console argument: JSON for objects, `Name: message` for
/// errors, the string form for everything else.
pub fn serialize_console_arg(arg: &JsValue) -> CaptureResult<String> {
    Ok(match arg {
        JsValue::Object(value) => serde_json::to_string(value)?,
        other => other.to_string(),
    })
}

struct Inner {
    window: Arc<Window>,
    transport: Arc<dyn Transport>,
    enabled: bool,
    flush_interval: Duration,
    buffer: EventBuffer<ConsoleError>,
    session: SessionSlot,
    running: AtomicBool,
    console_error: Interceptor<dyn ConsoleMethod>,
    console_warn: Interceptor<dyn ConsoleMethod>,
    listeners: Mutex<Vec<ListenerId>>,
    flush_task: Mutex<Option<RecurringTask>>,
}

/// Records console errors and warnings, uncaught errors and unhandled
/// promise rejections.
#[derive(Clone)]
pub struct ErrorRecorder {
    inner: Arc<Inner>,
}

impl ErrorRecorder {
    /// The console methods in place now are the ones restored on stop.
    pub fn new(window: Arc<Window>, transport: Arc<dyn Transport>, enabled: bool, flush_interval: Duration) -> Self {
        let console_error = Interceptor::capture(window.console.slot(ConsoleLevel::Error).clone());
        let console_warn = Interceptor::capture(window.console.slot(ConsoleLevel::Warn).clone());
        Self {
            inner: Arc::new(Inner {
                window,
                transport,
                enabled,
                flush_interval,
                buffer: EventBuffer::new(),
                session: SessionSlot::new(),
                running: AtomicBool::new(false),
                console_error,
                console_warn,
                listeners: Mutex::new(Vec::new()),
                flush_task: Mutex::new(None),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    pub async fn flush(&self) -> FlushOutcome {
        self.inner.flush().await
    }

    pub fn buffered(&self) -> Vec<ConsoleError> {
        self.inner.buffer.snapshot()
    }
}

impl CaptureStream for ErrorRecorder {
    fn name(&self) -> &'static str {
        "error"
    }

    fn start(&self) {
        let inner = &self.inner;
        if !inner.enabled || inner.running.swap(true, Ordering::SeqCst) {
            return;
        }
        inner.buffer.clear();

        let weak = Arc::downgrade(inner);
        for (interceptor, error_type) in [
            (&inner.console_error, ErrorType::ConsoleError),
            (&inner.console_warn, ErrorType::ConsoleWarn),
        ] {
            interceptor.install(Arc::new(RecordingConsole {
                original: interceptor.original(),
                recorder: weak.clone(),
                error_type,
            }));
        }

        let mut listeners = lock(&inner.listeners);
        for kind in [EventKind::Error, EventKind::UnhandledRejection] {
            let weak = weak.clone();
            listeners.push(inner.window.add_event_listener(
                kind,
                Arc::new(move |event: &DomEvent| {
                    if let Some(inner) = weak.upgrade() {
                        inner.handle_window_event(event);
                    }
                }),
            ));
        }
        drop(listeners);

        let task = RecurringTask::spawn("console errors flush", inner.flush_interval, move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.flush().await;
                }
            }
        });
        match task {
            Ok(task) => *lock(&inner.flush_task) = Some(task),
            Err(e) => error!("Failed to schedule console errors flush: {}", e),
        }
        debug!("Error recorder started");
    }

    fn stop(&self) {
        let inner = &self.inner;
        inner.running.store(false, Ordering::SeqCst);
        inner.console_error.uninstall();
        inner.console_warn.uninstall();
        for id in lock(&inner.listeners).drain(..) {
            inner.window.remove_event_listener(id);
        }
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
        flush_buffer(&CONSOLE_ERRORS_TARGET, &self.buffer, &self.session, self.transport.as_ref()).await
    }

    fn capture_console(&self, error_type: ErrorType, args: &[JsValue]) {
        if !self.is_running() {
            return;
        }
        match self.console_entry(error_type, args) {
            Ok(entry) => {
                self.buffer.push(entry);
            }
            Err(e) => error!("Failed to capture console error: {}", e),
        }
    }

    fn console_entry(&self, error_type: ErrorType, args: &[JsValue]) -> CaptureResult<ConsoleError> {
        let message = args
            .iter()
            .map(serialize_console_arg)
            .collect::<CaptureResult<Vec<_>>>()?
            .join(" ");
        let stack = args
            .first()
            .and_then(JsValue::as_error)
            .and_then(|e| e.stack.clone());
        Ok(ConsoleError {
            error_type,
            message,
            stack,
            timestamp: self.window.now_millis(),
            source: None,
        })
    }

    fn handle_window_event(&self, event: &DomEvent) {
        if !self.is_running() {
            return;
        }
        let entry = match event {
            DomEvent::Error(error) => self.uncaught_error(error),
            DomEvent::UnhandledRejection(rejection) => self.unhandled_rejection(rejection),
            _ => return,
        };
        self.buffer.push(entry);
    }

    fn uncaught_error(&self, event: &ErrorEvent) -> ConsoleError {
        ConsoleError {
            error_type: ErrorType::UncaughtError,
            message: event.message.clone(),
            stack: event
                .error
                .as_ref()
                .and_then(JsValue::as_error)
                .and_then(|e| e.stack.clone()),
            timestamp: self.window.now_millis(),
            source: (!event.filename.is_empty())
                .then(|| format!("{}:{}:{}", event.filename, event.lineno, event.colno)),
        }
    }

    fn unhandled_rejection(&self, event: &RejectionEvent) -> ConsoleError {
        let (message, stack) = match event.reason.as_error() {
            Some(error) => (error.message.clone(), error.stack.clone()),
            None => (event.reason.to_string(), None),
        };
        ConsoleError {
            error_type: ErrorType::UnhandledRejection,
            message,
            stack,
            timestamp: self.window.now_millis(),
            source: None,
        }
    }
}

/// Console method wrapper: record, then delegate.
struct RecordingConsole {
    original: Arc<dyn ConsoleMethod>,
    recorder: Weak<Inner>,
    error_type: ErrorType,
}

impl ConsoleMethod for RecordingConsole {
    fn call(&self, args: &[JsValue]) {
        if let Some(inner) = self.recorder.upgrade() {
            inner.capture_console(self.error_type, args);
        }
        self.original.call(args);
    }
}
