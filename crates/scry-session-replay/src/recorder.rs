//! Replay recorder

use scry_core::endpoints;
use scry_core::sync::lock;
use scry_core::{
    flush_buffer, CaptureStream, Envelope, EventBuffer, FlushOutcome, FlushPolicy, FlushTarget,
    HttpMethod, MaskingLevel, RecurringTask, ReplayRecordingSettings, SessionId, SessionSlot,
    Transport,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::capture::{ReplayCapture, ReplayEvent, StopHandle};
use crate::options::RecordOptions;

pub const RECORDING_TARGET: FlushTarget = FlushTarget {
    stream: "session recording",
    method: HttpMethod::Patch,
    endpoint: endpoints::recording,
    policy: FlushPolicy::RetainOnFailure,
    envelope: Envelope::Data,
    expected_status: None,
};

struct Inner {
    transport: Arc<dyn Transport>,
    capture: Arc<dyn ReplayCapture>,
    masking_level: MaskingLevel,
    enabled: bool,
    flush_interval: Duration,
    buffer: EventBuffer<ReplayEvent>,
    session: SessionSlot,
    running: AtomicBool,
    stop_handle: Mutex<Option<StopHandle>>,
    flush_task: Mutex<Option<RecurringTask>>,
}

/// Buffers replay events from a [`ReplayCapture`] and delivers them.
#[derive(Clone)]
pub struct ReplayRecorder {
    inner: Arc<Inner>,
}

impl ReplayRecorder {
    pub fn new(
        transport: Arc<dyn Transport>,
        capture: Arc<dyn ReplayCapture>,
        masking_level: MaskingLevel,
        settings: &ReplayRecordingSettings,
        flush_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                capture,
                masking_level,
                enabled: settings.enabled,
                flush_interval,
                buffer: EventBuffer::bounded(settings.max_retained_events),
                session: SessionSlot::new(),
                running: AtomicBool::new(false),
                stop_handle: Mutex::new(None),
                flush_task: Mutex::new(None),
            }),
        }
    }

    pub fn record_options(&self) -> RecordOptions {
        RecordOptions::for_masking_level(self.inner.masking_level)
    }

    pub fn buffered(&self) -> Vec<ReplayEvent> {
        self.inner.buffer.snapshot()
    }

    pub async fn flush(&self) -> FlushOutcome {
        self.inner.flush().await
    }
}

impl CaptureStream for ReplayRecorder {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn start(&self) {
        let inner = &self.inner;
        if !inner.enabled || inner.running.swap(true, Ordering::SeqCst) {
            return;
        }
        inner.buffer.clear();

        let weak = Arc::downgrade(inner);
        let emit_target = weak.clone();
        let emit = Arc::new(move |event: ReplayEvent| {
            if let Some(inner) = emit_target.upgrade() {
                inner.push(event);
            }
        });

        match inner.capture.record(self.record_options(), emit) {
            Ok(stop) => *lock(&inner.stop_handle) = Some(stop),
            Err(e) => {
                error!("Failed to start session replay capture: {}", e);
                inner.running.store(false, Ordering::SeqCst);
                return;
            }
        }

        let task = RecurringTask::spawn("session recording flush", inner.flush_interval, move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.flush().await;
                }
            }
        });
        match task {
            Ok(task) => *lock(&inner.flush_task) = Some(task),
            Err(e) => error!("Failed to schedule session recording flush: {}", e),
        }
        debug!("Replay recorder started (masking level {})", inner.masking_level.as_str());
    }

    fn stop(&self) {
        let inner = &self.inner;
        inner.running.store(false, Ordering::SeqCst);
        let stop = lock(&inner.stop_handle).take();
        if let Some(stop) = stop {
            stop();
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
    async fn flush(&self) -> FlushOutcome {
        flush_buffer(&RECORDING_TARGET, &self.buffer, &self.session, self.transport.as_ref()).await
    }

    fn push(&self, event: ReplayEvent) {
        let evicted = self.buffer.push(event);
        if evicted > 0 {
            warn!(
                "Session recording buffer is full ({} events), dropped {} oldest",
                self.buffer.limit().unwrap_or_default(),
                evicted
            );
        }
    }
}
