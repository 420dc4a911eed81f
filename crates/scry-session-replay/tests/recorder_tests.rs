use scry_core::test_utils::MockTransport;
use scry_core::{
    CaptureStream, FlushOutcome, HttpMethod, MaskingLevel, ReplayRecordingSettings, SessionId,
};
use scry_session_replay::{
    EmitHook, NoopReplayCapture, RecordOptions, ReplayCapture, ReplayError, ReplayRecorder,
    StopHandle,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Capture routine driven by the test: it hands out its emit hook and
/// counts teardowns.
#[derive(Default)]
struct ScriptedCapture {
    emit: Mutex<Option<EmitHook>>,
    options: Mutex<Option<RecordOptions>>,
    stops: Arc<AtomicUsize>,
    refuse: bool,
}

impl ScriptedCapture {
    fn emit(&self, event: serde_json::Value) {
        let hook = self.emit.lock().unwrap().clone().expect("capture not started");
        hook(event);
    }
}

impl ReplayCapture for ScriptedCapture {
    fn record(&self, options: RecordOptions, emit: EmitHook) -> Result<StopHandle, ReplayError> {
        if self.refuse {
            return Err(ReplayError::Unavailable("no document".to_string()));
        }
        *self.options.lock().unwrap() = Some(options);
        *self.emit.lock().unwrap() = Some(emit);
        let stops = self.stops.clone();
        Ok(Box::new(move || {
            stops.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

fn settings(max_retained_events: usize) -> ReplayRecordingSettings {
    ReplayRecordingSettings {
        enabled: true,
        max_retained_events,
    }
}

fn recorder(
    level: MaskingLevel,
    max_retained_events: usize,
) -> (ReplayRecorder, Arc<ScriptedCapture>, Arc<MockTransport>) {
    let capture = Arc::new(ScriptedCapture::default());
    let transport = MockTransport::new();
    let recorder = ReplayRecorder::new(
        transport.clone(),
        capture.clone(),
        level,
        &settings(max_retained_events),
        Duration::from_secs(2),
    );
    (recorder, capture, transport)
}

#[tokio::test]
async fn test_start_passes_masking_options_and_buffers_events() {
    let (recorder, capture, _) = recorder(MaskingLevel::InputPasswordOrEmailAndTextarea, 100);
    recorder.start();

    let options = capture.options.lock().unwrap().clone().unwrap();
    assert_eq!(options.block_class, "scry-block");
    assert!(!options.mask_all_inputs);
    assert!(options.mask_input_options.unwrap().email);

    capture.emit(json!({"type": 2, "timestamp": 1}));
    capture.emit(json!({"type": 3, "timestamp": 2}));

    assert_eq!(recorder.buffered().len(), 2);
    assert!(recorder.is_running());
    recorder.stop();
}

#[tokio::test]
async fn test_flush_patches_data_envelope_and_clears_buffer() {
    let (recorder, capture, transport) = recorder(MaskingLevel::All, 100);
    recorder.start();
    recorder.set_session_id(SessionId::from("sess-9"));
    capture.emit(json!({"type": 4}));

    let outcome = recorder.flush().await;

    assert!(matches!(outcome, FlushOutcome::Delivered { events: 1, .. }));
    let sent = transport.requests_to("/recording");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, HttpMethod::Patch);
    assert_eq!(sent[0].path, "/public/captured-sessions/sess-9/recording");
    assert_eq!(sent[0].body, Some(json!({"data": [{"type": 4}]})));
    assert!(recorder.buffered().is_empty());
    recorder.stop();
}

#[tokio::test]
async fn test_failed_flush_retains_events_for_next_attempt() {
    let (recorder, capture, transport) = recorder(MaskingLevel::All, 100);
    transport.respond(HttpMethod::Patch, "/recording", 500, json!("boom"));
    recorder.start();
    recorder.set_session_id(SessionId::from("s"));
    capture.emit(json!({"n": 1}));
    capture.emit(json!({"n": 2}));

    let outcome = recorder.flush().await;
    assert_eq!(outcome, FlushOutcome::Failed { events: 2, retained: true });

    capture.emit(json!({"n": 3}));
    transport.respond(HttpMethod::Patch, "/recording", 200, json!({}));
    recorder.flush().await;

    let sent = transport.requests_to("/recording");
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].body, Some(json!({"data": [{"n": 1}, {"n": 2}, {"n": 3}]})));
    assert!(recorder.buffered().is_empty());
    recorder.stop();
}

#[tokio::test]
async fn test_transport_error_also_retains() {
    let (recorder, capture, transport) = recorder(MaskingLevel::None, 100);
    transport.fail(HttpMethod::Patch, "/recording", "offline");
    recorder.start();
    recorder.set_session_id(SessionId::from("s"));
    capture.emit(json!({"n": 1}));

    recorder.flush().await;

    assert_eq!(recorder.buffered(), vec![json!({"n": 1})]);
    recorder.stop();
}

#[tokio::test]
async fn test_retention_is_bounded() {
    let (recorder, capture, _) = recorder(MaskingLevel::All, 3);
    recorder.start();
    for n in 0..5 {
        capture.emit(json!({"n": n}));
    }

    assert_eq!(
        recorder.buffered(),
        vec![json!({"n": 2}), json!({"n": 3}), json!({"n": 4})]
    );
    recorder.stop();
}

#[tokio::test]
async fn test_no_flush_without_session() {
    let (recorder, capture, transport) = recorder(MaskingLevel::All, 100);
    recorder.start();
    capture.emit(json!({"n": 1}));

    assert_eq!(recorder.flush().await, FlushOutcome::Skipped);
    assert!(transport.requests().is_empty());
    assert_eq!(recorder.buffered().len(), 1);
    recorder.stop();
}

#[tokio::test]
async fn test_stop_tears_capture_down_once() {
    let (recorder, capture, _) = recorder(MaskingLevel::All, 100);
    recorder.start();
    recorder.start();

    recorder.stop();
    recorder.stop();

    assert_eq!(capture.stops.load(Ordering::SeqCst), 1);
    assert!(!recorder.is_running());
}

#[tokio::test]
async fn test_capture_refusal_leaves_recorder_stopped() {
    let capture = Arc::new(ScriptedCapture {
        refuse: true,
        ..Default::default()
    });
    let recorder = ReplayRecorder::new(
        MockTransport::new(),
        capture.clone(),
        MaskingLevel::All,
        &settings(10),
        Duration::from_secs(2),
    );

    recorder.start();

    assert!(!recorder.is_running());
    assert!(capture.emit.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_disabled_recorder_never_records() {
    let capture = Arc::new(ScriptedCapture::default());
    let recorder = ReplayRecorder::new(
        MockTransport::new(),
        capture.clone(),
        MaskingLevel::All,
        &ReplayRecordingSettings {
            enabled: false,
            max_retained_events: 10,
        },
        Duration::from_secs(2),
    );

    recorder.start();

    assert!(!recorder.is_running());
    assert!(capture.options.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_noop_capture_runs_empty() {
    let recorder = ReplayRecorder::new(
        MockTransport::new(),
        Arc::new(NoopReplayCapture),
        MaskingLevel::All,
        &settings(10),
        Duration::from_secs(2),
    );

    recorder.start();
    assert!(recorder.is_running());
    assert!(recorder.buffered().is_empty());
    recorder.stop();
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_flush_delivers_buffered_events() {
    let (recorder, capture, transport) = recorder(MaskingLevel::All, 100);
    recorder.start();
    recorder.set_session_id(SessionId::from("s"));
    capture.emit(json!({"n": 1}));

    tokio::time::sleep(Duration::from_millis(2_100)).await;

    assert_eq!(transport.requests_to("/recording").len(), 1);
    recorder.stop();
}
