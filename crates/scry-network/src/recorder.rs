//! Network recorder

use scry_core::endpoints::{self, CAPTURED_SESSIONS_PATH};
use scry_core::host::{Body, FetchApi, Request, Response, Window, XhrApi, XmlHttpRequest};
use scry_core::sync::lock;
use scry_core::{
    flush_buffer, generate_request_id, CaptureStream, Envelope, EventBuffer, FlushOutcome,
    FlushPolicy, FlushTarget, HttpMethod, Interceptor, NetworkRecordingSettings, RecurringTask,
    SessionId, SessionSlot, Transport,
};
use scry_privacy::{filter_headers, limit_body, sanitize_url, UNREADABLE_RESPONSE_BODY, UNSERIALIZABLE_BODY};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error};

use crate::interceptors::{RecordingFetch, RecordingXhr};
use crate::types::{NetworkRequest, RequestType, XhrMetadata};

pub const NETWORK_REQUESTS_TARGET: FlushTarget = FlushTarget {
    stream: "network requests",
    method: HttpMethod::Post,
    endpoint: endpoints::network_requests,
    policy: FlushPolicy::DropOnFailure,
    envelope: Envelope::Array,
    expected_status: Some(201),
};

pub(crate) struct Inner {
    pub(crate) window: Arc<Window>,
    transport: Arc<dyn Transport>,
    settings: NetworkRecordingSettings,
    flush_interval: Duration,
    buffer: EventBuffer<NetworkRequest>,
    pending: Mutex<HashMap<String, NetworkRequest>>,
    session: SessionSlot,
    running: AtomicBool,
    fetch: Interceptor<dyn FetchApi>,
    xhr: Interceptor<dyn XhrApi>,
    flush_task: Mutex<Option<RecurringTask>>,
}

/// Records `fetch` and `XMLHttpRequest` traffic made by the page.
#[derive(Clone)]
pub struct NetworkRecorder {
    inner: Arc<Inner>,
}

impl NetworkRecorder {
    /// The fetch and XHR implementations in place now are the ones restored
    /// on stop.
    pub fn new(
        window: Arc<Window>,
        transport: Arc<dyn Transport>,
        settings: NetworkRecordingSettings,
        flush_interval: Duration,
    ) -> Self {
        let fetch = Interceptor::capture(window.fetch.clone());
        let xhr = Interceptor::capture(window.xhr.clone());
        Self {
            inner: Arc::new(Inner {
                window,
                transport,
                settings,
                flush_interval,
                buffer: EventBuffer::new(),
                pending: Mutex::new(HashMap::new()),
                session: SessionSlot::new(),
                running: AtomicBool::new(false),
                fetch,
                xhr,
                flush_task: Mutex::new(None),
            }),
        }
    }

    pub fn should_capture(&self, url: &str) -> bool {
        self.inner.should_capture(url)
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    pub fn buffered(&self) -> Vec<NetworkRequest> {
        self.inner.buffer.snapshot()
    }

    pub async fn flush(&self) -> FlushOutcome {
        self.inner.flush().await
    }
}

impl CaptureStream for NetworkRecorder {
    fn name(&self) -> &'static str {
        "network"
    }

    fn start(&self) {
        let inner = &self.inner;
        if !inner.settings.enabled || inner.running.swap(true, Ordering::SeqCst) {
            return;
        }
        inner.buffer.clear();

        let weak = Arc::downgrade(inner);
        inner.fetch.install(Arc::new(RecordingFetch {
            original: inner.fetch.original(),
            recorder: weak.clone(),
        }));
        inner.xhr.install(Arc::new(RecordingXhr {
            original: inner.xhr.original(),
            recorder: weak.clone(),
        }));

        let task = RecurringTask::spawn("network requests flush", inner.flush_interval, move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.flush().await;
                }
            }
        });
        match task {
            Ok(task) => *lock(&inner.flush_task) = Some(task),
            Err(e) => error!("Failed to schedule network requests flush: {}", e),
        }
        debug!("Network recorder started");
    }

    fn stop(&self) {
        let inner = &self.inner;
        inner.running.store(false, Ordering::SeqCst);
        inner.fetch.uninstall();
        inner.xhr.uninstall();
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
        flush_buffer(&NETWORK_REQUESTS_TARGET, &self.buffer, &self.session, self.transport.as_ref()).await
    }

    pub(crate) fn now(&self) -> i64 {
        self.window.now_millis()
    }

    pub(crate) fn should_capture(&self, url: &str) -> bool {
        if !self.running.load(Ordering::SeqCst) || !self.settings.enabled {
            return false;
        }
        let Ok(resolved) = self.window.location().join(url) else {
            return false;
        };
        if resolved.path().contains(CAPTURED_SESSIONS_PATH) {
            return false;
        }
        let host = resolved.host_str().unwrap_or_default();
        !self
            .settings
            .exclude_domains
            .iter()
            .any(|domain| host.contains(domain.as_str()))
    }

    pub(crate) fn sanitize(&self, url: &str) -> String {
        sanitize_url(url, Some(&self.window.location()))
    }

    fn headers<'a, I>(&self, headers: I) -> Option<BTreeMap<String, String>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if !self.settings.capture_headers {
            return None;
        }
        let filtered = filter_headers(headers, &self.settings.exclude_headers);
        (!filtered.is_empty()).then_some(filtered)
    }

    fn request_body(&self, body: Option<&Body>) -> Option<String> {
        if !self.settings.capture_request_bodies {
            return None;
        }
        let text = body?
            .to_text()
            .unwrap_or_else(|| UNSERIALIZABLE_BODY.to_string());
        limit_body(
            Some(&text),
            self.settings.max_request_body_size,
            self.settings.request_body_masking_function.as_ref(),
        )
    }

    fn response_body(&self, text: Option<String>) -> Option<String> {
        if !self.settings.capture_response_bodies {
            return None;
        }
        match text {
            Some(text) => limit_body(
                Some(&text),
                self.settings.max_response_body_size,
                self.settings.response_body_masking_function.as_ref(),
            ),
            None => Some(UNREADABLE_RESPONSE_BODY.to_string()),
        }
    }

    fn begin(&self, record: &NetworkRequest) {
        lock(&self.pending).insert(record.request_id.clone(), record.clone());
    }

    /// Buffered in completion order; `timestamp` stays the start time.
    fn complete(&self, record: NetworkRequest) {
        lock(&self.pending).remove(&record.request_id);
        self.buffer.push(record);
    }

    /// Pending record for a fetch about to be sent.
    pub(crate) fn begin_fetch(&self, request: &Request, request_id: String, timestamp: i64) -> NetworkRequest {
        let mut record = NetworkRequest::pending(
            request_id,
            RequestType::Fetch,
            request.method.to_uppercase(),
            self.sanitize(&request.url),
            timestamp,
        );
        record.request_headers = self.headers(request.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        record.request_body = self.request_body(request.body.as_ref());
        self.begin(&record);
        record
    }

    pub(crate) fn complete_fetch(&self, mut record: NetworkRequest, result: Result<&Response, &str>) {
        record.duration = Some(self.now() - record.timestamp);
        match result {
            Ok(response) => {
                record.response_status = Some(response.status);
                record.response_headers =
                    self.headers(response.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                record.response_body = self.response_body(response.text());
            }
            Err(message) => record.error = Some(message.to_string()),
        }
        self.complete(record);
    }

    /// Metadata for an XHR being opened, or `None` when it is not captured.
    pub(crate) fn open_xhr(&self, method: &str, url: &str) -> Option<XhrMetadata> {
        if !self.should_capture(url) {
            return None;
        }
        let timestamp = self.now();
        Some(XhrMetadata {
            request_id: generate_request_id(timestamp),
            timestamp,
            method: method.to_uppercase(),
            url: self.sanitize(url),
        })
    }

    pub(crate) fn begin_xhr(&self, meta: &XhrMetadata, xhr: &XmlHttpRequest, body: Option<&Body>) {
        let mut record = NetworkRequest::pending(
            meta.request_id.clone(),
            RequestType::Xhr,
            meta.method.clone(),
            meta.url.clone(),
            meta.timestamp,
        );
        let request_headers = xhr.request_headers();
        record.request_headers = self.headers(request_headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        record.request_body = self.request_body(body);
        self.begin(&record);
    }

    pub(crate) fn complete_xhr(&self, request_id: &str, xhr: &XmlHttpRequest) {
        let Some(mut record) = lock(&self.pending).remove(request_id) else {
            return;
        };
        record.duration = Some(self.now() - record.timestamp);

        let status = xhr.status();
        record.response_status = Some(status);
        let raw_headers = xhr.get_all_response_headers();
        record.response_headers = self.headers(raw_headers.split("\r\n").filter_map(|line| {
            let mut parts = line.split(": ");
            match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(value), None) => Some((name, value)),
                _ => None,
            }
        }));
        record.response_body = self.response_body(Some(xhr.response_text()));
        if status == 0 {
            record.error = Some("Network error".to_string());
        }
        self.buffer.push(record);
    }
}
