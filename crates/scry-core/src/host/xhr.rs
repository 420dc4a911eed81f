//! `XMLHttpRequest` instances and the open/send capability.
//!
//! Instances hold their own state; the shared [`XhrApi`] slot decides what
//! `open` and `send` do. Completion is driven through [`XmlHttpRequest::respond`]
//! and [`XmlHttpRequest::fail`] by whatever backs the request.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use super::fetch::{Body, Headers};
use crate::sync::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    Unsent = 0,
    Opened = 1,
    HeadersReceived = 2,
    Loading = 3,
    Done = 4,
}

pub type ReadyStateHandler = Arc<dyn Fn(&XmlHttpRequest) + Send + Sync>;

#[derive(Debug)]
struct XhrState {
    ready_state: ReadyState,
    method: String,
    url: String,
    request_headers: Headers,
    body: Option<Body>,
    sent: bool,
    status: u16,
    response_headers: Headers,
    response_text: String,
}

impl Default for XhrState {
    fn default() -> Self {
        Self {
            ready_state: ReadyState::Unsent,
            method: String::new(),
            url: String::new(),
            request_headers: Vec::new(),
            body: None,
            sent: false,
            status: 0,
            response_headers: Vec::new(),
            response_text: String::new(),
        }
    }
}

#[derive(Default)]
pub struct XmlHttpRequest {
    state: Mutex<XhrState>,
    on_ready_state_change: Mutex<Option<ReadyStateHandler>>,
    extensions: Mutex<http::Extensions>,
}

impl XmlHttpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready_state(&self) -> ReadyState {
        lock(&self.state).ready_state
    }

    pub fn status(&self) -> u16 {
        lock(&self.state).status
    }

    pub fn method(&self) -> String {
        lock(&self.state).method.clone()
    }

    pub fn url(&self) -> String {
        lock(&self.state).url.clone()
    }

    pub fn is_sent(&self) -> bool {
        lock(&self.state).sent
    }

    pub fn body(&self) -> Option<Body> {
        lock(&self.state).body.clone()
    }

    pub fn set_request_header(&self, name: &str, value: &str) {
        lock(&self.state)
            .request_headers
            .push((name.to_string(), value.to_string()));
    }

    pub fn request_headers(&self) -> Headers {
        lock(&self.state).request_headers.clone()
    }

    pub fn response_text(&self) -> String {
        lock(&self.state).response_text.clone()
    }

    pub fn response_headers(&self) -> Headers {
        lock(&self.state).response_headers.clone()
    }

    /// `name: value` lines joined by CRLF, as `getAllResponseHeaders()`.
    pub fn get_all_response_headers(&self) -> String {
        lock(&self.state)
            .response_headers
            .iter()
            .map(|(k, v)| format!("{}: {}\r\n", k.to_ascii_lowercase(), v))
            .collect()
    }

    pub fn on_ready_state_change(&self) -> Option<ReadyStateHandler> {
        lock(&self.on_ready_state_change).clone()
    }

    pub fn set_on_ready_state_change(&self, handler: Option<ReadyStateHandler>) {
        *lock(&self.on_ready_state_change) = handler;
    }

    /// Per-instance slots for whoever instruments the request.
    pub fn extensions(&self) -> MutexGuard<'_, http::Extensions> {
        lock(&self.extensions)
    }

    fn transition(&self, next: ReadyState) {
        lock(&self.state).ready_state = next;
        // Handlers run without any lock held; they read state back.
        if let Some(handler) = self.on_ready_state_change() {
            handler(self);
        }
    }

    pub(crate) fn open_native(&self, method: &str, url: &str) {
        {
            let mut state = lock(&self.state);
            *state = XhrState {
                method: method.to_uppercase(),
                url: url.to_string(),
                ..XhrState::default()
            };
        }
        self.transition(ReadyState::Opened);
    }

    pub(crate) fn send_native(&self, body: Option<Body>) {
        let mut state = lock(&self.state);
        state.sent = true;
        state.body = body;
    }

    /// Complete the request with a response.
    pub fn respond(&self, status: u16, headers: &[(&str, &str)], body: &str) {
        {
            let mut state = lock(&self.state);
            state.status = status;
            state.response_headers = headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            state.response_text = body.to_string();
        }
        self.transition(ReadyState::HeadersReceived);
        self.transition(ReadyState::Loading);
        self.transition(ReadyState::Done);
    }

    /// Complete the request with a network failure (status 0).
    pub fn fail(&self) {
        {
            let mut state = lock(&self.state);
            state.status = 0;
            state.response_headers.clear();
            state.response_text.clear();
        }
        self.transition(ReadyState::Done);
    }
}

impl fmt::Debug for XmlHttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlHttpRequest")
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

/// The shared `open`/`send` pair.
pub trait XhrApi: Send + Sync {
    fn open(&self, xhr: &XmlHttpRequest, method: &str, url: &str);
    fn send(&self, xhr: &XmlHttpRequest, body: Option<Body>);
}

#[derive(Debug, Default)]
pub struct NativeXhr;

impl XhrApi for NativeXhr {
    fn open(&self, xhr: &XmlHttpRequest, method: &str, url: &str) {
        xhr.open_native(method, url);
    }

    fn send(&self, xhr: &XmlHttpRequest, body: Option<Body>) {
        xhr.send_native(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_fires_handler_per_transition() {
        let xhr = XmlHttpRequest::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        xhr.set_on_ready_state_change(Some(Arc::new(move |x: &XmlHttpRequest| {
            lock(&sink).push((x.ready_state(), x.status()));
        })));

        NativeXhr.open(&xhr, "get", "/api/data");
        NativeXhr.send(&xhr, None);
        xhr.respond(200, &[("Content-Type", "application/json")], "{}");

        assert_eq!(xhr.method(), "GET");
        assert!(xhr.is_sent());
        assert_eq!(xhr.get_all_response_headers(), "content-type: application/json\r\n");
        assert_eq!(
            *lock(&seen),
            vec![
                (ReadyState::Opened, 0),
                (ReadyState::HeadersReceived, 200),
                (ReadyState::Loading, 200),
                (ReadyState::Done, 200),
            ]
        );
    }

    #[test]
    fn test_extensions_carry_typed_metadata() {
        #[derive(Clone, Debug, PartialEq)]
        struct Tag(&'static str);

        let xhr = XmlHttpRequest::new();
        xhr.extensions().insert(Tag("meta"));
        assert_eq!(xhr.extensions().get::<Tag>(), Some(&Tag("meta")));
    }
}
