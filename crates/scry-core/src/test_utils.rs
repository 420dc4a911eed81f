//! Test doubles shared by the recorder crates.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use crate::clock::ManualClock;
use crate::host::{Window, WindowBuilder};
use crate::sync::lock;
use crate::transport::{HttpMethod, Transport, TransportError, TransportRequest, TransportResponse};

#[derive(Debug, Clone)]
pub enum MockReply {
    Status(u16, Value),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: HttpMethod,
    path_suffix: String,
    reply: MockReply,
}

/// In-memory [`Transport`] that records every request and answers from a
/// table of routes (latest registration wins). Unrouted requests get `201 {}`.
#[derive(Debug, Default)]
pub struct MockTransport {
    requests: Mutex<Vec<TransportRequest>>,
    routes: Mutex<Vec<Route>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer requests whose path ends with `path_suffix` with `status`/`data`.
    pub fn respond(&self, method: HttpMethod, path_suffix: &str, status: u16, data: Value) {
        self.route(method, path_suffix, MockReply::Status(status, data));
    }

    /// Fail requests whose path ends with `path_suffix`.
    pub fn fail(&self, method: HttpMethod, path_suffix: &str, message: &str) {
        self.route(method, path_suffix, MockReply::Fail(message.to_string()));
    }

    fn route(&self, method: HttpMethod, path_suffix: &str, reply: MockReply) {
        lock(&self.routes).push(Route {
            method,
            path_suffix: path_suffix.to_string(),
            reply,
        });
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        lock(&self.requests).clone()
    }

    pub fn requests_to(&self, path_suffix: &str) -> Vec<TransportRequest> {
        lock(&self.requests)
            .iter()
            .filter(|r| r.path.ends_with(path_suffix))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.requests).clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let reply = lock(&self.routes)
            .iter()
            .rev()
            .find(|route| route.method == request.method && request.path.ends_with(&route.path_suffix))
            .map(|route| route.reply.clone())
            .unwrap_or_else(|| MockReply::Status(201, json!({})));

        lock(&self.requests).push(request);

        match reply {
            MockReply::Status(status, data) => Ok(TransportResponse::new(status, data)),
            MockReply::Fail(message) => Err(TransportError::Unavailable(message)),
        }
    }
}

/// A window at `href` whose timestamps come from the returned manual clock.
pub fn test_window(href: &str) -> (Arc<Window>, Arc<ManualClock>) {
    test_window_with(Window::builder(href))
}

pub fn test_window_with(builder: WindowBuilder) -> (Arc<Window>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let window = builder
        .clock(clock.clone())
        .build()
        .unwrap_or_else(|e| panic!("invalid test window: {}", e));
    (window, clock)
}
