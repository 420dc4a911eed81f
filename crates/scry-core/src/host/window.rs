//! The window environment handle.

use serde_json::Value;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use url::Url;

use super::console::Console;
use super::dom::Document;
use super::events::{DomEvent, EventKind, EventListener, EventListeners, ListenerId};
use super::fetch::{Body, FetchApi, FetchError, FetchInput, RequestInit, ReqwestFetch, Response};
use super::history::{HistoryApi, NativeHistory};
use super::xhr::{NativeXhr, XhrApi, XmlHttpRequest};
use crate::capability::CapabilitySlot;
use crate::clock::{Clock, SystemClock};
use crate::sync::{read, write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    pub user_agent: String,
    pub language: String,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            user_agent: format!("Scry/{}", env!("CARGO_PKG_VERSION")),
            language: "en-US".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

pub struct Window {
    location: Arc<RwLock<Url>>,
    document: RwLock<Document>,
    navigator: Navigator,
    timezone: String,
    referrer: String,
    viewport: Viewport,
    clock: Arc<dyn Clock>,
    listeners: EventListeners,
    pub console: Console,
    pub fetch: Arc<CapabilitySlot<dyn FetchApi>>,
    pub xhr: Arc<CapabilitySlot<dyn XhrApi>>,
    pub history: Arc<CapabilitySlot<dyn HistoryApi>>,
}

impl Window {
    pub fn builder(href: &str) -> WindowBuilder {
        WindowBuilder::new(href)
    }

    pub fn location(&self) -> Url {
        read(&self.location).clone()
    }

    pub fn href(&self) -> String {
        read(&self.location).to_string()
    }

    /// Shared location handle, for capabilities that resolve or update it.
    pub fn location_handle(&self) -> Arc<RwLock<Url>> {
        self.location.clone()
    }

    pub fn set_location(&self, url: Url) {
        *write(&self.location) = url;
    }

    pub fn document(&self) -> RwLockReadGuard<'_, Document> {
        read(&self.document)
    }

    pub fn document_mut(&self) -> RwLockWriteGuard<'_, Document> {
        write(&self.document)
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn referrer(&self) -> &str {
        &self.referrer
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn add_event_listener(&self, kind: EventKind, listener: EventListener) -> ListenerId {
        self.listeners.add(kind, listener)
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.count(kind)
    }

    /// Deliver an event to listeners. The document lock must not be held by
    /// the caller, since listeners read it.
    pub fn dispatch_event(&self, event: &DomEvent) -> usize {
        self.listeners.dispatch(event)
    }

    /// `fetch(input, init)` through the installed capability.
    pub async fn fetch(&self, input: impl Into<FetchInput>, init: Option<RequestInit>) -> Result<Response, FetchError> {
        let api = self.fetch.current();
        api.fetch(input.into(), init).await
    }

    pub fn xhr_open(&self, xhr: &XmlHttpRequest, method: &str, url: &str) {
        self.xhr.current().open(xhr, method, url);
    }

    pub fn xhr_send(&self, xhr: &XmlHttpRequest, body: Option<Body>) {
        self.xhr.current().send(xhr, body);
    }

    pub fn push_state(&self, state: Value, url: Option<&str>) {
        self.history.current().push_state(state, url);
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("location", &self.href())
            .field("navigator", &self.navigator)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

pub struct WindowBuilder {
    href: String,
    document: Document,
    navigator: Navigator,
    timezone: String,
    referrer: String,
    viewport: Viewport,
    clock: Arc<dyn Clock>,
    fetch: Option<Arc<dyn FetchApi>>,
    xhr: Option<Arc<dyn XhrApi>>,
    history: Option<Arc<dyn HistoryApi>>,
}

impl WindowBuilder {
    pub fn new(href: &str) -> Self {
        Self {
            href: href.to_string(),
            document: Document::new(),
            navigator: Navigator::default(),
            timezone: "UTC".to_string(),
            referrer: String::new(),
            viewport: Viewport::default(),
            clock: Arc::new(SystemClock),
            fetch: None,
            xhr: None,
            history: None,
        }
    }

    pub fn document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.navigator.user_agent = user_agent.to_string();
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.navigator.language = language.to_string();
        self
    }

    pub fn timezone(mut self, timezone: &str) -> Self {
        self.timezone = timezone.to_string();
        self
    }

    pub fn referrer(mut self, referrer: &str) -> Self {
        self.referrer = referrer.to_string();
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport { width, height };
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn fetch(mut self, fetch: Arc<dyn FetchApi>) -> Self {
        self.fetch = Some(fetch);
        self
    }

    pub fn xhr(mut self, xhr: Arc<dyn XhrApi>) -> Self {
        self.xhr = Some(xhr);
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryApi>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn build(self) -> Result<Arc<Window>, url::ParseError> {
        let location = Arc::new(RwLock::new(Url::parse(&self.href)?));
        let fetch: Arc<dyn FetchApi> = match self.fetch {
            Some(fetch) => fetch,
            None => Arc::new(ReqwestFetch::new(location.clone())),
        };
        let xhr: Arc<dyn XhrApi> = match self.xhr {
            Some(xhr) => xhr,
            None => Arc::new(NativeXhr),
        };
        let history: Arc<dyn HistoryApi> = match self.history {
            Some(history) => history,
            None => Arc::new(NativeHistory::new(location.clone())),
        };

        Ok(Arc::new(Window {
            location,
            document: RwLock::new(self.document),
            navigator: self.navigator,
            timezone: self.timezone,
            referrer: self.referrer,
            viewport: self.viewport,
            clock: self.clock,
            listeners: EventListeners::default(),
            console: Console::default(),
            fetch: Arc::new(CapabilitySlot::new(fetch)),
            xhr: Arc::new(CapabilitySlot::new(xhr)),
            history: Arc::new(CapabilitySlot::new(history)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;

    #[test]
    fn test_builder_defaults_and_push_state() {
        let clock = Arc::new(ManualClock::new(42));
        let window = Window::builder("https://shop.test/cart?ref=mail")
            .user_agent("Mozilla/5.0")
            .viewport(800, 600)
            .clock(clock.clone())
            .build()
            .unwrap();

        assert_eq!(window.now_millis(), 42);
        assert_eq!(window.navigator().user_agent, "Mozilla/5.0");
        assert_eq!(window.viewport(), Viewport { width: 800, height: 600 });

        window.push_state(json!(null), Some("/checkout"));
        assert_eq!(window.location().path(), "/checkout");
    }

    #[test]
    fn test_builder_rejects_invalid_href() {
        assert!(Window::builder("not a url").build().is_err());
    }
}
