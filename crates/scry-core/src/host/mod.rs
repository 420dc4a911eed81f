//! Host page model
//!
//! The recorders never touch process globals. Everything they observe or
//! patch hangs off a [`Window`]: the document, the location, event listeners
//! and the capability slots for console, fetch, XHR and history.

pub mod console;
pub mod dom;
pub mod events;
pub mod fetch;
pub mod history;
pub mod value;
pub mod window;
pub mod xhr;

pub use console::{Console, ConsoleLevel, ConsoleLine, ConsoleMethod};
pub use dom::{Document, NodeId};
pub use events::{DomEvent, ErrorEvent, EventKind, EventListener, ListenerId, RejectionEvent};
pub use fetch::{Body, FetchApi, FetchError, FetchInput, ReqwestFetch, Request, RequestInit, Response};
pub use history::{HistoryApi, NativeHistory};
pub use value::{JsError, JsValue};
pub use window::{Navigator, Viewport, Window, WindowBuilder};
pub use xhr::{NativeXhr, ReadyState, ReadyStateHandler, XhrApi, XmlHttpRequest};
