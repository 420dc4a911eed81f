//! Network recorder
//!
//! Instruments the page's `fetch` and `XMLHttpRequest` capabilities and
//! records each call (sanitized URL, filtered headers, size-limited bodies,
//! status and timing) for delivery to the collection endpoint.

mod interceptors;
pub mod recorder;
pub mod types;

pub use recorder::{NetworkRecorder, NETWORK_REQUESTS_TARGET};
pub use types::{NetworkRequest, RequestType, XhrMetadata};
