//! Core utilities and types shared across all Scry crates
//!
//! Holds the host model (the `Window` environment handle and its swappable
//! capabilities), the collection-endpoint transport, recorder settings and the
//! buffering/flush machinery every capture stream is built on.

pub mod buffer;
pub mod capability;
pub mod clock;
pub mod endpoints;
pub mod error;
pub mod flush;
pub mod host;
pub mod schedule;
pub mod settings;
pub mod stream;
pub mod test_utils;
pub mod transport;
pub mod utils;
pub mod sync;

// Re-export commonly used types
pub use buffer::{EventBuffer, SessionSlot};
pub use capability::{CapabilitySlot, Interceptor};
pub use clock::{Clock, ManualClock, SystemClock};
pub use endpoints::SessionId;
pub use error::*;
pub use flush::{flush_buffer, Envelope, FlushOutcome, FlushPolicy, FlushTarget};
pub use host::Window;
pub use schedule::{RecurringTask, ScheduleError};
pub use settings::*;
pub use stream::CaptureStream;
pub use transport::{
    HttpMethod, HttpTransport, Transport, TransportError, TransportExt, TransportRequest,
    TransportResponse,
};
pub use utils::*;

// Re-export external dependencies
pub use async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tokio;
pub use tracing;
pub use url;
