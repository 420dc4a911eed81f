//! Session coordinator
//!
//! [`Recorder`] is the single entry point a host page uses: it owns the four
//! capture streams, creates the captured session, keeps it alive with a
//! periodic ping and attaches environment metadata and user identity to it.

pub mod error;
pub mod metadata;
pub mod recorder;
pub mod types;
pub mod user_agent;

pub use error::RecorderError;
pub use metadata::CapturedUserMetadata;
pub use recorder::{Recorder, RecorderBuilder, SessionState};
pub use types::{CapturedUserIdentity, CreateSessionRequest};
pub use user_agent::BrowserInfo;
