//! Session replay recorder
//!
//! Starts a DOM capture routine with masking options derived from the
//! configured masking level, buffers the opaque events it emits and delivers
//! them to the session's recording endpoint. Undelivered events are kept for
//! the next attempt.

pub mod capture;
pub mod error;
pub mod options;
pub mod recorder;

pub use capture::{EmitHook, NoopReplayCapture, ReplayCapture, ReplayEvent, StopHandle};
pub use error::ReplayError;
pub use options::{MaskInputOptions, RecordOptions, TextMask, BLOCK_CLASS};
pub use recorder::{ReplayRecorder, RECORDING_TARGET};
