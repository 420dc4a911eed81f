//! The seam to the DOM capture routine.

use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::error::ReplayError;
use crate::options::RecordOptions;

/// One opaque replay record, serialized as the capture routine produced it.
pub type ReplayEvent = Value;

/// Called by the capture routine for every event it produces.
pub type EmitHook = Arc<dyn Fn(ReplayEvent) + Send + Sync>;

/// Tears the capture routine down.
pub type StopHandle = Box<dyn FnOnce() + Send>;

/// A DOM snapshot/mutation capture routine.
pub trait ReplayCapture: Send + Sync {
    /// Begin capturing with `options`, handing events to `emit`.
    fn record(&self, options: RecordOptions, emit: EmitHook) -> Result<StopHandle, ReplayError>;
}

/// Capture routine for hosts without a replay library. Emits nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReplayCapture;

impl ReplayCapture for NoopReplayCapture {
    fn record(&self, _options: RecordOptions, _emit: EmitHook) -> Result<StopHandle, ReplayError> {
        warn!("No replay capture configured, session replay will be empty");
        Ok(Box::new(|| {}))
    }
}
