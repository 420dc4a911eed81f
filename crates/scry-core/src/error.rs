//! Common error types used across all Scry crates

use thiserror::Error;

use crate::host::dom::NodeId;

/// Faults raised while inspecting host state inside a capture hook.
///
/// These never leave the recorder: hooks log them and return normally so the
/// host page keeps running.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Capture failed: {0}")]
    Failed(String),
}

/// Result type alias for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;
