use scry_core::TransportError;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("No async runtime available; the recorder must be built inside a tokio runtime")]
    NoRuntime,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Captured session was rejected with status {status}: {body}")]
    SessionRejected { status: u16, body: Value },

    #[error("Captured session response is not a session id: {0}")]
    InvalidSessionId(Value),

    #[error("userId must be a non-empty string")]
    InvalidIdentity,
}
