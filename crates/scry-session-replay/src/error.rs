use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Replay capture is not available: {0}")]
    Unavailable(String),

    #[error("Replay capture is already recording")]
    AlreadyRecording,

    #[error("Failed to start replay capture: {0}")]
    StartFailed(String),
}
