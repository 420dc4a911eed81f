use crate::endpoints::SessionId;

/// One capture stream, as the session coordinator drives it.
pub trait CaptureStream: Send + Sync {
    /// Stream name for logging/debugging
    fn name(&self) -> &'static str;

    /// Install capture hooks and begin the flush loop. Idempotent.
    fn start(&self);

    /// Remove capture hooks and stop rescheduling flushes. Idempotent.
    fn stop(&self);

    /// Supply the flush destination.
    fn set_session_id(&self, id: SessionId);

    fn is_running(&self) -> bool;
}
