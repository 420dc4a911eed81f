//! Cancellable recurring tasks (flush loops, liveness pings).

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("no async runtime available to schedule '{0}'")]
    NoRuntime(&'static str),
}

/// Sleep `period`, run `tick`, repeat, until cancelled.
///
/// Cancelling never interrupts a tick that is already running; it only stops
/// the next one from being scheduled. Dropping the handle cancels it.
#[derive(Debug)]
pub struct RecurringTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RecurringTask {
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Result<Self, ScheduleError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ScheduleError::NoRuntime(name))?;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(period) => {}
                }
                tick().await;
                if token.is_cancelled() {
                    break;
                }
            }
            debug!("{} loop stopped", name);
        });

        Ok(Self {
            name,
            cancel,
            handle,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RecurringTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let task = RecurringTask::spawn("test", Duration::from_secs(2), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

        tokio::time::sleep(Duration::from_millis(6_500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        task.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_does_not_abort_running_tick() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();
        let task = RecurringTask::spawn("slow", Duration::from_secs(1), move || {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

        // First tick starts at t=1s and is mid-flight at t=2s.
        tokio::time::sleep(Duration::from_secs(2)).await;
        task.cancel();
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(task.is_finished());
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let result = RecurringTask::spawn("orphan", Duration::from_secs(1), || async {});
        assert!(matches!(result, Err(ScheduleError::NoRuntime("orphan"))));
    }
}
