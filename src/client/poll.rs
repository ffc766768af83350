//! Fixed-interval background refresh.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::config::DEFAULT_POLL_INTERVAL;

/// How often to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    interval: Duration,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self::every(DEFAULT_POLL_INTERVAL)
    }
}

impl RefreshSchedule {
    /// A schedule ticking every `interval` (at least 1 ms).
    #[must_use]
    pub fn every(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// The tick interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawns a task calling `tick` immediately and then once per interval.
    ///
    /// A slow tick delays the next one instead of bunching ticks up. The
    /// task runs until the returned handle is cancelled or dropped.
    pub fn spawn<F, Fut>(&self, mut tick: F) -> PollHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let task = tokio::spawn(async move {
            loop {
                interval.tick().await;
                tick().await;
            }
        });
        PollHandle { task }
    }
}

/// Owner of a running refresh task. Dropping it stops the task.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stops the task. No tick starts after this returns.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// True until the task has been cancelled and wound down.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting(schedule: RefreshSchedule) -> (PollHandle, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let handle = schedule.spawn(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (handle, ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_follow_the_interval() {
        let (_handle, ticks) = counting(RefreshSchedule::every(Duration::from_secs(3)));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks() {
        let (handle, ticks) = counting(RefreshSchedule::every(Duration::from_secs(1)));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let seen = ticks.load(Ordering::SeqCst);

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticks() {
        let (handle, ticks) = counting(RefreshSchedule::every(Duration::from_secs(1)));
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(handle);
        let seen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[test]
    fn default_interval() {
        assert_eq!(RefreshSchedule::default().interval(), Duration::from_secs(3));
    }
}
