//! Cancellable scheduled tasks.
//!
//! Every timer the controller relies on (rotation cycle, crossfade steps,
//! ticker pass, retry wait) is a spawned tokio task that posts an event back
//! into the controller's channel.  The controller owns the [`ScheduledTask`];
//! replacing or dropping it aborts the task, so a restart can never leave a
//! second timer running.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

pub struct ScheduledTask {
    label: &'static str,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Run an arbitrary future (e.g. an in-flight fetch) under the same
    /// abort-on-drop ownership.
    pub fn spawn<F>(label: &'static str, fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            label,
            handle: tokio::spawn(fut),
        }
    }

    /// Post `event` once after `delay`.
    pub fn after<E: Send + 'static>(
        label: &'static str,
        delay: Duration,
        tx: mpsc::Sender<E>,
        event: E,
    ) -> Self {
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(event).await;
        });
        Self { label, handle }
    }

    /// Post `make()` every `period`, first one `period` from now.  Stops by
    /// itself when the receiver goes away.
    pub fn every<E, F>(label: &'static str, period: Duration, tx: mpsc::Sender<E>, make: F) -> Self
    where
        E: Send + 'static,
        F: Fn() -> E + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(make()).await.is_err() {
                    break;
                }
            }
        });
        Self { label, handle }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            trace!("cancelling scheduled task {}", self.label);
        }
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn after_fires_once() {
        let (tx, mut rx) = mpsc::channel(8);
        let task = ScheduledTask::after("once", Duration::from_millis(500), tx, 7u32);

        time::sleep(Duration::from_millis(499)).await;
        assert!(rx.try_recv().is_err());

        assert_eq!(rx.recv().await, Some(7));
        assert_eq!(task.label(), "once");
    }

    #[tokio::test(start_paused = true)]
    async fn every_skips_the_immediate_tick() {
        let (tx, mut rx) = mpsc::channel(8);
        let start = Instant::now();
        let _task = ScheduledTask::every("tick", Duration::from_secs(3), tx, || ());

        rx.recv().await.unwrap();
        let first = start.elapsed();
        assert!(first >= Duration::from_secs(3) && first < Duration::from_secs(4));
        rx.recv().await.unwrap();
        let second = start.elapsed();
        assert!(second >= Duration::from_secs(6) && second < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels() {
        let (tx, mut rx) = mpsc::channel::<()>(8);
        let task = ScheduledTask::every("tick", Duration::from_secs(1), tx, || ());
        task.cancel();

        // The only sender lived in the aborted task, so the channel closes.
        assert_eq!(rx.recv().await, None);
    }
}
