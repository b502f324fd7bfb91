//! Suspendable repeating poll timer.
//!
//! [`PollScheduler`] is the control handle (`start` / `stop`), shared by
//! every fetch path. [`PollTicks`] is the single consumer that waits for the
//! timer to fire. Stopping discards the pending tick; starting arms a fresh
//! full interval. Both are idempotent: `start` on a started timer does not
//! push the pending tick back.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Control handle of the poll timer.
#[derive(Debug, Clone)]
pub struct PollScheduler {
    running: Arc<watch::Sender<bool>>,
    interval: Duration,
}

/// Tick source of the poll timer.
#[derive(Debug)]
pub struct PollTicks {
    running: watch::Receiver<bool>,
    interval: Duration,
}

impl PollScheduler {
    /// Create a stopped timer firing every `interval` once started.
    #[must_use]
    pub fn new(interval: Duration) -> (Self, PollTicks) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                running: Arc::new(tx),
                interval,
            },
            PollTicks {
                running: rx,
                interval,
            },
        )
    }

    /// Arm the timer. No effect if already started.
    pub fn start(&self) {
        self.running.send_if_modified(|running| {
            if *running {
                false
            } else {
                *running = true;
                true
            }
        });
    }

    /// Disarm the timer. No effect if already stopped.
    pub fn stop(&self) {
        self.running.send_if_modified(|running| {
            if *running {
                *running = false;
                true
            } else {
                false
            }
        });
    }

    /// Whether the timer is armed.
    #[must_use]
    pub fn is_started(&self) -> bool {
        *self.running.borrow()
    }

    /// Poll interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl PollTicks {
    /// Wait for the next tick.
    ///
    /// Returns `false` once every [`PollScheduler`] handle is dropped.
    pub async fn tick(&mut self) -> bool {
        loop {
            if !*self.running.borrow_and_update() {
                if self.running.changed().await.is_err() {
                    return false;
                }
                continue;
            }

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {
                    if *self.running.borrow_and_update() {
                        return true;
                    }
                }
                changed = self.running.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Instant};

    #[tokio::test(start_paused = true)]
    async fn fires_every_interval_while_started() {
        let (scheduler, mut ticks) = PollScheduler::new(Duration::from_secs(30));
        scheduler.start();

        let begin = Instant::now();
        assert!(ticks.tick().await);
        assert_eq!(begin.elapsed(), Duration::from_secs(30));
        assert!(ticks.tick().await);
        assert_eq!(begin.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_timer_never_fires() {
        let (scheduler, mut ticks) = PollScheduler::new(Duration::from_secs(30));
        scheduler.start();
        scheduler.stop();
        scheduler.stop();

        assert!(!scheduler.is_started());
        assert!(timeout(Duration::from_secs(300), ticks.tick()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_arms_a_full_interval() {
        let (scheduler, mut ticks) = PollScheduler::new(Duration::from_secs(30));
        scheduler.start();

        let waiter = tokio::spawn(async move {
            let begin = Instant::now();
            ticks.tick().await;
            begin.elapsed()
        });

        tokio::time::sleep(Duration::from_secs(20)).await;
        scheduler.stop();
        scheduler.start();

        let elapsed = waiter.await.unwrap();
        assert_eq!(elapsed, Duration::from_secs(50));
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_does_not_postpone() {
        let (scheduler, mut ticks) = PollScheduler::new(Duration::from_secs(30));
        scheduler.start();

        let waiter = tokio::spawn(async move {
            let begin = Instant::now();
            ticks.tick().await;
            begin.elapsed()
        });

        tokio::time::sleep(Duration::from_secs(20)).await;
        scheduler.start();

        let elapsed = waiter.await.unwrap();
        assert_eq!(elapsed, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn ends_when_handles_drop() {
        let (scheduler, mut ticks) = PollScheduler::new(Duration::from_secs(30));
        drop(scheduler);
        assert!(!ticks.tick().await);
    }
}
