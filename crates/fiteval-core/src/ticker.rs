//! Periodic tick source for live sessions.
//!
//! The session controller never reads a clock; a [`Ticker`] drives it by
//! emitting one message per period on a channel. Dropping the ticker stops
//! the background task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// A background task that emits a tick every `period`.
#[derive(Debug)]
pub struct Ticker {
    rx: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
    period: Duration,
}

impl Ticker {
    /// Spawn a ticker on the current tokio runtime. The first tick arrives
    /// one full period after spawning.
    pub fn spawn(period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        Self { rx, handle, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next tick. `None` once the ticker has been stopped.
    pub async fn next(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Stop emitting ticks. Ticks already queued are discarded.
    pub fn stop(&mut self) {
        self.handle.abort();
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn emits_one_tick_per_period() {
        let start = time::Instant::now();
        let mut ticker = Ticker::spawn(Duration::from_millis(100));
        for _ in 0..10 {
            ticker.next().await.unwrap();
        }
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert_eq!(ticker.period(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_stream() {
        let mut ticker = Ticker::spawn(Duration::from_secs(1));
        ticker.next().await.unwrap();
        ticker.stop();
        assert_eq!(ticker.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn drives_a_session_to_completion() {
        use crate::catalog::Catalog;
        use crate::model::Category;
        use crate::session::{Progress, TestSession};

        let (mut session, done) = TestSession::new(&Catalog::standard(), Category::Speed).unwrap();
        session.start().unwrap();
        let mut ticker = Ticker::spawn(Duration::from_secs(1));
        while session.elapsed() < Duration::from_secs(6) {
            ticker.next().await.unwrap();
            session.tick().unwrap();
        }
        ticker.stop();
        assert!(matches!(session.stop().unwrap(), Progress::Completed(_)));
        assert_eq!(done.wait().await.unwrap().score(), 100);
    }
}
