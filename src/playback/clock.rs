use std::time::Duration;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::debug;

/// Frame cadence used while a part is playing.
///
/// Owned by the coordinator and polled from its event loop, so at most one
/// update loop can exist. Stopping drops the interval.
pub struct ProgressClock {
    period: Duration,
    interval: Option<Interval>,
}

impl ProgressClock {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            interval: None,
        }
    }

    /// Start ticking, replacing any running loop
    pub fn start(&mut self) {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        if self.interval.replace(interval).is_none() {
            debug!("Progress clock started ({:?} per frame)", self.period);
        }
    }

    pub fn stop(&mut self) {
        if self.interval.take().is_some() {
            debug!("Progress clock stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next frame. Never resolves while stopped.
    pub async fn next_frame(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
