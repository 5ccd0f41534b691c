//! Refresh throttle
//!
//! Callers that keep attachment-derived poses fresh by re-running
//! [`PoleStore::refresh_attachments`] on every tick go through this so the
//! pass runs at most once per interval.

use std::time::{Duration, Instant};

use super::PoleStore;

/// Default minimum time between refresh passes
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct RefreshThrottle {
    interval: Duration,
    last_run: Option<Instant>,
}

impl Default for RefreshThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

impl RefreshThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true, and records the run, when at least one interval has
    /// passed since the last run at `now`
    pub fn ready_at(&mut self, now: Instant) -> bool {
        let due = match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last_run = Some(now);
        }
        due
    }

    /// Refreshes `store` if due; returns the number of poses that changed
    pub fn tick(&mut self, store: &mut PoleStore) -> Option<usize> {
        if self.ready_at(Instant::now()) {
            Some(store.refresh_attachments())
        } else {
            None
        }
    }

    /// Forgets the last run so the next tick refreshes
    pub fn reset(&mut self) {
        self.last_run = None;
    }
}
