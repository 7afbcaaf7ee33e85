//! Deadlines checked on every poll
//!
//! Both timers are driven by the `now` handed to the connection's poll rather than by a
//! runtime, so a caller that polls too rarely sees them fire late, never early.

use std::time::{Duration, Instant};

/// Periodic deadline for sending empty frames to keep the peer's idle timer from expiring
#[derive(Debug)]
pub(crate) struct HeartBeat {
    period: Option<Duration>,
    last: Instant,
}

impl HeartBeat {
    /// A [`HeartBeat`] that is never due
    pub fn never(now: Instant) -> Self {
        Self { period: None, last: now }
    }

    /// A [`HeartBeat`] that is due once `period` has passed without a [`reset`](Self::reset)
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period: Some(period),
            last: now,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.period {
            Some(period) => now.saturating_duration_since(self.last) >= period,
            None => false,
        }
    }
}

/// Our own idle timeout, reset by every inbound frame
#[derive(Debug)]
pub(crate) struct IdleTimeout {
    duration: Duration,
    last: Instant,
}

impl IdleTimeout {
    /// Returns `None` for a zero duration, which means no timeout
    pub fn new(duration: Duration, now: Instant) -> Option<Self> {
        match duration.is_zero() {
            true => None,
            false => Some(Self {
                duration,
                last: now,
            }),
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn is_elapsed(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.duration
    }
}
