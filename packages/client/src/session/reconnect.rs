//! Reconnection Policy.
//!
//! A fixed backoff with no growth and no retry cap. At most one attempt is
//! pending or in flight at any time.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    backoff: Duration,
    pending: Option<Instant>,
    in_flight: bool,
}

impl ReconnectPolicy {
    pub fn new(backoff: Duration) -> Self {
        Self {
            backoff,
            pending: None,
            in_flight: false,
        }
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Schedule an attempt `backoff` after `now`.
    ///
    /// Returns `false` and changes nothing when an attempt is already
    /// pending or in flight.
    pub fn schedule(&mut self, now: Instant) -> bool {
        if self.pending.is_some() || self.in_flight {
            return false;
        }
        self.pending = Some(now + self.backoff);
        true
    }

    /// When the pending attempt is due
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// The timer fired: the pending attempt becomes the in-flight one.
    pub fn begin_attempt(&mut self) {
        self.pending = None;
        self.in_flight = true;
    }

    pub fn finish_attempt(&mut self) {
        self.in_flight = false;
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none() && !self.in_flight
    }

    /// Drop the pending attempt, if any.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
