//! Bounded source recovery with capped exponential backoff.

use std::time::{Duration, Instant};

/// How recovery attempts are scheduled after a source is lost.
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    /// Reopen attempts before giving up and surfacing the error.
    pub max_attempts: u32,

    /// Delay before the first attempt.
    pub initial_backoff: Duration,

    /// Ceiling for the doubled backoff.
    pub max_backoff: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RecoveryPolicy {
    /// Start tracking a recovery episode at `now`.
    pub fn begin(&self, now: Instant) -> RecoveryState {
        RecoveryState {
            attempts: 0,
            backoff: self.initial_backoff,
            next_attempt_at: now + self.initial_backoff,
        }
    }
}

/// Progress of one recovery episode.
#[derive(Debug, Clone)]
pub struct RecoveryState {
    attempts: u32,
    backoff: Duration,
    next_attempt_at: Instant,
}

impl RecoveryState {
    /// Whether the next reopen attempt is due.
    pub fn due(&self, now: Instant) -> bool {
        now >= self.next_attempt_at
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record a failed reopen attempt and schedule the next one with
    /// doubled backoff. Returns true when the policy is exhausted.
    pub fn record_failure(&mut self, policy: &RecoveryPolicy, now: Instant) -> bool {
        self.attempts += 1;
        if self.attempts >= policy.max_attempts {
            return true;
        }
        self.backoff = (self.backoff * 2).min(policy.max_backoff);
        self.next_attempt_at = now + self.backoff;
        false
    }
}
