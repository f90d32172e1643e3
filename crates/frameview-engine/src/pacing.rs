//! Frame pacing: the rate ceiling and adaptive degradation.

use std::time::{Duration, Instant};

use tracing::debug;

/// Consecutive transient failures tolerated before the effective rate is
/// halved.
const DEGRADE_THRESHOLD: u32 = 10;

/// Floor for adaptive degradation, in frames per second.
const MIN_EFFECTIVE_RATE: u32 = 5;

/// Gates capture attempts so the configured frame rate is never
/// exceeded, however fast the host ticks. Under sustained transient
/// failures the effective rate is halved (down to a floor) and ramped
/// back up once polls succeed again.
pub struct FramePacer {
    target_rate: u32,
    effective_rate: u32,
    last_accepted: Option<Instant>,
    consecutive_transients: u32,
}

impl FramePacer {
    pub fn new(target_rate: u32) -> Self {
        let target_rate = target_rate.max(1);
        Self {
            target_rate,
            effective_rate: target_rate,
            last_accepted: None,
            consecutive_transients: 0,
        }
    }

    /// The interval implied by the current effective rate.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.effective_rate as f64)
    }

    /// Whether a capture attempt is allowed at `now`.
    pub fn due(&self, now: Instant) -> bool {
        match self.last_accepted {
            Some(last) => now.saturating_duration_since(last) >= self.interval(),
            None => true,
        }
    }

    /// Record an accepted frame; restores the rate toward the target.
    pub fn mark_accepted(&mut self, now: Instant) {
        self.last_accepted = Some(now);
        self.consecutive_transients = 0;
        if self.effective_rate < self.target_rate {
            // Ramp back up gently rather than snapping to target.
            self.effective_rate = (self.effective_rate * 2).min(self.target_rate);
            debug!(
                effective_rate = self.effective_rate,
                "frame rate restored after recovery"
            );
        }
    }

    /// Record a transient poll failure; halves the effective rate after
    /// a run of them.
    pub fn mark_transient(&mut self) {
        self.consecutive_transients += 1;
        if self.consecutive_transients >= DEGRADE_THRESHOLD {
            self.consecutive_transients = 0;
            let degraded = (self.effective_rate / 2).max(MIN_EFFECTIVE_RATE);
            if degraded != self.effective_rate {
                self.effective_rate = degraded;
                debug!(
                    effective_rate = self.effective_rate,
                    "frame rate degraded under sustained transient failures"
                );
            }
        }
    }

    /// Forget pacing history (after pause/resume or a source switch) so
    /// the next tick may capture immediately.
    pub fn reset(&mut self) {
        self.last_accepted = None;
        self.consecutive_transients = 0;
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    pub fn effective_rate(&self) -> u32 {
        self.effective_rate
    }
}
