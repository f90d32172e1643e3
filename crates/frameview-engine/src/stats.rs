//! Capture statistics collection.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use frameview_types::CaptureStats;

/// Sliding window over which the measured frame rate is computed.
const FPS_WINDOW: Duration = Duration::from_secs(2);

/// Accumulates counters on the engine tick path and produces
/// [`CaptureStats`] snapshots. Single-writer: only the engine mutates it.
pub struct StatsCollector {
    frames_captured: u64,
    frames_dropped: u64,
    last_error: Option<String>,
    started_at: Option<Instant>,
    accepted: VecDeque<Instant>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            frames_captured: 0,
            frames_dropped: 0,
            last_error: None,
            started_at: None,
            accepted: VecDeque::new(),
        }
    }

    /// Reset counters and mark the start of a capture run.
    pub fn start(&mut self, now: Instant) {
        self.frames_captured = 0;
        self.frames_dropped = 0;
        self.last_error = None;
        self.started_at = Some(now);
        self.accepted.clear();
    }

    /// Stop the uptime clock; counters survive so a stopped engine still
    /// reports its final totals.
    pub fn stop(&mut self) {
        self.started_at = None;
        self.accepted.clear();
    }

    pub fn record_captured(&mut self, now: Instant) {
        self.frames_captured += 1;
        self.accepted.push_back(now);
        self.trim(now);
    }

    pub fn record_dropped(&mut self) {
        self.frames_dropped += 1;
    }

    pub fn set_last_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames_captured
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn trim(&mut self, now: Instant) {
        while let Some(front) = self.accepted.front() {
            if now.saturating_duration_since(*front) > FPS_WINDOW {
                self.accepted.pop_front();
            } else {
                break;
            }
        }
    }

    /// Point-in-time snapshot. `effective_frame_rate` comes from the
    /// pacer since degradation lives there.
    pub fn snapshot(&mut self, now: Instant, effective_frame_rate: u32) -> CaptureStats {
        self.trim(now);
        let actual_fps = self.accepted.len() as f32 / FPS_WINDOW.as_secs_f32();
        CaptureStats {
            frames_captured: self.frames_captured,
            frames_dropped: self.frames_dropped,
            actual_fps,
            effective_frame_rate,
            uptime_seconds: self
                .started_at
                .map(|t| now.saturating_duration_since(t).as_secs())
                .unwrap_or(0),
            last_error: self.last_error.clone(),
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut stats = StatsCollector::new();
        let t0 = Instant::now();
        stats.start(t0);
        stats.record_captured(t0);
        stats.record_captured(t0 + Duration::from_millis(33));
        stats.record_dropped();

        let snap = stats.snapshot(t0 + Duration::from_secs(3), 30);
        assert_eq!(snap.frames_captured, 2);
        assert_eq!(snap.frames_dropped, 1);
        assert_eq!(snap.uptime_seconds, 3);
        assert_eq!(snap.effective_frame_rate, 30);
    }

    #[test]
    fn fps_window_forgets_old_frames() {
        let mut stats = StatsCollector::new();
        let t0 = Instant::now();
        stats.start(t0);
        for i in 0..30 {
            stats.record_captured(t0 + Duration::from_millis(i * 33));
        }
        // One second later the whole burst is still inside the window.
        let fresh = stats.snapshot(t0 + Duration::from_secs(1), 30).actual_fps;
        assert!(fresh > 10.0);
        // Ten seconds later it has aged out entirely.
        let stale = stats.snapshot(t0 + Duration::from_secs(10), 30).actual_fps;
        assert_eq!(stale, 0.0);
    }

    #[test]
    fn start_resets_counters_but_stop_keeps_them() {
        let mut stats = StatsCollector::new();
        let t0 = Instant::now();
        stats.start(t0);
        stats.record_captured(t0);
        stats.stop();
        assert_eq!(stats.snapshot(t0, 0).frames_captured, 1);
        assert_eq!(stats.snapshot(t0, 0).uptime_seconds, 0);

        stats.start(t0);
        assert_eq!(stats.snapshot(t0, 0).frames_captured, 0);
    }
}
