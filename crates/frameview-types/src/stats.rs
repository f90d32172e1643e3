//! Capture statistics snapshot.

use serde::{Deserialize, Serialize};

/// A point-in-time copy of capture statistics.
///
/// Mutated only by the engine on its tick path; consumers read snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureStats {
    /// Frames accepted into the frame buffer since capture started.
    pub frames_captured: u64,

    /// Capture attempts that did not produce a buffered frame
    /// (failed polls and recovery retries).
    pub frames_dropped: u64,

    /// Measured frames per second over a sliding window.
    pub actual_fps: f32,

    /// Effective frame-rate target after adaptive degradation; equals
    /// the configured rate when no degradation is active.
    pub effective_frame_rate: u32,

    /// Seconds since capture started; 0 when idle.
    pub uptime_seconds: u64,

    /// The most recent terminal error, if any.
    pub last_error: Option<String>,
}
