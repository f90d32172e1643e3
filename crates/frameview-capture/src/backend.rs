//! Backend capability contract.
//!
//! Every native capture driver, whatever its acquisition model (pull-based
//! screen blit, tracked window capture, push-based webcam callbacks), is
//! adapted to the same poll shape: [`SourceDriver`]. [`CaptureBackends`]
//! is the factory the engine is constructed over; swapping it for a mock
//! is how the whole pipeline is tested without native APIs.

use frameview_types::{CaptureRegion, MonitorGeometry, SourceInfo};

use crate::error::{CaptureResult, OpenError};
use crate::frame::RawFrame;

/// The source a driver is opened against, after the session has resolved
/// selectors and validated geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// A screen rectangle in virtual desktop coordinates.
    Screen {
        region: CaptureRegion,
        /// Set for single-monitor captures; `None` for custom regions and
        /// the full virtual desktop.
        monitor_index: Option<u32>,
    },

    /// A live window, by backend-assigned id.
    Window {
        id: String,
        follow_movement: bool,
        include_borders: bool,
    },

    /// A webcam device.
    Webcam {
        device_index: u32,
        resolution: (u32, u32),
        fps: u32,
    },
}

/// Live rectangle of a tracked window, re-queried each poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedBounds {
    /// The driver does not track a window (screen and webcam sources).
    NotTracked,

    /// The window is minimized or hidden; polling yields no frame.
    Hidden,

    /// The window is visible at this rectangle.
    Visible(CaptureRegion),
}

/// One opened capture driver.
///
/// `poll_once` must never block on device timing: screen and window
/// drivers perform a synchronous point-in-time capture; webcam drivers
/// drain the freshest frame their acquisition path has buffered and
/// return `None` when nothing new arrived.
pub trait SourceDriver: Send {
    /// Initialize the native capture resources for `source`.
    fn open(&mut self, source: &ResolvedSource) -> Result<(), OpenError>;

    /// Acquire at most one frame. `Ok(None)` means no new frame is ready
    /// and is not an error.
    fn poll_once(&mut self) -> CaptureResult<Option<RawFrame>>;

    /// Release the native handle. Must be idempotent.
    fn close(&mut self);

    /// Window drivers report the target's live rectangle so the session
    /// can follow moves and resizes. Non-window drivers keep the default.
    fn tracked_bounds(&mut self) -> CaptureResult<TrackedBounds> {
        Ok(TrackedBounds::NotTracked)
    }

    /// Adjust the capture rectangle mid-session (window tracking).
    fn apply_region(&mut self, _region: CaptureRegion) {}
}

/// Factory for drivers and enumerations, one per source type.
pub trait CaptureBackends: Send + Sync {
    /// Enumerate monitors. Called once at session open and cached.
    fn monitors(&self) -> CaptureResult<Vec<MonitorGeometry>>;

    /// Create an unopened screen driver.
    fn create_screen_driver(&self) -> CaptureResult<Box<dyn SourceDriver>>;

    /// Create an unopened window driver.
    fn create_window_driver(&self) -> CaptureResult<Box<dyn SourceDriver>>;

    /// Create an unopened webcam driver.
    fn create_webcam_driver(&self) -> CaptureResult<Box<dyn SourceDriver>>;

    /// List capturable windows.
    fn enumerate_windows(&self) -> CaptureResult<Vec<SourceInfo>>;

    /// List webcam devices.
    fn enumerate_webcams(&self) -> CaptureResult<Vec<SourceInfo>>;
}
