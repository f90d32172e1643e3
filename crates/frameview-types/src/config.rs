//! Capture configuration, discriminated by source type.
//!
//! Exactly one source variant is active at a time. Structural validation
//! (zero-area regions, out-of-range frame rates) happens here, before any
//! backend is touched; geometry validation against live monitor layout
//! belongs to the session open path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::CaptureRegion;
use crate::source::WindowSelector;

/// Highest frame rate the engine will accept as a target.
pub const MAX_FRAME_RATE: u32 = 240;

/// Rejected configuration. Raised before any backend call; a failed
/// validation never tears down an already-running session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Region with zero width or height.
    #[error("capture region must have non-zero area (got {width}x{height})")]
    EmptyRegion { width: u32, height: u32 },

    /// Region does not overlap any enumerated monitor.
    #[error("capture region does not overlap any monitor")]
    RegionOffscreen,

    /// Monitor index not present in the enumeration.
    #[error("monitor index {index} out of range ({available} available)")]
    MonitorOutOfRange { index: u32, available: usize },

    /// Webcam device index not present in the enumeration.
    #[error("webcam device index {index} out of range ({available} available)")]
    DeviceOutOfRange { index: u32, available: usize },

    /// Window selector did not resolve to a live window.
    #[error("window not found: {0}")]
    WindowNotFound(String),

    /// Frame rate outside `1..=MAX_FRAME_RATE`.
    #[error("frame rate {0} out of range (1..={MAX_FRAME_RATE})")]
    FrameRateOutOfRange(u32),

    /// Webcam resolution with a zero dimension.
    #[error("webcam resolution must be non-zero (got {width}x{height})")]
    EmptyResolution { width: u32, height: u32 },

    /// Backend reported no monitors at all.
    #[error("no monitors enumerated")]
    NoMonitors,
}

/// Which part of the screen a screen source captures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenSelection {
    /// A custom rectangle in virtual desktop coordinates.
    Region(CaptureRegion),

    /// One monitor, by enumeration index.
    Monitor(u32),

    /// The union bounding rectangle of every monitor.
    FullVirtualDesktop,
}

/// The source half of a capture configuration, one variant per source
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceConfig {
    /// Desktop capture (region, single monitor or full virtual desktop).
    Screen { selection: ScreenSelection },

    /// A tracked application window.
    Window {
        /// How to find the window.
        selector: WindowSelector,

        /// Re-query the window rectangle each poll cycle so the capture
        /// follows moves and resizes.
        follow_movement: bool,

        /// Include the window frame and title bar.
        include_borders: bool,
    },

    /// A webcam device.
    Webcam {
        /// Device index from enumeration.
        device_index: u32,

        /// Requested resolution (width, height).
        resolution: (u32, u32),

        /// Device-side frame rate request.
        fps: u32,
    },
}

/// Quality tier consumed by the renderer; carried through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityTier {
    Low,
    #[default]
    Medium,
    High,
}

/// Full capture configuration handed to `CaptureEngine::set_source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// The active source.
    pub source: SourceConfig,

    /// Target frame rate ceiling, in frames per second.
    pub frame_rate: u32,

    /// Quality tier for the display layer.
    pub quality: QualityTier,
}

impl CaptureConfig {
    /// Structural validation only; no backend or monitor geometry is
    /// consulted here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 || self.frame_rate > MAX_FRAME_RATE {
            return Err(ConfigError::FrameRateOutOfRange(self.frame_rate));
        }
        match &self.source {
            SourceConfig::Screen {
                selection: ScreenSelection::Region(region),
            } => {
                if region.width == 0 || region.height == 0 {
                    return Err(ConfigError::EmptyRegion {
                        width: region.width,
                        height: region.height,
                    });
                }
            }
            SourceConfig::Webcam {
                resolution: (w, h), ..
            } => {
                if *w == 0 || *h == 0 {
                    return Err(ConfigError::EmptyResolution {
                        width: *w,
                        height: *h,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::Screen {
                selection: ScreenSelection::FullVirtualDesktop,
            },
            frame_rate: 30,
            quality: QualityTier::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CaptureConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_frame_rate() {
        let mut config = CaptureConfig::default();
        config.frame_rate = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FrameRateOutOfRange(0))
        ));
        config.frame_rate = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_webcam_resolution() {
        let config = CaptureConfig {
            source: SourceConfig::Webcam {
                device_index: 0,
                resolution: (640, 0),
                fps: 30,
            },
            frame_rate: 30,
            quality: QualityTier::Low,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyResolution { .. })
        ));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = CaptureConfig {
            source: SourceConfig::Window {
                selector: WindowSelector::Title("editor".into()),
                follow_movement: true,
                include_borders: false,
            },
            frame_rate: 60,
            quality: QualityTier::High,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: CaptureConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
