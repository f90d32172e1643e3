//! Virtual desktop geometry.
//!
//! [`MonitorLayout`] snapshots the monitor arrangement once, at session
//! open. [`CaptureRegion`] describes an arbitrary rectangle in virtual
//! desktop coordinates that may span multiple monitors.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// A rectangle in virtual desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    /// Build a region, rejecting zero-area rectangles.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyRegion { width, height });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Right edge (exclusive) in virtual desktop coordinates.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    /// Bottom edge (exclusive) in virtual desktop coordinates.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    /// Whether `other` lies entirely inside this region.
    pub fn contains(&self, other: &CaptureRegion) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Intersection with `other`, if any.
    pub fn intersect(&self, other: &CaptureRegion) -> Option<CaptureRegion> {
        let ix = self.x.max(other.x);
        let iy = self.y.max(other.y);
        let ix2 = self.right().min(other.right());
        let iy2 = self.bottom().min(other.bottom());
        if ix < ix2 && iy < iy2 {
            Some(CaptureRegion {
                x: ix,
                y: iy,
                width: (ix2 - ix) as u32,
                height: (iy2 - iy) as u32,
            })
        } else {
            None
        }
    }
}

/// Geometry of a single monitor inside the virtual desktop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorGeometry {
    /// Stable index assigned by the backend at enumeration time.
    pub index: u32,

    /// Top-left corner in virtual desktop coordinates.
    pub x: i32,
    pub y: i32,

    /// Size in pixels.
    pub width: u32,
    pub height: u32,

    /// Whether this is the primary monitor.
    pub is_primary: bool,

    /// Display name for the UI.
    pub name: String,
}

impl MonitorGeometry {
    /// The monitor's bounds as a region.
    pub fn bounds(&self) -> CaptureRegion {
        CaptureRegion {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// A snapshot of the monitor arrangement, queried once when a session
/// opens. The layout is not refreshed automatically; a monitor being
/// unplugged mid-session surfaces as a capture error, not a layout change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorLayout {
    monitors: Vec<MonitorGeometry>,
}

impl MonitorLayout {
    /// Build a layout from backend-enumerated monitors.
    pub fn new(monitors: Vec<MonitorGeometry>) -> Result<Self, ConfigError> {
        if monitors.is_empty() {
            return Err(ConfigError::NoMonitors);
        }
        Ok(Self { monitors })
    }

    pub fn monitors(&self) -> &[MonitorGeometry] {
        &self.monitors
    }

    /// Look up a monitor by its enumeration index.
    pub fn monitor(&self, index: u32) -> Option<&MonitorGeometry> {
        self.monitors.iter().find(|m| m.index == index)
    }

    /// The primary monitor, falling back to the first enumerated one.
    pub fn primary(&self) -> &MonitorGeometry {
        self.monitors
            .iter()
            .find(|m| m.is_primary)
            .unwrap_or(&self.monitors[0])
    }

    /// Union bounding rectangle of every enumerated monitor.
    pub fn virtual_desktop(&self) -> CaptureRegion {
        let mut left = i32::MAX;
        let mut top = i32::MAX;
        let mut right = i32::MIN;
        let mut bottom = i32::MIN;
        for m in &self.monitors {
            left = left.min(m.x);
            top = top.min(m.y);
            right = right.max(m.bounds().right());
            bottom = bottom.max(m.bounds().bottom());
        }
        CaptureRegion {
            x: left,
            y: top,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }

    /// Whether the region overlaps at least one monitor.
    pub fn overlaps_any(&self, region: &CaptureRegion) -> bool {
        self.monitors
            .iter()
            .any(|m| m.bounds().intersect(region).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(index: u32, x: i32, y: i32, w: u32, h: u32, primary: bool) -> MonitorGeometry {
        MonitorGeometry {
            index,
            x,
            y,
            width: w,
            height: h,
            is_primary: primary,
            name: format!("Display {index}"),
        }
    }

    #[test]
    fn rejects_zero_area_region() {
        assert!(CaptureRegion::new(0, 0, 0, 100).is_err());
        assert!(CaptureRegion::new(0, 0, 100, 0).is_err());
        assert!(CaptureRegion::new(-10, -10, 1, 1).is_ok());
    }

    #[test]
    fn virtual_desktop_spans_all_monitors() {
        let layout = MonitorLayout::new(vec![
            monitor(0, 0, 0, 1920, 1080, true),
            monitor(1, 1920, -120, 2560, 1440, false),
        ])
        .unwrap();

        let vd = layout.virtual_desktop();
        assert_eq!(vd.x, 0);
        assert_eq!(vd.y, -120);
        assert_eq!(vd.width, 1920 + 2560);
        assert_eq!(vd.bottom(), 1320);
    }

    #[test]
    fn primary_falls_back_to_first() {
        let layout = MonitorLayout::new(vec![
            monitor(0, 0, 0, 800, 600, false),
            monitor(1, 800, 0, 800, 600, false),
        ])
        .unwrap();
        assert_eq!(layout.primary().index, 0);
    }

    #[test]
    fn region_overlap_detection() {
        let layout = MonitorLayout::new(vec![monitor(0, 0, 0, 1920, 1080, true)]).unwrap();
        let inside = CaptureRegion::new(100, 100, 640, 480).unwrap();
        let outside = CaptureRegion::new(3000, 3000, 10, 10).unwrap();
        assert!(layout.overlaps_any(&inside));
        assert!(!layout.overlaps_any(&outside));
    }
}
