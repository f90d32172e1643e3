//! Source sessions: the live binding between the engine and one opened
//! backend driver.

use tracing::{debug, warn};

use frameview_types::{
    CaptureConfig, ConfigError, MonitorLayout, ScreenSelection, SourceConfig, SourceInfo,
    WindowSelector,
};

use crate::backend::{CaptureBackends, ResolvedSource, SourceDriver, TrackedBounds};
use crate::error::{CaptureError, CaptureResult, OpenError};
use crate::frame::RawFrame;

/// One active capture session.
///
/// Owns the backend driver exclusively, the resolved source it was opened
/// against, and the session health flags. Created by `open`, destroyed by
/// `close` (or drop); a source switch always tears the old session down
/// fully before the next one is constructed.
pub struct SourceSession {
    driver: Option<Box<dyn SourceDriver>>,
    source: ResolvedSource,
    layout: MonitorLayout,
    current_region: Option<frameview_types::CaptureRegion>,
    tracking: bool,
    device_lost: bool,
    last_error: Option<String>,
}

impl SourceSession {
    /// Resolve `config` against live enumerations and open a driver.
    ///
    /// Validation happens entirely before the driver sees the config:
    /// region bounds are checked against monitor geometry, monitor and
    /// device indices against their enumerations, and window selectors
    /// against the live window list. Monitor enumeration is queried once
    /// here and cached for the session's lifetime.
    pub fn open(backends: &dyn CaptureBackends, config: &CaptureConfig) -> Result<Self, OpenError> {
        config.validate()?;

        let layout = MonitorLayout::new(
            backends
                .monitors()
                .map_err(|e| OpenError::Backend(e.to_string()))?,
        )?;

        let source = resolve_source(backends, &config.source, &layout)?;

        let mut driver = match &source {
            ResolvedSource::Screen { .. } => backends.create_screen_driver(),
            ResolvedSource::Window { .. } => backends.create_window_driver(),
            ResolvedSource::Webcam { .. } => backends.create_webcam_driver(),
        }
        .map_err(|e| OpenError::Backend(e.to_string()))?;

        driver.open(&source)?;
        debug!(source = ?source, "source session opened");

        let current_region = match &source {
            ResolvedSource::Screen { region, .. } => Some(*region),
            _ => None,
        };

        Ok(Self {
            driver: Some(driver),
            source,
            layout,
            current_region,
            tracking: true,
            device_lost: false,
            last_error: None,
        })
    }

    /// Run the same resolution `open` performs, without creating a
    /// driver. Lets a caller reject a bad config before tearing down
    /// whatever session it currently holds.
    pub fn validate(
        backends: &dyn CaptureBackends,
        config: &CaptureConfig,
    ) -> Result<(), OpenError> {
        config.validate()?;
        let layout = MonitorLayout::new(
            backends
                .monitors()
                .map_err(|e| OpenError::Backend(e.to_string()))?,
        )?;
        resolve_source(backends, &config.source, &layout)?;
        Ok(())
    }

    /// Ask the driver for one frame.
    ///
    /// Window sources refresh their tracked rectangle first; a minimized
    /// or hidden window yields `Ok(None)` with `tracking()` false rather
    /// than an error. `Ok(None)` in general means no new frame is ready.
    pub fn poll_frame(&mut self) -> CaptureResult<Option<RawFrame>> {
        let driver = self.driver.as_mut().ok_or(CaptureError::SessionClosed)?;

        if let ResolvedSource::Window {
            follow_movement: true,
            ..
        } = self.source
        {
            match driver.tracked_bounds() {
                Ok(TrackedBounds::Hidden) => {
                    self.tracking = false;
                    return Ok(None);
                }
                Ok(TrackedBounds::Visible(bounds)) => {
                    self.tracking = true;
                    if self.current_region != Some(bounds) {
                        driver.apply_region(bounds);
                        self.current_region = Some(bounds);
                    }
                }
                Ok(TrackedBounds::NotTracked) => {}
                Err(e) => {
                    self.record_error(&e);
                    return Err(e);
                }
            }
        }

        match driver.poll_once() {
            Ok(frame) => Ok(frame),
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    fn record_error(&mut self, error: &CaptureError) {
        if error.is_recoverable() {
            self.device_lost = true;
        }
        self.last_error = Some(error.to_string());
    }

    /// Release the backend driver. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.close();
            debug!("source session closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.driver.is_some()
    }

    /// Whether a tracked window is currently visible. Always true for
    /// non-window sources.
    pub fn tracking(&self) -> bool {
        self.tracking
    }

    pub fn device_lost(&self) -> bool {
        self.device_lost
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The monitor layout snapshotted at open.
    pub fn layout(&self) -> &MonitorLayout {
        &self.layout
    }

    /// The source the driver was opened against.
    pub fn source(&self) -> &ResolvedSource {
        &self.source
    }

    /// Top-left of the capture rectangle in virtual desktop coordinates.
    /// Used to translate pointer positions into frame space. Webcams and
    /// untracked windows report the frame origin itself.
    pub fn capture_origin(&self) -> (i32, i32) {
        match self.current_region {
            Some(region) => (region.x, region.y),
            None => (0, 0),
        }
    }

    /// Monitor index for single-monitor screen captures.
    pub fn monitor_index(&self) -> Option<u32> {
        match self.source {
            ResolvedSource::Screen { monitor_index, .. } => monitor_index,
            _ => None,
        }
    }
}

impl Drop for SourceSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resolve the configured source into concrete capture coordinates and
/// identifiers, validating against the given enumerations.
fn resolve_source(
    backends: &dyn CaptureBackends,
    source: &SourceConfig,
    layout: &MonitorLayout,
) -> Result<ResolvedSource, OpenError> {
    match source {
        SourceConfig::Screen { selection } => match selection {
            ScreenSelection::Region(region) => {
                if !layout.overlaps_any(region) {
                    return Err(ConfigError::RegionOffscreen.into());
                }
                Ok(ResolvedSource::Screen {
                    region: *region,
                    monitor_index: None,
                })
            }
            ScreenSelection::Monitor(index) => {
                let monitor =
                    layout
                        .monitor(*index)
                        .ok_or_else(|| ConfigError::MonitorOutOfRange {
                            index: *index,
                            available: layout.monitors().len(),
                        })?;
                Ok(ResolvedSource::Screen {
                    region: monitor.bounds(),
                    monitor_index: Some(*index),
                })
            }
            ScreenSelection::FullVirtualDesktop => Ok(ResolvedSource::Screen {
                region: layout.virtual_desktop(),
                monitor_index: None,
            }),
        },
        SourceConfig::Window {
            selector,
            follow_movement,
            include_borders,
        } => {
            let windows = backends
                .enumerate_windows()
                .map_err(|e| OpenError::Backend(e.to_string()))?;
            let window = find_window(&windows, selector).ok_or_else(|| {
                warn!(selector = %selector.describe(), "window selector did not resolve");
                ConfigError::WindowNotFound(selector.describe())
            })?;
            Ok(ResolvedSource::Window {
                id: window.id.clone(),
                follow_movement: *follow_movement,
                include_borders: *include_borders,
            })
        }
        SourceConfig::Webcam {
            device_index,
            resolution,
            fps,
        } => {
            let devices = backends
                .enumerate_webcams()
                .map_err(|e| OpenError::Backend(e.to_string()))?;
            if *device_index as usize >= devices.len() {
                return Err(ConfigError::DeviceOutOfRange {
                    index: *device_index,
                    available: devices.len(),
                }
                .into());
            }
            Ok(ResolvedSource::Webcam {
                device_index: *device_index,
                resolution: *resolution,
                fps: *fps,
            })
        }
    }
}

fn find_window<'a>(windows: &'a [SourceInfo], selector: &WindowSelector) -> Option<&'a SourceInfo> {
    match selector {
        WindowSelector::Id(id) => windows.iter().find(|w| &w.id == id),
        WindowSelector::Title(fragment) => windows.iter().find(|w| w.name.contains(fragment)),
    }
}
