//! Deterministic in-process backend.
//!
//! Produces a moving gradient test pattern for every source type, with a
//! shared mutable desktop model so callers can move windows, hide them or
//! unplug the webcam mid-session. Used by the headless CLI and by
//! integration-style engine tests; no native API is touched.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, TrySendError};
use parking_lot::Mutex;
use tracing::debug;

use frameview_types::{CaptureRegion, MonitorGeometry, SourceInfo, SourceKind};

use crate::backend::{CaptureBackends, ResolvedSource, SourceDriver, TrackedBounds};
use crate::error::{CaptureError, CaptureResult, OpenError};
use crate::frame::RawFrame;

/// Frames buffered between a webcam producer and its consumer. Matches
/// a drop-oldest policy: when the consumer lags, stale frames are shed.
const WEBCAM_CHANNEL_CAPACITY: usize = 2;

/// One synthetic window.
#[derive(Debug, Clone)]
pub struct SyntheticWindow {
    pub id: String,
    pub title: String,
    pub bounds: CaptureRegion,
    pub visible: bool,
}

/// Mutable desktop model shared between the backend and its drivers.
#[derive(Debug, Clone)]
pub struct SyntheticDesktop {
    pub monitors: Vec<MonitorGeometry>,
    pub windows: Vec<SyntheticWindow>,
    pub webcam_count: usize,
}

impl SyntheticDesktop {
    /// A single 1920x1080 monitor, one window, one webcam.
    pub fn single_monitor() -> Self {
        Self {
            monitors: vec![MonitorGeometry {
                index: 0,
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
                is_primary: true,
                name: "Synthetic Display 0".into(),
            }],
            windows: vec![SyntheticWindow {
                id: "syn-window-0".into(),
                title: "Synthetic Window".into(),
                bounds: CaptureRegion {
                    x: 100,
                    y: 100,
                    width: 320,
                    height: 240,
                },
                visible: true,
            }],
            webcam_count: 1,
        }
    }
}

/// Test-pattern backend over a shared [`SyntheticDesktop`].
pub struct SyntheticBackends {
    desktop: Arc<Mutex<SyntheticDesktop>>,
}

impl SyntheticBackends {
    pub fn new(desktop: SyntheticDesktop) -> Self {
        Self {
            desktop: Arc::new(Mutex::new(desktop)),
        }
    }

    /// Shared handle for mutating the desktop mid-session (move windows,
    /// unplug the webcam).
    pub fn desktop(&self) -> Arc<Mutex<SyntheticDesktop>> {
        Arc::clone(&self.desktop)
    }
}

impl Default for SyntheticBackends {
    fn default() -> Self {
        Self::new(SyntheticDesktop::single_monitor())
    }
}

impl CaptureBackends for SyntheticBackends {
    fn monitors(&self) -> CaptureResult<Vec<MonitorGeometry>> {
        Ok(self.desktop.lock().monitors.clone())
    }

    fn create_screen_driver(&self) -> CaptureResult<Box<dyn SourceDriver>> {
        Ok(Box::new(SyntheticScreenDriver {
            region: None,
            tick: 0,
        }))
    }

    fn create_window_driver(&self) -> CaptureResult<Box<dyn SourceDriver>> {
        Ok(Box::new(SyntheticWindowDriver {
            desktop: Arc::clone(&self.desktop),
            window_id: None,
            region: None,
            tick: 0,
        }))
    }

    fn create_webcam_driver(&self) -> CaptureResult<Box<dyn SourceDriver>> {
        Ok(Box::new(SyntheticWebcamDriver {
            desktop: Arc::clone(&self.desktop),
            producer: None,
        }))
    }

    fn enumerate_windows(&self) -> CaptureResult<Vec<SourceInfo>> {
        Ok(self
            .desktop
            .lock()
            .windows
            .iter()
            .map(|w| SourceInfo {
                id: w.id.clone(),
                name: w.title.clone(),
                kind: SourceKind::Window,
                width: w.bounds.width,
                height: w.bounds.height,
            })
            .collect())
    }

    fn enumerate_webcams(&self) -> CaptureResult<Vec<SourceInfo>> {
        Ok((0..self.desktop.lock().webcam_count)
            .map(|i| SourceInfo {
                id: format!("syn-cam-{i}"),
                name: format!("Synthetic Camera {i}"),
                kind: SourceKind::Webcam,
                width: 640,
                height: 480,
            })
            .collect())
    }
}

/// Render one RGBA gradient frame. `tick` shifts the pattern so motion
/// is visible frame to frame.
pub fn render_pattern(width: u32, height: u32, tick: u64) -> RawFrame {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push(((x as u64 + tick) & 0xFF) as u8);
            pixels.push(((y as u64 + tick / 2) & 0xFF) as u8);
            pixels.push((tick & 0xFF) as u8);
            pixels.push(0xFF);
        }
    }
    RawFrame {
        pixels,
        width,
        height,
    }
}

struct SyntheticScreenDriver {
    region: Option<CaptureRegion>,
    tick: u64,
}

impl SourceDriver for SyntheticScreenDriver {
    fn open(&mut self, source: &ResolvedSource) -> Result<(), OpenError> {
        match source {
            ResolvedSource::Screen { region, .. } => {
                self.region = Some(*region);
                Ok(())
            }
            other => Err(OpenError::Backend(format!(
                "screen driver opened with {other:?}"
            ))),
        }
    }

    fn poll_once(&mut self) -> CaptureResult<Option<RawFrame>> {
        let region = self.region.ok_or(CaptureError::SessionClosed)?;
        self.tick += 1;
        Ok(Some(render_pattern(region.width, region.height, self.tick)))
    }

    fn close(&mut self) {
        self.region = None;
    }
}

struct SyntheticWindowDriver {
    desktop: Arc<Mutex<SyntheticDesktop>>,
    window_id: Option<String>,
    region: Option<CaptureRegion>,
    tick: u64,
}

impl SyntheticWindowDriver {
    fn lookup(&self) -> CaptureResult<Option<SyntheticWindow>> {
        let id = self.window_id.as_ref().ok_or(CaptureError::SessionClosed)?;
        Ok(self
            .desktop
            .lock()
            .windows
            .iter()
            .find(|w| &w.id == id)
            .cloned())
    }
}

impl SourceDriver for SyntheticWindowDriver {
    fn open(&mut self, source: &ResolvedSource) -> Result<(), OpenError> {
        match source {
            ResolvedSource::Window { id, .. } => {
                self.window_id = Some(id.clone());
                Ok(())
            }
            other => Err(OpenError::Backend(format!(
                "window driver opened with {other:?}"
            ))),
        }
    }

    fn poll_once(&mut self) -> CaptureResult<Option<RawFrame>> {
        let window = self
            .lookup()?
            .ok_or_else(|| CaptureError::SourceLost("window closed".into()))?;
        if !window.visible {
            return Ok(None);
        }
        let region = self.region.unwrap_or(window.bounds);
        self.tick += 1;
        Ok(Some(render_pattern(region.width, region.height, self.tick)))
    }

    fn close(&mut self) {
        self.window_id = None;
        self.region = None;
    }

    fn tracked_bounds(&mut self) -> CaptureResult<TrackedBounds> {
        match self.lookup()? {
            Some(window) if window.visible => Ok(TrackedBounds::Visible(window.bounds)),
            Some(_) => Ok(TrackedBounds::Hidden),
            None => Err(CaptureError::SourceLost("window closed".into())),
        }
    }

    fn apply_region(&mut self, region: CaptureRegion) {
        self.region = Some(region);
    }
}

struct WebcamProducer {
    frames: Receiver<RawFrame>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Drop for WebcamProducer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct SyntheticWebcamDriver {
    desktop: Arc<Mutex<SyntheticDesktop>>,
    producer: Option<WebcamProducer>,
}

impl SourceDriver for SyntheticWebcamDriver {
    fn open(&mut self, source: &ResolvedSource) -> Result<(), OpenError> {
        let (device_index, (width, height), fps) = match source {
            ResolvedSource::Webcam {
                device_index,
                resolution,
                fps,
            } => (*device_index, *resolution, *fps),
            other => {
                return Err(OpenError::Backend(format!(
                    "webcam driver opened with {other:?}"
                )))
            }
        };

        let (tx, rx) = bounded(WEBCAM_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        let tick = AtomicU64::new(0);

        // The device callback path: a producer thread pushes frames at
        // device rate; stale frames are shed when the channel is full so
        // the consumer always drains the freshest.
        let handle = std::thread::Builder::new()
            .name(format!("synthetic-webcam-{device_index}"))
            .spawn(move || {
                while !stop_flag.load(Ordering::SeqCst) {
                    let n = tick.fetch_add(1, Ordering::Relaxed);
                    let frame = render_pattern(width, height, n);
                    match tx.try_send(frame) {
                        Ok(()) | Err(TrySendError::Full(_)) => {}
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                    std::thread::sleep(interval);
                }
            })
            .map_err(|e| OpenError::Backend(format!("failed to spawn webcam producer: {e}")))?;

        debug!(device_index, fps, "synthetic webcam producer started");
        self.producer = Some(WebcamProducer {
            frames: rx,
            stop,
            handle: Some(handle),
        });
        Ok(())
    }

    fn poll_once(&mut self) -> CaptureResult<Option<RawFrame>> {
        if self.desktop.lock().webcam_count == 0 {
            return Err(CaptureError::SourceLost("webcam unplugged".into()));
        }
        let producer = self.producer.as_ref().ok_or(CaptureError::SessionClosed)?;
        Ok(drain_latest(&producer.frames))
    }

    fn close(&mut self) {
        self.producer = None;
    }
}

/// Drain a receiver down to its most recent element, discarding the
/// rest. Non-blocking.
pub(crate) fn drain_latest<T>(rx: &Receiver<T>) -> Option<T> {
    let mut latest = None;
    while let Ok(item) = rx.try_recv() {
        latest = Some(item);
    }
    latest
}
