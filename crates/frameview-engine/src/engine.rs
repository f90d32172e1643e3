//! The capture engine: a tick-driven state machine over one source
//! session and one frame ring.
//!
//! Single-writer by contract: every mutating call happens on the host's
//! control thread, so the engine holds no locks. The host drives
//! [`CaptureEngine::update`] at whatever cadence it likes; the pacer
//! inside enforces the configured frame rate regardless of tick rate.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use frameview_capture::{
    CaptureBackends, CaptureError, CursorCompositor, CursorMode, Frame, FrameBuffer, FrameMeta,
    OpenError, PixelFormat, PointerQuery, SourceSession, DEFAULT_BUFFER_CAPACITY,
};
use frameview_types::{
    CaptureConfig, CaptureStats, EngineState, MonitorGeometry, SourceAvailability, SourceInfo,
    SourceKind,
};

use crate::pacing::FramePacer;
use crate::recovery::{RecoveryPolicy, RecoveryState};
use crate::stats::StatsCollector;

/// Engine-level operation failures.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `start_capture` with no source configured.
    #[error("no capture source configured")]
    NotConfigured,

    /// An operation that is not legal in the current state.
    #[error("{op} is not valid while {state}")]
    InvalidState {
        op: &'static str,
        state: &'static str,
    },

    /// Session open failed (bad config or backend refusal).
    #[error(transparent)]
    Open(#[from] OpenError),
}

/// Live capture engine over a set of backend capabilities.
pub struct CaptureEngine {
    backends: Arc<dyn CaptureBackends>,
    state: EngineState,
    config: Option<CaptureConfig>,
    session: Option<SourceSession>,
    buffer: FrameBuffer,
    stats: StatsCollector,
    pacer: Option<FramePacer>,
    cursor: Option<CursorCompositor>,
    recovery_policy: RecoveryPolicy,
    recovery: Option<RecoveryState>,
    sequence: u64,
}

impl CaptureEngine {
    pub fn new(backends: Arc<dyn CaptureBackends>) -> Self {
        Self {
            backends,
            state: EngineState::Idle,
            config: None,
            session: None,
            buffer: FrameBuffer::new(DEFAULT_BUFFER_CAPACITY),
            stats: StatsCollector::new(),
            pacer: None,
            cursor: None,
            recovery_policy: RecoveryPolicy::default(),
            recovery: None,
            sequence: 0,
        }
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer = FrameBuffer::new(capacity);
        self
    }

    pub fn with_recovery_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.recovery_policy = policy;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> Option<&CaptureConfig> {
        self.config.as_ref()
    }

    /// Configure (or switch) the capture source.
    ///
    /// The new config is validated against live enumerations before the
    /// current session is touched, so a rejected config leaves a running
    /// capture exactly as it was. With a session open, the old one is
    /// closed fully before the replacement opens; an in-flight recovery
    /// episode is cancelled, superseded by the new source.
    #[instrument(skip_all)]
    pub fn set_source(&mut self, config: CaptureConfig) -> Result<(), OpenError> {
        SourceSession::validate(self.backends.as_ref(), &config)?;

        let was_live = self.state.has_session();
        let was_paused = self.state.is_paused();

        self.recovery = None;
        if let Some(mut session) = self.session.take() {
            session.close();
        }

        self.config = Some(config.clone());

        if !was_live {
            self.transition_to(EngineState::Configured);
            return Ok(());
        }

        match SourceSession::open(self.backends.as_ref(), &config) {
            Ok(session) => {
                info!(frame_rate = config.frame_rate, "capture source switched");
                self.session = Some(session);
                self.pacer = Some(FramePacer::new(config.frame_rate));
                self.stats.clear_last_error();
                self.transition_to(if was_paused {
                    EngineState::Paused
                } else {
                    EngineState::Capturing
                });
                Ok(())
            }
            Err(e) => {
                // Old session is already gone; fall back to Configured so
                // the host can retry start_capture.
                warn!(error = %e, "replacement source failed to open");
                self.pacer = None;
                self.stats.set_last_error(e.to_string());
                self.transition_to(EngineState::Configured);
                Err(e)
            }
        }
    }

    /// Open a session for the configured source and begin capturing.
    /// A no-op when a session is already open.
    #[instrument(skip(self))]
    pub fn start_capture(&mut self) -> Result<(), EngineError> {
        if self.state.has_session() {
            debug!(state = self.state.name(), "start_capture ignored");
            return Ok(());
        }

        let config = self.config.clone().ok_or(EngineError::NotConfigured)?;
        match SourceSession::open(self.backends.as_ref(), &config) {
            Ok(session) => {
                info!(frame_rate = config.frame_rate, "capture started");
                self.session = Some(session);
                self.pacer = Some(FramePacer::new(config.frame_rate));
                self.stats.start(Instant::now());
                self.transition_to(EngineState::Capturing);
                Ok(())
            }
            Err(e) => {
                self.stats.set_last_error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Stop capturing and release the session. The last buffered frame
    /// stays readable until [`clear_buffer`](Self::clear_buffer) or the
    /// next capture overwrites it.
    #[instrument(skip(self))]
    pub fn stop_capture(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        self.recovery = None;
        self.pacer = None;
        self.config = None;
        self.stats.stop();
        if !self.state.is_idle() {
            info!(frames = self.stats.frames_captured(), "capture stopped");
            self.transition_to(EngineState::Idle);
        }
    }

    /// Suspend polling without closing the session.
    pub fn pause(&mut self) -> Result<(), EngineError> {
        if !self.state.is_capturing() {
            return Err(EngineError::InvalidState {
                op: "pause",
                state: self.state.name(),
            });
        }
        self.transition_to(EngineState::Paused);
        Ok(())
    }

    /// Resume a paused capture.
    pub fn resume(&mut self) -> Result<(), EngineError> {
        if !self.state.is_paused() {
            return Err(EngineError::InvalidState {
                op: "resume",
                state: self.state.name(),
            });
        }
        if let Some(pacer) = &mut self.pacer {
            pacer.reset();
        }
        self.transition_to(EngineState::Capturing);
        Ok(())
    }

    /// One engine tick at `now`. Polls the source when capturing and a
    /// frame is due, or drives recovery when the source was lost. A
    /// no-op in every other state.
    pub fn update(&mut self, now: Instant) {
        match self.state {
            EngineState::Capturing => self.tick_capture(now),
            EngineState::Recovering => self.tick_recovery(now),
            _ => {}
        }
    }

    fn tick_capture(&mut self, now: Instant) {
        let due = self.pacer.as_ref().is_some_and(|p| p.due(now));
        if !due {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match session.poll_frame() {
            Ok(Some(mut raw)) => {
                // Reject malformed pixel data before the compositor
                // touches it; a driver misreporting dimensions must land
                // on the drop path, not panic mid-blend.
                if let Err(e) = raw.check(PixelFormat::Rgba8) {
                    warn!(error = %e, "driver returned malformed frame");
                    self.stats.record_dropped();
                    return;
                }

                let origin = session.capture_origin();
                let monitor_index = session.monitor_index();
                let (cursor, composited) = match &self.cursor {
                    Some(compositor) => compositor.apply(&mut raw, origin),
                    None => (None, false),
                };

                let mut meta = FrameMeta::new(now, self.sequence);
                meta.monitor_index = monitor_index;
                meta.cursor = cursor;
                meta.cursor_composited = composited;

                match self.buffer.write_frame(&raw, PixelFormat::Rgba8, meta) {
                    Ok(()) => {
                        self.sequence += 1;
                        self.stats.record_captured(now);
                        if let Some(pacer) = &mut self.pacer {
                            pacer.mark_accepted(now);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "frame rejected by buffer");
                        self.stats.record_dropped();
                    }
                }
            }
            Ok(None) => {}
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "source lost, entering recovery");
                self.stats.record_dropped();
                self.stats.set_last_error(e.to_string());
                if let Some(mut session) = self.session.take() {
                    session.close();
                }
                self.recovery = Some(self.recovery_policy.begin(now));
                self.transition_to(EngineState::Recovering);
            }
            Err(e) => {
                debug!(error = %e, "transient capture failure");
                self.stats.record_dropped();
                if let Some(pacer) = &mut self.pacer {
                    pacer.mark_transient();
                }
            }
        }
    }

    fn tick_recovery(&mut self, now: Instant) {
        let (due, attempts) = match &self.recovery {
            Some(recovery) => (recovery.due(now), recovery.attempts()),
            None => {
                self.transition_to(EngineState::Idle);
                return;
            }
        };
        if !due {
            return;
        }
        let Some(config) = self.config.clone() else {
            self.recovery = None;
            self.transition_to(EngineState::Idle);
            return;
        };

        match SourceSession::open(self.backends.as_ref(), &config) {
            Ok(session) => {
                info!(attempts, "capture source recovered");
                self.session = Some(session);
                self.recovery = None;
                if let Some(pacer) = &mut self.pacer {
                    pacer.reset();
                }
                self.stats.clear_last_error();
                self.transition_to(EngineState::Capturing);
            }
            Err(e) => {
                self.stats.record_dropped();
                let exhausted = match &mut self.recovery {
                    Some(recovery) => recovery.record_failure(&self.recovery_policy, now),
                    None => true,
                };
                if exhausted {
                    warn!(error = %e, "recovery attempts exhausted, giving up");
                    self.stats.set_last_error(e.to_string());
                    self.stats.stop();
                    self.recovery = None;
                    self.pacer = None;
                    self.config = None;
                    self.transition_to(EngineState::Idle);
                } else {
                    debug!(error = %e, "recovery attempt failed, backing off");
                }
            }
        }
    }

    /// Latest fully written frame, if any.
    pub fn get_frame(&self) -> Option<&Frame> {
        self.buffer.latest()
    }

    /// Drop every buffered frame and release slot memory.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Bytes currently resident in the frame ring.
    pub fn buffer_memory_usage(&self) -> usize {
        self.buffer.memory_usage()
    }

    /// Statistics snapshot taken at the current time.
    pub fn get_stats(&mut self) -> CaptureStats {
        self.stats_at(Instant::now())
    }

    /// Statistics snapshot taken at `now`.
    pub fn stats_at(&mut self, now: Instant) -> CaptureStats {
        let effective = self
            .pacer
            .as_ref()
            .map(|p| p.effective_rate())
            .or_else(|| self.config.as_ref().map(|c| c.frame_rate))
            .unwrap_or(0);
        self.stats.snapshot(now, effective)
    }

    /// Install a pointer source with the given cursor mode.
    pub fn set_cursor(&mut self, mode: CursorMode, pointer: Box<dyn PointerQuery>) {
        self.cursor = Some(CursorCompositor::new(mode, pointer));
    }

    /// Change the cursor mode of an installed pointer source.
    pub fn set_cursor_mode(&mut self, mode: CursorMode) {
        if let Some(compositor) = &mut self.cursor {
            compositor.set_mode(mode);
        }
    }

    /// Live monitor enumeration from the backend.
    pub fn get_available_monitors(&self) -> Result<Vec<MonitorGeometry>, CaptureError> {
        self.backends.monitors()
    }

    /// Per-source-type availability, one entry per kind. Enumeration
    /// failures become unavailability with a reason, never an error.
    pub fn get_available_sources(&self) -> Vec<SourceAvailability> {
        let screens = self.backends.monitors().map(|monitors| {
            monitors
                .iter()
                .map(|m| SourceInfo {
                    id: format!("monitor-{}", m.index),
                    name: m.name.clone(),
                    kind: SourceKind::Screen,
                    width: m.width,
                    height: m.height,
                })
                .collect()
        });
        vec![
            availability(SourceKind::Screen, screens),
            availability(SourceKind::Window, self.backends.enumerate_windows()),
            availability(SourceKind::Webcam, self.backends.enumerate_webcams()),
        ]
    }

    fn transition_to(&mut self, next: EngineState) {
        if self.state != next {
            debug!(
                from = self.state.name(),
                to = next.name(),
                "engine state transition"
            );
            self.state = next;
        }
    }
}

fn availability(
    kind: SourceKind,
    sources: Result<Vec<SourceInfo>, CaptureError>,
) -> SourceAvailability {
    match sources {
        Ok(sources) => SourceAvailability {
            kind,
            available: !sources.is_empty(),
            reason: sources.is_empty().then(|| "none enumerated".to_string()),
            sources,
        },
        Err(e) => SourceAvailability {
            kind,
            available: false,
            reason: Some(e.to_string()),
            sources: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;

    use frameview_capture::{CaptureResult, CursorState, RawFrame, ResolvedSource, SourceDriver};
    use frameview_types::{ConfigError, QualityTier, ScreenSelection, SourceConfig};

    #[derive(Clone, Copy)]
    enum PollScript {
        Frame,
        ShortFrame,
        NoFrame,
        Transient,
        Lost,
    }

    struct ScriptedDriver {
        script: Arc<Mutex<PollScript>>,
        open_fails: Arc<AtomicBool>,
        opens: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
    }

    impl SourceDriver for ScriptedDriver {
        fn open(&mut self, _source: &ResolvedSource) -> Result<(), OpenError> {
            if self.open_fails.load(Ordering::SeqCst) {
                return Err(OpenError::Backend("device missing".into()));
            }
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn poll_once(&mut self) -> CaptureResult<Option<RawFrame>> {
            match *self.script.lock() {
                PollScript::Frame => Ok(Some(RawFrame {
                    pixels: vec![0x40; 8 * 8 * 4],
                    width: 8,
                    height: 8,
                })),
                // Dimensions claim 8x8 but the buffer is far too short.
                PollScript::ShortFrame => Ok(Some(RawFrame {
                    pixels: vec![0x40; 8],
                    width: 8,
                    height: 8,
                })),
                PollScript::NoFrame => Ok(None),
                PollScript::Transient => Err(CaptureError::Transient("busy".into())),
                PollScript::Lost => Err(CaptureError::SourceLost("gone".into())),
            }
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct ScriptedBackends {
        script: Arc<Mutex<PollScript>>,
        open_fails: Arc<AtomicBool>,
        opens: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
    }

    impl ScriptedBackends {
        fn new() -> Self {
            Self {
                script: Arc::new(Mutex::new(PollScript::Frame)),
                open_fails: Arc::new(AtomicBool::new(false)),
                opens: Arc::new(AtomicUsize::new(0)),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn driver(&self) -> Box<dyn SourceDriver> {
            Box::new(ScriptedDriver {
                script: Arc::clone(&self.script),
                open_fails: Arc::clone(&self.open_fails),
                opens: Arc::clone(&self.opens),
                closes: Arc::clone(&self.closes),
            })
        }
    }

    impl CaptureBackends for ScriptedBackends {
        fn monitors(&self) -> CaptureResult<Vec<MonitorGeometry>> {
            Ok(vec![MonitorGeometry {
                index: 0,
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
                is_primary: true,
                name: "Display 0".into(),
            }])
        }

        fn create_screen_driver(&self) -> CaptureResult<Box<dyn SourceDriver>> {
            Ok(self.driver())
        }

        fn create_window_driver(&self) -> CaptureResult<Box<dyn SourceDriver>> {
            Ok(self.driver())
        }

        fn create_webcam_driver(&self) -> CaptureResult<Box<dyn SourceDriver>> {
            Ok(self.driver())
        }

        fn enumerate_windows(&self) -> CaptureResult<Vec<SourceInfo>> {
            Ok(Vec::new())
        }

        fn enumerate_webcams(&self) -> CaptureResult<Vec<SourceInfo>> {
            Ok(vec![SourceInfo {
                id: "cam0".into(),
                name: "Integrated Camera".into(),
                kind: SourceKind::Webcam,
                width: 640,
                height: 480,
            }])
        }
    }

    fn monitor_config(frame_rate: u32) -> CaptureConfig {
        CaptureConfig {
            source: SourceConfig::Screen {
                selection: ScreenSelection::Monitor(0),
            },
            frame_rate,
            quality: QualityTier::Medium,
        }
    }

    fn webcam_config() -> CaptureConfig {
        CaptureConfig {
            source: SourceConfig::Webcam {
                device_index: 0,
                resolution: (640, 480),
                fps: 30,
            },
            frame_rate: 30,
            quality: QualityTier::Medium,
        }
    }

    fn fast_recovery() -> RecoveryPolicy {
        RecoveryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(40),
        }
    }

    fn capturing_engine(backends: &Arc<ScriptedBackends>, frame_rate: u32) -> CaptureEngine {
        let mut engine = CaptureEngine::new(Arc::clone(backends) as Arc<dyn CaptureBackends>)
            .with_recovery_policy(fast_recovery());
        engine.set_source(monitor_config(frame_rate)).unwrap();
        engine.start_capture().unwrap();
        engine
    }

    #[test]
    fn rate_ceiling_bounds_accepted_frames() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);

        // Tick at 100Hz for 100ms: at most 3 frames fit under a 30fps
        // ceiling (one per elapsed ~33ms interval).
        let t0 = Instant::now();
        for i in 1..=10 {
            engine.update(t0 + Duration::from_millis(i * 10));
        }
        let stats = engine.stats_at(t0 + Duration::from_millis(100));
        assert!(stats.frames_captured <= 3, "got {}", stats.frames_captured);
        assert!(stats.frames_captured >= 2);
    }

    #[test]
    fn sequence_numbers_increase_monotonically() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);

        let t0 = Instant::now();
        engine.update(t0);
        let first = engine.get_frame().unwrap().meta().sequence;
        engine.update(t0 + Duration::from_secs(1));
        let second = engine.get_frame().unwrap().meta().sequence;
        assert!(second > first);
    }

    #[test]
    fn stop_keeps_last_frame_until_cleared() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);
        engine.update(Instant::now());
        assert!(engine.get_frame().is_some());

        engine.stop_capture();
        assert!(engine.state().is_idle());
        assert!(engine.get_frame().is_some());

        engine.clear_buffer();
        assert!(engine.get_frame().is_none());
        assert_eq!(engine.buffer_memory_usage(), 0);
    }

    #[test]
    fn start_without_source_is_not_configured() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = CaptureEngine::new(backends as Arc<dyn CaptureBackends>);
        assert!(matches!(
            engine.start_capture(),
            Err(EngineError::NotConfigured)
        ));
        assert!(engine.state().is_idle());
    }

    #[test]
    fn rejected_source_leaves_running_session_untouched() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);

        let bad = CaptureConfig {
            source: SourceConfig::Screen {
                selection: ScreenSelection::Monitor(5),
            },
            ..monitor_config(30)
        };
        assert!(matches!(
            engine.set_source(bad),
            Err(OpenError::Config(ConfigError::MonitorOutOfRange {
                index: 5,
                ..
            }))
        ));

        assert!(engine.state().is_capturing());
        assert_eq!(backends.closes.load(Ordering::SeqCst), 0);
        engine.update(Instant::now());
        assert!(engine.get_frame().is_some());
    }

    #[test]
    fn switching_source_closes_old_session_exactly_once() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);
        assert_eq!(backends.opens.load(Ordering::SeqCst), 1);

        engine.set_source(webcam_config()).unwrap();
        assert!(engine.state().is_capturing());
        assert_eq!(backends.closes.load(Ordering::SeqCst), 1);
        assert_eq!(backends.opens.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn pause_gates_polling_and_resume_restores_it() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);

        let t0 = Instant::now();
        engine.update(t0);
        let captured = engine.stats_at(t0).frames_captured;
        assert_eq!(captured, 1);

        engine.pause().unwrap();
        assert!(engine.state().is_paused());
        for i in 1..10 {
            engine.update(t0 + Duration::from_secs(i));
        }
        assert_eq!(engine.stats_at(t0).frames_captured, captured);

        engine.resume().unwrap();
        engine.update(t0 + Duration::from_secs(20));
        assert_eq!(
            engine.stats_at(t0 + Duration::from_secs(20)).frames_captured,
            captured + 1
        );
    }

    #[test]
    fn pause_outside_capturing_is_invalid() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = CaptureEngine::new(backends as Arc<dyn CaptureBackends>);
        assert!(matches!(
            engine.pause(),
            Err(EngineError::InvalidState { op: "pause", .. })
        ));
        assert!(matches!(
            engine.resume(),
            Err(EngineError::InvalidState { op: "resume", .. })
        ));
    }

    #[test]
    fn source_loss_enters_recovery_then_reconnects() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);

        *backends.script.lock() = PollScript::Lost;
        let t0 = Instant::now();
        engine.update(t0);
        assert!(engine.state().is_recovering());
        assert_eq!(backends.closes.load(Ordering::SeqCst), 1);
        assert!(engine.stats_at(t0).frames_dropped >= 1);

        // Source comes back before the first retry fires.
        *backends.script.lock() = PollScript::Frame;
        engine.update(t0 + Duration::from_millis(50));
        assert!(engine.state().is_capturing());
        assert_eq!(backends.opens.load(Ordering::SeqCst), 2);

        engine.update(t0 + Duration::from_millis(100));
        assert!(engine.get_frame().is_some());
    }

    #[test]
    fn exhausted_recovery_falls_back_to_idle_with_error() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);

        *backends.script.lock() = PollScript::Lost;
        backends.open_fails.store(true, Ordering::SeqCst);

        let t0 = Instant::now();
        engine.update(t0);
        assert!(engine.state().is_recovering());

        // Step well past every backoff; 3 attempts then give up.
        for i in 1..=10 {
            engine.update(t0 + Duration::from_secs(i));
        }
        assert!(engine.state().is_idle());
        let stats = engine.stats_at(t0 + Duration::from_secs(10));
        assert!(stats.last_error.is_some());
        // Idle engines do not accrue uptime.
        assert_eq!(stats.uptime_seconds, 0);

        // No further reopen attempts once idle.
        backends.open_fails.store(false, Ordering::SeqCst);
        engine.update(t0 + Duration::from_secs(60));
        assert!(engine.state().is_idle());
        assert_eq!(backends.opens.load(Ordering::SeqCst), 1);
        assert!(matches!(
            engine.start_capture(),
            Err(EngineError::NotConfigured)
        ));
    }

    #[test]
    fn set_source_during_recovery_cancels_it() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);

        *backends.script.lock() = PollScript::Lost;
        backends.open_fails.store(true, Ordering::SeqCst);
        let t0 = Instant::now();
        engine.update(t0);
        assert!(engine.state().is_recovering());

        *backends.script.lock() = PollScript::Frame;
        backends.open_fails.store(false, Ordering::SeqCst);
        engine.set_source(webcam_config()).unwrap();
        assert!(engine.state().is_capturing());

        engine.update(t0 + Duration::from_secs(1));
        assert!(engine.get_frame().is_some());
    }

    #[test]
    fn sustained_transients_degrade_effective_rate_to_floor() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 60);

        *backends.script.lock() = PollScript::Transient;
        let t0 = Instant::now();
        for i in 0..100 {
            engine.update(t0 + Duration::from_millis(i));
        }
        let stats = engine.stats_at(t0 + Duration::from_millis(100));
        assert_eq!(stats.effective_frame_rate, 5);
        assert!(engine.state().is_capturing());

        // One good frame starts ramping the rate back up.
        *backends.script.lock() = PollScript::Frame;
        engine.update(t0 + Duration::from_secs(1));
        let stats = engine.stats_at(t0 + Duration::from_secs(1));
        assert!(stats.effective_frame_rate > 5);
    }

    #[test]
    fn no_frame_ready_changes_nothing() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);

        *backends.script.lock() = PollScript::NoFrame;
        let t0 = Instant::now();
        engine.update(t0);
        let stats = engine.stats_at(t0);
        assert_eq!(stats.frames_captured, 0);
        assert_eq!(stats.frames_dropped, 0);
        assert!(engine.get_frame().is_none());
    }

    struct FixedPointer(CursorState);

    impl PointerQuery for FixedPointer {
        fn cursor(&self) -> Option<CursorState> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn cursor_metadata_rides_along_with_frames() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);
        engine.set_cursor(
            CursorMode::Overlay,
            Box::new(FixedPointer(CursorState {
                x: 2,
                y: 2,
                visible: true,
                hotspot_x: 0,
                hotspot_y: 0,
                shape_width: 2,
                shape_height: 2,
                shape_rgba: vec![255, 255, 255, 255].repeat(4),
            })),
        );

        engine.update(Instant::now());
        let frame = engine.get_frame().unwrap();
        assert!(frame.meta().cursor.is_some());
        assert!(frame.meta().cursor_composited);
        assert_eq!(frame.meta().monitor_index, Some(0));
    }

    #[test]
    fn metadata_only_mode_leaves_pixels_alone() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);
        engine.set_cursor(
            CursorMode::MetadataOnly,
            Box::new(FixedPointer(CursorState {
                x: 2,
                y: 2,
                visible: true,
                hotspot_x: 0,
                hotspot_y: 0,
                shape_width: 2,
                shape_height: 2,
                shape_rgba: vec![255, 255, 255, 255].repeat(4),
            })),
        );

        engine.update(Instant::now());
        let frame = engine.get_frame().unwrap();
        assert!(frame.meta().cursor.is_some());
        assert!(!frame.meta().cursor_composited);
        assert!(frame.pixels().iter().all(|&b| b == 0x40));
    }

    #[test]
    fn short_driver_frame_with_overlay_is_dropped_not_a_panic() {
        let backends = Arc::new(ScriptedBackends::new());
        let mut engine = capturing_engine(&backends, 30);
        engine.set_cursor(
            CursorMode::Overlay,
            Box::new(FixedPointer(CursorState {
                x: 2,
                y: 2,
                visible: true,
                hotspot_x: 0,
                hotspot_y: 0,
                shape_width: 2,
                shape_height: 2,
                shape_rgba: vec![255, 255, 255, 255].repeat(4),
            })),
        );

        *backends.script.lock() = PollScript::ShortFrame;
        let t0 = Instant::now();
        engine.update(t0);

        let stats = engine.stats_at(t0);
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.frames_captured, 0);
        assert!(engine.get_frame().is_none());
        assert!(engine.state().is_capturing());

        // Honest frames keep flowing afterwards.
        *backends.script.lock() = PollScript::Frame;
        engine.update(t0 + Duration::from_secs(1));
        assert!(engine.get_frame().is_some());
    }

    #[test]
    fn available_sources_report_each_kind() {
        let backends = Arc::new(ScriptedBackends::new());
        let engine = CaptureEngine::new(backends as Arc<dyn CaptureBackends>);
        let sources = engine.get_available_sources();
        assert_eq!(sources.len(), 3);

        let screen = &sources[0];
        assert_eq!(screen.kind, SourceKind::Screen);
        assert!(screen.available);
        assert_eq!(screen.sources.len(), 1);

        // No windows enumerated: unavailable with a reason.
        let windows = &sources[1];
        assert_eq!(windows.kind, SourceKind::Window);
        assert!(!windows.available);
        assert!(windows.reason.is_some());

        let webcams = &sources[2];
        assert!(webcams.available);
    }
}
