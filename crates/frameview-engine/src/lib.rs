//! Tick-driven capture engine.
//!
//! [`CaptureEngine`] owns one source session and one frame ring and
//! walks the `Idle → Configured → Capturing → (Paused) → Idle` state
//! machine, with bounded recovery when a source disappears mid-capture.
//! The surrounding modules supply the pieces: frame pacing, statistics,
//! recovery scheduling, hotkey dispatch and interactive region
//! selection.

mod engine;
mod hotkeys;
mod pacing;
mod recovery;
mod selection;
mod stats;

pub use engine::{CaptureEngine, EngineError};
pub use hotkeys::{EngineAction, HotkeyError, HotkeyMap, KeyEvent};
pub use pacing::FramePacer;
pub use recovery::{RecoveryPolicy, RecoveryState};
pub use selection::{RegionSelection, SelectionState};
pub use stats::StatsCollector;
