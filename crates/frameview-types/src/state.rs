//! Engine state machine type.

use serde::{Deserialize, Serialize};

/// The current state of the capture engine.
///
/// Legal transitions: `Idle → Configured → Capturing → (Paused) → Idle`,
/// plus `Capturing → Recovering` on source loss. Recovery either returns
/// to `Capturing` or falls back to `Idle` after the retry cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No source configured, nothing captured.
    #[default]
    Idle,

    /// A source is configured but capture has not started.
    Configured,

    /// Actively polling the source each tick.
    Capturing,

    /// Capture suspended; the session stays open.
    Paused,

    /// The source was lost; bounded reconnection attempts in progress.
    Recovering,
}

impl EngineState {
    /// Returns true if the engine is in the Idle state.
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a source is configured (capture may be started).
    pub fn is_configured(self) -> bool {
        matches!(self, Self::Configured)
    }

    /// Returns true if the engine is actively capturing.
    pub fn is_capturing(self) -> bool {
        matches!(self, Self::Capturing)
    }

    /// Returns true if capture is paused.
    pub fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Returns true if the engine is attempting source recovery.
    pub fn is_recovering(self) -> bool {
        matches!(self, Self::Recovering)
    }

    /// Returns true while a session is open (capturing, paused or
    /// recovering).
    pub fn has_session(self) -> bool {
        matches!(self, Self::Capturing | Self::Paused | Self::Recovering)
    }

    /// Returns a simple string representation of the state.
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Configured => "Configured",
            Self::Capturing => "Capturing",
            Self::Paused => "Paused",
            Self::Recovering => "Recovering",
        }
    }
}
