//! Error types for the capture layer.

use thiserror::Error;

use frameview_types::ConfigError;

/// Errors that can occur while a session is live.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// The capture target disappeared (window closed, device unplugged).
    /// Recoverable: the engine enters bounded reconnection.
    #[error("capture source lost: {0}")]
    SourceLost(String),

    /// A single poll failed but the source is presumed still valid.
    /// Retried on the next tick without a state change.
    #[error("transient capture failure: {0}")]
    Transient(String),

    /// The native capture API refused the call outright.
    #[error("capture backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A driver returned pixel data that does not match its reported
    /// dimensions.
    #[error("frame size mismatch: got {got} bytes, expected {expected} for {width}x{height}")]
    FrameSizeMismatch {
        got: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    /// Poll on a session whose driver was already released.
    #[error("session is closed")]
    SessionClosed,
}

impl CaptureError {
    /// Whether the engine should enter recovery rather than surface the
    /// error terminally.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SourceLost(_))
    }

    /// Whether the next tick may simply retry the poll.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Failure to open a source session.
#[derive(Debug, Clone, Error)]
pub enum OpenError {
    /// The configuration was rejected before any backend call.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backend failed to initialize for a valid configuration.
    #[error("backend failed to open source: {0}")]
    Backend(String),
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;
