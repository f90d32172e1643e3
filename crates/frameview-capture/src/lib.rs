//! Frame memory and source sessions for frameview.
//!
//! This crate owns everything between the native capture drivers and the
//! engine: the fixed-ring [`FrameBuffer`], the [`SourceDriver`] /
//! [`CaptureBackends`] capability contract that every driver is adapted
//! to, the [`SourceSession`] lifecycle, and cursor compositing.

mod backend;
mod cursor;
mod error;
mod frame;
mod session;
pub mod synthetic;

pub use backend::{CaptureBackends, ResolvedSource, SourceDriver, TrackedBounds};
pub use cursor::{CursorCompositor, CursorMode, CursorState, PointerQuery};
pub use error::{CaptureError, CaptureResult, OpenError};
pub use frame::{
    Frame, FrameBuffer, FrameMeta, PixelFormat, RawFrame, DEFAULT_BUFFER_CAPACITY,
    MIN_BUFFER_CAPACITY,
};
pub use session::SourceSession;
