//! Enumerable capture source descriptors.

use serde::{Deserialize, Serialize};

/// How a window source is located at session open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowSelector {
    /// Opaque backend-assigned window id.
    Id(String),

    /// First window whose title contains this string.
    Title(String),
}

impl WindowSelector {
    /// Human-readable form for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Id(id) => format!("id={id}"),
            Self::Title(title) => format!("title~\"{title}\""),
        }
    }
}

/// Type of capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// A monitor or desktop region.
    Screen,

    /// An application window.
    Window,

    /// A webcam device.
    Webcam,
}

impl SourceKind {
    /// Returns the display name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Screen => "Screen",
            Self::Window => "Window",
            Self::Webcam => "Webcam",
        }
    }
}

/// A single enumerable source (one window, one webcam, one monitor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Backend-assigned identifier.
    pub id: String,

    /// Display name for the UI.
    pub name: String,

    /// Type of capture source.
    pub kind: SourceKind,

    /// Native width in pixels, when known.
    pub width: u32,

    /// Native height in pixels, when known.
    pub height: u32,
}

/// Per-source-type availability, with a reason when unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAvailability {
    /// Type of capture source this entry describes.
    pub kind: SourceKind,

    /// Whether at least one source of this kind can be opened.
    pub available: bool,

    /// Why the kind is unavailable, when it is.
    pub reason: Option<String>,

    /// The enumerable sources of this kind.
    pub sources: Vec<SourceInfo>,
}
