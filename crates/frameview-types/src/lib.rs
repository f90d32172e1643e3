//! Shared plain-data types for the frameview capture pipeline.
//!
//! This crate defines the configuration, geometry, state and statistics
//! vocabulary used between the capture layer, the engine and any UI or
//! settings collaborator. Everything here is serializable and carries no
//! behavior beyond validation and simple geometry math.

mod config;
mod geometry;
mod source;
mod state;
mod stats;

pub use config::{
    CaptureConfig, ConfigError, QualityTier, ScreenSelection, SourceConfig, MAX_FRAME_RATE,
};
pub use geometry::{CaptureRegion, MonitorGeometry, MonitorLayout};
pub use source::{SourceAvailability, SourceInfo, SourceKind, WindowSelector};
pub use state::EngineState;
pub use stats::CaptureStats;
