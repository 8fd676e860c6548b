//! Shared wire types for the solar wind journey.
//!
//! This crate contains pure data structures with no engine logic: the stage
//! document served by the tour backend and the live telemetry messages pushed
//! by the space-weather stream. It is a dependency for all other crates in the
//! workspace.

pub mod stage;
pub mod telemetry;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

// Re-export stage document types
pub use stage::{default_stage_document, ParticleSpec, StageDocument, StageRecord, DEFAULT_STAGE_COUNT};

// Re-export telemetry types
pub use telemetry::{
    LiveMetrics, SpaceWeatherEvent, StageEventInfo, StageSignal, TelemetryEvent, AURORA_ACTIVE,
    GEOMAGNETIC_STORM, SEVERITY_STRONG,
};
