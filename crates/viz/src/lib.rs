//! Visualization layer: Bevy renderer and host adapters for the tour engine.

pub mod camera;
pub mod completion;
pub mod hud;
pub mod input;
pub mod narration;
pub mod particles;
pub mod plugin;
pub mod scene;
pub mod stage_loader;
pub mod telemetry;
pub mod tour;

pub use plugin::JourneyPlugin;
pub use tour::{LaunchOptions, TourSet, TourState};
