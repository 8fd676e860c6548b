//! Staging, particle, camera and interaction engine for the solar wind tour.
//!
//! Render-agnostic: everything here runs on `bevy_math` types and is driven
//! one frame at a time through [`TourContext::frame`].

pub mod camera;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod controller;
pub mod input;
pub mod particles;
pub mod picker;
pub mod scene;
pub mod stage;
pub mod telemetry;

pub use camera::{CameraError, CameraMode, CameraRig};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::{CompletionNotifier, LogCompletion, NarrationSink, SilentNarration};
pub use config::{default_config_toml, ConfigError, TourConfig};
pub use context::{HudNotice, NoticeLevel, SceneBody, Tooltip, TourContext, ViewToggles};
pub use controller::{ChangeCause, SpeedPreset, StageController, StageEvent, TourPhase};
pub use input::{InputQueue, TourInput};
pub use particles::{ParticleField, ParticleTier};
pub use picker::{HoverChanged, InteractableId, InteractionPicker, SurfaceRect};
pub use scene::{BodyKind, BodySpec, Category, SatelliteClass, VisualState};
pub use stage::{SceneToggles, Stage, StageError, StagePresentation, StageSet};
pub use telemetry::{LinkStatus, TelemetryBridge, TelemetryNotice, TelemetryTransport, TransportError};
