//! Configuration loading for the tour engine.
//!
//! All tunables are loaded from a TOML configuration file. Every section is
//! optional and falls back to its defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::particles::ParticleTier;

/// Complete tour configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourConfig {
    /// Stage timing settings
    #[serde(default)]
    pub stage: StageConfig,
    /// Particle field tunables
    #[serde(default)]
    pub particles: ParticleConfig,
    /// Camera rig tunables
    #[serde(default)]
    pub camera: CameraConfig,
    /// Live telemetry settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl TourConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string and validates it.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stage.validate()?;
        self.particles.validate()?;
        self.camera.validate()?;
        self.telemetry.validate()
    }

    /// Replaces each section that fails validation with its defaults.
    pub fn sanitized(mut self) -> Self {
        if let Err(e) = self.stage.validate() {
            tracing::warn!("{}; using stage defaults", e);
            self.stage = StageConfig::default();
        }
        if let Err(e) = self.particles.validate() {
            tracing::warn!("{}; using particle defaults", e);
            self.particles = ParticleConfig::default();
        }
        if let Err(e) = self.camera.validate() {
            tracing::warn!("{}; using camera defaults", e);
            self.camera = CameraConfig::default();
        }
        if let Err(e) = self.telemetry.validate() {
            tracing::warn!("{}; using telemetry defaults", e);
            self.telemetry = TelemetryConfig::default();
        }
        self
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Stage timing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Speed multiplier for the Normal preset
    pub normal_speed: f32,
    /// Speed multiplier for the Fast preset
    pub fast_speed: f32,
    /// Longest frame delta fed into the stage timer, in seconds
    pub max_frame_delta: f32,
    /// Start with auto-play enabled
    pub auto_play: bool,
    /// Play narration on stage changes
    pub narration: bool,
}

impl StageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("stage", "normal_speed", self.normal_speed)?;
        require_positive("stage", "fast_speed", self.fast_speed)?;
        require_non_negative("stage", "max_frame_delta", self.max_frame_delta)
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            normal_speed: 1.0,
            fast_speed: 3.0,
            max_frame_delta: 0.1,
            auto_play: false,
            narration: true,
        }
    }
}

/// Particle field configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Device tier that fixes the particle capacity
    pub tier: ParticleTier,
    /// Seed for the particle random source
    pub seed: u64,
    /// Travel-axis coordinate past which particles are recycled
    pub capture_depth: f32,
    /// Inner radius of the spawn shell
    pub shell_inner_radius: f32,
    /// Outer radius of the spawn shell
    pub shell_outer_radius: f32,
    /// Shift applied along the travel axis to respawned particles
    pub spawn_back_offset: f32,
    /// Half extent of the lateral bounding volume
    pub bounds_half_extent: f32,
    /// Per-axis velocity weights (x, y, travel)
    pub axis_weights: [f32; 3],
    /// Lateral jitter scale
    pub jitter_scale: f32,
    /// Full width of the lateral speed range
    pub lateral_speed: f32,
    /// Slowest travel-axis speed
    pub min_axial_speed: f32,
    /// Fastest travel-axis speed
    pub max_axial_speed: f32,
    /// Smallest particle size
    pub min_size: f32,
    /// Largest particle size
    pub max_size: f32,
    /// Intensity ramp over one stage
    pub ramp_factor: f32,
    /// Stage intensity that maps to a ramp of exactly `ramp_factor`
    pub reference_intensity: f32,
    /// Upper bound on integration intensity
    pub max_intensity: f32,
}

impl ParticleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = self;
        for (field, value) in [
            ("capture_depth", c.capture_depth),
            ("spawn_back_offset", c.spawn_back_offset),
            ("jitter_scale", c.jitter_scale),
            ("lateral_speed", c.lateral_speed),
            ("min_axial_speed", c.min_axial_speed),
            ("max_axial_speed", c.max_axial_speed),
            ("ramp_factor", c.ramp_factor),
            ("reference_intensity", c.reference_intensity),
        ] {
            require_finite("particles", field, value)?;
        }
        for (i, weight) in c.axis_weights.iter().enumerate() {
            require_finite("particles", &format!("axis_weights[{}]", i), *weight)?;
        }
        for (field, value) in [
            ("shell_inner_radius", c.shell_inner_radius),
            ("shell_outer_radius", c.shell_outer_radius),
            ("bounds_half_extent", c.bounds_half_extent),
            ("min_size", c.min_size),
            ("max_size", c.max_size),
            ("max_intensity", c.max_intensity),
        ] {
            require_non_negative("particles", field, value)?;
        }
        Ok(())
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            tier: ParticleTier::High,
            seed: 0x5017_A12D,
            capture_depth: 980.0,
            shell_inner_radius: 62.0,
            shell_outer_radius: 117.0,
            spawn_back_offset: 80.0,
            bounds_half_extent: 2000.0,
            axis_weights: [0.45, 0.45, 0.75],
            jitter_scale: 0.25,
            lateral_speed: 1.8,
            min_axial_speed: 1.2,
            max_axial_speed: 4.6,
            min_size: 0.35,
            max_size: 1.25,
            ramp_factor: 2.0,
            reference_intensity: 0.5,
            max_intensity: 4.0,
        }
    }
}

/// Camera rig configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Closest allowed distance to the focus target
    pub min_distance: f32,
    /// Farthest allowed distance to the focus target
    pub max_distance: f32,
    /// Closest distance chosen by focus-on
    pub focus_min_distance: f32,
    /// Farthest distance chosen by focus-on
    pub focus_max_distance: f32,
    /// Focus distance as a multiple of the bounding radius
    pub radius_multiplier: f32,
    /// Smallest bounding radius considered by focus-on
    pub min_focus_radius: f32,
    /// Focus transition length in seconds
    pub transition_seconds: f32,
    /// Zoom convergence per 60 Hz frame
    pub zoom_smoothing: f32,
    /// Cinematic follow convergence per 60 Hz frame
    pub follow_smoothing: f32,
    /// Starting focus distance
    pub initial_distance: f32,
    /// Starting camera position
    pub initial_position: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Orbit sensitivity in radians per pixel of drag
    pub orbit_sensitivity: f32,
    /// Waypoints the cinematic camera travels through over the whole tour
    pub cinematic_path: Vec<CameraWaypoint>,
}

/// One framing on the cinematic camera path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraWaypoint {
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl CameraWaypoint {
    pub const fn new(position: [f32; 3], target: [f32; 3]) -> Self {
        Self { position, target }
    }
}

/// From the Sun out to the planet at z = 800.
pub fn default_cinematic_path() -> Vec<CameraWaypoint> {
    vec![
        CameraWaypoint::new([0.0, 50.0, 150.0], [0.0, 0.0, 0.0]),
        CameraWaypoint::new([100.0, 100.0, 200.0], [0.0, 0.0, 0.0]),
        CameraWaypoint::new([200.0, 50.0, 300.0], [0.0, 0.0, 100.0]),
        CameraWaypoint::new([100.0, 150.0, 400.0], [0.0, 0.0, 300.0]),
        CameraWaypoint::new([0.0, 0.0, 600.0], [0.0, 0.0, 800.0]),
    ]
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = self;
        for (field, value) in [
            ("min_distance", c.min_distance),
            ("max_distance", c.max_distance),
            ("focus_min_distance", c.focus_min_distance),
            ("focus_max_distance", c.focus_max_distance),
            ("radius_multiplier", c.radius_multiplier),
            ("min_focus_radius", c.min_focus_radius),
            ("transition_seconds", c.transition_seconds),
            ("zoom_smoothing", c.zoom_smoothing),
            ("follow_smoothing", c.follow_smoothing),
            ("initial_distance", c.initial_distance),
        ] {
            require_non_negative("camera", field, value)?;
        }
        require_ordered("camera", ("min_distance", c.min_distance), ("max_distance", c.max_distance))?;
        require_ordered(
            "camera",
            ("focus_min_distance", c.focus_min_distance),
            ("focus_max_distance", c.focus_max_distance),
        )?;
        require_positive("camera", "fov_degrees", c.fov_degrees)?;
        if c.fov_degrees >= 180.0 {
            return Err(ConfigError::invalid("camera", "fov_degrees must be below 180"));
        }
        require_finite("camera", "orbit_sensitivity", c.orbit_sensitivity)?;
        let points = std::iter::once(c.initial_position)
            .chain(c.cinematic_path.iter().flat_map(|w| [w.position, w.target]));
        for point in points {
            if !point.iter().all(|v| v.is_finite()) {
                return Err(ConfigError::invalid("camera", "positions must be finite"));
            }
        }
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_distance: 5.0,
            max_distance: 2500.0,
            focus_min_distance: 140.0,
            focus_max_distance: 900.0,
            radius_multiplier: 6.0,
            min_focus_radius: 10.0,
            transition_seconds: 1.5,
            zoom_smoothing: 0.15,
            follow_smoothing: 0.05,
            initial_distance: 160.0,
            initial_position: [0.0, 50.0, 100.0],
            fov_degrees: 75.0,
            orbit_sensitivity: 0.005,
            cinematic_path: default_cinematic_path(),
        }
    }
}

/// Live telemetry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Delay before reconnecting after a failure, in seconds
    pub reconnect_delay_seconds: f64,
    /// Follow stage hints from the stream
    pub auto_advance: bool,
}

impl TelemetryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let delay = self.reconnect_delay_seconds;
        if delay.is_finite() && delay >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::invalid(
                "telemetry",
                format!("reconnect_delay_seconds must be a non-negative number, got {}", delay),
            ))
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_seconds: 5.0,
            auto_advance: false,
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("invalid [{section}] config: {reason}")]
    Invalid { section: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(section: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            section,
            reason: reason.into(),
        }
    }
}

fn require_finite(section: &'static str, field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(section, format!("{} must be finite, got {}", field, value)))
    }
}

fn require_non_negative(section: &'static str, field: &str, value: f32) -> Result<(), ConfigError> {
    require_finite(section, field, value)?;
    if value < 0.0 {
        return Err(ConfigError::invalid(section, format!("{} must not be negative, got {}", field, value)));
    }
    Ok(())
}

fn require_positive(section: &'static str, field: &str, value: f32) -> Result<(), ConfigError> {
    require_finite(section, field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::invalid(section, format!("{} must be positive, got {}", field, value)));
    }
    Ok(())
}

fn require_ordered(
    section: &'static str,
    (low_name, low): (&str, f32),
    (high_name, high): (&str, f32),
) -> Result<(), ConfigError> {
    if low <= high {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            section,
            format!("{} ({}) is greater than {} ({})", low_name, low, high_name, high),
        ))
    }
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Solar Wind Journey Configuration

[stage]
normal_speed = 1.0
fast_speed = 3.0
# Longer frames are clamped so a stall cannot skip stages
max_frame_delta = 0.1
auto_play = false
narration = true

[particles]
# "high" = 6500 particles, "retina" = 4500
tier = "high"
seed = 1343725869
capture_depth = 980.0
shell_inner_radius = 62.0
shell_outer_radius = 117.0
spawn_back_offset = 80.0
bounds_half_extent = 2000.0
axis_weights = [0.45, 0.45, 0.75]
jitter_scale = 0.25
lateral_speed = 1.8
min_axial_speed = 1.2
max_axial_speed = 4.6
min_size = 0.35
max_size = 1.25
ramp_factor = 2.0
reference_intensity = 0.5
max_intensity = 4.0

[camera]
min_distance = 5.0
max_distance = 2500.0
focus_min_distance = 140.0
focus_max_distance = 900.0
radius_multiplier = 6.0
min_focus_radius = 10.0
transition_seconds = 1.5
zoom_smoothing = 0.15
follow_smoothing = 0.05
initial_distance = 160.0
initial_position = [0.0, 50.0, 100.0]
fov_degrees = 75.0
orbit_sensitivity = 0.005

# Cinematic framings, one per fifth of the tour. An empty list keeps the
# camera on the planet.
[[camera.cinematic_path]]
position = [0.0, 50.0, 150.0]
target = [0.0, 0.0, 0.0]

[[camera.cinematic_path]]
position = [100.0, 100.0, 200.0]
target = [0.0, 0.0, 0.0]

[[camera.cinematic_path]]
position = [200.0, 50.0, 300.0]
target = [0.0, 0.0, 100.0]

[[camera.cinematic_path]]
position = [100.0, 150.0, 400.0]
target = [0.0, 0.0, 300.0]

[[camera.cinematic_path]]
position = [0.0, 0.0, 600.0]
target = [0.0, 0.0, 800.0]

[telemetry]
reconnect_delay_seconds = 5.0
auto_advance = false
"#
    .to_string()
}
