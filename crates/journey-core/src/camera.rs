//! Camera rig: focus transitions, zoom smoothing, and cinematic/free modes.
//!
//! In cinematic mode the rig travels along the configured waypoint path,
//! picking the waypoint from overall tour progress, until a focus-on takes
//! over. Leaving free mode or changing stage hands control back to the path.
//!
//! The rig never reads a wall clock. Callers pass `now` (seconds, from a
//! [`Clock`](crate::clock::Clock)) to anything that starts or advances a
//! transition.

use std::f32::consts::FRAC_PI_2;

use bevy_math::{Dir3, Ray3d, Vec2, Vec3};
use thiserror::Error;

use crate::config::{CameraConfig, CameraWaypoint};

/// Frame rate the per-frame smoothing constants are tuned for.
const REFERENCE_FPS: f32 = 60.0;
/// Keeps orbit pitch away from the poles.
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.05;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CameraError {
    #[error("invalid zoom factor {0}")]
    InvalidZoomFactor(f32),
}

/// Camera control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    /// The rig frames the focus target on its own.
    #[default]
    Cinematic,
    /// Orbit input drives the camera around the focus target.
    Free,
}

/// An in-flight focus transition.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusTransition {
    pub start_time: f64,
    pub duration: f32,
    pub start_position: Vec3,
    pub start_target: Vec3,
    /// Unit vector from the starting camera position to the focus point.
    pub direction: Vec3,
}

impl FocusTransition {
    /// Progress of this transition (0.0 to 1.0).
    pub fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (((now - self.start_time) as f32) / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self, now: f64) -> bool {
        self.progress(now) >= 1.0
    }
}

/// `value` limited to `[min, max]`. Never panics on unordered or NaN bounds.
fn clamp_between(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// The waypoint for `progress` through the tour.
pub fn path_waypoint(path: &[CameraWaypoint], progress: f32) -> Option<CameraWaypoint> {
    let last = path.len().checked_sub(1)?;
    let progress = if progress.is_finite() { progress.max(0.0) } else { 0.0 };
    let index = ((progress * path.len() as f32) as usize).min(last);
    path.get(index).copied()
}

/// Cubic ease-in-out.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Converts a per-frame smoothing constant into a blend weight for `dt`.
pub fn frame_blend(per_frame: f32, dt: f32) -> f32 {
    let k = per_frame.clamp(0.0, 1.0);
    let frames = (dt.max(0.0)) * REFERENCE_FPS;
    1.0 - (1.0 - k).powf(frames)
}

/// Yaw/pitch around the focus target for free mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrbitAngles {
    pub yaw: f32,
    pub pitch: f32,
}

impl OrbitAngles {
    /// Angles that place the camera along `offset` from the target.
    pub fn from_offset(offset: Vec3) -> Self {
        let dir = offset.normalize_or_zero();
        if dir == Vec3::ZERO {
            return Self::default();
        }
        Self {
            yaw: dir.x.atan2(dir.z),
            pitch: dir.y.clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT),
        }
    }

    /// Unit offset from the target to the camera.
    pub fn unit_offset(&self) -> Vec3 {
        Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        )
    }
}

/// The camera rig.
#[derive(Debug, Clone)]
pub struct CameraRig {
    config: CameraConfig,
    mode: CameraMode,
    position: Vec3,
    look_at: Vec3,
    focus_target: Vec3,
    focus_distance: f32,
    focus_distance_target: f32,
    transition: Option<FocusTransition>,
    orbit: OrbitAngles,
    /// Focus distance at which path waypoints are used unscaled.
    base_distance: f32,
    tour_progress: f32,
    /// Set by focus-on; suspends the cinematic path.
    path_override: bool,
}

impl CameraRig {
    pub fn new(config: &CameraConfig) -> Self {
        let distance = clamp_between(config.initial_distance, config.min_distance, config.max_distance);
        Self {
            config: config.clone(),
            mode: CameraMode::Cinematic,
            position: Vec3::from_array(config.initial_position),
            look_at: Vec3::ZERO,
            focus_target: Vec3::ZERO,
            focus_distance: distance,
            focus_distance_target: distance,
            transition: None,
            orbit: OrbitAngles::default(),
            base_distance: distance,
            tour_progress: 0.0,
            path_override: false,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn focus_target(&self) -> Vec3 {
        self.focus_target
    }

    pub fn focus_distance(&self) -> f32 {
        self.focus_distance
    }

    pub fn focus_distance_target(&self) -> f32 {
        self.focus_distance_target
    }

    pub fn transition(&self) -> Option<&FocusTransition> {
        self.transition.as_ref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn fov_radians(&self) -> f32 {
        self.config.fov_degrees.to_radians()
    }

    pub fn orbit(&self) -> OrbitAngles {
        self.orbit
    }

    pub fn tour_progress(&self) -> f32 {
        self.tour_progress
    }

    /// Whether the cinematic path currently drives the camera.
    pub fn follows_path(&self) -> bool {
        self.mode == CameraMode::Cinematic
            && !self.path_override
            && !self.config.cinematic_path.is_empty()
    }

    /// Overall tour progress (0.0 to 1.0) used to pick the path waypoint.
    pub fn set_tour_progress(&mut self, progress: f32) {
        self.tour_progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Hands the cinematic camera back to the path after a focus-on.
    pub fn release_focus(&mut self) {
        self.path_override = false;
    }

    /// Moves the focus point without a transition.
    pub fn set_focus_target(&mut self, target: Vec3) {
        self.focus_target = target;
        self.look_at = target;
    }

    /// Starts a transition that frames a sphere at `target`.
    pub fn focus_on(&mut self, target: Vec3, bounding_radius: f32, now: f64) {
        let radius = if bounding_radius.is_finite() {
            bounding_radius.max(self.config.min_focus_radius)
        } else {
            self.config.min_focus_radius
        };
        let c = &self.config;
        let distance = clamp_between(
            clamp_between(radius * c.radius_multiplier, c.focus_min_distance, c.focus_max_distance),
            c.min_distance,
            c.max_distance,
        );

        let direction = match (target - self.position).try_normalize() {
            Some(dir) => dir,
            None => Vec3::NEG_Z,
        };

        self.transition = Some(FocusTransition {
            start_time: now,
            duration: self.config.transition_seconds,
            start_position: self.position,
            start_target: self.look_at,
            direction,
        });
        self.focus_target = target;
        self.focus_distance_target = distance;
        self.focus_distance = distance;
        self.path_override = true;

        tracing::debug!(
            "Focusing on ({:.0}, {:.0}, {:.0}) at distance {:.0}",
            target.x,
            target.y,
            target.z,
            distance
        );
    }

    /// Scales the zoom target. Does not restart a running transition.
    pub fn set_zoom_factor(&mut self, factor: f32) -> Result<(), CameraError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(CameraError::InvalidZoomFactor(factor));
        }
        let before = self.focus_distance_target;
        self.focus_distance_target =
            clamp_between(before * factor, self.config.min_distance, self.config.max_distance);
        tracing::debug!(
            "Camera zoom: {:.0} -> {:.0}",
            before,
            self.focus_distance_target
        );
        Ok(())
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        match mode {
            CameraMode::Free => {
                self.orbit = OrbitAngles::from_offset(self.position - self.focus_target);
            }
            CameraMode::Cinematic => self.path_override = false,
        }
        self.mode = mode;
    }

    /// Applies a drag in free mode. `delta` is in pixels.
    pub fn orbit_by(&mut self, delta: Vec2) {
        if self.mode != CameraMode::Free || !delta.is_finite() {
            return;
        }
        let s = self.config.orbit_sensitivity;
        self.orbit.yaw -= delta.x * s;
        self.orbit.pitch = (self.orbit.pitch + delta.y * s).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Adopts an externally driven camera position, clamped to the distance bounds.
    pub fn observe_free_camera(&mut self, position: Vec3) {
        if !position.is_finite() {
            return;
        }
        let offset = position - self.focus_target;
        let clamped = match offset.try_normalize() {
            Some(dir) => {
                dir * clamp_between(offset.length(), self.config.min_distance, self.config.max_distance)
            }
            None => Vec3::Z * self.config.min_distance,
        };
        self.position = self.focus_target + clamped;
        self.orbit = OrbitAngles::from_offset(clamped);
    }

    /// Advances the rig by one frame.
    pub fn update(&mut self, dt: f32, now: f64) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let zoom = frame_blend(self.config.zoom_smoothing, dt);
        self.focus_distance += (self.focus_distance_target - self.focus_distance) * zoom;
        self.focus_distance =
            clamp_between(self.focus_distance, self.config.min_distance, self.config.max_distance);

        if let Some(transition) = self.transition.clone() {
            let progress = transition.progress(now);
            let end = self.focus_target - transition.direction * self.focus_distance;

            if progress >= 1.0 {
                self.position = end;
                self.look_at = self.focus_target;
                self.transition = None;
                self.orbit = OrbitAngles::from_offset(self.position - self.focus_target);
            } else {
                let t = ease_in_out_cubic(progress);
                self.position = transition.start_position.lerp(end, t);
                self.look_at = transition.start_target.lerp(self.focus_target, t);
            }
            return;
        }

        let follow = frame_blend(self.config.follow_smoothing, dt);
        if self.follows_path() {
            if let Some(waypoint) = path_waypoint(&self.config.cinematic_path, self.tour_progress) {
                let target = Vec3::from_array(waypoint.target);
                let offset = Vec3::from_array(waypoint.position) - target;
                let zoom = if self.base_distance > 0.0 {
                    self.focus_distance / self.base_distance
                } else {
                    1.0
                };
                self.position = self.position.lerp(target + offset * zoom, follow);
                self.look_at = self.look_at.lerp(target, follow);
                return;
            }
        }

        match self.mode {
            CameraMode::Cinematic => {
                let dir = (self.focus_target - self.position)
                    .try_normalize()
                    .unwrap_or(Vec3::NEG_Z);
                let goal = self.focus_target - dir * self.focus_distance;
                self.position = self.position.lerp(goal, follow);
            }
            CameraMode::Free => {
                self.position = self.focus_target + self.orbit.unit_offset() * self.focus_distance;
            }
        }
        self.look_at = self.focus_target;
    }

    /// A world-space ray through normalized device coordinates `ndc`.
    pub fn ray_through(&self, ndc: Vec2, aspect: f32) -> Option<Ray3d> {
        let forward = (self.look_at - self.position).try_normalize()?;
        let right = forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);

        let half_height = (self.fov_radians() * 0.5).tan();
        let half_width = half_height * aspect.max(f32::EPSILON);
        let direction = forward + right * (ndc.x * half_width) + up * (ndc.y * half_height);

        let direction = Dir3::new(direction).ok()?;
        Some(Ray3d {
            origin: self.position,
            direction,
        })
    }
}
