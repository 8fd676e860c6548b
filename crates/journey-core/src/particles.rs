//! Solar wind particle field.
//!
//! Particles are stored as parallel position/velocity/size buffers of fixed
//! capacity. Each integration step moves them along the travel axis (+Z, from
//! the star toward the planet) and recycles anything that reaches the capture
//! depth, leaves the bounding volume, or goes non-finite back onto the spawn
//! shell around the star. The count never changes after construction.

use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use bevy_math::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::ParticleConfig;

/// Device tier that fixes the particle capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleTier {
    #[default]
    High,
    /// High-DPI displays: fewer, slightly smaller particles.
    Retina,
}

impl ParticleTier {
    pub fn capacity(self) -> usize {
        match self {
            ParticleTier::High => 6500,
            ParticleTier::Retina => 4500,
        }
    }

    pub fn size_scale(self) -> f32 {
        match self {
            ParticleTier::High => 1.0,
            ParticleTier::Retina => 0.9,
        }
    }

    /// Picks a tier from the window scale factor.
    pub fn for_scale_factor(scale_factor: f64) -> Self {
        if scale_factor >= 2.0 {
            ParticleTier::Retina
        } else {
            ParticleTier::High
        }
    }
}

impl fmt::Display for ParticleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticleTier::High => write!(f, "high"),
            ParticleTier::Retina => write!(f, "retina"),
        }
    }
}

impl FromStr for ParticleTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(ParticleTier::High),
            "retina" => Ok(ParticleTier::Retina),
            other => Err(format!("unknown particle tier '{}' (expected high or retina)", other)),
        }
    }
}

/// Renderable transform of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleInstance {
    pub translation: Vec3,
    pub scale: f32,
}

/// Integration intensity for the current point in a stage.
///
/// Ramps from 0 at stage start to `ramp_factor` at stage end for a stage of
/// reference intensity, scaled by the stage's own intensity.
pub fn stage_intensity(config: &ParticleConfig, elapsed: f32, duration: f32, particle_intensity: f32) -> f32 {
    if duration <= 0.0 || config.reference_intensity <= 0.0 {
        return 0.0;
    }
    let stage_factor = config.ramp_factor * particle_intensity / config.reference_intensity;
    let intensity = (elapsed / duration) * stage_factor;
    if intensity.is_finite() {
        intensity.clamp(0.0, config.max_intensity.max(0.0))
    } else {
        0.0
    }
}

/// The particle simulator.
pub struct ParticleField {
    config: ParticleConfig,
    size_scale: f32,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    sizes: Vec<f32>,
    instances: Vec<ParticleInstance>,
    rng: SmallRng,
    visible: bool,
    recycled: u64,
}

impl ParticleField {
    /// Creates a field sized by the configured tier.
    pub fn new(config: &ParticleConfig) -> Self {
        Self::with_capacity(config, config.tier.capacity())
    }

    pub fn with_capacity(config: &ParticleConfig, capacity: usize) -> Self {
        let mut field = Self {
            config: config.clone(),
            size_scale: config.tier.size_scale(),
            positions: vec![Vec3::ZERO; capacity],
            velocities: vec![Vec3::ZERO; capacity],
            sizes: vec![0.0; capacity],
            instances: Vec::with_capacity(capacity),
            rng: SmallRng::seed_from_u64(config.seed),
            visible: true,
            recycled: 0,
        };

        for i in 0..capacity {
            field.respawn(i);
            let (lo, hi) = ordered(field.config.min_size, field.config.max_size);
            field.sizes[i] = field.rng.gen_range(lo..=hi) * field.size_scale;
        }
        field.recycled = 0;
        field.write_instances();

        tracing::debug!("Particle field created with {} particles", capacity);
        field
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// Translation and scale per particle, refreshed after each step.
    pub fn instances(&self) -> &[ParticleInstance] {
        &self.instances
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hidden fields are not integrated.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Number of particles recycled since construction.
    pub fn recycled_count(&self) -> u64 {
        self.recycled
    }

    /// Advances every particle one step.
    pub fn integrate(&mut self, intensity: f32, speed_multiplier: f32) {
        if !self.visible {
            return;
        }
        let intensity = if intensity.is_finite() { intensity.max(0.0) } else { 0.0 };
        let speed = if speed_multiplier.is_finite() { speed_multiplier.max(0.0) } else { 0.0 };

        let accel = intensity * speed;
        let weights = Vec3::from_array(self.config.axis_weights) * accel;
        let jitter = intensity * self.config.jitter_scale;

        for i in 0..self.positions.len() {
            let mut p = self.positions[i] + self.velocities[i] * weights;
            if jitter > 0.0 {
                p.x += (self.rng.gen::<f32>() - 0.5) * jitter;
                p.y += (self.rng.gen::<f32>() - 0.5) * jitter;
            }
            self.positions[i] = p;

            if self.needs_recycle(i) {
                self.respawn(i);
                self.recycled += 1;
            }
        }

        self.write_instances();
    }

    fn needs_recycle(&self, i: usize) -> bool {
        let p = self.positions[i];
        let v = self.velocities[i];
        let bound = self.config.bounds_half_extent;

        !p.is_finite()
            || !v.is_finite()
            || p.z > self.config.capture_depth
            || p.z < -bound
            || p.x.abs() > bound
            || p.y.abs() > bound
    }

    /// Places particle `i` on the spawn shell with a fresh velocity.
    fn respawn(&mut self, i: usize) {
        let c = &self.config;
        let (inner, outer) = ordered(c.shell_inner_radius, c.shell_outer_radius);
        let (min_axial, max_axial) = ordered(c.min_axial_speed, c.max_axial_speed);
        let half_lateral = c.lateral_speed.abs() * 0.5;
        let back_offset = c.spawn_back_offset;

        // Uniform direction on the unit sphere
        let azimuth = self.rng.gen_range(0.0..TAU);
        let cos_polar: f32 = self.rng.gen_range(-1.0..=1.0);
        let sin_polar = (1.0 - cos_polar * cos_polar).max(0.0).sqrt();
        let radius = self.rng.gen_range(inner..=outer);

        self.positions[i] = Vec3::new(
            radius * sin_polar * azimuth.cos(),
            radius * sin_polar * azimuth.sin(),
            radius * cos_polar - back_offset,
        );
        self.velocities[i] = Vec3::new(
            self.rng.gen_range(-half_lateral..=half_lateral),
            self.rng.gen_range(-half_lateral..=half_lateral),
            self.rng.gen_range(min_axial..=max_axial),
        );
    }

    fn write_instances(&mut self) {
        self.instances.clear();
        self.instances.extend(
            self.positions
                .iter()
                .zip(self.sizes.iter())
                .map(|(&translation, &scale)| ParticleInstance { translation, scale }),
        );
    }

    #[cfg(test)]
    fn poison(&mut self, i: usize) {
        self.positions[i] = Vec3::new(f32::NAN, 0.0, f32::INFINITY);
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
