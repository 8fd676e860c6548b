//! Scene catalog: the bodies of the tour and how they move.
//!
//! The catalog is render-agnostic. The engine registers every body as an
//! interactable; the Bevy layer spawns meshes from the same entries.

use std::f32::consts::TAU;
use std::fmt;

use bevy_math::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// World position of the planet.
pub const EARTH_POSITION: Vec3 = Vec3::new(0.0, 0.0, 800.0);
pub const SUN_RADIUS: f32 = 55.0;
pub const EARTH_RADIUS: f32 = 32.0;
pub const MARS_RADIUS: f32 = 18.0;
pub const MAGNETOSPHERE_RADIUS: f32 = 78.0;
pub const CME_MAJOR_RADIUS: f32 = 85.0;
pub const CME_MINOR_RADIUS: f32 = 3.2;
pub const DEBRIS_COUNT: usize = 1200;
pub const DEBRIS_CENTER: Vec3 = Vec3::new(0.0, 0.0, 360.0);
pub const DEBRIS_SPREAD: Vec3 = Vec3::new(520.0, 220.0, 560.0);

/// Tooltip category of an interactable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Star,
    Planet,
    Phenomenon,
    Debris,
    Field,
    Satellite,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Star => "star",
            Category::Planet => "planet",
            Category::Phenomenon => "phenomenon",
            Category::Debris => "debris",
            Category::Field => "field",
            Category::Satellite => "satellite",
        };
        f.write_str(s)
    }
}

/// Emissive look of a body, used for hover emphasis and restore.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    /// Linear RGB emissive colour.
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub scale: f32,
}

impl VisualState {
    pub const fn plain() -> Self {
        Self {
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 0.0,
            scale: 1.0,
        }
    }

    pub const fn glowing(emissive: [f32; 3], emissive_intensity: f32) -> Self {
        Self {
            emissive,
            emissive_intensity,
            scale: 1.0,
        }
    }
}

impl Default for VisualState {
    fn default() -> Self {
        Self::plain()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatelliteClass {
    Gps,
    Comm,
    Weather,
}

impl SatelliteClass {
    pub const ALL: [SatelliteClass; 3] = [SatelliteClass::Gps, SatelliteClass::Comm, SatelliteClass::Weather];

    pub fn label(self) -> &'static str {
        match self {
            SatelliteClass::Gps => "GPS",
            SatelliteClass::Comm => "Comm",
            SatelliteClass::Weather => "Weather",
        }
    }

    pub fn altitude(self) -> f32 {
        match self {
            SatelliteClass::Gps => 200.0,
            SatelliteClass::Comm => 220.0,
            SatelliteClass::Weather => 180.0,
        }
    }

    pub fn count(self) -> usize {
        match self {
            SatelliteClass::Gps => 6,
            SatelliteClass::Comm => 8,
            SatelliteClass::Weather => 4,
        }
    }

    pub fn size(self) -> f32 {
        match self {
            SatelliteClass::Gps => 3.0,
            SatelliteClass::Comm => 2.5,
            SatelliteClass::Weather => 2.0,
        }
    }

    /// Body colour as `0xRRGGBB`.
    pub fn color(self) -> u32 {
        match self {
            SatelliteClass::Gps => 0x4488ff,
            SatelliteClass::Comm => 0xff8844,
            SatelliteClass::Weather => 0x44ff88,
        }
    }
}

/// Which body an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Sun,
    Earth,
    Mars,
    CmeShock,
    DebrisField,
    Magnetosphere,
    Satellite(SatelliteClass),
}

/// A pickable sub-part, relative to its body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartSpec {
    pub offset: Vec3,
    pub radius: f32,
    /// Uniform scale for rendering; debris rocks vary in size.
    pub scale: f32,
}

/// Circular orbit around the planet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatelliteOrbit {
    pub angle: f32,
    pub radius: f32,
    /// Radians per 60 Hz frame at speed 1.
    pub orbit_speed: f32,
    /// Radians per 60 Hz frame.
    pub spin_speed: f32,
}

impl SatelliteOrbit {
    pub fn position(&self) -> Vec3 {
        Vec3::new(
            self.angle.cos() * self.radius,
            self.angle.sin() * self.radius,
            EARTH_POSITION.z + (self.angle * 2.0).sin() * 2.0,
        )
    }

    pub fn advance(&mut self, dt: f32, speed_multiplier: f32) {
        self.angle = (self.angle + self.orbit_speed * speed_multiplier * dt * 60.0) % TAU;
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySpec {
    pub kind: BodyKind,
    pub name: String,
    pub description: &'static str,
    pub category: Category,
    pub position: Vec3,
    /// Radius used to frame the body on focus.
    pub bounding_radius: f32,
    /// Radius of the body's own hit sphere; zero when only parts are pickable.
    pub pick_radius: f32,
    pub parts: Vec<PartSpec>,
    pub visual: VisualState,
    pub orbit: Option<SatelliteOrbit>,
}

const ORBITAL_ASSET: &str = "Orbital asset: hover to inspect, click to focus.";

/// Builds the tour's bodies. Random placement is driven by `seed`.
pub fn default_catalog(seed: u64) -> Vec<BodySpec> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut bodies = vec![
        BodySpec {
            kind: BodyKind::Sun,
            name: "Sun (Photosphere)".to_string(),
            description: "Hover to inspect. Click to focus.",
            category: Category::Star,
            position: Vec3::ZERO,
            bounding_radius: SUN_RADIUS,
            pick_radius: SUN_RADIUS,
            parts: Vec::new(),
            visual: VisualState::glowing([1.0, 0.55, 0.1], 1.2),
            orbit: None,
        },
        BodySpec {
            kind: BodyKind::Earth,
            name: "Earth".to_string(),
            description: "High-res Earth textures + atmospheric glow. Hover/click to explore.",
            category: Category::Planet,
            position: EARTH_POSITION,
            bounding_radius: EARTH_RADIUS,
            pick_radius: EARTH_RADIUS,
            parts: Vec::new(),
            visual: VisualState::glowing([0.05, 0.15, 0.4], 0.2),
            orbit: None,
        },
        BodySpec {
            kind: BodyKind::Mars,
            name: "Mars".to_string(),
            description: "Hover to inspect. Click to focus.",
            category: Category::Planet,
            position: Vec3::new(-220.0, 40.0, 420.0),
            bounding_radius: MARS_RADIUS,
            pick_radius: MARS_RADIUS,
            parts: Vec::new(),
            visual: VisualState::plain(),
            orbit: None,
        },
        cme_shock(),
        debris_field(&mut rng),
        BodySpec {
            kind: BodyKind::Magnetosphere,
            name: "Earth Magnetosphere".to_string(),
            description: "Earth's magnetic shield. Deflects solar wind and compresses during storms.",
            category: Category::Field,
            position: EARTH_POSITION,
            bounding_radius: MAGNETOSPHERE_RADIUS,
            pick_radius: MAGNETOSPHERE_RADIUS,
            parts: Vec::new(),
            visual: VisualState::glowing([0.0, 0.7, 1.0], 0.3),
            orbit: None,
        },
    ];

    for class in SatelliteClass::ALL {
        let count = class.count();
        for i in 0..count {
            let angle = (i as f32 / count as f32) * TAU + rng.gen::<f32>() * 0.5;
            let orbit = SatelliteOrbit {
                angle,
                radius: 40.0 + class.altitude(),
                orbit_speed: rng.gen::<f32>() * 0.001 + 0.0005,
                spin_speed: rng.gen::<f32>() * 0.02 + 0.01,
            };
            bodies.push(satellite(class, orbit));
        }
    }

    bodies
}

fn cme_shock() -> BodySpec {
    // The ring lies in the xz plane; pick it with spheres along the tube.
    const SEGMENTS: usize = 32;
    let parts = (0..SEGMENTS)
        .map(|i| {
            let a = i as f32 / SEGMENTS as f32 * TAU;
            PartSpec {
                offset: Vec3::new(a.cos() * CME_MAJOR_RADIUS, 0.0, a.sin() * CME_MAJOR_RADIUS),
                radius: CME_MINOR_RADIUS * 2.5,
                scale: 1.0,
            }
        })
        .collect();

    BodySpec {
        kind: BodyKind::CmeShock,
        name: "CME Shockfront".to_string(),
        description: "An expanding shockwave of plasma + magnetic field pushing into space.",
        category: Category::Phenomenon,
        position: Vec3::ZERO,
        bounding_radius: CME_MAJOR_RADIUS + CME_MINOR_RADIUS,
        pick_radius: 0.0,
        parts,
        visual: VisualState::glowing([1.0, 0.69, 0.0], 0.8),
        orbit: None,
    }
}

fn debris_field(rng: &mut SmallRng) -> BodySpec {
    let parts = (0..DEBRIS_COUNT)
        .map(|_| {
            let offset = Vec3::new(
                (rng.gen::<f32>() - 0.5) * DEBRIS_SPREAD.x,
                (rng.gen::<f32>() - 0.5) * DEBRIS_SPREAD.y,
                (rng.gen::<f32>() - 0.5) * DEBRIS_SPREAD.z,
            );
            let scale = rng.gen::<f32>() * 2.2 + 0.25;
            PartSpec {
                offset,
                radius: 0.9 * scale,
                scale,
            }
        })
        .collect();

    BodySpec {
        kind: BodyKind::DebrisField,
        name: "Debris / Micrometeoroids".to_string(),
        description: "A simulated debris field. Even tiny particles can threaten spacecraft at orbital speeds.",
        category: Category::Debris,
        position: DEBRIS_CENTER,
        bounding_radius: (DEBRIS_SPREAD * 0.5).length(),
        pick_radius: 0.0,
        parts,
        visual: VisualState::plain(),
        orbit: None,
    }
}

fn satellite(class: SatelliteClass, orbit: SatelliteOrbit) -> BodySpec {
    let s = class.size();
    let parts = vec![
        // body
        PartSpec { offset: Vec3::ZERO, radius: s * 0.5, scale: 1.0 },
        // solar panels
        PartSpec { offset: Vec3::new(-s, 0.0, 0.0), radius: s, scale: 1.0 },
        PartSpec { offset: Vec3::new(s, 0.0, 0.0), radius: s, scale: 1.0 },
        // antenna
        PartSpec { offset: Vec3::new(0.0, s * 0.4, s * 0.5), radius: s * 0.4, scale: 1.0 },
    ];

    BodySpec {
        kind: BodyKind::Satellite(class),
        name: format!("{} Satellite", class.label()),
        description: ORBITAL_ASSET,
        category: Category::Satellite,
        position: orbit.position(),
        bounding_radius: s * 2.0,
        pick_radius: 0.0,
        parts,
        visual: VisualState::plain(),
        orbit: Some(orbit),
    }
}
