//! Validated stage list and the per-index scene presentation.

use journey_events::{default_stage_document, StageDocument, StageRecord};
use thiserror::Error;

/// Highest value on the planetary K index scale.
pub const KP_MAX: f32 = 9.0;

/// Errors raised by stage loading and stage navigation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StageError {
    #[error("stage index {index} out of range (0..{len})")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("stage document contains no stages")]
    EmptyDocument,
    #[error("stage '{id}' has invalid {field}: {value}")]
    InvalidField {
        id: String,
        field: &'static str,
        value: f32,
    },
    #[error("invalid speed multiplier {0}")]
    InvalidSpeed(f32),
}

/// One stage of the tour. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub description: String,
    pub narration: String,
    pub duration_seconds: f32,
    pub kp_index: f32,
    /// Advertised particle count. Informational only.
    pub particle_count: u32,
    pub particle_intensity: f32,
}

impl Stage {
    /// Validates a wire record.
    pub fn from_record(record: &StageRecord) -> Result<Self, StageError> {
        let invalid = |field: &'static str, value: f32| StageError::InvalidField {
            id: record.id.clone(),
            field,
            value,
        };

        if !record.duration_seconds.is_finite() || record.duration_seconds <= 0.0 {
            return Err(invalid("duration_seconds", record.duration_seconds));
        }
        if !record.particles.intensity.is_finite() || record.particles.intensity < 0.0 {
            return Err(invalid("particles.intensity", record.particles.intensity));
        }
        if !record.kp_index.is_finite() {
            return Err(invalid("kp_index", record.kp_index));
        }

        Ok(Self::from(record))
    }
}

impl From<&StageRecord> for Stage {
    fn from(record: &StageRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            narration: record.narration.clone(),
            duration_seconds: record.duration_seconds,
            kp_index: record.kp_index.clamp(0.0, KP_MAX),
            particle_count: record.particles.count,
            particle_intensity: record.particles.intensity,
        }
    }
}

/// The loaded tour. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSet {
    stages: Vec<Stage>,
}

impl StageSet {
    /// Validates a whole document. Any bad stage rejects the document.
    pub fn from_document(doc: &StageDocument) -> Result<Self, StageError> {
        if doc.stages.is_empty() {
            return Err(StageError::EmptyDocument);
        }
        let stages = doc
            .stages
            .iter()
            .map(Stage::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { stages })
    }

    /// The built-in seven stage tour.
    pub fn defaults() -> Self {
        let doc = default_stage_document();
        Self {
            stages: doc.stages.iter().map(Stage::from).collect(),
        }
    }

    /// Validates `doc`, falling back to the defaults on failure.
    pub fn from_document_or_default(doc: &StageDocument) -> Self {
        match Self::from_document(doc) {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!("Rejected stage document, using defaults: {}", e);
                Self::defaults()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    pub fn last_index(&self) -> usize {
        self.stages.len().saturating_sub(1)
    }
}

/// Side panel text for a stage index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePresentation {
    pub location: &'static str,
    pub phenomenon: &'static str,
    pub visible_summary: &'static str,
}

const PRESENTATIONS: [StagePresentation; 7] = [
    StagePresentation {
        location: "Sun • Corona",
        phenomenon: "Magnetic reconnection & early CME formation",
        visible_summary: "Sun • CME shockfront • Solar wind particles",
    },
    StagePresentation {
        location: "Sun • CME Launch",
        phenomenon: "Coronal Mass Ejection (shockwave + plasma eruption)",
        visible_summary: "Sun • CME shockfront • Solar wind particles",
    },
    StagePresentation {
        location: "Interplanetary Space",
        phenomenon: "Solar wind propagation through the heliosphere",
        visible_summary: "Solar wind particles • Debris field • Mars (scale)",
    },
    StagePresentation {
        location: "Near-Earth Space",
        phenomenon: "Magnetosphere compression & bow shock",
        visible_summary: "Earth • Magnetosphere shell • Satellites",
    },
    StagePresentation {
        location: "Earth • Poles",
        phenomenon: "Aurora formation (particle precipitation)",
        visible_summary: "Earth • Aurora • Magnetosphere • Satellites",
    },
    StagePresentation {
        location: "Earth Orbit",
        phenomenon: "Satellite impacts (charging / GPS degradation)",
        visible_summary: "Satellites • Magnetosphere • Particle stream",
    },
    StagePresentation {
        location: "Earth System",
        phenomenon: "Solar-terrestrial connection overview",
        visible_summary: "Earth • Magnetosphere • Satellites • Particle stream",
    },
];

impl StagePresentation {
    /// Indices past the table reuse the last entry.
    pub fn for_index(index: usize) -> Self {
        PRESENTATIONS[index.min(PRESENTATIONS.len() - 1)]
    }
}

/// Which stage-driven scene elements are shown.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneToggles {
    pub cme_shock: bool,
    pub debris_field: bool,
    pub magnetosphere: bool,
    pub aurora_light: bool,
    /// Aurora ribbon opacity in `[0, 0.8]`.
    pub aurora_opacity: f32,
}

impl SceneToggles {
    pub fn for_stage(index: usize, elapsed: f32, duration: f32) -> Self {
        Self {
            cme_shock: index <= 1,
            debris_field: index == 2,
            magnetosphere: index >= 3,
            aurora_light: index >= 4,
            aurora_opacity: aurora_opacity(index, elapsed, duration),
        }
    }
}

/// Aurora ribbons fade in from stage index 4 onward.
pub fn aurora_opacity(index: usize, elapsed: f32, duration: f32) -> f32 {
    if index < 4 {
        return 0.0;
    }
    let fraction = if duration > 0.0 { elapsed / duration } else { 0.0 };
    let ramp = ((index - 4) as f32 + fraction) * 0.3;
    ramp.clamp(0.0, 1.0) * 0.8
}
