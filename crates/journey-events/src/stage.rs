//! Stage Document Types
//!
//! The tour backend serves a document shaped like:
//!
//! ```json
//! { "stages": [ { "id": "stage_1", "name": "...", "description": "...",
//!                 "narration": "...", "duration_seconds": 10, "kp_index": 2,
//!                 "particles": { "count": 5000, "intensity": 0.3 } } ] }
//! ```
//!
//! # Example
//!
//! ```
//! use journey_events::{default_stage_document, DEFAULT_STAGE_COUNT};
//!
//! let doc = default_stage_document();
//! assert_eq!(doc.stages.len(), DEFAULT_STAGE_COUNT);
//! assert!(doc.stages.iter().all(|s| s.duration_seconds > 0.0));
//! ```

use serde::{Deserialize, Serialize};

/// Number of stages in the built-in fallback tour.
pub const DEFAULT_STAGE_COUNT: usize = 7;

/// Top-level stage document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDocument {
    pub stages: Vec<StageRecord>,
}

impl StageDocument {
    /// Parses a stage document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the document to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A single stage as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub narration: String,
    pub duration_seconds: f32,
    #[serde(default)]
    pub kp_index: f32,
    #[serde(default)]
    pub particles: ParticleSpec,
}

/// Particle hints for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ParticleSpec {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub intensity: f32,
}

fn record(
    index: usize,
    name: &str,
    description: &str,
    narration: &str,
    kp_index: f32,
    count: u32,
    intensity: f32,
) -> StageRecord {
    StageRecord {
        id: format!("stage_{}", index),
        name: name.to_string(),
        description: description.to_string(),
        narration: narration.to_string(),
        duration_seconds: 10.0,
        kp_index,
        particles: ParticleSpec { count, intensity },
    }
}

/// Returns the built-in seven stage tour used when the backend is unreachable.
pub fn default_stage_document() -> StageDocument {
    StageDocument {
        stages: vec![
            record(
                1,
                "The Solar Wind Journey Begins",
                "Stand on the Sun's surface and witness a Coronal Mass Ejection",
                "Welcome to the Sun's surface. You are about to witness an incredible Coronal Mass Ejection.",
                2.0,
                5000,
                0.3,
            ),
            record(
                2,
                "Plasma Eruption",
                "A massive solar flare erupts from the corona",
                "Watch as a massive eruption of plasma is released from the Sun's corona.",
                4.0,
                8000,
                0.6,
            ),
            record(
                3,
                "Journey Through Space",
                "Travel with the solar wind through the vacuum of space",
                "Now we travel through the vast expanse of space, following the solar wind.",
                3.0,
                6000,
                0.4,
            ),
            record(
                4,
                "Earth Approaches",
                "Our beautiful blue planet comes into view",
                "Earth appears on the horizon. Our destination is near.",
                2.0,
                4000,
                0.2,
            ),
            record(
                5,
                "Aurora Borealis",
                "The solar wind interacts with Earth's magnetosphere",
                "The solar wind interacts with Earth's magnetic field, creating the Aurora Borealis.",
                6.0,
                7000,
                0.7,
            ),
            record(
                6,
                "Satellite Network",
                "Critical satellites relay data during the storm",
                "Earth's satellites play a critical role in monitoring and managing this solar storm.",
                5.0,
                5000,
                0.5,
            ),
            record(
                7,
                "Global Impact",
                "The complete picture of the solar storm's effects",
                "This is the complete picture of how a solar storm affects our planet and technology.",
                7.0,
                3000,
                0.3,
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_document_shape() {
        let doc = default_stage_document();
        assert_eq!(doc.stages.len(), DEFAULT_STAGE_COUNT);
        assert_eq!(doc.stages[0].id, "stage_1");
        assert_eq!(doc.stages[6].id, "stage_7");
        assert!(doc.stages.iter().all(|s| s.duration_seconds == 10.0));
    }

    #[test]
    fn test_parse_minimal_record() {
        let json = r#"{"stages":[{"id":"a","name":"A","duration_seconds":4}]}"#;
        let doc = StageDocument::from_json(json).unwrap();

        assert_eq!(doc.stages.len(), 1);
        assert_eq!(doc.stages[0].duration_seconds, 4.0);
        assert_eq!(doc.stages[0].kp_index, 0.0);
        assert_eq!(doc.stages[0].particles, ParticleSpec::default());
        assert!(doc.stages[0].narration.is_empty());
    }

    #[test]
    fn test_missing_duration_is_rejected() {
        let json = r#"{"stages":[{"id":"a","name":"A"}]}"#;
        assert!(StageDocument::from_json(json).is_err());
    }

    #[test]
    fn test_default_document_survives_json() {
        let doc = default_stage_document();
        let json = doc.to_json_pretty().unwrap();
        assert!(json.contains("\"duration_seconds\""));
        assert!(json.contains("\"particles\""));
        assert_eq!(StageDocument::from_json(&json).unwrap(), doc);
    }
}
