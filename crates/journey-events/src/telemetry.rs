//! Live telemetry messages.
//!
//! The space-weather stream pushes one JSON object per message:
//!
//! ```json
//! { "metrics": { "kp_index": 6.3, "solar_wind_speed": 610.0, ... },
//!   "stage":   { "index": 4, "changed": true,
//!                "info": { "event": { "type": "aurora_active" } } } }
//! ```
//!
//! A message without `metrics` does not decode; receivers drop it.

use serde::{Deserialize, Serialize};

/// Event type announcing a geomagnetic storm.
pub const GEOMAGNETIC_STORM: &str = "geomagnetic_storm";
/// Event type announcing visible aurora.
pub const AURORA_ACTIVE: &str = "aurora_active";
/// Storm severity that raises a HUD notice.
pub const SEVERITY_STRONG: &str = "strong";

/// A decoded telemetry message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub metrics: LiveMetrics,
    #[serde(default)]
    pub stage: StageSignal,
}

impl TelemetryEvent {
    /// Parses a single message.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the message as one JSONL line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The attached space-weather event, if any.
    pub fn weather_event(&self) -> Option<&SpaceWeatherEvent> {
        self.stage.info.as_ref().and_then(|info| info.event.as_ref())
    }
}

/// Latest space-weather readings. Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LiveMetrics {
    #[serde(default)]
    pub kp_index: Option<f32>,
    #[serde(default)]
    pub solar_wind_speed: Option<f32>,
    #[serde(default)]
    pub particle_flux: Option<f64>,
    #[serde(default)]
    pub aurora_intensity: Option<f32>,
    #[serde(default, rename = "satellite_impact_risk")]
    pub satellite_risk: Option<f32>,
    #[serde(default)]
    pub data_quality: Option<String>,
    #[serde(default, rename = "timestamp")]
    pub timestamp_utc: Option<String>,
}

/// Stage hint carried alongside the metrics.
///
/// `index` is signed on the wire so that a bogus negative value reaches the
/// controller and is rejected there instead of failing the whole message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageSignal {
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<StageEventInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageEventInfo {
    #[serde(default)]
    pub event: Option<SpaceWeatherEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceWeatherEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub severity: Option<String>,
}

impl SpaceWeatherEvent {
    pub fn is_strong_storm(&self) -> bool {
        self.kind == GEOMAGNETIC_STORM && self.severity.as_deref() == Some(SEVERITY_STRONG)
    }

    pub fn is_aurora(&self) -> bool {
        self.kind == AURORA_ACTIVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_message() {
        let json = r#"{
            "metrics": {
                "kp_index": 6.3,
                "solar_wind_speed": 610.0,
                "particle_flux": 12000.5,
                "aurora_intensity": 0.8,
                "satellite_impact_risk": 0.4,
                "data_quality": "live",
                "timestamp": "2024-05-10T17:00:00Z"
            },
            "stage": {
                "index": 4,
                "changed": true,
                "info": { "event": { "type": "aurora_active" } }
            }
        }"#;

        let event = TelemetryEvent::from_json(json).unwrap();
        assert_eq!(event.metrics.kp_index, Some(6.3));
        assert_eq!(event.metrics.satellite_risk, Some(0.4));
        assert_eq!(event.metrics.timestamp_utc.as_deref(), Some("2024-05-10T17:00:00Z"));
        assert_eq!(event.stage.index, Some(4));
        assert!(event.stage.changed);
        assert!(event.weather_event().unwrap().is_aurora());
    }

    #[test]
    fn test_missing_metrics_fails() {
        let json = r#"{"stage":{"index":2,"changed":true}}"#;
        assert!(TelemetryEvent::from_json(json).is_err());

        let json = r#"{"metrics":null}"#;
        assert!(TelemetryEvent::from_json(json).is_err());
    }

    #[test]
    fn test_missing_stage_defaults() {
        let event = TelemetryEvent::from_json(r#"{"metrics":{}}"#).unwrap();
        assert_eq!(event.stage, StageSignal::default());
        assert!(!event.stage.changed);
        assert!(event.weather_event().is_none());
    }

    #[test]
    fn test_storm_severity() {
        let strong = SpaceWeatherEvent {
            kind: GEOMAGNETIC_STORM.to_string(),
            severity: Some("strong".to_string()),
        };
        let minor = SpaceWeatherEvent {
            kind: GEOMAGNETIC_STORM.to_string(),
            severity: Some("minor".to_string()),
        };

        assert!(strong.is_strong_storm());
        assert!(!minor.is_strong_storm());
        assert!(!strong.is_aurora());
    }

    #[test]
    fn test_wire_names_on_output() {
        let event = TelemetryEvent {
            metrics: LiveMetrics {
                satellite_risk: Some(0.2),
                timestamp_utc: Some("t".to_string()),
                ..Default::default()
            },
            stage: StageSignal::default(),
        };
        let line = event.to_jsonl().unwrap();
        assert!(line.contains("\"satellite_impact_risk\":0.2"));
        assert!(line.contains("\"timestamp\":\"t\""));
        assert!(!line.contains('\n'));
    }
}
