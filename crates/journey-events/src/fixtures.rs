//! Sample data fixtures for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! ```ignore
//! // [dev-dependencies]
//! // journey-events = { path = "../journey-events", features = ["test-fixtures"] }
//!
//! use journey_events::fixtures;
//!
//! let doc = fixtures::sample_stage_document();
//! let stream = fixtures::sample_telemetry();
//! ```

use crate::{LiveMetrics, SpaceWeatherEvent, StageDocument, StageEventInfo, StageSignal, TelemetryEvent};

/// Returns the four stage tour from the fixtures file.
///
/// Durations are 6, 8, 12 and 10 seconds; the last stage carries Kp 8.
pub fn sample_stage_document() -> StageDocument {
    let json = include_str!("../tests/fixtures/stages.json");
    StageDocument::from_json(json).expect("Failed to parse stages.json")
}

/// Returns the sample telemetry stream.
///
/// Contains 5 messages:
/// - a quiet reading at stage 0
/// - a stage change to 1
/// - a strong geomagnetic storm moving to stage 3
/// - aurora activity moving to stage 4
/// - an out-of-scale Kp reading of 11 with no stage change
pub fn sample_telemetry() -> Vec<TelemetryEvent> {
    let jsonl = include_str!("../tests/fixtures/telemetry.jsonl");
    jsonl
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            TelemetryEvent::from_json(l).unwrap_or_else(|e| {
                panic!("Failed to parse telemetry line: {}\nError: {}", l, e)
            })
        })
        .collect()
}

/// Builds a telemetry event with the given Kp and stage hint.
pub fn telemetry_event(kp_index: f32, stage_index: i64, changed: bool) -> TelemetryEvent {
    TelemetryEvent {
        metrics: LiveMetrics {
            kp_index: Some(kp_index),
            data_quality: Some("test".to_string()),
            ..Default::default()
        },
        stage: StageSignal {
            index: Some(stage_index),
            changed,
            info: None,
        },
    }
}

/// Attaches a space-weather event to a telemetry message.
pub fn with_weather(mut event: TelemetryEvent, kind: &str, severity: Option<&str>) -> TelemetryEvent {
    event.stage.info = Some(StageEventInfo {
        event: Some(SpaceWeatherEvent {
            kind: kind.to_string(),
            severity: severity.map(str::to_string),
        }),
    });
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_stage_document() {
        let doc = sample_stage_document();
        assert_eq!(doc.stages.len(), 4);
        assert_eq!(doc.stages[1].id, "launch");
        assert_eq!(doc.stages[3].kp_index, 8.0);
    }

    #[test]
    fn test_sample_telemetry() {
        let stream = sample_telemetry();
        assert_eq!(stream.len(), 5);
        assert!(stream[2].weather_event().unwrap().is_strong_storm());
        assert!(stream[3].weather_event().unwrap().is_aurora());
        assert_eq!(stream[4].metrics.solar_wind_speed, None);
    }

    #[test]
    fn test_builders() {
        let event = with_weather(telemetry_event(5.0, 2, true), "geomagnetic_storm", Some("strong"));
        assert_eq!(event.stage.index, Some(2));
        assert!(event.weather_event().unwrap().is_strong_storm());
    }
}
