//! Live telemetry bridge.
//!
//! The bridge owns a [`TelemetryTransport`] and is pumped once per frame. It
//! decodes messages, keeps the latest metrics for display, optionally follows
//! stage hints, and reconnects after a fixed delay whenever the link fails.

use journey_events::{LiveMetrics, TelemetryEvent};
use thiserror::Error;

use crate::config::TelemetryConfig;
use crate::controller::{ChangeCause, StageController};
use crate::stage::KP_MAX;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed")]
    Closed,
}

/// A source of raw telemetry messages.
pub trait TelemetryTransport: Send + Sync {
    /// Starts delivering messages.
    fn open(&mut self) -> Result<(), TransportError>;
    /// Next pending message, without blocking.
    fn poll(&mut self) -> Result<Option<String>, TransportError>;
    /// Stops delivery and releases resources.
    fn close(&mut self);
    /// Human-readable endpoint for logs and the HUD.
    fn describe(&self) -> String;
}

/// Link state shown in the HUD.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LinkStatus {
    #[default]
    Offline,
    Connecting,
    Live,
    /// Waiting to reconnect at `retry_at` (clock seconds).
    Backoff { retry_at: f64 },
}

/// Things worth a HUD notification.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryNotice {
    Connected(String),
    Disconnected,
    ConnectionLost(String),
    StrongGeomagneticStorm,
    AuroraActive,
}

impl TelemetryNotice {
    pub fn message(&self) -> String {
        match self {
            TelemetryNotice::Connected(endpoint) => {
                format!("Live Mode: connected to {}", endpoint)
            }
            TelemetryNotice::Disconnected => "Live Mode: disconnected".to_string(),
            TelemetryNotice::ConnectionLost(reason) => {
                format!("Live Mode: connection error ({}), using local data", reason)
            }
            TelemetryNotice::StrongGeomagneticStorm => "STRONG GEOMAGNETIC STORM DETECTED!".to_string(),
            TelemetryNotice::AuroraActive => "Aurora Active - Kp Index elevated".to_string(),
        }
    }
}

/// Adapter from telemetry messages to engine state.
pub struct TelemetryBridge {
    transport: Option<Box<dyn TelemetryTransport>>,
    status: LinkStatus,
    wanted: bool,
    auto_advance: bool,
    reconnect_delay: f64,
    latest: Option<LiveMetrics>,
    notices: Vec<TelemetryNotice>,
    received: u64,
    dropped: u64,
}

impl TelemetryBridge {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            transport: None,
            status: LinkStatus::Offline,
            wanted: false,
            auto_advance: config.auto_advance,
            reconnect_delay: config.reconnect_delay_seconds.max(0.0),
            latest: None,
            notices: Vec::new(),
            received: 0,
            dropped: 0,
        }
    }

    /// Installs the transport used by `connect`.
    pub fn set_transport(&mut self, transport: Box<dyn TelemetryTransport>) {
        if let Some(mut old) = self.transport.take() {
            old.close();
        }
        self.transport = Some(transport);
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    pub fn is_live(&self) -> bool {
        self.status == LinkStatus::Live
    }

    /// True between `connect` and `disconnect`.
    pub fn is_enabled(&self) -> bool {
        self.wanted
    }

    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    pub fn set_auto_advance(&mut self, on: bool) {
        self.auto_advance = on;
    }

    pub fn latest_metrics(&self) -> Option<&LiveMetrics> {
        self.latest.as_ref()
    }

    /// Messages decoded and applied.
    pub fn received_count(&self) -> u64 {
        self.received
    }

    /// Messages dropped as malformed.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    pub fn drain_notices(&mut self) -> Vec<TelemetryNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Opens the link, retrying after failures until `disconnect`.
    pub fn connect(&mut self, now: f64) {
        if self.wanted && matches!(self.status, LinkStatus::Live | LinkStatus::Connecting) {
            tracing::debug!("Telemetry already connected");
            return;
        }
        self.wanted = true;
        self.attempt_open(now);
    }

    /// Closes the link and cancels any pending reconnect.
    pub fn disconnect(&mut self) {
        let was_enabled = self.wanted;
        self.wanted = false;
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
        self.status = LinkStatus::Offline;
        if was_enabled {
            tracing::info!("Telemetry disconnected");
            self.notices.push(TelemetryNotice::Disconnected);
        }
    }

    pub fn toggle(&mut self, now: f64) {
        if self.wanted {
            self.disconnect();
        } else {
            self.connect(now);
        }
    }

    fn attempt_open(&mut self, now: f64) {
        let Some(transport) = self.transport.as_mut() else {
            tracing::warn!("Live mode requested but no telemetry transport is configured");
            self.wanted = false;
            self.status = LinkStatus::Offline;
            return;
        };

        self.status = LinkStatus::Connecting;
        let endpoint = transport.describe();
        match transport.open() {
            Ok(()) => {
                tracing::info!("Telemetry connected to {}", endpoint);
                self.status = LinkStatus::Live;
                self.notices.push(TelemetryNotice::Connected(endpoint));
            }
            Err(e) => {
                tracing::error!("Telemetry connect to {} failed: {}", endpoint, e);
                self.schedule_retry(now);
            }
        }
    }

    fn schedule_retry(&mut self, now: f64) {
        let retry_at = now + self.reconnect_delay;
        tracing::info!("Retrying telemetry in {:.0}s", self.reconnect_delay);
        self.status = LinkStatus::Backoff { retry_at };
    }

    /// Drains pending messages into the controller and runs the reconnect timer.
    pub fn pump(&mut self, now: f64, controller: &mut StageController) {
        if !self.wanted {
            return;
        }

        if let LinkStatus::Backoff { retry_at } = self.status {
            if now >= retry_at {
                tracing::info!("Attempting to reconnect telemetry");
                self.attempt_open(now);
            }
            return;
        }

        if self.status != LinkStatus::Live {
            return;
        }

        loop {
            let Some(transport) = self.transport.as_mut() else { return };
            match transport.poll() {
                Ok(Some(line)) => self.handle_message(&line, controller),
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Telemetry link lost: {}", e);
                    transport.close();
                    self.notices.push(TelemetryNotice::ConnectionLost(e.to_string()));
                    self.schedule_retry(now);
                    break;
                }
            }
        }
    }

    /// Decodes one raw message. Malformed input is dropped.
    pub fn handle_message(&mut self, raw: &str, controller: &mut StageController) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        match TelemetryEvent::from_json(raw) {
            Ok(event) => self.on_event(event, controller),
            Err(e) => {
                self.dropped += 1;
                tracing::debug!("Dropped malformed telemetry: {}", e);
            }
        }
    }

    /// Applies one decoded event.
    pub fn on_event(&mut self, event: TelemetryEvent, controller: &mut StageController) {
        self.received += 1;

        let mut metrics = event.metrics.clone();
        metrics.kp_index = metrics
            .kp_index
            .filter(|kp| kp.is_finite())
            .map(|kp| kp.clamp(0.0, KP_MAX));
        self.latest = Some(metrics);

        if self.auto_advance && event.stage.changed {
            if let Some(index) = event.stage.index {
                if index != controller.current_index() as i64 {
                    tracing::info!("Auto-advancing to stage {} from live data", index);
                    if let Err(e) = controller.jump_with_cause(index, ChangeCause::Telemetry) {
                        tracing::warn!("Ignoring live stage hint: {}", e);
                    }
                }
            }
        }

        if let Some(weather) = event.weather_event() {
            if weather.is_strong_storm() {
                self.notices.push(TelemetryNotice::StrongGeomagneticStorm);
            } else if weather.is_aurora() {
                self.notices.push(TelemetryNotice::AuroraActive);
            }
        }
    }
}

impl Drop for TelemetryBridge {
    fn drop(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
    }
}

/// A scripted transport for tests and offline demos.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    /// Results returned by successive `open` calls; `true` succeeds. Empty means success.
    pub open_results: Vec<bool>,
    /// Messages handed out by `poll`, then `Ok(None)`.
    pub messages: std::collections::VecDeque<String>,
    /// Fail the next poll with `Closed` once the messages run out.
    pub close_after_messages: bool,
    pub open_calls: usize,
    pub close_calls: usize,
    open: bool,
}

impl ScriptedTransport {
    pub fn with_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

impl TelemetryTransport for ScriptedTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        let ok = if self.open_results.is_empty() {
            true
        } else {
            self.open_results.remove(0)
        };
        self.open_calls += 1;
        if ok {
            self.open = true;
            Ok(())
        } else {
            Err(TransportError::Connect("scripted refusal".to_string()))
        }
    }

    fn poll(&mut self) -> Result<Option<String>, TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        match self.messages.pop_front() {
            Some(m) => Ok(Some(m)),
            None if self.close_after_messages => {
                self.close_after_messages = false;
                Err(TransportError::Closed)
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.close_calls += 1;
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageSet;
    use journey_events::fixtures;

    fn controller() -> StageController {
        StageController::new(StageSet::defaults(), false)
    }

    fn bridge(auto_advance: bool) -> TelemetryBridge {
        TelemetryBridge::new(&TelemetryConfig {
            reconnect_delay_seconds: 5.0,
            auto_advance,
        })
    }

    #[test]
    fn test_auto_advance_jumps_to_hinted_stage() {
        let mut c = controller();
        let mut b = bridge(true);
        b.on_event(fixtures::telemetry_event(5.0, 3, true), &mut c);

        assert_eq!(c.current_index(), 3);
        assert_eq!(b.latest_metrics().unwrap().kp_index, Some(5.0));
    }

    #[test]
    fn test_hint_ignored_without_auto_advance_or_change() {
        let mut c = controller();
        let mut b = bridge(false);
        b.on_event(fixtures::telemetry_event(5.0, 3, true), &mut c);
        assert_eq!(c.current_index(), 0);

        let mut b = bridge(true);
        b.on_event(fixtures::telemetry_event(5.0, 3, false), &mut c);
        assert_eq!(c.current_index(), 0);
    }

    #[test]
    fn test_same_stage_hint_does_not_reset_timer() {
        let mut c = StageController::new(StageSet::defaults(), true);
        c.tick(4.0);
        let mut b = bridge(true);
        b.on_event(fixtures::telemetry_event(1.0, 0, true), &mut c);
        assert_eq!(c.elapsed(), 4.0);
    }

    #[test]
    fn test_out_of_range_hint_is_rejected() {
        let mut c = controller();
        let mut b = bridge(true);
        b.on_event(fixtures::telemetry_event(5.0, 12, true), &mut c);
        b.on_event(fixtures::telemetry_event(5.0, -2, true), &mut c);
        assert_eq!(c.current_index(), 0);
        assert_eq!(b.received_count(), 2);
    }

    #[test]
    fn test_malformed_messages_dropped() {
        let mut c = controller();
        let mut b = bridge(true);
        b.handle_message("not json", &mut c);
        b.handle_message(r#"{"stage":{"index":3,"changed":true}}"#, &mut c);
        b.handle_message("   ", &mut c);

        assert_eq!(b.dropped_count(), 2);
        assert_eq!(b.received_count(), 0);
        assert!(b.latest_metrics().is_none());
        assert_eq!(c.current_index(), 0);
    }

    #[test]
    fn test_kp_echo_is_clamped() {
        let mut c = controller();
        let mut b = bridge(false);
        b.on_event(fixtures::telemetry_event(11.0, 0, false), &mut c);
        assert_eq!(b.latest_metrics().unwrap().kp_index, Some(9.0));
    }

    #[test]
    fn test_weather_notices() {
        let mut c = controller();
        let mut b = bridge(false);
        let storm = fixtures::with_weather(fixtures::telemetry_event(8.0, 0, false), "geomagnetic_storm", Some("strong"));
        let minor = fixtures::with_weather(fixtures::telemetry_event(4.0, 0, false), "geomagnetic_storm", Some("minor"));
        let aurora = fixtures::with_weather(fixtures::telemetry_event(6.0, 0, false), "aurora_active", None);

        b.on_event(storm, &mut c);
        b.on_event(minor, &mut c);
        b.on_event(aurora, &mut c);

        assert_eq!(
            b.drain_notices(),
            vec![TelemetryNotice::StrongGeomagneticStorm, TelemetryNotice::AuroraActive]
        );
    }

    #[test]
    fn test_pump_delivers_messages() {
        let mut c = controller();
        let mut b = bridge(true);
        let lines: Vec<String> = fixtures::sample_telemetry()
            .iter()
            .map(|e| e.to_jsonl().unwrap())
            .collect();
        b.set_transport(Box::new(ScriptedTransport::with_messages(lines)));

        b.connect(0.0);
        assert!(b.is_live());
        b.pump(0.1, &mut c);

        assert_eq!(b.received_count(), 5);
        assert_eq!(c.current_index(), 4);
        assert_eq!(b.latest_metrics().unwrap().kp_index, Some(9.0));
    }

    #[test]
    fn test_connect_failure_backs_off_and_retries() {
        let mut c = controller();
        let mut b = bridge(false);
        b.set_transport(Box::new(ScriptedTransport {
            open_results: vec![false, false, true],
            ..Default::default()
        }));

        b.connect(10.0);
        assert_eq!(b.status(), LinkStatus::Backoff { retry_at: 15.0 });

        b.pump(14.9, &mut c);
        assert_eq!(b.status(), LinkStatus::Backoff { retry_at: 15.0 });

        b.pump(15.0, &mut c);
        assert_eq!(b.status(), LinkStatus::Backoff { retry_at: 20.0 });

        b.pump(20.0, &mut c);
        assert!(b.is_live());
    }

    #[test]
    fn test_unexpected_close_schedules_reconnect() {
        let mut c = controller();
        let mut b = bridge(false);
        let mut transport = ScriptedTransport::with_messages([r#"{"metrics":{"kp_index":3}}"#]);
        transport.close_after_messages = true;
        b.set_transport(Box::new(transport));

        b.connect(0.0);
        b.pump(1.0, &mut c);

        assert_eq!(b.received_count(), 1);
        assert_eq!(b.status(), LinkStatus::Backoff { retry_at: 6.0 });
        assert!(matches!(
            b.drain_notices().last(),
            Some(TelemetryNotice::ConnectionLost(_))
        ));

        b.pump(6.0, &mut c);
        assert!(b.is_live());
    }

    #[test]
    fn test_disconnect_cancels_reconnect() {
        let mut c = controller();
        let mut b = bridge(false);
        b.set_transport(Box::new(ScriptedTransport {
            open_results: vec![false, true],
            ..Default::default()
        }));

        b.connect(0.0);
        assert!(matches!(b.status(), LinkStatus::Backoff { .. }));
        b.disconnect();
        b.pump(100.0, &mut c);

        assert_eq!(b.status(), LinkStatus::Offline);
        assert!(!b.is_enabled());
    }

    #[test]
    fn test_connect_without_transport_stays_offline() {
        let mut b = bridge(false);
        b.connect(0.0);
        assert_eq!(b.status(), LinkStatus::Offline);
        assert!(!b.is_enabled());
    }

    #[test]
    fn test_toggle() {
        let mut b = bridge(false);
        b.set_transport(Box::new(ScriptedTransport::default()));
        b.toggle(0.0);
        assert!(b.is_live());
        b.toggle(1.0);
        assert_eq!(b.status(), LinkStatus::Offline);
        assert_eq!(
            b.drain_notices(),
            vec![TelemetryNotice::Connected("scripted".to_string()), TelemetryNotice::Disconnected]
        );
    }
}
