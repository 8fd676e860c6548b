//! The tour context: owns every engine component and runs one frame.
//!
//! Frame order is fixed:
//! 1. drain the input queue
//! 2. pump telemetry
//! 3. tick the stage controller
//! 4. apply stage-change side effects
//! 5. integrate particles
//! 6. move satellites
//! 7. update the camera

use bevy_math::Vec2;

use crate::camera::{CameraMode, CameraRig};
use crate::clock::Clock;
use crate::collaborators::{CompletionNotifier, NarrationSink};
use crate::config::TourConfig;
use crate::controller::{SpeedPreset, StageController, StageEvent};
use crate::input::{InputQueue, TourInput};
use crate::particles::{stage_intensity, ParticleField};
use crate::picker::{HoverChanged, InteractableId, InteractionPicker, SurfaceRect};
use crate::scene::{default_catalog, BodyKind, SatelliteOrbit};
use crate::stage::{SceneToggles, StagePresentation, StageSet};
use crate::telemetry::{TelemetryBridge, TelemetryNotice, TelemetryTransport};

/// A catalog body as registered with the picker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBody {
    pub kind: BodyKind,
    pub id: InteractableId,
    pub orbit: Option<SatelliteOrbit>,
}

/// HUD toggles bound to single keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewToggles {
    pub particles: bool,
    pub kp_meter: bool,
    pub narration: bool,
    pub help: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A transient HUD notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudNotice {
    pub text: String,
    pub level: NoticeLevel,
}

impl HudNotice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NoticeLevel::Info,
        }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NoticeLevel::Warning,
        }
    }
}

/// Tooltip contents for the hovered interactable.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub title: String,
    pub description: String,
    pub category: String,
    pub position: Vec2,
}

pub struct TourContext {
    config: TourConfig,
    controller: StageController,
    particles: ParticleField,
    camera: CameraRig,
    picker: InteractionPicker,
    telemetry: TelemetryBridge,
    input: InputQueue,
    bodies: Vec<SceneBody>,
    view: ViewToggles,
    scene_toggles: SceneToggles,
    surface: SurfaceRect,
    narration: Box<dyn NarrationSink>,
    completion: Box<dyn CompletionNotifier>,
    notices: Vec<HudNotice>,
    hover_changes: Vec<HoverChanged>,
    pending_pointer: Option<Vec2>,
    exit_requested: bool,
    started: bool,
}

impl TourContext {
    pub fn new(
        config: TourConfig,
        stages: StageSet,
        narration: Box<dyn NarrationSink>,
        completion: Box<dyn CompletionNotifier>,
    ) -> Self {
        let config = config.sanitized();
        let controller = StageController::new(stages, config.stage.auto_play);
        let particles = ParticleField::new(&config.particles);
        let mut camera = CameraRig::new(&config.camera);
        let telemetry = TelemetryBridge::new(&config.telemetry);

        let mut picker = InteractionPicker::new();
        let bodies: Vec<SceneBody> = default_catalog(config.particles.seed)
            .iter()
            .map(|spec| SceneBody {
                kind: spec.kind,
                id: picker.register(spec),
                orbit: spec.orbit,
            })
            .collect();

        if let Some(earth) = bodies
            .iter()
            .find(|b| b.kind == BodyKind::Earth)
            .and_then(|b| picker.get(b.id))
        {
            camera.set_focus_target(earth.world_position);
        }

        let view = ViewToggles {
            particles: true,
            kp_meter: true,
            narration: config.stage.narration,
            help: false,
        };

        let mut context = Self {
            config,
            controller,
            particles,
            camera,
            picker,
            telemetry,
            input: InputQueue::new(),
            bodies,
            view,
            scene_toggles: SceneToggles::default(),
            surface: SurfaceRect::default(),
            narration,
            completion,
            notices: Vec::new(),
            hover_changes: Vec::new(),
            pending_pointer: None,
            exit_requested: false,
            started: false,
        };
        context.apply_scene_toggles(true);

        tracing::info!(
            "Tour context ready: {} stages, {} particles, {} interactables",
            context.controller.stages().len(),
            context.particles.len(),
            context.picker.len()
        );
        context
    }

    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    pub fn controller(&self) -> &StageController {
        &self.controller
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn picker(&self) -> &InteractionPicker {
        &self.picker
    }

    pub fn telemetry(&self) -> &TelemetryBridge {
        &self.telemetry
    }

    pub fn bodies(&self) -> &[SceneBody] {
        &self.bodies
    }

    pub fn body(&self, kind: BodyKind) -> Option<&SceneBody> {
        self.bodies.iter().find(|b| b.kind == kind)
    }

    pub fn view(&self) -> ViewToggles {
        self.view
    }

    pub fn scene_toggles(&self) -> SceneToggles {
        self.scene_toggles
    }

    pub fn surface(&self) -> SurfaceRect {
        self.surface
    }

    pub fn presentation(&self) -> StagePresentation {
        StagePresentation::for_index(self.controller.current_index())
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn set_telemetry_transport(&mut self, transport: Box<dyn TelemetryTransport>) {
        self.telemetry.set_transport(transport);
    }

    /// Queues host input for the next frame.
    pub fn push_input(&mut self, input: TourInput) {
        self.input.push(input);
    }

    pub fn drain_notices(&mut self) -> Vec<HudNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn drain_hover_changes(&mut self) -> Vec<HoverChanged> {
        std::mem::take(&mut self.hover_changes)
    }

    /// Live Kp while telemetry is connected, otherwise the stage-derived value.
    pub fn display_kp(&self) -> f32 {
        if self.telemetry.is_live() {
            if let Some(kp) = self.telemetry.latest_metrics().and_then(|m| m.kp_index) {
                return kp;
            }
        }
        self.controller.display_kp()
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        let record = self.picker.hovered_record()?;
        let pointer = self.picker.pointer()?;
        Some(Tooltip {
            title: record.display_name.clone(),
            description: record.description.clone(),
            category: record.category.to_string(),
            position: self.surface.tooltip_position(pointer),
        })
    }

    /// Narrates the first stage. Runs once; `frame` calls it if needed.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        if let Some(stage) = self.controller.current_stage() {
            tracing::info!("Starting tour at {}", stage.name);
            if self.view.narration {
                self.narration.play(stage);
            }
        }
    }

    /// Runs one frame of `delta_seconds`, clamped to the configured maximum.
    pub fn frame(&mut self, delta_seconds: f32, clock: &impl Clock) {
        self.start();
        let now = clock.now();
        let dt = if delta_seconds.is_finite() {
            delta_seconds.clamp(0.0, self.config.stage.max_frame_delta.max(0.0))
        } else {
            0.0
        };

        self.drain_input(now);
        if self.exit_requested {
            return;
        }

        self.telemetry.pump(now, &mut self.controller);
        for notice in self.telemetry.drain_notices() {
            self.notices.push(telemetry_notice(&notice));
        }

        self.controller.tick(dt);
        self.apply_stage_events();
        self.apply_scene_toggles(false);

        if self.controller.is_playing() {
            if let Some(stage) = self.controller.current_stage() {
                let intensity = stage_intensity(
                    &self.config.particles,
                    self.controller.elapsed(),
                    stage.duration_seconds,
                    stage.particle_intensity,
                );
                self.particles.integrate(intensity, self.controller.speed());
            }
        }

        let speed = self.controller.speed();
        for body in &mut self.bodies {
            if let Some(orbit) = body.orbit.as_mut() {
                orbit.advance(dt, speed);
                self.picker.set_world_position(body.id, orbit.position());
            }
        }

        self.camera.set_tour_progress(self.controller.tour_progress());
        self.camera.update(dt, now);
    }

    fn drain_input(&mut self, now: f64) {
        for input in self.input.drain() {
            match input {
                TourInput::PointerMoved(position) => self.pending_pointer = Some(position),
                TourInput::PointerLeft => {
                    self.pending_pointer = None;
                    let change = self.picker.pointer_left();
                    self.record_hover(change);
                }
                TourInput::Click => {
                    self.flush_pointer();
                    self.picker.on_click(&mut self.camera, now);
                }
                TourInput::Wheel { .. } | TourInput::ZoomIn | TourInput::ZoomOut => {
                    if let Some(factor) = input.zoom_factor() {
                        if let Err(e) = self.camera.set_zoom_factor(factor) {
                            tracing::warn!("Ignoring zoom: {}", e);
                        }
                    }
                }
                TourInput::OrbitDrag(delta) => self.camera.orbit_by(delta),
                TourInput::Advance => self.controller.advance(),
                TourInput::Retreat => self.controller.retreat(),
                TourInput::JumpTo(index) => {
                    if let Err(e) = self.controller.jump_to(index) {
                        tracing::warn!("Ignoring jump: {}", e);
                    }
                }
                TourInput::SetSpeed(preset) => self.set_speed(preset),
                TourInput::ToggleParticles => {
                    self.view.particles = !self.view.particles;
                    self.particles.set_visible(self.view.particles);
                }
                TourInput::ToggleKpMeter => self.view.kp_meter = !self.view.kp_meter,
                TourInput::ToggleNarration => {
                    self.view.narration = !self.view.narration;
                    let state = if self.view.narration { "on" } else { "off" };
                    self.notices.push(HudNotice::info(format!("Narration {}", state)));
                }
                TourInput::ToggleHelp => self.view.help = !self.view.help,
                TourInput::ToggleFreeCam => self.toggle_free_camera(now),
                TourInput::ToggleAutoPlay => {
                    let on = !self.controller.auto_play();
                    self.controller.set_auto_play(on);
                    let state = if on { "on" } else { "off" };
                    self.notices.push(HudNotice::info(format!("Auto-play {}", state)));
                }
                TourInput::ToggleLive => self.telemetry.toggle(now),
                TourInput::Resize(surface) => self.surface = surface,
                TourInput::Exit => {
                    tracing::info!("Leaving the tour");
                    self.exit_requested = true;
                    self.telemetry.disconnect();
                    return;
                }
            }
        }
        self.flush_pointer();
    }

    fn flush_pointer(&mut self) {
        if let Some(pointer) = self.pending_pointer.take() {
            let change = self
                .picker
                .update_from_pointer(pointer, &self.surface, &self.camera);
            self.record_hover(change);
        }
    }

    fn record_hover(&mut self, change: Option<HoverChanged>) {
        if let Some(change) = change {
            self.hover_changes.push(change);
        }
    }

    fn set_speed(&mut self, preset: SpeedPreset) {
        let multiplier = match preset {
            SpeedPreset::Normal => self.config.stage.normal_speed,
            SpeedPreset::Fast => self.config.stage.fast_speed,
        };
        match self.controller.set_speed(multiplier) {
            Ok(()) => self
                .notices
                .push(HudNotice::info(format!("Speed: {}x", multiplier))),
            Err(e) => tracing::warn!("Ignoring speed preset: {}", e),
        }
    }

    fn toggle_free_camera(&mut self, now: f64) {
        match self.camera.mode() {
            CameraMode::Cinematic => {
                self.camera.set_mode(CameraMode::Free);
                let anchor = self
                    .body(BodyKind::Earth)
                    .or_else(|| self.body(BodyKind::Sun))
                    .and_then(|b| self.picker.get(b.id))
                    .map(|r| (r.world_position, r.bounding_radius));
                if let Some((position, radius)) = anchor {
                    self.camera.focus_on(position, radius, now);
                }
                self.notices.push(HudNotice::info("Free camera"));
            }
            CameraMode::Free => {
                self.camera.set_mode(CameraMode::Cinematic);
                self.notices.push(HudNotice::info("Cinematic camera"));
            }
        }
    }

    fn apply_stage_events(&mut self) {
        for event in self.controller.drain_events() {
            match event {
                StageEvent::StageChanged { from, to, cause } => {
                    let Some(stage) = self.controller.current_stage() else { continue };
                    tracing::info!("Stage {} -> {} ({:?}): {}", from + 1, to + 1, cause, stage.name);
                    self.camera.release_focus();
                    self.notices
                        .push(HudNotice::info(format!("Stage {}: {}", to + 1, stage.name)));
                    if self.view.narration {
                        self.narration.play(stage);
                    }
                }
                StageEvent::TourCompleted => {
                    self.notices.push(HudNotice::info("Journey complete"));
                    self.completion.notify_complete();
                }
            }
        }
    }

    fn apply_scene_toggles(&mut self, force: bool) {
        let index = self.controller.current_index();
        let duration = self
            .controller
            .current_stage()
            .map(|s| s.duration_seconds)
            .unwrap_or(1.0);
        let next = SceneToggles::for_stage(index, self.controller.elapsed(), duration);
        let previous = self.scene_toggles;
        self.scene_toggles = next;

        let updates = [
            (BodyKind::CmeShock, previous.cme_shock, next.cme_shock),
            (BodyKind::DebrisField, previous.debris_field, next.debris_field),
            (BodyKind::Magnetosphere, previous.magnetosphere, next.magnetosphere),
        ];
        for (kind, was, now_visible) in updates {
            if !force && was == now_visible {
                continue;
            }
            if let Some(id) = self.body(kind).map(|b| b.id) {
                let change = self.picker.set_visible(id, now_visible);
                self.record_hover(change);
            }
        }
    }
}

fn telemetry_notice(notice: &TelemetryNotice) -> HudNotice {
    match notice {
        TelemetryNotice::ConnectionLost(_) | TelemetryNotice::StrongGeomagneticStorm => {
            HudNotice::warning(notice.message())
        }
        _ => HudNotice::info(notice.message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::collaborators::{LogCompletion, SilentNarration};
    use crate::controller::TourPhase;

    fn context(auto_play: bool) -> TourContext {
        let mut config = TourConfig::default();
        config.stage.auto_play = auto_play;
        TourContext::new(
            config,
            StageSet::defaults(),
            Box::new(SilentNarration),
            Box::new(LogCompletion),
        )
    }

    #[test]
    fn test_initial_scene() {
        let ctx = context(false);
        assert_eq!(ctx.bodies().len(), 24);
        assert!(ctx.scene_toggles().cme_shock);

        let debris = ctx.body(BodyKind::DebrisField).unwrap().id;
        let magnetosphere = ctx.body(BodyKind::Magnetosphere).unwrap().id;
        assert!(!ctx.picker().get(debris).unwrap().visible);
        assert!(!ctx.picker().get(magnetosphere).unwrap().visible);
        assert_eq!(ctx.camera().focus_target(), crate::scene::EARTH_POSITION);
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let mut ctx = context(true);
        let clock = ManualClock::at(0.0);
        // A 60 s stall counts as 0.1 s
        ctx.frame(60.0, &clock);
        assert_eq!(ctx.controller().current_index(), 0);
        assert!((ctx.controller().elapsed() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_config_falls_back_and_runs() {
        let mut config = TourConfig::default();
        config.camera.min_distance = 3000.0;
        config.stage.max_frame_delta = -1.0;
        config.particles.max_intensity = f32::NAN;
        config.stage.auto_play = true;
        let mut ctx = TourContext::new(
            config,
            StageSet::defaults(),
            Box::new(SilentNarration),
            Box::new(LogCompletion),
        );
        assert!(ctx.config().validate().is_ok());

        let mut clock = ManualClock::at(0.0);
        for _ in 0..30 {
            clock.advance(0.05);
            ctx.frame(0.05, &clock);
        }
        ctx.push_input(TourInput::ZoomOut);
        ctx.frame(0.05, &clock);
        assert!(ctx.controller().elapsed() > 0.0);
        assert!(ctx.camera().focus_distance() <= 2500.0);
    }

    #[test]
    fn test_cinematic_camera_travels_with_the_tour() {
        let mut ctx = context(false);
        let clock = ManualClock::at(0.0);
        let planet = crate::scene::EARTH_POSITION;
        let mut distances = Vec::new();

        for _ in 0..ctx.controller().stages().len() {
            for _ in 0..400 {
                ctx.frame(1.0 / 60.0, &clock);
            }
            distances.push(ctx.camera().look_at().distance(planet));
            ctx.push_input(TourInput::Advance);
        }

        assert!(distances.first() > distances.last());
        assert!(distances.windows(2).all(|w| w[1] <= w[0] + 1e-3));
        assert!(*distances.last().unwrap() < 1.0);
    }

    #[test]
    fn test_stage_change_updates_visibility() {
        let mut ctx = context(false);
        let clock = ManualClock::at(0.0);
        ctx.push_input(TourInput::JumpTo(3));
        ctx.frame(0.016, &clock);

        let cme = ctx.body(BodyKind::CmeShock).unwrap().id;
        let magnetosphere = ctx.body(BodyKind::Magnetosphere).unwrap().id;
        assert!(!ctx.picker().get(cme).unwrap().visible);
        assert!(ctx.picker().get(magnetosphere).unwrap().visible);
        assert!(ctx
            .drain_notices()
            .iter()
            .any(|n| n.text == "Stage 4: Earth Approaches"));
    }

    #[test]
    fn test_invalid_jump_is_ignored() {
        let mut ctx = context(false);
        ctx.push_input(TourInput::JumpTo(99));
        ctx.frame(0.016, &ManualClock::at(0.0));
        assert_eq!(ctx.controller().current_index(), 0);
    }

    #[test]
    fn test_particles_only_move_while_playing() {
        let mut ctx = context(false);
        let clock = ManualClock::at(0.0);
        let before = ctx.particles().positions().to_vec();
        ctx.frame(0.05, &clock);
        assert_eq!(ctx.particles().positions(), &before[..]);

        ctx.push_input(TourInput::ToggleAutoPlay);
        ctx.frame(0.05, &clock);
        ctx.frame(0.05, &clock);
        assert_ne!(ctx.particles().positions(), &before[..]);
    }

    #[test]
    fn test_speed_presets() {
        let mut ctx = context(true);
        let clock = ManualClock::at(0.0);
        ctx.push_input(TourInput::SetSpeed(SpeedPreset::Fast));
        ctx.frame(0.1, &clock);
        assert_eq!(ctx.controller().speed(), 3.0);
        assert!((ctx.controller().elapsed() - 0.3).abs() < 1e-5);

        ctx.push_input(TourInput::SetSpeed(SpeedPreset::Normal));
        ctx.frame(0.0, &clock);
        assert_eq!(ctx.controller().speed(), 1.0);
    }

    #[test]
    fn test_toggles() {
        let mut ctx = context(false);
        let clock = ManualClock::at(0.0);
        ctx.push_input(TourInput::ToggleParticles);
        ctx.push_input(TourInput::ToggleKpMeter);
        ctx.push_input(TourInput::ToggleHelp);
        ctx.frame(0.016, &clock);

        let view = ctx.view();
        assert!(!view.particles);
        assert!(!ctx.particles().is_visible());
        assert!(!view.kp_meter);
        assert!(view.help);
    }

    #[test]
    fn test_free_camera_focuses_planet() {
        let mut ctx = context(false);
        let clock = ManualClock::at(0.0);
        ctx.push_input(TourInput::ToggleFreeCam);
        ctx.frame(0.016, &clock);

        assert_eq!(ctx.camera().mode(), CameraMode::Free);
        assert!(ctx.camera().is_transitioning());
        assert_eq!(ctx.camera().focus_target(), crate::scene::EARTH_POSITION);

        ctx.push_input(TourInput::ToggleFreeCam);
        ctx.frame(0.016, &clock);
        assert_eq!(ctx.camera().mode(), CameraMode::Cinematic);
    }

    #[test]
    fn test_wheel_zooms() {
        let mut ctx = context(false);
        let start = ctx.camera().focus_distance_target();
        ctx.push_input(TourInput::Wheel { delta_y: 120.0 });
        ctx.frame(0.016, &ManualClock::at(0.0));
        assert!((ctx.camera().focus_distance_target() - start * 1.25).abs() < 1e-3);
    }

    #[test]
    fn test_completion_via_advance() {
        let mut ctx = context(true);
        let clock = ManualClock::at(0.0);
        for _ in 0..7 {
            ctx.push_input(TourInput::Advance);
        }
        ctx.frame(0.016, &clock);

        assert_eq!(ctx.controller().phase(), TourPhase::Completed);
        assert!(ctx
            .drain_notices()
            .iter()
            .any(|n| n.text == "Journey complete"));
    }

    #[test]
    fn test_exit_stops_the_frame() {
        let mut ctx = context(true);
        ctx.push_input(TourInput::Exit);
        ctx.push_input(TourInput::Advance);
        ctx.frame(0.05, &ManualClock::at(0.0));

        assert!(ctx.exit_requested());
        assert_eq!(ctx.controller().current_index(), 0);
        assert_eq!(ctx.controller().elapsed(), 0.0);
    }

    #[test]
    fn test_display_kp_falls_back_to_stage() {
        let mut ctx = context(false);
        ctx.push_input(TourInput::JumpTo(6));
        ctx.frame(0.016, &ManualClock::at(0.0));
        assert!((ctx.display_kp() - 6.0 / 7.0 * 9.0).abs() < 1e-4);
    }
}
