//! Stage progression: timer, navigation, playback and completion.

use crate::stage::{Stage, StageError, StageSet, KP_MAX};

/// Playback phase of the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TourPhase {
    #[default]
    Idle,
    Playing,
    /// Terminal until an explicit jump.
    Completed,
}

/// Why the current stage changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    Timer,
    Advance,
    Retreat,
    Jump,
    Telemetry,
}

/// Notices raised by the controller, drained once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    StageChanged {
        from: usize,
        to: usize,
        cause: ChangeCause,
    },
    TourCompleted,
}

/// Speed presets bound to the `1` and `2` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedPreset {
    Normal,
    Fast,
}

/// Owns the stage runtime state.
#[derive(Debug, Clone)]
pub struct StageController {
    stages: StageSet,
    current_index: usize,
    elapsed: f32,
    auto_play: bool,
    phase: TourPhase,
    speed: f32,
    outbox: Vec<StageEvent>,
}

impl StageController {
    /// Starts at stage 0. Playing immediately when auto-play is on.
    pub fn new(stages: StageSet, auto_play: bool) -> Self {
        Self {
            stages,
            current_index: 0,
            elapsed: 0.0,
            auto_play,
            phase: if auto_play {
                TourPhase::Playing
            } else {
                TourPhase::Idle
            },
            speed: 1.0,
            outbox: Vec::new(),
        }
    }

    pub fn stages(&self) -> &StageSet {
        &self.stages
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.stages.get(self.current_index)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn phase(&self) -> TourPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == TourPhase::Playing
    }

    pub fn is_completed(&self) -> bool {
        self.phase == TourPhase::Completed
    }

    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn current_duration(&self) -> f32 {
        self.current_stage()
            .map(|s| s.duration_seconds)
            .unwrap_or(1.0)
    }

    /// Advances the stage timer. Crossing the stage duration advances once.
    pub fn tick(&mut self, delta_seconds: f32) {
        if !self.is_playing() || !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return;
        }
        self.elapsed += delta_seconds * self.speed;
        if self.elapsed >= self.current_duration() {
            self.step_forward(ChangeCause::Timer);
        }
    }

    /// Moves to the next stage, or completes the tour from the last one.
    pub fn advance(&mut self) {
        if self.is_completed() {
            tracing::debug!("Advance ignored: tour already completed");
            return;
        }
        self.step_forward(ChangeCause::Advance);
    }

    fn step_forward(&mut self, cause: ChangeCause) {
        if self.current_index + 1 >= self.stages.len() {
            self.complete();
            return;
        }
        let from = self.current_index;
        self.current_index += 1;
        self.elapsed = 0.0;
        self.outbox.push(StageEvent::StageChanged {
            from,
            to: self.current_index,
            cause,
        });
    }

    fn complete(&mut self) {
        self.phase = TourPhase::Completed;
        // Held at the end of the last stage; tour progress reads 1.0.
        self.elapsed = self.elapsed.min(self.current_duration());
        self.outbox.push(StageEvent::TourCompleted);
        tracing::info!("Tour completed after {} stages", self.stages.len());
    }

    /// Steps back one stage. No-op at the first stage.
    pub fn retreat(&mut self) {
        if self.is_completed() || self.current_index == 0 {
            return;
        }
        let from = self.current_index;
        self.current_index -= 1;
        self.elapsed = 0.0;
        self.outbox.push(StageEvent::StageChanged {
            from,
            to: self.current_index,
            cause: ChangeCause::Retreat,
        });
    }

    /// Jumps to `index`. Out-of-range indices leave the state untouched.
    pub fn jump_to(&mut self, index: i64) -> Result<(), StageError> {
        self.jump_with_cause(index, ChangeCause::Jump)
    }

    pub(crate) fn jump_with_cause(&mut self, index: i64, cause: ChangeCause) -> Result<(), StageError> {
        let len = self.stages.len();
        let target = usize::try_from(index)
            .ok()
            .filter(|&i| i < len)
            .ok_or(StageError::IndexOutOfRange { index, len })?;

        let from = self.current_index;
        self.current_index = target;
        self.elapsed = 0.0;
        self.phase = if self.auto_play {
            TourPhase::Playing
        } else {
            TourPhase::Idle
        };
        self.outbox.push(StageEvent::StageChanged {
            from,
            to: target,
            cause,
        });
        Ok(())
    }

    /// Pauses or resumes. Ignored once the tour has completed.
    pub fn set_playing(&mut self, playing: bool) {
        if self.is_completed() {
            tracing::debug!("Playback change ignored: tour completed");
            return;
        }
        self.phase = if playing {
            TourPhase::Playing
        } else {
            TourPhase::Idle
        };
    }

    /// Turns auto-play on or off; playback follows and the stage timer restarts.
    pub fn set_auto_play(&mut self, on: bool) {
        self.auto_play = on;
        if self.is_completed() {
            return;
        }
        self.elapsed = 0.0;
        self.set_playing(on);
    }

    pub fn set_speed(&mut self, multiplier: f32) -> Result<(), StageError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(StageError::InvalidSpeed(multiplier));
        }
        self.speed = multiplier;
        Ok(())
    }

    /// Removes and returns pending events.
    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Fraction of the whole tour covered, in `[0, 1]`.
    pub fn tour_progress(&self) -> f32 {
        let len = self.stages.len().max(1) as f32;
        let within = (self.elapsed / self.current_duration()).clamp(0.0, 1.0);
        ((self.current_index as f32 + within) / len).clamp(0.0, 1.0)
    }

    /// Stage counter as a percentage, 100 on the last stage.
    pub fn stage_progress_percent(&self) -> f32 {
        (self.current_index + 1) as f32 / self.stages.len().max(1) as f32 * 100.0
    }

    /// Kp shown while no live reading is available.
    pub fn display_kp(&self) -> f32 {
        (self.current_index as f32 / self.stages.len().max(1) as f32 * KP_MAX).clamp(0.0, KP_MAX)
    }
}
