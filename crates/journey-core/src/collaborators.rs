//! Seams to the outside world: narration playback and tour completion.

use crate::stage::Stage;

/// Plays the narration for a stage.
pub trait NarrationSink: Send + Sync {
    fn play(&mut self, stage: &Stage);
}

/// Told once when the tour completes.
pub trait CompletionNotifier: Send + Sync {
    fn notify_complete(&mut self);
}

/// Narration that goes nowhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNarration;

impl NarrationSink for SilentNarration {
    fn play(&mut self, stage: &Stage) {
        tracing::debug!("Narration skipped for {}", stage.id);
    }
}

/// Completion that is only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCompletion;

impl CompletionNotifier for LogCompletion {
    fn notify_complete(&mut self) {
        tracing::info!("Tour complete");
    }
}
