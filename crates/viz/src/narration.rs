//! On-screen narration captions.
//!
//! Speech playback is out of scope; the narrator publishes the stage's
//! narration text for the HUD caption instead.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use journey_core::{NarrationSink, Stage};

/// The caption currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Caption {
    pub title: String,
    pub text: String,
    /// Bumped on every new caption so the HUD can restart its fade.
    pub sequence: u64,
}

/// Shared caption slot, read by the HUD.
#[derive(Resource, Clone, Default)]
pub struct NarrationCaption(pub Arc<Mutex<Caption>>);

impl NarrationCaption {
    pub fn current(&self) -> Option<Caption> {
        self.0.lock().ok().map(|c| c.clone())
    }

    /// A narrator writing into this slot.
    pub fn narrator(&self) -> CaptionNarrator {
        CaptionNarrator {
            slot: self.0.clone(),
        }
    }
}

pub struct CaptionNarrator {
    slot: Arc<Mutex<Caption>>,
}

impl NarrationSink for CaptionNarrator {
    fn play(&mut self, stage: &Stage) {
        tracing::debug!("Narrating {}", stage.id);
        match self.slot.lock() {
            Ok(mut caption) => {
                caption.title = stage.name.clone();
                caption.text = stage.narration.clone();
                caption.sequence += 1;
            }
            Err(_) => tracing::warn!("Caption slot poisoned, narration for {} dropped", stage.id),
        }
    }
}
