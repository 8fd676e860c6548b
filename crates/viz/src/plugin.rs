//! Main plugin that ties the tour systems together.

use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;

use crate::camera::CameraPlugin;
use crate::hud::HudPlugin;
use crate::input::InputPlugin;
use crate::particles::ParticlePlugin;
use crate::scene::ScenePlugin;
use crate::tour::TourPlugin;

/// Default log filter; keeps renderer chatter down.
pub const DEFAULT_LOG_FILTER: &str = "info,wgpu=error,naga=warn";

/// Main plugin for the Solar Wind Journey.
///
/// Sets up the window and logging, then adds the engine driver and the
/// rendering plugins that mirror its state every frame.
pub struct JourneyPlugin {
    pub log_filter: String,
}

impl Default for JourneyPlugin {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Plugin for JourneyPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Solar Wind Journey".into(),
                        resolution: (1280., 720.).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: self.log_filter.clone(),
                    level: Level::INFO,
                    ..default()
                }),
        )
        .add_plugins((
            TourPlugin,
            InputPlugin,
            ScenePlugin,
            ParticlePlugin,
            CameraPlugin,
            HudPlugin,
        ));
    }
}
