//! Tour plugin: builds the engine at startup and steps it once per frame.

use std::path::PathBuf;
use std::time::Duration;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use journey_core::{
    Clock, CompletionNotifier, LogCompletion, ParticleTier, TourConfig, TourContext,
};

use crate::completion::HttpCompletionNotifier;
use crate::narration::NarrationCaption;
use crate::stage_loader::{load_stages, StageSource};
use crate::telemetry::{ReplayFileTransport, TcpLineTransport};

/// Pacing of replayed telemetry lines.
pub const REPLAY_INTERVAL: Duration = Duration::from_millis(1500);

/// Frame phases, run in order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TourSet {
    /// Host input is queued into the context.
    Input,
    /// The engine runs one frame.
    Step,
    /// Engine state is copied into the scene and HUD.
    Sync,
}

pub struct TourPlugin;

impl Plugin for TourPlugin {
    fn build(&self, app: &mut App) {
        // LaunchOptions should be inserted by main.rs; fall back to defaults
        if !app.world().contains_resource::<LaunchOptions>() {
            app.init_resource::<LaunchOptions>();
        }

        app.init_resource::<NarrationCaption>()
            .configure_sets(Update, (TourSet::Input, TourSet::Step, TourSet::Sync).chain())
            .add_systems(PreStartup, build_tour)
            .add_systems(Update, step_tour.in_set(TourSet::Step));
    }
}

/// Command-line choices that shape the tour.
#[derive(Resource, Debug, Clone, Default)]
pub struct LaunchOptions {
    pub config_path: Option<PathBuf>,
    pub stages_url: Option<String>,
    pub stages_file: Option<PathBuf>,
    pub telemetry_addr: Option<String>,
    pub telemetry_replay: Option<PathBuf>,
    pub auto_advance: bool,
    pub auto_play: bool,
    pub completion_url: Option<String>,
    /// `None` keeps the configured tier; `"auto"` picks by display scale.
    pub particle_tier: Option<String>,
}

impl LaunchOptions {
    /// Loads the config file and applies command-line overrides.
    pub fn resolve_config(&self, scale_factor: f64) -> TourConfig {
        let mut config = match &self.config_path {
            Some(path) => TourConfig::from_file(path).unwrap_or_else(|e| {
                tracing::warn!("Using default config, failed to load {:?}: {}", path, e);
                TourConfig::default()
            }),
            None => TourConfig::default(),
        };

        if self.auto_play {
            config.stage.auto_play = true;
        }
        if self.auto_advance {
            config.telemetry.auto_advance = true;
        }
        match self.particle_tier.as_deref() {
            None => {}
            Some("auto") => config.particles.tier = ParticleTier::for_scale_factor(scale_factor),
            Some(name) => match name.parse::<ParticleTier>() {
                Ok(tier) => config.particles.tier = tier,
                Err(e) => tracing::warn!("Ignoring --particle-tier: {}", e),
            },
        }
        config
    }

    pub fn stage_source(&self) -> StageSource {
        StageSource::from_options(self.stages_url.as_deref(), self.stages_file.as_deref())
    }
}

/// The engine, owned by the world.
#[derive(Resource)]
pub struct TourState {
    pub context: TourContext,
}

/// Frame time as seen by the engine.
struct FrameClock(f64);

impl Clock for FrameClock {
    fn now(&self) -> f64 {
        self.0
    }
}

fn build_tour(
    mut commands: Commands,
    options: Res<LaunchOptions>,
    caption: Res<NarrationCaption>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let scale_factor = windows
        .get_single()
        .map(|w| w.scale_factor() as f64)
        .unwrap_or(1.0);
    let config = options.resolve_config(scale_factor);
    let stages = load_stages(&options.stage_source());

    let completion: Box<dyn CompletionNotifier> = match &options.completion_url {
        Some(url) => Box::new(HttpCompletionNotifier::new(url.clone())),
        None => Box::new(LogCompletion),
    };

    let mut context = TourContext::new(config, stages, Box::new(caption.narrator()), completion);

    if let Some(addr) = &options.telemetry_addr {
        context.set_telemetry_transport(Box::new(TcpLineTransport::new(addr.clone())));
    } else if let Some(path) = &options.telemetry_replay {
        context.set_telemetry_transport(Box::new(ReplayFileTransport::new(path.clone(), REPLAY_INTERVAL)));
    }

    commands.insert_resource(TourState { context });
}

fn step_tour(mut tour: ResMut<TourState>, time: Res<Time>, mut exit: EventWriter<AppExit>) {
    let clock = FrameClock(time.elapsed_seconds_f64());
    tour.context.frame(time.delta_seconds(), &clock);

    if tour.context.exit_requested() {
        exit.send(AppExit::Success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_overrides_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[particles]\ntier = \"retina\"\n").unwrap();

        let options = LaunchOptions {
            config_path: Some(file.path().to_path_buf()),
            auto_play: true,
            auto_advance: true,
            ..Default::default()
        };
        let config = options.resolve_config(1.0);
        assert_eq!(config.particles.tier, ParticleTier::Retina);
        assert!(config.stage.auto_play);
        assert!(config.telemetry.auto_advance);
    }

    #[test]
    fn test_particle_tier_option() {
        let auto = LaunchOptions {
            particle_tier: Some("auto".to_string()),
            ..Default::default()
        };
        assert_eq!(auto.resolve_config(2.0).particles.tier, ParticleTier::Retina);
        assert_eq!(auto.resolve_config(1.0).particles.tier, ParticleTier::High);

        let bogus = LaunchOptions {
            particle_tier: Some("ultra".to_string()),
            ..Default::default()
        };
        assert_eq!(bogus.resolve_config(1.0).particles.tier, ParticleTier::High);
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let options = LaunchOptions {
            config_path: Some(PathBuf::from("/nope/tour.toml")),
            ..Default::default()
        };
        assert_eq!(options.resolve_config(1.0), TourConfig::default());
    }

    #[test]
    fn test_invalid_config_uses_defaults() {
        for body in [
            "[camera]\nmin_distance = 3000.0\n",
            "[stage]\nmax_frame_delta = -1.0\n",
            "[particles]\nmax_intensity = nan\n",
        ] {
            let mut file = NamedTempFile::new().unwrap();
            write!(file, "{}", body).unwrap();
            let options = LaunchOptions {
                config_path: Some(file.path().to_path_buf()),
                auto_play: true,
                ..Default::default()
            };

            let config = options.resolve_config(1.0);
            assert!(config.validate().is_ok(), "{}", body);
            assert!(config.stage.auto_play);
        }
    }

    #[test]
    fn test_step_system_runs_a_frame() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(LaunchOptions {
                auto_play: true,
                ..Default::default()
            })
            .add_event::<AppExit>()
            .add_plugins(TourPlugin);

        app.update();
        app.update();

        let tour = app.world().resource::<TourState>();
        assert!(tour.context.controller().is_playing());
        assert_eq!(tour.context.controller().stages().len(), 7);
    }
}
