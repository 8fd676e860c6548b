//! Solar Wind Journey
//!
//! Run with: cargo run -p viz
//!
//! Examples:
//!   cargo run -p viz -- --auto-play
//!   cargo run -p viz -- --stages-file stages.json --telemetry-replay storm.jsonl --auto-advance
//!   cargo run -p viz -- --stages-url http://localhost:8000/api/stages --telemetry-addr 127.0.0.1:9100

use bevy::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use viz::plugin::DEFAULT_LOG_FILTER;
use viz::{JourneyPlugin, LaunchOptions};

/// Solar Wind Journey: a guided 3D tour from the Sun to Earth
#[derive(Parser, Debug)]
#[command(name = "viz")]
#[command(about = "Guided 3D tour of a solar wind event")]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fetch stages from this URL
    #[arg(long)]
    stages_url: Option<String>,

    /// Read stages from a JSON file (wins over --stages-url)
    #[arg(long)]
    stages_file: Option<PathBuf>,

    /// Live telemetry over TCP, one JSON event per line (press L to connect)
    #[arg(long)]
    telemetry_addr: Option<String>,

    /// Replay telemetry from a JSON-lines file (press L to start)
    #[arg(long)]
    telemetry_replay: Option<PathBuf>,

    /// Let live telemetry change the current stage
    #[arg(long)]
    auto_advance: bool,

    /// Start playing on launch
    #[arg(long)]
    auto_play: bool,

    /// Endpoint called with GET when the tour completes
    #[arg(long)]
    completion_url: Option<String>,

    /// Particle tier: high, retina, or auto
    #[arg(long)]
    particle_tier: Option<String>,

    /// Log filter in env-filter syntax
    #[arg(long, default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,
}

fn main() {
    let args = Args::parse();

    let options = LaunchOptions {
        config_path: args.config,
        stages_url: args.stages_url,
        stages_file: args.stages_file,
        telemetry_addr: args.telemetry_addr,
        telemetry_replay: args.telemetry_replay,
        auto_advance: args.auto_advance,
        auto_play: args.auto_play,
        completion_url: args.completion_url,
        particle_tier: args.particle_tier,
    };

    App::new()
        .insert_resource(options)
        .add_plugins(JourneyPlugin {
            log_filter: args.log_filter,
        })
        .run();
}
