use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrollcue_core::MotionConfig;

mod commands;
mod scenario;
mod simulation;

#[derive(Parser)]
#[command(name = "scrollcue")]
#[command(author, version, about = "Scroll-driven animation triggers, replayed frame by frame")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.config/scrollcue/config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file and print the triggers it produces
    Simulate {
        /// Scenario TOML file
        scenario: PathBuf,
        /// Frame rate override
        #[arg(long)]
        fps: Option<u32>,
        /// Emit one JSON object per event
        #[arg(long)]
        json: bool,
        /// Pace frames on the wall clock instead of stepping instantly
        #[arg(long)]
        realtime: bool,
    },
    /// Sample a named easing curve
    Easing {
        /// Curve name, e.g. easeOut, expoOut or inOut(3)
        name: String,
        /// Number of intervals to sample
        #[arg(short = 'n', long, default_value_t = 10)]
        samples: usize,
    },
    /// Show the effective configuration
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration before logging so its level can seed the filter
    let config_path = cli.config.unwrap_or_else(MotionConfig::config_path);
    let config = MotionConfig::load_from(&config_path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Simulate {
            scenario,
            fps,
            json,
            realtime,
        } => commands::simulate::run(&config, &scenario, fps, json, realtime).await,
        Commands::Easing { name, samples } => commands::easing::run(&name, samples),
        Commands::Config { init } => commands::config::run(&config, &config_path, init),
    }
}
