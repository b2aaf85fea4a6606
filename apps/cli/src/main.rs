mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use raumfeld_core::{DiscoveryConfig, SeekUnit};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "raumfeld")]
#[command(author, version, about = "Discover and control Raumfeld zones", long_about = None)]
struct Args {
    /// Config file (defaults to <config dir>/raumfeld/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seconds of silence that end a search round
    #[arg(long, global = true)]
    timeout: Option<f64>,

    /// Number of search rounds
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// Print machine readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

/// How the target device is found
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Target {
    /// Case-insensitive part of the device's friendly name
    #[arg(long)]
    pub device: Option<String>,

    /// Description URL of the device; skips discovery
    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List discovered devices
    Discover,
    /// Show transport state, volume, mute and position
    Status {
        #[command(flatten)]
        target: Target,
    },
    /// Show or set the volume (0-100)
    Volume {
        #[command(flatten)]
        target: Target,
        #[arg(value_parser = clap::value_parser!(u16).range(0..=100))]
        level: Option<u16>,
    },
    /// Show or set the mute state
    Mute {
        #[command(flatten)]
        target: Target,
        #[arg(value_parser = ["on", "off"])]
        state: Option<String>,
    },
    /// Resume playback, or play URI
    Play {
        #[command(flatten)]
        target: Target,
        uri: Option<String>,
        /// DIDL-Lite metadata sent along with URI
        #[arg(long, requires = "uri")]
        metadata: Option<String>,
    },
    Pause {
        #[command(flatten)]
        target: Target,
    },
    Stop {
        #[command(flatten)]
        target: Target,
    },
    Next {
        #[command(flatten)]
        target: Target,
    },
    Previous {
        #[command(flatten)]
        target: Target,
    },
    /// Seek within the current media
    Seek {
        #[command(flatten)]
        target: Target,
        /// H:MM:SS for time units, a track number for track-nr
        target_position: String,
        /// abs-time, rel-time or track-nr
        #[arg(long, default_value = "abs-time")]
        unit: SeekUnit,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose { "info,raumfeld=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&args)?;
    let out = commands::Output { json: args.json };

    match args.command.unwrap_or(Command::Discover) {
        Command::Discover => commands::discover(&config, out).await,
        Command::Status { target } => commands::status(&config, &target, out).await,
        Command::Volume { target, level } => commands::volume(&config, &target, level, out).await,
        Command::Mute { target, state } => {
            let muted = state.map(|s| s == "on");
            commands::mute(&config, &target, muted, out).await
        }
        Command::Play { target, uri, metadata } => {
            commands::play(&config, &target, uri.as_deref(), metadata.as_deref()).await
        }
        Command::Pause { target } => commands::pause(&config, &target).await,
        Command::Stop { target } => commands::stop(&config, &target).await,
        Command::Next { target } => commands::next(&config, &target).await,
        Command::Previous { target } => commands::previous(&config, &target).await,
        Command::Seek {
            target,
            target_position,
            unit,
        } => commands::seek(&config, &target, &target_position, unit).await,
    }
}

/// Load the config file and apply command line overrides
fn load_config(args: &Args) -> Result<DiscoveryConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };

    let mut config = DiscoveryConfig::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if let Some(secs) = args.timeout {
        config.timeout = Duration::try_from_secs_f64(secs)
            .with_context(|| format!("Invalid --timeout value: {}", secs))?;
    }
    if let Some(retries) = args.retries {
        config.retries = retries;
    }

    Ok(config)
}

/// Get the config file path (platform-specific)
fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Failed to get config directory"))?
        .join("raumfeld");

    Ok(config_dir.join("config.toml"))
}
