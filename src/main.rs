// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use picam::backends::camera::CameraBackendType;
use picam::config::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "picam")]
#[command(about = "Controller for the Raspberry Pi camera module")]
#[command(version)]
struct Cli {
    /// Config file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera backend: v4l2 or virtual
    #[arg(short, long)]
    backend: Option<CameraBackendType>,

    /// V4L2 device node
    #[arg(short, long)]
    device: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the setting registry
    Settings,

    /// Take a photo
    Photo {
        /// Output directory (default: the configured images directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seconds to wait before the capture
        #[arg(long, default_value = "0")]
        delay: u64,
    },

    /// Run the live preview and report the frame rate
    Preview {
        /// How long to run, in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,
    },

    /// List presets
    Presets {
        /// Presets directory (default: the configured one)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=picam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path),
        None => Config::default(),
    };
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(device) = args.device {
        config.device_path = device;
    }

    match args.command {
        Commands::Settings => cli::list_settings(),
        Commands::Photo { output, delay } => cli::take_photo(&config, output, delay),
        Commands::Preview { duration } => cli::run_preview(&config, duration),
        Commands::Presets { dir } => cli::list_presets(&config, dir),
    }
}
