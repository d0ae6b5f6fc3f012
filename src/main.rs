// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "simplesnap")]
#[command(about = "Minimal camera: take photos and record videos into the media library")]
#[command(version)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Simulate missing camera and microphone permissions
    #[arg(long, global = true)]
    deny_permissions: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a photo
    Photo,

    /// Record a video
    Video {
        /// Recording duration in seconds (Ctrl+C stops early)
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },

    /// List saved photos and videos
    Gallery {
        /// Open the media directory in the system viewer
        #[arg(short, long)]
        open: bool,
    },

    /// Interactive camera screen (default)
    Shell,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=simplesnap=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let session = cli::Session::open(cli.config.as_deref(), !cli.deny_permissions)?;

    match cli.command {
        Some(Commands::Photo) => session.take_photo(),
        Some(Commands::Video { duration }) => session.record_video(duration),
        Some(Commands::Gallery { open }) => session.gallery(open),
        Some(Commands::Shell) | None => session.shell(),
    }
}
