// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use framebooth::backends::camera::types::CameraFacing;
use framebooth::config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "framebooth")]
#[command(about = "Photo booth camera widget with decorative frame overlays")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras and overlay frames
    List,

    /// Take a single overlaid photo without the interactive widget
    Capture {
        /// Camera facing to use
        #[arg(short, long, value_enum, default_value = "front")]
        facing: FacingArg,

        /// Overlay frame id (see 'framebooth list'; default: first entry)
        #[arg(long, conflicts_with = "no_overlay")]
        overlay: Option<String>,

        /// Capture without any overlay layer
        #[arg(long)]
        no_overlay: bool,

        /// Explicit device path (e.g. /dev/video0, or stub://demo)
        #[arg(long)]
        device: Option<String>,

        /// Output file or directory (default: the configured save directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FacingArg {
    Front,
    Back,
}

impl From<FacingArg> for CameraFacing {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Front => CameraFacing::Front,
            FacingArg::Back => CameraFacing::Back,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=framebooth=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Capture {
            facing,
            overlay,
            no_overlay,
            device,
            output,
        }) => cli::capture_photo(facing.into(), overlay, no_overlay, device, output),
        None => framebooth::ui::run(config::load()),
    }
}
