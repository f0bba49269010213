//! Command-line argument parsing for the prism preview.

use std::path::PathBuf;

use clap::Parser;
use prism_lighting::LightingModel;

use crate::Config;

/// Prism command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "prism-preview", about = "Shade voxel block materials to a PNG")]
pub struct CliArgs {
    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// RON material library. The built-in library is used when omitted.
    #[arg(long)]
    pub materials: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Force one lighting evaluator for every material (`pbr` or `legacy`).
    #[arg(long)]
    pub lighting: Option<LightingModel>,

    /// Connected-texture direction mask (0..=15).
    #[arg(long)]
    pub connected: Option<u8>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref path) = args.output {
            self.output.path = path.clone();
        }
        if let Some(w) = args.width {
            self.output.width = w;
        }
        if let Some(h) = args.height {
            self.output.height = h;
        }
        if let Some(mode) = args.lighting {
            self.lighting.model_override = Some(mode);
        }
        if let Some(mask) = args.connected {
            self.frame.connected_directions = mask;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
