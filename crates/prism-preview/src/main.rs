//! Prism preview: shades every block appearance of a material library into
//! a PNG strip using the CPU shading pipeline.

mod render;

use std::path::{Path, PathBuf};

use clap::Parser;
use prism_config::{CliArgs, Config};
use prism_materials::MaterialLibrary;
use prism_shading::FrameSlot;
use tracing::{error, info};

use crate::render::{PreviewError, build_atlas, frame_from_config, render_preview};

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = match args.config.clone().map_or_else(Config::default_dir, Ok) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{e}, using the working directory");
            PathBuf::from(".")
        }
    };

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    if let Err(e) = prism_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config)) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = run(&args, &config) {
        error!("preview failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: &CliArgs, config: &Config) -> Result<(), PreviewError> {
    config.validate()?;

    let (library, texture_root) = match &args.materials {
        Some(path) => (
            MaterialLibrary::from_ron(path)?,
            path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        ),
        None => (MaterialLibrary::builtin()?, PathBuf::from(".")),
    };
    info!(blocks = library.len(), "material library ready");

    let atlas = build_atlas(&library, config, &texture_root)?;

    let slot = FrameSlot::new();
    slot.publish(frame_from_config(config, 1)?)?;
    let frame = slot.snapshot()?;

    let img = render_preview(&library, &atlas, &frame, config)?;
    img.save(&config.output.path)?;
    info!(path = %config.output.path.display(), "preview written");
    Ok(())
}
