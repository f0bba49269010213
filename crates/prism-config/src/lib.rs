//! Startup settings for prism: atlas tile size, lighting, the preview frame
//! and output image. Loaded from `config.ron`, then patched by [`CliArgs`].

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AtlasSettings, Config, DebugConfig, FrameSettings, LightingSettings, OutputSettings,
};
pub use error::ConfigError;
