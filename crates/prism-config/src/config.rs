//! Shading configuration persisted as `config.ron`.
//!
//! Every section falls back to its defaults field by field, so older or
//! partial files keep loading.

use std::path::{Path, PathBuf};

use prism_lighting::LightingModel;
use prism_materials::MIN_TILE_EXTENT;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Everything the shading core and the preview read at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Texture atlas geometry.
    pub atlas: AtlasSettings,
    /// Lighting evaluator settings.
    pub lighting: LightingSettings,
    /// Per-frame light and view descriptor used by the preview.
    pub frame: FrameSettings,
    /// Preview output settings.
    pub output: OutputSettings,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Texture atlas configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtlasSettings {
    /// Width of every atlas layer in texels. Must exceed 4.
    pub tile_width: u32,
    /// Height of every atlas layer in texels. Must exceed 4.
    pub tile_height: u32,
}

/// Lighting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingSettings {
    /// Forces every material onto one evaluator. `None` honours each material's flag.
    pub model_override: Option<LightingModel>,
    /// Scalar intensity of the single point light.
    pub light_intensity: f32,
    /// Constant ambient factor of the physically-based evaluator.
    pub ambient_strength: f32,
}

/// Light/frame descriptor values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FrameSettings {
    /// World-space camera position.
    pub view_pos: [f32; 3],
    /// World-space light position.
    pub light_pos: [f32; 3],
    /// Connected-texture directions (4-bit mask: 0x3 horizontal, 0xC vertical).
    pub connected_directions: u8,
}

/// Preview image output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Destination PNG path.
    pub path: PathBuf,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for AtlasSettings {
    fn default() -> Self {
        Self {
            tile_width: 16,
            tile_height: 16,
        }
    }
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            model_override: None,
            light_intensity: 1.0,
            ambient_strength: 0.03,
        }
    }
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            view_pos: [0.0, 0.0, 3.0],
            light_pos: [2.0, 4.0, 3.0],
            connected_directions: 0,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            width: 512,
            height: 128,
            path: PathBuf::from("prism-preview.png"),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Persistence ---

impl Config {
    /// Per-user configuration directory (`<config_dir>/prism`).
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|d| d.join("prism"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Path of the config file inside `config_dir`.
    pub fn file_path(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE)
    }

    /// Reads `config.ron` from `config_dir`, writing the defaults there first
    /// when the file is missing.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::file_path(config_dir);
        if !path.exists() {
            let config = Self::default();
            config.save(config_dir)?;
            log::info!("wrote default shading config to {}", path.display());
            return Ok(config);
        }
        let config = Self::read(&path)?;
        log::info!("shading config loaded from {}", path.display());
        Ok(config)
    }

    /// Writes `config.ron` into `config_dir`, creating the directory.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let path = Self::file_path(config_dir);
        let write_err = |source| ConfigError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_err)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let text = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Encode)?;
        std::fs::write(&path, text).map_err(write_err)
    }

    /// Re-reads the file; `Some` only when it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read(&Self::file_path(config_dir))?;
        if fresh == *self {
            return Ok(None);
        }
        log::info!("shading config changed on disk");
        Ok(Some(fresh))
    }

    /// Rejects values the shading core refuses at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let AtlasSettings {
            tile_width,
            tile_height,
        } = self.atlas;
        if tile_width.min(tile_height) < MIN_TILE_EXTENT {
            return Err(ConfigError::Invalid {
                field: "atlas",
                reason: format!("tile {tile_width}x{tile_height} is below {MIN_TILE_EXTENT} texels"),
            });
        }
        if self.frame.connected_directions > 0xF {
            return Err(ConfigError::Invalid {
                field: "frame.connected_directions",
                reason: format!("{:#x} uses bits above 0xF", self.frame.connected_directions),
            });
        }
        if self.output.width == 0 || self.output.height == 0 {
            return Err(ConfigError::Invalid {
                field: "output",
                reason: format!("{}x{} image is empty", self.output.width, self.output.height),
            });
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lighting_defaults() {
        let lighting = LightingSettings::default();
        assert_eq!(lighting.light_intensity, 1.0);
        assert!((lighting.ambient_strength - 0.03).abs() < 1e-6);
        assert_eq!(lighting.model_override, None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = ron::from_str("(atlas: (tile_width: 32), output: (height: 64))").unwrap();
        assert_eq!((config.atlas.tile_width, config.atlas.tile_height), (32, 16));
        assert_eq!((config.output.width, config.output.height), (512, 64));
        assert_eq!(config.frame, FrameSettings::default());
    }

    #[test]
    fn test_unknown_keys_tolerated() {
        assert!(ron::from_str::<Config>("(renderer: (msaa: 4))").is_ok());
    }

    #[test]
    fn test_override_mode_parses_snake_case() {
        let config: Config = ron::from_str("(lighting: (model_override: Some(legacy)))").unwrap();
        assert_eq!(config.lighting.model_override, Some(LightingModel::Legacy));
    }

    #[test]
    fn test_first_load_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(Config::file_path(dir.path()).is_file());
    }

    #[test]
    fn test_saved_values_survive_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.frame.light_pos = [0.0, 10.0, 0.0];
        config.lighting.model_override = Some(LightingModel::Pbr);
        config.save(dir.path()).unwrap();
        assert_eq!(Config::load_or_create(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_reload_reports_only_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());

        let mut edited = config.clone();
        edited.frame.connected_directions = 0xC;
        edited.save(dir.path()).unwrap();
        let changed = config.reload(dir.path()).unwrap().unwrap();
        assert_eq!(changed.frame.connected_directions, 0xC);
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Config::file_path(dir.path()), "(atlas: [").unwrap();
        match Config::load_or_create(dir.path()) {
            Err(ConfigError::Parse { path, .. }) => assert!(path.ends_with("config.ron")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_reload_without_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::default().reload(dir.path()),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_validate_bounds() {
        assert!(Config::default().validate().is_ok());

        let mut small_tile = Config::default();
        small_tile.atlas.tile_height = 4;
        assert!(matches!(
            small_tile.validate(),
            Err(ConfigError::Invalid { field: "atlas", .. })
        ));

        let mut wide_mask = Config::default();
        wide_mask.frame.connected_directions = 0x10;
        assert!(wide_mask.validate().is_err());

        let mut empty = Config::default();
        empty.output.width = 0;
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_tile_bound_agrees_with_atlas() {
        for extent in [MIN_TILE_EXTENT - 1, MIN_TILE_EXTENT, 16] {
            let mut config = Config::default();
            config.atlas.tile_width = extent;
            let atlas = prism_materials::AtlasConfig {
                tile_width: extent,
                tile_height: config.atlas.tile_height,
                layer_count: 1,
            };
            assert_eq!(
                config.validate().is_ok(),
                atlas.validate().is_ok(),
                "tile width {extent}"
            );
        }
    }
}
