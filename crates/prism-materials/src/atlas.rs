//! Layered texture atlas: one tile-sized RGBA image per layer, addressed by a
//! layer index computed from block id and variant id.
//!
//! The CPU sampler uses nearest filtering with clamp-to-edge addressing, the
//! same state the GPU path binds for its `Rgba8Unorm` texture array. Colour
//! values are converted to `[0, 1]` by dividing by 255, with no gamma step.

use std::path::Path;

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Number of atlas layers reserved for each block id (one per variant).
pub const LAYERS_PER_BLOCK: u32 = 16;

/// Upper bound on `AtlasConfig::layer_count`. Layers are allocated up front,
/// so this keeps a stray block id from requesting gigabytes of placeholder.
pub const MAX_ATLAS_LAYERS: u32 = 1 << 16;

/// Largest block id whose variants all fit under [`MAX_ATLAS_LAYERS`].
pub const MAX_BLOCK_ID: u32 = MAX_ATLAS_LAYERS / LAYERS_PER_BLOCK - 1;

/// Smallest tile extent, in texels, that leaves room for the 2-texel
/// connected-texture margin on both sides.
pub const MIN_TILE_EXTENT: u32 = 5;

/// Side length of one square of the placeholder checker, in texels.
const CHECKER_CELL: u32 = 4;
const CHECKER_A: [u8; 4] = [255, 0, 255, 255];
const CHECKER_B: [u8; 4] = [0, 0, 0, 255];

/// Flattened layer index `block_id * 16 + variant_id`.
///
/// Returns `None` if `variant_id` does not fit in one block's layer range or
/// the product overflows `u32`.
pub fn layer_index(block_id: u32, variant_id: u16) -> Option<u32> {
    let variant_id = u32::from(variant_id);
    if variant_id >= LAYERS_PER_BLOCK {
        return None;
    }
    block_id.checked_mul(LAYERS_PER_BLOCK)?.checked_add(variant_id)
}

/// Layers needed to hold every variant of blocks `0..=max_block_id`.
pub fn layers_for_blocks(max_block_id: u32) -> Option<u32> {
    max_block_id.checked_add(1)?.checked_mul(LAYERS_PER_BLOCK)
}

// ---------------------------------------------------------------------------
// AtlasError
// ---------------------------------------------------------------------------

/// Errors returned during atlas construction and sampling.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// Failed to load or decode an image file.
    #[error("image load error: {0}")]
    ImageLoad(#[from] image::ImageError),

    /// Configuration validation error.
    #[error("invalid atlas config: {0}")]
    InvalidConfig(String),

    /// Tile dimensions too small for the connected-texture margin.
    #[error("tile {width}x{height} is too small (each side must be at least 5 texels)")]
    TileTooSmall {
        /// Tile width in texels.
        width: u32,
        /// Tile height in texels.
        height: u32,
    },

    /// A layer index at or beyond the layer count.
    #[error("layer {layer} out of range (atlas has {layer_count} layers)")]
    LayerOutOfRange {
        /// Requested layer.
        layer: u32,
        /// Layers in the atlas.
        layer_count: u32,
    },

    /// The atlas cannot hold every variant of the largest block id in use.
    #[error("atlas has {layer_count} layers but {required} are required")]
    InsufficientLayers {
        /// Layers needed by the content.
        required: u32,
        /// Layers in the atlas.
        layer_count: u32,
    },
}

// ---------------------------------------------------------------------------
// AtlasConfig
// ---------------------------------------------------------------------------

/// Dimensions of a layered atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Width of every layer in texels.
    pub tile_width: u32,
    /// Height of every layer in texels.
    pub tile_height: u32,
    /// Number of layers in the array.
    pub layer_count: u32,
}

impl AtlasConfig {
    /// Config sized for every variant of blocks `0..=max_block_id`.
    pub fn for_blocks(tile_width: u32, tile_height: u32, max_block_id: u32) -> Result<Self, AtlasError> {
        let layer_count = layers_for_blocks(max_block_id).ok_or_else(|| {
            AtlasError::InvalidConfig(format!("block id {max_block_id} overflows the layer range"))
        })?;
        Ok(Self {
            tile_width,
            tile_height,
            layer_count,
        })
    }

    /// Bytes in one RGBA8 layer.
    pub fn layer_bytes(&self) -> usize {
        self.tile_width as usize * self.tile_height as usize * 4
    }

    /// Checks tile dimensions and layer count.
    pub fn validate(&self) -> Result<(), AtlasError> {
        if self.tile_width < MIN_TILE_EXTENT || self.tile_height < MIN_TILE_EXTENT {
            return Err(AtlasError::TileTooSmall {
                width: self.tile_width,
                height: self.tile_height,
            });
        }
        if self.layer_count == 0 {
            return Err(AtlasError::InvalidConfig(
                "layer_count must be at least 1".to_string(),
            ));
        }
        if self.layer_count > MAX_ATLAS_LAYERS {
            return Err(AtlasError::InvalidConfig(format!(
                "layer_count {} exceeds {MAX_ATLAS_LAYERS}",
                self.layer_count
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TextureArrayAtlas
// ---------------------------------------------------------------------------

/// An immutable layered atlas. Read-only once built.
#[derive(Clone, Debug)]
pub struct TextureArrayAtlas {
    config: AtlasConfig,
    layers: Vec<image::RgbaImage>,
}

impl TextureArrayAtlas {
    /// Layer width in texels.
    pub fn tile_width(&self) -> u32 {
        self.config.tile_width
    }

    /// Layer height in texels.
    pub fn tile_height(&self) -> u32 {
        self.config.tile_height
    }

    /// Number of layers.
    pub fn layer_count(&self) -> u32 {
        self.config.layer_count
    }

    /// The configuration the atlas was built with.
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// A single layer image.
    pub fn layer(&self, layer: u32) -> Option<&image::RgbaImage> {
        self.layers.get(layer as usize)
    }

    /// All layers in index order, e.g. for upload as a texture array.
    pub fn layers(&self) -> &[image::RgbaImage] {
        &self.layers
    }

    /// Nearest-texel sample at normalized `uv` with clamp-to-edge addressing.
    ///
    /// # Errors
    ///
    /// [`AtlasError::LayerOutOfRange`] if `layer >= layer_count`.
    pub fn sample_nearest(&self, uv: Vec2, layer: u32) -> Result<Vec4, AtlasError> {
        let image = self.layer(layer).ok_or(AtlasError::LayerOutOfRange {
            layer,
            layer_count: self.layer_count(),
        })?;
        let x = texel_coord(uv.x, image.width());
        let y = texel_coord(uv.y, image.height());
        let [r, g, b, a] = image.get_pixel(x, y).0;
        Ok(Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0)
    }

    /// Content validation: every variant of every block up to `max_block_id`
    /// must have a layer.
    pub fn validate_for(&self, max_block_id: u32) -> Result<(), AtlasError> {
        let required = layers_for_blocks(max_block_id).ok_or_else(|| {
            AtlasError::InvalidConfig(format!("block id {max_block_id} overflows the layer range"))
        })?;
        if self.layer_count() < required {
            return Err(AtlasError::InsufficientLayers {
                required,
                layer_count: self.layer_count(),
            });
        }
        Ok(())
    }
}

/// Map a normalized coordinate to a texel index in `0..extent`.
fn texel_coord(coord: f32, extent: u32) -> u32 {
    // NaN saturates to 0 through the cast.
    let texel = (coord * extent as f32).floor() as i64;
    texel.clamp(0, i64::from(extent) - 1) as u32
}

// ---------------------------------------------------------------------------
// AtlasBuilder
// ---------------------------------------------------------------------------

/// Builds a [`TextureArrayAtlas`] layer by layer.
///
/// Layers that are never written keep a magenta/black checker so missing
/// content is visible rather than silently black.
pub struct AtlasBuilder {
    config: AtlasConfig,
    layers: Vec<image::RgbaImage>,
    written: Vec<bool>,
}

impl AtlasBuilder {
    /// Creates a builder after validating `config`.
    pub fn new(config: AtlasConfig) -> Result<Self, AtlasError> {
        config.validate()?;
        let placeholder = checker(config.tile_width, config.tile_height);
        Ok(Self {
            layers: vec![placeholder; config.layer_count as usize],
            written: vec![false; config.layer_count as usize],
            config,
        })
    }

    /// Returns a reference to the atlas configuration.
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Number of layers explicitly written so far.
    pub fn written_layers(&self) -> usize {
        self.written.iter().filter(|w| **w).count()
    }

    /// Places an in-memory image at `layer`, resizing it to the tile size.
    pub fn set_layer_from_image(
        &mut self,
        layer: u32,
        img: &image::RgbaImage,
    ) -> Result<(), AtlasError> {
        let slot = self.slot(layer)?;
        let (w, h) = (self.config.tile_width, self.config.tile_height);
        self.layers[slot] = if img.width() != w || img.height() != h {
            image::imageops::resize(img, w, h, image::imageops::FilterType::Nearest)
        } else {
            img.clone()
        };
        self.written[slot] = true;
        debug!(layer, "atlas layer set from image");
        Ok(())
    }

    /// Loads an image file from disk into `layer`.
    pub fn set_layer_from_path(&mut self, layer: u32, path: &Path) -> Result<(), AtlasError> {
        // Reject the slot before decoding.
        self.slot(layer)?;
        let img = image::open(path)?.to_rgba8();
        self.set_layer_from_image(layer, &img)
    }

    /// Fills `layer` with a solid RGBA8 colour.
    pub fn fill_layer(&mut self, layer: u32, rgba: [u8; 4]) -> Result<(), AtlasError> {
        let slot = self.slot(layer)?;
        self.layers[slot] =
            image::RgbaImage::from_pixel(self.config.tile_width, self.config.tile_height, image::Rgba(rgba));
        self.written[slot] = true;
        Ok(())
    }

    /// Places `img` at the layer for `(block_id, variant_id)`; returns that layer.
    pub fn set_block_layer(
        &mut self,
        block_id: u32,
        variant_id: u16,
        img: &image::RgbaImage,
    ) -> Result<u32, AtlasError> {
        let layer = layer_index(block_id, variant_id).ok_or(AtlasError::LayerOutOfRange {
            layer: u32::MAX,
            layer_count: self.config.layer_count,
        })?;
        self.set_layer_from_image(layer, img)?;
        Ok(layer)
    }

    /// Finalizes the atlas.
    pub fn build(self) -> TextureArrayAtlas {
        info!(
            layers = self.config.layer_count,
            written = self.written_layers(),
            tile_width = self.config.tile_width,
            tile_height = self.config.tile_height,
            "texture array atlas built"
        );
        TextureArrayAtlas {
            config: self.config,
            layers: self.layers,
        }
    }

    fn slot(&self, layer: u32) -> Result<usize, AtlasError> {
        if layer >= self.config.layer_count {
            return Err(AtlasError::LayerOutOfRange {
                layer,
                layer_count: self.config.layer_count,
            });
        }
        Ok(layer as usize)
    }
}

fn checker(width: u32, height: u32) -> image::RgbaImage {
    image::RgbaImage::from_fn(width, height, |x, y| {
        if (x / CHECKER_CELL + y / CHECKER_CELL).is_multiple_of(2) {
            image::Rgba(CHECKER_A)
        } else {
            image::Rgba(CHECKER_B)
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config(layers: u32) -> AtlasConfig {
        AtlasConfig {
            tile_width: 16,
            tile_height: 16,
            layer_count: layers,
        }
    }

    #[test]
    fn test_layer_index_formula() {
        assert_eq!(layer_index(3, 5), Some(53));
        assert_eq!(layer_index(0, 0), Some(0));
        assert_eq!(layer_index(0, 15), Some(15));
        assert_eq!(layer_index(1, 0), Some(16));
    }

    #[test]
    fn test_layer_index_rejects_out_of_range() {
        assert_eq!(layer_index(0, 16), None);
        assert_eq!(layer_index(u32::MAX, 0), None);
    }

    #[test]
    fn test_layer_index_stays_below_block_bound() {
        let blocks = 8;
        for block in 0..blocks {
            for variant in 0..16u16 {
                let idx = layer_index(block, variant).unwrap();
                assert!(idx < blocks * LAYERS_PER_BLOCK);
            }
        }
    }

    #[test]
    fn test_layers_for_blocks() {
        assert_eq!(layers_for_blocks(0), Some(16));
        assert_eq!(layers_for_blocks(3), Some(64));
        assert_eq!(layers_for_blocks(u32::MAX), None);
    }

    #[test]
    fn test_config_validation() {
        assert!(config(1).validate().is_ok());
        assert!(matches!(
            AtlasConfig {
                tile_width: 4,
                tile_height: 16,
                layer_count: 1
            }
            .validate(),
            Err(AtlasError::TileTooSmall { width: 4, .. })
        ));
        assert!(matches!(config(0).validate(), Err(AtlasError::InvalidConfig(_))));
        assert!(AtlasBuilder::new(config(0)).is_err());
    }

    #[test]
    fn test_layer_count_capped_before_allocation() {
        assert!(config(MAX_ATLAS_LAYERS).validate().is_ok());
        assert!(matches!(
            config(MAX_ATLAS_LAYERS + 1).validate(),
            Err(AtlasError::InvalidConfig(_))
        ));
        // 100M blocks would be 1.6G layers; rejected without allocating.
        let cfg = AtlasConfig::for_blocks(16, 16, 100_000_000).unwrap();
        assert!(AtlasBuilder::new(cfg).is_err());

        let cfg = AtlasConfig::for_blocks(16, 16, MAX_BLOCK_ID).unwrap();
        assert_eq!(cfg.layer_count, MAX_ATLAS_LAYERS);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_for_blocks_sizes_layer_count() {
        let cfg = AtlasConfig::for_blocks(16, 16, 4).unwrap();
        assert_eq!(cfg.layer_count, 80);
        assert_eq!(cfg.layer_bytes(), 16 * 16 * 4);
    }

    #[test]
    fn test_sample_returns_normalized_colour() {
        let mut builder = AtlasBuilder::new(config(2)).unwrap();
        builder.fill_layer(1, [255, 0, 51, 128]).unwrap();
        let atlas = builder.build();
        let c = atlas.sample_nearest(Vec2::new(0.5, 0.5), 1).unwrap();
        assert!((c - Vec4::new(1.0, 0.0, 0.2, 128.0 / 255.0)).length() < 1e-6);
    }

    #[test]
    fn test_sample_is_nearest_and_clamped() {
        let mut img = image::RgbaImage::from_pixel(16, 16, image::Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        img.put_pixel(15, 15, image::Rgba([255, 0, 0, 255]));
        let mut builder = AtlasBuilder::new(config(1)).unwrap();
        builder.set_layer_from_image(0, &img).unwrap();
        let atlas = builder.build();

        // Inside texel (0, 0).
        assert_eq!(atlas.sample_nearest(Vec2::new(0.03, 0.03), 0).unwrap().x, 1.0);
        // Outside [0, 1] clamps to edge texels.
        assert_eq!(atlas.sample_nearest(Vec2::new(-3.0, -0.1), 0).unwrap().y, 1.0);
        let far = atlas.sample_nearest(Vec2::new(1.0, 7.0), 0).unwrap();
        assert_eq!((far.x, far.y), (1.0, 0.0));
        // Next texel over is black.
        assert_eq!(atlas.sample_nearest(Vec2::new(0.07, 0.03), 0).unwrap().x, 0.0);
    }

    #[test]
    fn test_sample_out_of_range_layer() {
        let atlas = AtlasBuilder::new(config(16)).unwrap().build();
        assert!(matches!(
            atlas.sample_nearest(Vec2::ZERO, 16),
            Err(AtlasError::LayerOutOfRange {
                layer: 16,
                layer_count: 16
            })
        ));
    }

    #[test]
    fn test_unwritten_layers_are_checkered() {
        let atlas = AtlasBuilder::new(config(1)).unwrap().build();
        let layer = atlas.layer(0).unwrap();
        assert_eq!(layer.get_pixel(0, 0).0, CHECKER_A);
        assert_eq!(layer.get_pixel(CHECKER_CELL, 0).0, CHECKER_B);
    }

    #[test]
    fn test_images_are_resized_to_tile() {
        let img = image::RgbaImage::from_pixel(64, 32, image::Rgba([10, 20, 30, 255]));
        let mut builder = AtlasBuilder::new(config(1)).unwrap();
        builder.set_layer_from_image(0, &img).unwrap();
        assert_eq!(builder.written_layers(), 1);
        let atlas = builder.build();
        let layer = atlas.layer(0).unwrap();
        assert_eq!((layer.width(), layer.height()), (16, 16));
        assert_eq!(layer.get_pixel(8, 8).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_set_block_layer_uses_flattened_index() {
        let mut builder = AtlasBuilder::new(config(64)).unwrap();
        let img = image::RgbaImage::from_pixel(16, 16, image::Rgba([1, 2, 3, 255]));
        assert_eq!(builder.set_block_layer(3, 5, &img).unwrap(), 53);
        assert!(matches!(
            builder.set_block_layer(4, 0, &img),
            Err(AtlasError::LayerOutOfRange { layer: 64, .. })
        ));
        assert!(builder.set_block_layer(0, 16, &img).is_err());
    }

    #[test]
    fn test_set_layer_from_path_round_trips_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        image::RgbaImage::from_pixel(16, 16, image::Rgba([0, 255, 0, 255]))
            .save(&path)
            .unwrap();

        let mut builder = AtlasBuilder::new(config(1)).unwrap();
        builder.set_layer_from_path(0, &path).unwrap();
        let atlas = builder.build();
        assert_eq!(atlas.sample_nearest(Vec2::splat(0.5), 0).unwrap().y, 1.0);
    }

    #[test]
    fn test_set_layer_from_missing_path_fails() {
        let mut builder = AtlasBuilder::new(config(1)).unwrap();
        let result = builder.set_layer_from_path(0, Path::new("/nonexistent/tile.png"));
        assert!(matches!(result, Err(AtlasError::ImageLoad(_))));
    }

    #[test]
    fn test_validate_for_block_range() {
        let atlas = AtlasBuilder::new(config(64)).unwrap().build();
        assert!(atlas.validate_for(3).is_ok());
        assert!(matches!(
            atlas.validate_for(4),
            Err(AtlasError::InsufficientLayers {
                required: 80,
                layer_count: 64
            })
        ));
    }
}
