//! Atlas sampler: flattened layer addressing with explicit bounds checks.

use glam::{UVec2, Vec2, Vec4};
use prism_materials::{LAYERS_PER_BLOCK, TextureArrayAtlas, layer_index};

use crate::error::ShadingError;

/// A layered texture the fragment stage can sample.
pub trait LayerSource {
    /// Pixel dimensions shared by every layer.
    fn tile_size(&self) -> UVec2;

    /// Number of layers.
    fn layer_count(&self) -> u32;

    /// Sample `layer` at normalized `uv`. Returns `None` for a missing layer.
    fn texel(&self, uv: Vec2, layer: u32) -> Option<Vec4>;
}

impl LayerSource for TextureArrayAtlas {
    fn tile_size(&self) -> UVec2 {
        UVec2::new(self.tile_width(), self.tile_height())
    }

    fn layer_count(&self) -> u32 {
        TextureArrayAtlas::layer_count(self)
    }

    fn texel(&self, uv: Vec2, layer: u32) -> Option<Vec4> {
        self.sample_nearest(uv, layer).ok()
    }
}

/// Layer index `block_id * 16 + variant_id`, checked against `layer_count`.
///
/// # Errors
///
/// - [`ShadingError::InvalidPackedField`] if `variant_id` is 16 or more.
/// - [`ShadingError::AtlasIndexOutOfRange`] if the index does not address
///   an existing layer.
pub fn atlas_layer_index(block_id: u32, variant_id: u16, layer_count: u32) -> Result<u32, ShadingError> {
    if u32::from(variant_id) >= LAYERS_PER_BLOCK {
        return Err(ShadingError::InvalidPackedField {
            field: "variant_id",
            value: u32::from(variant_id),
        });
    }
    layer_index(block_id, variant_id)
        .filter(|&layer| layer < layer_count)
        .ok_or(ShadingError::AtlasIndexOutOfRange {
            index: u64::from(block_id) * u64::from(LAYERS_PER_BLOCK) + u64::from(variant_id),
            layer_count,
        })
}

/// Sample the atlas layer of `(block_id, variant_id)` at `uv`.
pub fn sample_atlas<S: LayerSource + ?Sized>(
    source: &S,
    uv: Vec2,
    block_id: u32,
    variant_id: u16,
) -> Result<Vec4, ShadingError> {
    let layer_count = source.layer_count();
    let layer = atlas_layer_index(block_id, variant_id, layer_count)?;
    source
        .texel(uv, layer)
        .ok_or(ShadingError::AtlasIndexOutOfRange {
            index: u64::from(layer),
            layer_count,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_materials::{AtlasBuilder, AtlasConfig};

    /// Layer `i` is a flat colour with red = i / 255.
    struct IndexedLayers {
        count: u32,
    }

    impl LayerSource for IndexedLayers {
        fn tile_size(&self) -> UVec2 {
            UVec2::splat(16)
        }

        fn layer_count(&self) -> u32 {
            self.count
        }

        fn texel(&self, _uv: Vec2, layer: u32) -> Option<Vec4> {
            (layer < self.count).then(|| Vec4::new(layer as f32 / 255.0, 0.0, 0.0, 1.0))
        }
    }

    #[test]
    fn test_reference_index() {
        assert_eq!(atlas_layer_index(3, 5, 64), Ok(53));
    }

    #[test]
    fn test_index_bounded_by_block_count() {
        let blocks = 4;
        let count = blocks * LAYERS_PER_BLOCK;
        for block in 0..blocks {
            for variant in 0..16u16 {
                let idx = atlas_layer_index(block, variant, count).unwrap();
                assert!(idx < count);
            }
        }
        assert!(atlas_layer_index(blocks, 0, count).is_err());
    }

    #[test]
    fn test_out_of_range_layer_reported() {
        assert_eq!(
            atlas_layer_index(4, 1, 64),
            Err(ShadingError::AtlasIndexOutOfRange {
                index: 65,
                layer_count: 64
            })
        );
    }

    #[test]
    fn test_overflowing_index_reported_widened() {
        let err = atlas_layer_index(u32::MAX, 15, u32::MAX).unwrap_err();
        assert_eq!(
            err,
            ShadingError::AtlasIndexOutOfRange {
                index: u64::from(u32::MAX) * 16 + 15,
                layer_count: u32::MAX
            }
        );
    }

    #[test]
    fn test_variant_beyond_block_range_is_invalid_field() {
        assert_eq!(
            atlas_layer_index(0, 16, 1024),
            Err(ShadingError::InvalidPackedField {
                field: "variant_id",
                value: 16
            })
        );
    }

    #[test]
    fn test_sample_selects_flattened_layer() {
        let layers = IndexedLayers { count: 64 };
        let c = sample_atlas(&layers, Vec2::splat(0.5), 3, 5).unwrap();
        assert!((c.x * 255.0 - 53.0).abs() < 1e-3);
    }

    #[test]
    fn test_texture_array_atlas_is_a_layer_source() {
        let mut builder = AtlasBuilder::new(AtlasConfig {
            tile_width: 8,
            tile_height: 8,
            layer_count: 32,
        })
        .unwrap();
        builder.fill_layer(17, [0, 255, 0, 255]).unwrap();
        let atlas = builder.build();

        assert_eq!(atlas.tile_size(), UVec2::new(8, 8));
        let c = sample_atlas(&atlas, Vec2::splat(0.5), 1, 1).unwrap();
        assert_eq!(c, Vec4::new(0.0, 1.0, 0.0, 1.0));
        assert!(sample_atlas(&atlas, Vec2::ZERO, 2, 0).is_err());
    }
}
