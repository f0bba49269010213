//! Preview scene assembly: atlas construction, frame setup, and the band
//! rasterizer that feeds the CPU shading pipeline.

use std::path::Path;

use glam::{Mat4, Vec2, Vec3};
use prism_config::Config;
use prism_lighting::LightParams;
use prism_materials::{
    AtlasBuilder, AtlasConfig, AtlasError, LibraryError, MaterialLibrary, TextureArrayAtlas,
    layer_index,
};
use prism_shading::{
    ConnectedDirections, FACING_VIEWER, FrameContext, FrameTransform, LightFrame, ShadingError,
    SurfaceVertex, VariantData, VertexOutput, interpolate_fragment, shade_batch, to_rgba8,
};
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced by the preview binary.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("config error: {0}")]
    Config(#[from] prism_config::ConfigError),

    #[error("material library error: {0}")]
    Library(#[from] LibraryError),

    #[error("atlas error: {0}")]
    Atlas(#[from] AtlasError),

    #[error("shading error: {0}")]
    Shading(#[from] ShadingError),

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),

    #[error("material library is empty")]
    EmptyLibrary,

    #[error("output size {width}x{height} is empty")]
    EmptyOutput { width: u32, height: u32 },
}

// ---------------------------------------------------------------------------
// Atlas
// ---------------------------------------------------------------------------

/// Procedural greyscale tile: a dark one-texel frame, a bright interior, and
/// diagonal stripes whose period depends on the variant.
pub fn procedural_tile(width: u32, height: u32, variant_id: u16) -> image::RgbaImage {
    let period = u32::from(variant_id) + 3;
    image::RgbaImage::from_fn(width, height, |x, y| {
        let edge = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
        let level = if edge {
            150
        } else if (x + y).is_multiple_of(period) {
            205
        } else {
            255
        };
        image::Rgba([level, level, level, 255])
    })
}

/// Builds an atlas holding one layer per library appearance.
///
/// Appearances with a texture path load it relative to `texture_root`;
/// the rest get a [`procedural_tile`].
pub fn build_atlas(
    library: &MaterialLibrary,
    config: &Config,
    texture_root: &Path,
) -> Result<TextureArrayAtlas, PreviewError> {
    let max_block_id = library.max_block_id().ok_or(PreviewError::EmptyLibrary)?;
    let atlas_config =
        AtlasConfig::for_blocks(config.atlas.tile_width, config.atlas.tile_height, max_block_id)?;
    let mut builder = AtlasBuilder::new(atlas_config)?;

    for (block_id, variant_id) in library.appearances() {
        match library.texture_for(block_id, variant_id) {
            Some(texture) => {
                let layer = layer_index(block_id, variant_id).ok_or(AtlasError::LayerOutOfRange {
                    layer: u32::MAX,
                    layer_count: atlas_config.layer_count,
                })?;
                builder.set_layer_from_path(layer, &texture_root.join(texture))?;
            }
            None => {
                let tile = procedural_tile(atlas_config.tile_width, atlas_config.tile_height, variant_id);
                builder.set_block_layer(block_id, variant_id, &tile)?;
            }
        }
    }

    let atlas = builder.build();
    atlas.validate_for(max_block_id)?;
    Ok(atlas)
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Frame descriptor from config: camera at `view_pos` looking at the origin
/// through an orthographic projection covering the unit quad.
pub fn frame_from_config(config: &Config, version: u64) -> Result<FrameContext, PreviewError> {
    let view_pos = Vec3::from_array(config.frame.view_pos);
    let light = LightFrame {
        view_pos,
        light_pos: Vec3::from_array(config.frame.light_pos),
        time: 0.0,
        connected: ConnectedDirections::from_bits(u32::from(config.frame.connected_directions))?,
        light: LightParams {
            intensity: config.lighting.light_intensity,
            ambient: config.lighting.ambient_strength,
        },
    };
    let transform = FrameTransform {
        model: Mat4::IDENTITY,
        view: Mat4::look_at_rh(view_pos, Vec3::ZERO, Vec3::Y),
        projection: Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.1, 100.0),
    };
    Ok(FrameContext::new(version, transform, light)?)
}

// ---------------------------------------------------------------------------
// Rasterization
// ---------------------------------------------------------------------------

/// Horizontal pixel range `[start, end)` of band `index` out of `count`.
pub fn band_range(width: u32, index: usize, count: usize) -> (u32, u32) {
    let w = u64::from(width);
    let start = w * index as u64 / count as u64;
    let end = w * (index as u64 + 1) / count as u64;
    (start as u32, end as u32)
}

/// Quad for one band as two triangles sharing the top-left corner.
///
/// Corners run top-left, top-right, bottom-right, bottom-left with tile
/// coordinates `(0,0)`, `(1,0)`, `(1,1)`, `(0,1)`.
fn band_quad(x0: f32, x1: f32, block_id: u32, variant: VariantData) -> [[SurfaceVertex; 3]; 2] {
    let corner = |x: f32, y: f32, u: f32, v: f32| {
        SurfaceVertex::new(Vec3::new(x, y, 0.0), FACING_VIEWER, Vec2::new(u, v), block_id, variant)
    };
    let tl = corner(x0, 1.0, 0.0, 0.0);
    let tr = corner(x1, 1.0, 1.0, 0.0);
    let br = corner(x1, -1.0, 1.0, 1.0);
    let bl = corner(x0, -1.0, 0.0, 1.0);
    [[tl, tr, br], [tl, br, bl]]
}

/// Triangle and barycentric weights for quad-local `(s, t)`, both in `[0, 1]`.
pub fn quad_weights(s: f32, t: f32) -> (usize, Vec3) {
    if s >= t {
        (0, Vec3::new(1.0 - s, s - t, t))
    } else {
        (1, Vec3::new(1.0 - t, s, t - s))
    }
}

/// Shades every library appearance into its own column band.
pub fn render_preview(
    library: &MaterialLibrary,
    atlas: &TextureArrayAtlas,
    frame: &FrameContext,
    config: &Config,
) -> Result<image::RgbaImage, PreviewError> {
    let (width, height) = (config.output.width, config.output.height);
    if width == 0 || height == 0 {
        return Err(PreviewError::EmptyOutput { width, height });
    }
    let appearances = library.appearances();
    if appearances.is_empty() {
        return Err(PreviewError::EmptyLibrary);
    }
    let forced = config.lighting.model_override;
    let prepared = frame.prepared();
    let mut img = image::RgbaImage::new(width, height);

    for (index, &(block_id, variant_id)) in appearances.iter().enumerate() {
        let (px0, px1) = band_range(width, index, appearances.len());
        if px0 == px1 {
            debug!(block_id, variant_id, "band narrower than a pixel, skipped");
            continue;
        }

        let mut material = library.descriptor(block_id, variant_id)?;
        if let Some(model) = forced {
            material = material.with_lighting(model);
        }

        let x0 = -1.0 + 2.0 * px0 as f32 / width as f32;
        let x1 = -1.0 + 2.0 * px1 as f32 / width as f32;
        let triangles = band_quad(x0, x1, block_id, VariantData::new(variant_id, Default::default()))
            .map(|tri| tri.map(|v| prepared.transform_vertex(&v)));

        let band_width = px1 - px0;
        let mut fragments = Vec::with_capacity(band_width as usize * height as usize);
        for py in 0..height {
            let t = (py as f32 + 0.5) / height as f32;
            for px in 0..band_width {
                let s = (px as f32 + 0.5) / band_width as f32;
                let (tri, weights) = quad_weights(s, t);
                let triangle: &[VertexOutput; 3] = &triangles[tri];
                fragments.push(interpolate_fragment(triangle, weights));
            }
        }

        let colors = shade_batch(frame, &material, atlas, &fragments)?;
        for (i, color) in colors.into_iter().enumerate() {
            let x = px0 + i as u32 % band_width;
            let y = i as u32 / band_width;
            img.put_pixel(x, y, image::Rgba(to_rgba8(color)));
        }
        debug!(block_id, variant_id, px0, px1, "band shaded");
    }

    info!(width, height, bands = appearances.len(), "preview rendered");
    Ok(img)
}
