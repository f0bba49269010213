//! Fragment stage on the CPU: variant decode, connected UVs, material blend,
//! atlas sample, and lighting, in that order.

use std::sync::atomic::{AtomicBool, Ordering};

use glam::{Vec3, Vec4};
use prism_lighting::{Radiance, ShadingGeometry};
use prism_materials::{MaterialDescriptor, blend_material};
use tracing::debug;

use crate::error::ShadingError;
use crate::frame::FrameContext;
use crate::sampler::{LayerSource, sample_atlas};
use crate::transform::Fragment;
use crate::uv::resolve_connected_uv;
use crate::variant::VariantData;

/// Result of shading one fragment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadedFragment {
    /// Final linear RGBA; alpha is the sampled texture alpha.
    pub color: Vec4,
    /// Lighting terms before modulation by the texture.
    pub radiance: Radiance,
}

/// Shade one fragment.
///
/// Pure with respect to its inputs: nothing is written to the frame, the
/// material, or the atlas. `material` is not part of the frame version; it
/// is borrowed for the whole call, so it cannot change under a fragment.
pub fn shade_fragment<S: LayerSource + ?Sized>(
    frame: &FrameContext,
    material: &MaterialDescriptor,
    atlas: &S,
    fragment: &Fragment,
) -> Result<ShadedFragment, ShadingError> {
    let light = frame.light();

    // Facing bits are decoded with the id but have no consumer yet.
    let variant = VariantData::unpack(fragment.variant_data);

    let uv = resolve_connected_uv(fragment.tex_coord, light.connected, atlas.tile_size())?;
    let surface = blend_material(material);
    let texel = sample_atlas(atlas, uv, fragment.block_id, variant.variant_id)?;

    let geometry = ShadingGeometry::from_positions(
        fragment.world_normal,
        fragment.world_position,
        light.view_pos,
        light.light_pos,
    );
    let radiance = material.lighting.evaluate(&geometry, &surface, &light.light);

    Ok(ShadedFragment {
        color: (radiance.total() * texel.truncate()).extend(texel.w),
        radiance,
    })
}

/// Shade `fragments` in parallel, returning colours in input order.
///
/// Work is split into contiguous chunks across up to `num_cpus` scoped
/// threads. The first failure stops the remaining workers and is returned.
pub fn shade_batch<S: LayerSource + Sync + ?Sized>(
    frame: &FrameContext,
    material: &MaterialDescriptor,
    atlas: &S,
    fragments: &[Fragment],
) -> Result<Vec<Vec4>, ShadingError> {
    if fragments.is_empty() {
        return Ok(Vec::new());
    }

    let workers = num_cpus::get().clamp(1, fragments.len());
    let chunk_len = fragments.len().div_ceil(workers);
    let failed = AtomicBool::new(false);
    debug!(
        fragments = fragments.len(),
        workers,
        frame = frame.version(),
        "shading batch"
    );

    let results: Vec<Option<Result<Vec<Vec4>, ShadingError>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = fragments
            .chunks(chunk_len)
            .map(|chunk| {
                let failed = &failed;
                scope.spawn(move || shade_chunk(frame, material, atlas, chunk, failed))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    let mut colors = Vec::with_capacity(fragments.len());
    let mut first_error = None;
    for result in results.into_iter().flatten() {
        match result {
            Ok(chunk) => colors.extend(chunk),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(colors),
    }
}

/// `None` when the chunk stopped early because another chunk failed.
fn shade_chunk<S: LayerSource + ?Sized>(
    frame: &FrameContext,
    material: &MaterialDescriptor,
    atlas: &S,
    chunk: &[Fragment],
    failed: &AtomicBool,
) -> Option<Result<Vec<Vec4>, ShadingError>> {
    let mut out = Vec::with_capacity(chunk.len());
    for fragment in chunk {
        if failed.load(Ordering::Relaxed) {
            return None;
        }
        match shade_fragment(frame, material, atlas, fragment) {
            Ok(shaded) => out.push(shaded.color),
            Err(e) => {
                failed.store(true, Ordering::Relaxed);
                return Some(Err(e));
            }
        }
    }
    Some(Ok(out))
}

/// Linear colour to 8-bit RGBA, clamping each channel.
pub fn to_rgba8(color: Vec4) -> [u8; 4] {
    let c = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
}

/// Unit normal facing `+Z`, the default orientation of preview quads.
pub const FACING_VIEWER: Vec3 = Vec3::Z;
