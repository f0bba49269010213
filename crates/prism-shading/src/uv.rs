//! Connected-texture UV resolver.
//!
//! When a tile's texture continues into a same-type neighbour, sampling right
//! at the shared edge shows a seam. Coordinates within [`CONNECTED_MARGIN`]
//! texels of a connected edge are pushed inward by that margin; everything
//! else is returned untouched.

use glam::{UVec2, Vec2};
use prism_materials::MIN_TILE_EXTENT;

use crate::connectivity::ConnectedDirections;
use crate::error::ShadingError;

/// Width of the border region, in texels, and the distance it is nudged.
pub const CONNECTED_MARGIN: f32 = 2.0;

/// Adjust `uv` (normalized within one tile) for the frame's connectivity mask.
///
/// Horizontal bits act on `u`, vertical bits on `v`, independently. The two
/// edge checks of an axis run in sequence, so on the narrowest tiles a
/// coordinate pushed off the low edge can be pulled back by the high edge.
///
/// An empty mask returns `uv` unchanged whatever the tile size.
///
/// # Errors
///
/// [`ShadingError::TileTooSmall`] if a connected axis has an extent below
/// [`MIN_TILE_EXTENT`] texels.
pub fn resolve_connected_uv(
    uv: Vec2,
    connected: ConnectedDirections,
    tile: UVec2,
) -> Result<Vec2, ShadingError> {
    let horizontal = connected.intersects(ConnectedDirections::HORIZONTAL);
    let vertical = connected.intersects(ConnectedDirections::VERTICAL);
    if (horizontal && tile.x < MIN_TILE_EXTENT) || (vertical && tile.y < MIN_TILE_EXTENT) {
        return Err(ShadingError::TileTooSmall {
            width: tile.x,
            height: tile.y,
        });
    }

    Ok(Vec2::new(
        nudge_axis(uv.x, tile.x as f32, horizontal),
        nudge_axis(uv.y, tile.y as f32, vertical),
    ))
}

/// Returns `coord` bit-for-bit when nothing moves.
fn nudge_axis(coord: f32, extent: f32, connected: bool) -> f32 {
    if !connected {
        return coord;
    }

    let texel = coord * extent;
    let mut nudged = texel;
    if nudged < CONNECTED_MARGIN {
        nudged += CONNECTED_MARGIN;
    }
    if nudged > extent - CONNECTED_MARGIN {
        nudged -= CONNECTED_MARGIN;
    }

    if nudged == texel { coord } else { nudged / extent }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: UVec2 = UVec2::new(16, 16);

    fn texel(uv: Vec2) -> Vec2 {
        uv * TILE.as_vec2()
    }

    #[test]
    fn test_horizontal_nudge_reference() {
        let uv = Vec2::new(0.5 / 16.0, 0.5);
        let out = resolve_connected_uv(uv, ConnectedDirections::HORIZONTAL, TILE).unwrap();
        assert!((texel(out).x - 2.5).abs() < 1e-5, "got {}", texel(out).x);
        assert_eq!(out.y, uv.y);
    }

    #[test]
    fn test_high_edge_pulls_inward() {
        let uv = Vec2::new(15.5 / 16.0, 15.0 / 16.0);
        let out = resolve_connected_uv(uv, ConnectedDirections::ALL, TILE).unwrap();
        assert!((texel(out).x - 13.5).abs() < 1e-5);
        assert!((texel(out).y - 13.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_mask_is_identity() {
        for &uv in &[
            Vec2::ZERO,
            Vec2::ONE,
            Vec2::new(0.01, 0.99),
            Vec2::new(0.3, 0.7),
            Vec2::new(-0.5, 1.5),
        ] {
            let out = resolve_connected_uv(uv, ConnectedDirections::NONE, TILE).unwrap();
            assert_eq!(out, uv);
        }
    }

    #[test]
    fn test_interior_is_untouched() {
        // More than 2 texels from every edge.
        for &uv in &[Vec2::new(2.01 / 16.0, 13.99 / 16.0), Vec2::splat(0.5), Vec2::new(0.3, 0.3)] {
            let out = resolve_connected_uv(uv, ConnectedDirections::ALL, TILE).unwrap();
            assert_eq!(out, uv);
        }
    }

    #[test]
    fn test_axes_are_independent() {
        let uv = Vec2::new(0.01, 0.01);
        let h = resolve_connected_uv(uv, ConnectedDirections::LEFT, TILE).unwrap();
        assert_ne!(h.x, uv.x);
        assert_eq!(h.y, uv.y);

        let v = resolve_connected_uv(uv, ConnectedDirections::DOWN, TILE).unwrap();
        assert_eq!(v.x, uv.x);
        assert_ne!(v.y, uv.y);
    }

    #[test]
    fn test_non_square_tile_uses_each_extent() {
        let tile = UVec2::new(32, 8);
        let uv = Vec2::new(1.0 / 32.0, 7.5 / 8.0);
        let out = resolve_connected_uv(uv, ConnectedDirections::ALL, tile).unwrap();
        assert!((out.x * 32.0 - 3.0).abs() < 1e-5);
        assert!((out.y * 8.0 - 5.5).abs() < 1e-5);
    }

    #[test]
    fn test_small_tiles_rejected() {
        assert_eq!(
            resolve_connected_uv(Vec2::ZERO, ConnectedDirections::ALL, UVec2::new(4, 16)),
            Err(ShadingError::TileTooSmall { width: 4, height: 16 })
        );
        assert_eq!(
            resolve_connected_uv(Vec2::ZERO, ConnectedDirections::UP, UVec2::new(16, 2)),
            Err(ShadingError::TileTooSmall { width: 16, height: 2 })
        );
        assert!(resolve_connected_uv(Vec2::ZERO, ConnectedDirections::ALL, UVec2::new(5, 5)).is_ok());
    }

    #[test]
    fn test_empty_mask_accepts_any_tile() {
        let uv = Vec2::new(0.01, 0.99);
        for tile in [UVec2::new(16, 2), UVec2::new(1, 1), UVec2::ZERO] {
            assert_eq!(resolve_connected_uv(uv, ConnectedDirections::NONE, tile), Ok(uv));
        }
    }

    #[test]
    fn test_small_extent_ignored_on_unconnected_axis() {
        let uv = Vec2::new(0.5 / 16.0, 0.5);
        let out = resolve_connected_uv(uv, ConnectedDirections::HORIZONTAL, UVec2::new(16, 2)).unwrap();
        assert!((out.x * 16.0 - 2.5).abs() < 1e-5);
        assert_eq!(out.y, uv.y);
    }
}
