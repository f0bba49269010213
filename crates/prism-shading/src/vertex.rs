//! Surface vertex format and its canonical `wgpu::VertexBufferLayout`.
//!
//! ## Attribute Packing
//!
//! | Location | Offset | Format    | Field         |
//! |----------|--------|-----------|---------------|
//! | 0        | 0      | Float32x3 | position      |
//! | 1        | 12     | Float32x3 | normal        |
//! | 2        | 24     | Float32x2 | tex_coord     |
//! | 3        | 32     | Uint32    | block_id      |
//! | 4        | 36     | Uint32    | variant_data  |

use std::mem;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

use crate::variant::VariantData;

/// One mesh vertex as emitted by the mesh builder. 40 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SurfaceVertex {
    /// Model-space position.
    pub position: [f32; 3],
    /// Model-space normal.
    pub normal: [f32; 3],
    /// Texture coordinate, `[0, 1]` across one tile.
    pub tex_coord: [f32; 2],
    /// Block id.
    pub block_id: u32,
    /// Packed [`VariantData`].
    pub variant_data: u32,
}

static_assertions::assert_eq_size!(SurfaceVertex, [u8; 40]);

impl SurfaceVertex {
    /// Build a vertex, packing the variant field.
    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec2, block_id: u32, variant: VariantData) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tex_coord: tex_coord.to_array(),
            block_id,
            variant_data: variant.pack(),
        }
    }

    /// Decode the variant field.
    pub fn variant(&self) -> VariantData {
        VariantData::unpack(self.variant_data)
    }
}

/// Vertex attributes for [`SurfaceVertex`], in field order.
pub const SURFACE_VERTEX_ATTRIBUTES: [VertexAttribute; 5] = [
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 12,
        shader_location: 1,
    },
    VertexAttribute {
        format: VertexFormat::Float32x2,
        offset: 24,
        shader_location: 2,
    },
    // Integer attributes reach the fragment stage with flat interpolation.
    VertexAttribute {
        format: VertexFormat::Uint32,
        offset: 32,
        shader_location: 3,
    },
    VertexAttribute {
        format: VertexFormat::Uint32,
        offset: 36,
        shader_location: 4,
    },
];

/// The vertex buffer layout for the surface pipeline.
pub const SURFACE_VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: mem::size_of::<SurfaceVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &SURFACE_VERTEX_ATTRIBUTES,
};

// ---------------------------------------------------------------------------
// Compile-time validation
// ---------------------------------------------------------------------------

const _: () = assert!(
    mem::offset_of!(SurfaceVertex, normal) as u64 == SURFACE_VERTEX_ATTRIBUTES[1].offset
);
const _: () = assert!(
    mem::offset_of!(SurfaceVertex, tex_coord) as u64 == SURFACE_VERTEX_ATTRIBUTES[2].offset
);
const _: () = assert!(
    mem::offset_of!(SurfaceVertex, block_id) as u64 == SURFACE_VERTEX_ATTRIBUTES[3].offset
);
const _: () = assert!(
    mem::offset_of!(SurfaceVertex, variant_data) as u64 == SURFACE_VERTEX_ATTRIBUTES[4].offset
);

/// Last attribute must end exactly at the stride.
const _: () = assert!(
    SURFACE_VERTEX_ATTRIBUTES[4].offset + 4 == mem::size_of::<SurfaceVertex>() as u64,
    "SurfaceVertex has trailing bytes not covered by the layout"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::FacingBits;

    #[test]
    fn test_layout_stride_matches_vertex_struct_size() {
        assert_eq!(SURFACE_VERTEX_LAYOUT.array_stride, 40);
        assert_eq!(SURFACE_VERTEX_LAYOUT.step_mode, VertexStepMode::Vertex);
    }

    #[test]
    fn test_attribute_formats_follow_field_order() {
        let formats: Vec<VertexFormat> = SURFACE_VERTEX_ATTRIBUTES.iter().map(|a| a.format).collect();
        assert_eq!(
            formats,
            vec![
                VertexFormat::Float32x3,
                VertexFormat::Float32x3,
                VertexFormat::Float32x2,
                VertexFormat::Uint32,
                VertexFormat::Uint32,
            ]
        );
    }

    #[test]
    fn test_shader_locations_are_sequential() {
        for (i, attr) in SURFACE_VERTEX_ATTRIBUTES.iter().enumerate() {
            assert_eq!(attr.shader_location, i as u32);
        }
    }

    #[test]
    fn test_attributes_do_not_overlap() {
        for pair in SURFACE_VERTEX_ATTRIBUTES.windows(2) {
            assert!(pair[0].offset + pair[0].format.size() <= pair[1].offset);
        }
    }

    #[test]
    fn test_vertex_bytes_carry_packed_variant() {
        let v = SurfaceVertex::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::Y,
            Vec2::new(0.25, 0.75),
            9,
            VariantData::new(4, FacingBits(1)),
        );
        let bytes = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 40);
        assert_eq!(&bytes[32..36], &9u32.to_ne_bytes());
        assert_eq!(&bytes[36..40], &0x0004_0001u32.to_ne_bytes());
        assert_eq!(v.variant().variant_id, 4);
    }
}
