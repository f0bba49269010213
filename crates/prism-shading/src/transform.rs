//! Attribute transform stage and fragment interpolation.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::error::ShadingError;
use crate::vertex::SurfaceVertex;

/// Model, view and projection matrices for one draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTransform {
    /// Model-to-world.
    pub model: Mat4,
    /// World-to-view.
    pub view: Mat4,
    /// View-to-clip.
    pub projection: Mat4,
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

impl FrameTransform {
    /// Precompute the combined clip matrix and the normal matrix.
    ///
    /// # Errors
    ///
    /// [`ShadingError::NonInvertibleModel`] if the model's upper 3x3 block
    /// is singular.
    pub fn prepare(&self) -> Result<PreparedTransform, ShadingError> {
        let upper = Mat3::from_mat4(self.model);
        let det = upper.determinant();
        if !det.is_finite() || det.abs() <= f32::MIN_POSITIVE {
            return Err(ShadingError::NonInvertibleModel);
        }
        Ok(PreparedTransform {
            model: self.model,
            clip_from_model: self.projection * self.view * self.model,
            normal_matrix: upper.inverse().transpose(),
        })
    }
}

/// Per-draw matrices ready for the vertex stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreparedTransform {
    model: Mat4,
    clip_from_model: Mat4,
    normal_matrix: Mat3,
}

impl PreparedTransform {
    /// Inverse-transpose of the model's upper 3x3 block.
    pub fn normal_matrix(&self) -> Mat3 {
        self.normal_matrix
    }

    /// Run the vertex stage for one vertex.
    ///
    /// The normal is transformed but not normalized; the fragment stage
    /// normalizes after interpolation.
    pub fn transform_vertex(&self, vertex: &SurfaceVertex) -> VertexOutput {
        let local = Vec3::from(vertex.position).extend(1.0);
        VertexOutput {
            clip_position: self.clip_from_model * local,
            world_position: (self.model * local).truncate(),
            world_normal: self.normal_matrix * Vec3::from(vertex.normal),
            tex_coord: Vec2::from(vertex.tex_coord),
            block_id: vertex.block_id,
            variant_data: vertex.variant_data,
        }
    }
}

/// Vertex stage output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexOutput {
    /// Clip-space position for rasterization.
    pub clip_position: Vec4,
    /// World-space position.
    pub world_position: Vec3,
    /// World-space normal (unnormalized).
    pub world_normal: Vec3,
    /// Tile texture coordinate.
    pub tex_coord: Vec2,
    /// Block id, never interpolated.
    pub block_id: u32,
    /// Packed variant data, never interpolated.
    pub variant_data: u32,
}

/// Inputs of the fragment stage at one covered surface point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fragment {
    /// Interpolated world-space position.
    pub world_position: Vec3,
    /// Interpolated world-space normal.
    pub world_normal: Vec3,
    /// Interpolated tile texture coordinate.
    pub tex_coord: Vec2,
    /// Block id of the provoking vertex.
    pub block_id: u32,
    /// Packed variant data of the provoking vertex.
    pub variant_data: u32,
}

impl From<VertexOutput> for Fragment {
    fn from(v: VertexOutput) -> Self {
        Self {
            world_position: v.world_position,
            world_normal: v.world_normal,
            tex_coord: v.tex_coord,
            block_id: v.block_id,
            variant_data: v.variant_data,
        }
    }
}

/// Interpolate a triangle's vertex outputs at barycentric `weights`.
///
/// Continuous attributes are blended; `block_id` and `variant_data` come from
/// the first (provoking) vertex unchanged.
pub fn interpolate_fragment(triangle: &[VertexOutput; 3], weights: Vec3) -> Fragment {
    let [a, b, c] = triangle;
    let w = weights;
    Fragment {
        world_position: a.world_position * w.x + b.world_position * w.y + c.world_position * w.z,
        world_normal: a.world_normal * w.x + b.world_normal * w.y + c.world_normal * w.z,
        tex_coord: a.tex_coord * w.x + b.tex_coord * w.y + c.tex_coord * w.z,
        block_id: a.block_id,
        variant_data: a.variant_data,
    }
}
