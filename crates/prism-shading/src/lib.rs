//! Per-surface-point shading for voxel blocks.
//!
//! Stages, in data-flow order:
//! 1. [`PreparedTransform::transform_vertex`]: model-space vertex to world
//!    space, with block id and packed variant data forwarded unchanged.
//! 2. [`VariantData::unpack`]: split the packed variant field.
//! 3. [`resolve_connected_uv`]: nudge coordinates away from connected edges.
//! 4. [`prism_materials::blend_material`]: fold variant modifiers in.
//! 5. [`sample_atlas`]: flattened layer lookup with bounds checks.
//! 6. [`prism_lighting::LightingModel::evaluate`]: single-light response.
//!
//! [`shade_fragment`] chains stages 2 to 6; [`shade_batch`] runs it across
//! threads. The same stages exist on the GPU in [`VOXEL_SURFACE_SHADER_SOURCE`].

mod connectivity;
mod error;
mod frame;
mod gpu;
mod pipeline;
mod sampler;
mod transform;
mod uv;
mod variant;
mod vertex;

pub use connectivity::ConnectedDirections;
pub use error::ShadingError;
pub use frame::{FrameContext, FrameSlot, LightFrame};
pub use gpu::{
    ATLAS_FORMAT, FrameTransformUniform, LightUniform, SurfacePipeline, VOXEL_SURFACE_SHADER_SOURCE, atlas_view,
    upload_atlas,
};
pub use pipeline::{FACING_VIEWER, ShadedFragment, shade_batch, shade_fragment, to_rgba8};
pub use sampler::{LayerSource, atlas_layer_index, sample_atlas};
pub use transform::{Fragment, FrameTransform, PreparedTransform, VertexOutput, interpolate_fragment};
pub use uv::{CONNECTED_MARGIN, resolve_connected_uv};
pub use variant::{FacingBits, VariantData};
pub use vertex::{SURFACE_VERTEX_ATTRIBUTES, SURFACE_VERTEX_LAYOUT, SurfaceVertex};
