//! Material system: material descriptors, variant blending, the layered
//! block texture atlas, and the RON-backed block material library.

mod atlas;
mod blending;
mod library;
mod material;

pub use atlas::{
    AtlasBuilder, AtlasConfig, AtlasError, LAYERS_PER_BLOCK, MAX_ATLAS_LAYERS, MAX_BLOCK_ID,
    MIN_TILE_EXTENT, TextureArrayAtlas, layer_index, layers_for_blocks,
};
pub use blending::{MaterialModifiers, blend_material};
pub use library::{
    BlockEntry, BlockMaterial, LibraryError, LibraryManifest, MaterialLibrary, VariantEntry,
};
pub use material::{MaterialDescriptor, MaterialError, MaterialUniform};
