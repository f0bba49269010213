//! Block material library: base materials per block id plus up to fifteen
//! named variants each, loaded from a RON manifest.
//!
//! Variant id 0 is the base appearance of every block and never carries
//! modifiers; manifest variants use ids `1..16` so that every appearance maps
//! to its own atlas layer (see [`crate::layer_index`]). The library is
//! immutable after construction.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use glam::Vec3;
use prism_lighting::LightingModel;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::atlas::{LAYERS_PER_BLOCK, MAX_BLOCK_ID};
use crate::blending::MaterialModifiers;
use crate::material::{MaterialDescriptor, MaterialError};

/// Separator between block and variant in a qualified name (`"grass:dry"`).
const QUALIFIER: char = ':';

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned while loading or querying the library.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// I/O error reading the manifest file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// RON deserialization error.
    #[error("ron parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// Material validation error.
    #[error("block `{block}`: {source}")]
    Material {
        /// Block name.
        block: String,
        /// Underlying validation failure.
        #[source]
        source: MaterialError,
    },

    /// The block id has no room in the layered atlas.
    #[error("block id {block} exceeds the maximum of {max}")]
    BlockIdOutOfRange {
        /// Offending block id.
        block: u32,
        /// Largest accepted id.
        max: u32,
    },

    /// Two blocks share an id.
    #[error("duplicate block id: {0}")]
    DuplicateId(u32),

    /// Two blocks, or two variants of one block, share a name.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// A block or variant has an empty name or one containing `:`.
    #[error("invalid name {0:?}")]
    InvalidName(String),

    /// Variant id 0 is reserved for the base and ids must stay below 16.
    #[error("block {block}: variant id {variant} outside 1..16")]
    VariantOutOfRange {
        /// Block id.
        block: u32,
        /// Offending variant id.
        variant: u16,
    },

    /// Two variants of one block share an id.
    #[error("block {block}: duplicate variant id {variant}")]
    DuplicateVariant {
        /// Block id.
        block: u32,
        /// Repeated variant id.
        variant: u16,
    },

    /// No block with this id or name.
    #[error("unknown block: {0}")]
    UnknownBlock(String),

    /// The block exists but has no such variant.
    #[error("block {block}: unknown variant {variant}")]
    UnknownVariant {
        /// Block id.
        block: u32,
        /// Requested variant (id or name).
        variant: String,
    },
}

// ---------------------------------------------------------------------------
// RON manifest types
// ---------------------------------------------------------------------------

/// Top-level RON manifest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryManifest {
    /// Block entries, in any order.
    pub blocks: Vec<BlockEntry>,
}

/// A single block entry in the RON manifest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    /// Block id as stored in vertex data.
    pub id: u32,
    /// Unique name.
    pub name: String,
    /// Base albedo (linear RGB).
    pub albedo: [f32; 3],
    /// Base roughness.
    pub roughness: f32,
    /// Base metallic factor.
    pub metallic: f32,
    /// Lighting evaluator for every appearance of this block.
    #[serde(default)]
    pub lighting: LightingModel,
    /// Texture for the base appearance, relative to the manifest.
    #[serde(default)]
    pub texture: Option<String>,
    /// Alternate appearances.
    #[serde(default)]
    pub variants: Vec<VariantEntry>,
}

/// A variant entry of a block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantEntry {
    /// Variant id, `1..16`.
    pub id: u16,
    /// Name, unique within the block.
    pub name: String,
    /// Modifiers applied over the block's base material.
    #[serde(default)]
    pub modifiers: MaterialModifiers,
    /// Texture override; falls back to the block's texture.
    #[serde(default)]
    pub texture: Option<String>,
}

// ---------------------------------------------------------------------------
// BlockMaterial
// ---------------------------------------------------------------------------

/// A validated block with its variants.
#[derive(Clone, Debug)]
pub struct BlockMaterial {
    /// Block id.
    pub id: u32,
    /// Block name.
    pub name: String,
    /// Validated base material (no modifiers).
    pub base: MaterialDescriptor,
    /// Base texture path.
    pub texture: Option<String>,
    /// Variants keyed by id.
    pub variants: BTreeMap<u16, VariantEntry>,
}

impl BlockMaterial {
    /// Look up a variant id by name.
    pub fn variant_id(&self, name: &str) -> Option<u16> {
        self.variants
            .values()
            .find(|v| v.name == name)
            .map(|v| v.id)
    }
}

// ---------------------------------------------------------------------------
// MaterialLibrary
// ---------------------------------------------------------------------------

/// Lookup from `(block_id, variant_id)` to material descriptors.
#[derive(Clone, Debug, Default)]
pub struct MaterialLibrary {
    blocks: BTreeMap<u32, BlockMaterial>,
    name_to_id: HashMap<String, u32>,
}

impl MaterialLibrary {
    /// Load the library from a RON manifest file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError`] on I/O, parse, or validation failures.
    pub fn from_ron(path: &Path) -> Result<Self, LibraryError> {
        let contents = std::fs::read_to_string(path)?;
        let library = Self::from_ron_str(&contents)?;
        info!(path = %path.display(), blocks = library.len(), "material library loaded");
        Ok(library)
    }

    /// Load the library from a RON string.
    pub fn from_ron_str(ron_str: &str) -> Result<Self, LibraryError> {
        let manifest: LibraryManifest = ron::from_str(ron_str)?;
        Self::from_manifest(manifest)
    }

    /// Validate a manifest and build the library.
    pub fn from_manifest(manifest: LibraryManifest) -> Result<Self, LibraryError> {
        let mut blocks = BTreeMap::new();
        let mut name_to_id = HashMap::new();

        for entry in manifest.blocks {
            check_name(&entry.name)?;
            if entry.id > MAX_BLOCK_ID {
                return Err(LibraryError::BlockIdOutOfRange {
                    block: entry.id,
                    max: MAX_BLOCK_ID,
                });
            }
            if blocks.contains_key(&entry.id) {
                return Err(LibraryError::DuplicateId(entry.id));
            }
            if name_to_id.contains_key(&entry.name) {
                return Err(LibraryError::DuplicateName(entry.name));
            }

            let base = MaterialDescriptor::new(Vec3::from(entry.albedo), entry.roughness, entry.metallic)
                .with_lighting(entry.lighting)
                .validated()
                .map_err(|source| LibraryError::Material {
                    block: entry.name.clone(),
                    source,
                })?;

            let mut variants = BTreeMap::new();
            for variant in entry.variants {
                check_name(&variant.name)?;
                if variant.id == 0 || u32::from(variant.id) >= LAYERS_PER_BLOCK {
                    return Err(LibraryError::VariantOutOfRange {
                        block: entry.id,
                        variant: variant.id,
                    });
                }
                if variants.contains_key(&variant.id) {
                    return Err(LibraryError::DuplicateVariant {
                        block: entry.id,
                        variant: variant.id,
                    });
                }
                if variants.values().any(|v: &VariantEntry| v.name == variant.name) {
                    return Err(LibraryError::DuplicateName(format!(
                        "{}{QUALIFIER}{}",
                        entry.name, variant.name
                    )));
                }
                // Surface non-finite modifiers at load time.
                base.with_modifiers(&variant.modifiers)
                    .validated()
                    .map_err(|source| LibraryError::Material {
                        block: entry.name.clone(),
                        source,
                    })?;
                variants.insert(variant.id, variant);
            }

            name_to_id.insert(entry.name.clone(), entry.id);
            blocks.insert(
                entry.id,
                BlockMaterial {
                    id: entry.id,
                    name: entry.name,
                    base,
                    texture: entry.texture,
                    variants,
                },
            );
        }

        Ok(Self { blocks, name_to_id })
    }

    /// The library used when no manifest is supplied.
    pub fn builtin() -> Result<Self, LibraryError> {
        Self::from_manifest(builtin_manifest())
    }

    /// Material descriptor for one appearance.
    ///
    /// Variant 0 is the block's base material. Other variants set the
    /// variant flag when they carry modifiers.
    pub fn descriptor(&self, block_id: u32, variant_id: u16) -> Result<MaterialDescriptor, LibraryError> {
        let block = self
            .blocks
            .get(&block_id)
            .ok_or_else(|| LibraryError::UnknownBlock(block_id.to_string()))?;
        if variant_id == 0 {
            return Ok(block.base);
        }
        let variant = block
            .variants
            .get(&variant_id)
            .ok_or_else(|| LibraryError::UnknownVariant {
                block: block_id,
                variant: variant_id.to_string(),
            })?;
        Ok(block.base.with_modifiers(&variant.modifiers))
    }

    /// Block by id.
    pub fn block(&self, block_id: u32) -> Option<&BlockMaterial> {
        self.blocks.get(&block_id)
    }

    /// Block id by name.
    pub fn id_by_name(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    /// Resolve `"block"` or `"block:variant"` to `(block_id, variant_id)`.
    pub fn lookup(&self, qualified: &str) -> Result<(u32, u16), LibraryError> {
        let (block_name, variant_name) = match qualified.split_once(QUALIFIER) {
            Some((block, variant)) => (block, Some(variant)),
            None => (qualified, None),
        };
        let block_id = self
            .id_by_name(block_name)
            .ok_or_else(|| LibraryError::UnknownBlock(block_name.to_string()))?;
        let Some(variant_name) = variant_name else {
            return Ok((block_id, 0));
        };
        let variant_id = self
            .blocks
            .get(&block_id)
            .and_then(|b| b.variant_id(variant_name))
            .ok_or_else(|| LibraryError::UnknownVariant {
                block: block_id,
                variant: variant_name.to_string(),
            })?;
        Ok((block_id, variant_id))
    }

    /// Texture path for an appearance: the variant's override, else the block's.
    pub fn texture_for(&self, block_id: u32, variant_id: u16) -> Option<&str> {
        let block = self.blocks.get(&block_id)?;
        block
            .variants
            .get(&variant_id)
            .and_then(|v| v.texture.as_deref())
            .or(block.texture.as_deref())
    }

    /// Largest block id, or `None` for an empty library.
    pub fn max_block_id(&self) -> Option<u32> {
        self.blocks.keys().next_back().copied()
    }

    /// Every `(block_id, variant_id)` appearance, base first, ordered by id.
    pub fn appearances(&self) -> Vec<(u32, u16)> {
        self.blocks
            .values()
            .flat_map(|b| std::iter::once((b.id, 0)).chain(b.variants.keys().map(move |&v| (b.id, v))))
            .collect()
    }

    /// Blocks in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockMaterial> {
        self.blocks.values()
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the library holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_name(name: &str) -> Result<(), LibraryError> {
    if name.trim().is_empty() || name.contains(QUALIFIER) {
        return Err(LibraryError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn variant(id: u16, name: &str, modifiers: MaterialModifiers) -> VariantEntry {
    VariantEntry {
        id,
        name: name.to_string(),
        modifiers,
        texture: None,
    }
}

fn builtin_manifest() -> LibraryManifest {
    let block = |id: u32, name: &str, albedo: [f32; 3], roughness: f32, metallic: f32| BlockEntry {
        id,
        name: name.to_string(),
        albedo,
        roughness,
        metallic,
        lighting: LightingModel::Pbr,
        texture: None,
        variants: Vec::new(),
    };

    let mut stone = block(1, "stone", [0.55, 0.55, 0.55], 0.85, 0.0);
    stone.variants = vec![
        variant(
            1,
            "mossy",
            MaterialModifiers {
                albedo_factor: Some([0.7, 1.0, 0.6]),
                roughness_offset: Some(0.1),
                metallic_offset: None,
            },
        ),
        variant(
            2,
            "polished",
            MaterialModifiers {
                albedo_factor: None,
                roughness_offset: Some(-0.6),
                metallic_offset: None,
            },
        ),
    ];

    let mut grass = block(2, "grass", [0.35, 0.65, 0.25], 0.8, 0.0);
    grass.variants = vec![variant(
        1,
        "dry",
        MaterialModifiers {
            albedo_factor: Some([1.3, 1.0, 0.5]),
            ..Default::default()
        },
    )];

    let mut water = block(3, "water", [0.2, 0.4, 0.8], 0.1, 0.0);
    water.lighting = LightingModel::Legacy;

    let mut gold = block(4, "gold_ore", [1.0, 0.78, 0.34], 0.4, 0.6);
    gold.variants = vec![variant(
        1,
        "pure",
        MaterialModifiers {
            albedo_factor: None,
            roughness_offset: Some(-0.2),
            metallic_offset: Some(0.4),
        },
    )];

    LibraryManifest {
        blocks: vec![stone, grass, water, gold],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
