//! Material parameter blending: folds variant modifiers into the base
//! material to produce the surface parameters the lighting stage consumes.

use prism_lighting::SurfaceParams;
use serde::{Deserialize, Serialize};

use crate::material::MaterialDescriptor;

/// Variant modifiers as authored in the material library.
///
/// Missing fields are neutral: albedo factor 1, offsets 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialModifiers {
    /// Component-wise albedo multiplier.
    #[serde(default)]
    pub albedo_factor: Option<[f32; 3]>,
    /// Added to roughness before clamping.
    #[serde(default)]
    pub roughness_offset: Option<f32>,
    /// Added to metallic before clamping.
    #[serde(default)]
    pub metallic_offset: Option<f32>,
}

impl MaterialModifiers {
    /// `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        self.albedo_factor.is_none() && self.roughness_offset.is_none() && self.metallic_offset.is_none()
    }
}

/// Blend a material descriptor into final surface parameters.
///
/// Without the variant flag the base values pass through unchanged. With it,
/// albedo is multiplied component-wise and roughness/metallic receive their
/// deltas, then are clamped to `[0.0, 1.0]`.
pub fn blend_material(material: &MaterialDescriptor) -> SurfaceParams {
    if !material.has_variants {
        return SurfaceParams {
            albedo: material.albedo,
            roughness: material.roughness,
            metallic: material.metallic,
        };
    }

    SurfaceParams {
        albedo: material.albedo * material.albedo_mod,
        roughness: (material.roughness + material.roughness_mod).clamp(0.0, 1.0),
        metallic: (material.metallic + material.metallic_mod).clamp(0.0, 1.0),
    }
}
