//! Core material types: [`MaterialDescriptor`] and its GPU form [`MaterialUniform`].

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use prism_lighting::LightingModel;
use thiserror::Error;

use crate::blending::MaterialModifiers;

// ---------------------------------------------------------------------------
// MaterialError
// ---------------------------------------------------------------------------

/// Errors returned during material validation.
#[derive(Debug, Error, PartialEq)]
pub enum MaterialError {
    /// A parameter is NaN or infinite.
    #[error("material field `{field}` is not finite")]
    NonFinite {
        /// Name of the offending field.
        field: &'static str,
    },
}

// ---------------------------------------------------------------------------
// MaterialDescriptor
// ---------------------------------------------------------------------------

/// Per-draw material descriptor, read-only while a frame is being shaded.
///
/// The modifier fields only take effect when `has_variants` is set; see
/// [`crate::blend_material`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialDescriptor {
    /// Base color (linear RGB), nominally `[0.0, 1.0]`.
    pub albedo: Vec3,
    /// Base roughness `[0.0, 1.0]`.
    pub roughness: f32,
    /// Base metallic factor `[0.0, 1.0]`.
    pub metallic: f32,
    /// Whether the variant modifiers below apply.
    pub has_variants: bool,
    /// Component-wise albedo multiplier.
    pub albedo_mod: Vec3,
    /// Additive roughness delta.
    pub roughness_mod: f32,
    /// Additive metallic delta.
    pub metallic_mod: f32,
    /// Lighting evaluator used for this material.
    pub lighting: LightingModel,
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self::new(Vec3::splat(0.8), 0.5, 0.0)
    }
}

impl MaterialDescriptor {
    /// A base material with no variant modifiers, shaded by the PBR evaluator.
    pub fn new(albedo: Vec3, roughness: f32, metallic: f32) -> Self {
        Self {
            albedo,
            roughness,
            metallic,
            has_variants: false,
            albedo_mod: Vec3::ONE,
            roughness_mod: 0.0,
            metallic_mod: 0.0,
            lighting: LightingModel::Pbr,
        }
    }

    /// Select the lighting evaluator.
    pub fn with_lighting(mut self, lighting: LightingModel) -> Self {
        self.lighting = lighting;
        self
    }

    /// Attach variant modifiers. Empty modifiers clear the variant flag.
    pub fn with_modifiers(mut self, modifiers: &MaterialModifiers) -> Self {
        if modifiers.is_empty() {
            self.has_variants = false;
            self.albedo_mod = Vec3::ONE;
            self.roughness_mod = 0.0;
            self.metallic_mod = 0.0;
            return self;
        }
        self.has_variants = true;
        self.albedo_mod = modifiers.albedo_factor.map_or(Vec3::ONE, Vec3::from);
        self.roughness_mod = modifiers.roughness_offset.unwrap_or(0.0);
        self.metallic_mod = modifiers.metallic_offset.unwrap_or(0.0);
        self
    }

    /// Reject non-finite values and clamp the base parameters to `[0.0, 1.0]`.
    ///
    /// Modifier deltas are left untouched; the blender clamps their result.
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::NonFinite`] naming the first offending field.
    pub fn validated(mut self) -> Result<Self, MaterialError> {
        let checks: [(&'static str, bool); 6] = [
            ("albedo", self.albedo.is_finite()),
            ("roughness", self.roughness.is_finite()),
            ("metallic", self.metallic.is_finite()),
            ("albedo_mod", self.albedo_mod.is_finite()),
            ("roughness_mod", self.roughness_mod.is_finite()),
            ("metallic_mod", self.metallic_mod.is_finite()),
        ];
        if let Some(&(field, _)) = checks.iter().find(|(_, ok)| !*ok) {
            return Err(MaterialError::NonFinite { field });
        }

        self.albedo = self.albedo.clamp(Vec3::ZERO, Vec3::ONE);
        self.roughness = self.roughness.clamp(0.0, 1.0);
        self.metallic = self.metallic.clamp(0.0, 1.0);
        Ok(self)
    }

    /// Build the GPU-side uniform.
    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            albedo_roughness: [self.albedo.x, self.albedo.y, self.albedo.z, self.roughness],
            albedo_mod_roughness_mod: [
                self.albedo_mod.x,
                self.albedo_mod.y,
                self.albedo_mod.z,
                self.roughness_mod,
            ],
            metallic_pad: [self.metallic, self.metallic_mod, 0.0, 0.0],
            flags: [u32::from(self.has_variants), self.lighting.gpu_tag(), 0, 0],
        }
    }
}

// ---------------------------------------------------------------------------
// MaterialUniform
// ---------------------------------------------------------------------------

/// GPU-side material uniform, 64 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    /// xyz = albedo, w = roughness.
    pub albedo_roughness: [f32; 4],
    /// xyz = albedo multiplier, w = roughness delta.
    pub albedo_mod_roughness_mod: [f32; 4],
    /// x = metallic, y = metallic delta, zw = padding.
    pub metallic_pad: [f32; 4],
    /// x = has_variants (0/1), y = lighting model tag, zw = padding.
    pub flags: [u32; 4],
}
