//! Physically-based single-light evaluation.
//!
//! A simplified Cook-Torrance response: GGX distribution and Schlick Fresnel,
//! with no geometric masking/shadowing term, plus a constant ambient term.
//! The same math runs on the GPU (see the WGSL surface shader in
//! `prism-shading`); these functions are the CPU path and its test oracle.

use std::f32::consts::PI;

use glam::Vec3;

use crate::geometry::{Radiance, ShadingGeometry, SurfaceParams};
use crate::model::LightParams;

/// Normal-incidence reflectance of a dielectric surface.
pub const DIELECTRIC_F0: f32 = 0.04;

/// Constant ambient factor applied to albedo.
pub const AMBIENT_FACTOR: f32 = 0.03;

/// GGX/Trowbridge-Reitz normal distribution function.
///
/// `n_dot_h` is clamped to be non-negative. A perfectly smooth surface
/// (roughness 0) aligned exactly with H has no finite peak and yields 0.
pub fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let n_dot_h = n_dot_h.max(0.0);
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    let denom = PI * denom * denom;
    if denom <= f32::MIN_POSITIVE {
        return 0.0;
    }
    a2 / denom
}

/// Schlick Fresnel approximation.
pub fn fresnel_schlick(cos_theta: f32, f0: Vec3) -> Vec3 {
    f0 + (Vec3::ONE - f0) * (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5)
}

/// F0 blended from the dielectric constant toward albedo by `metallic`.
pub fn base_reflectance(albedo: Vec3, metallic: f32) -> Vec3 {
    Vec3::splat(DIELECTRIC_F0).lerp(albedo, metallic)
}

/// Diffuse weight kD = (1 − F) · (1 − metallic).
pub fn diffuse_weight(fresnel: Vec3, metallic: f32) -> Vec3 {
    (Vec3::ONE - fresnel) * (1.0 - metallic)
}

/// Evaluate the physically-based response for one light.
pub fn evaluate_pbr(geom: &ShadingGeometry, surface: &SurfaceParams, light: &LightParams) -> Radiance {
    let half_vec = geom.half_vector();
    let n_dot_l = geom.n_dot_l();
    let n_dot_h = geom.normal.dot(half_vec).max(0.0);
    let h_dot_v = half_vec.dot(geom.view_dir).max(0.0);

    let f0 = base_reflectance(surface.albedo, surface.metallic);
    let d = distribution_ggx(n_dot_h, surface.roughness);
    let f = fresnel_schlick(h_dot_v, f0);
    let k_d = diffuse_weight(f, surface.metallic);

    let radiance = n_dot_l * light.intensity;

    Radiance {
        ambient: Vec3::splat(light.ambient) * surface.albedo,
        diffuse: k_d * surface.albedo / PI * radiance,
        specular: d * f * radiance,
    }
}
