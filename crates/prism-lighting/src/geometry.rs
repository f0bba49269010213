//! Inputs and outputs shared by both lighting evaluators.

use glam::Vec3;

/// Blended surface parameters for one shading point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceParams {
    /// Base color (linear RGB).
    pub albedo: Vec3,
    /// Microfacet roughness \[0.0, 1.0\].
    pub roughness: f32,
    /// Metallic factor \[0.0, 1.0\].
    pub metallic: f32,
}

/// Unit vectors describing the light/view configuration at a shading point.
///
/// Degenerate inputs (zero-length normal, coincident positions) produce zero
/// vectors rather than NaNs, which the evaluators treat as "no direct light".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadingGeometry {
    /// Surface normal N.
    pub normal: Vec3,
    /// Direction from the surface toward the viewer, V.
    pub view_dir: Vec3,
    /// Direction from the surface toward the light, L.
    pub light_dir: Vec3,
}

impl ShadingGeometry {
    /// Build from an (unnormalized) world normal and world-space positions.
    pub fn from_positions(normal: Vec3, frag_pos: Vec3, view_pos: Vec3, light_pos: Vec3) -> Self {
        Self {
            normal: normal.normalize_or_zero(),
            view_dir: (view_pos - frag_pos).normalize_or_zero(),
            light_dir: (light_pos - frag_pos).normalize_or_zero(),
        }
    }

    /// Half-vector H = normalize(V + L).
    pub fn half_vector(&self) -> Vec3 {
        (self.view_dir + self.light_dir).normalize_or_zero()
    }

    /// `max(N·L, 0)`.
    pub fn n_dot_l(&self) -> f32 {
        self.normal.dot(self.light_dir).max(0.0)
    }
}

/// Lighting result split by contribution.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Radiance {
    /// Constant ambient term.
    pub ambient: Vec3,
    /// Direct diffuse term.
    pub diffuse: Vec3,
    /// Direct specular term.
    pub specular: Vec3,
}

impl Radiance {
    /// Sum of all contributions, in linear RGB.
    pub fn total(&self) -> Vec3 {
        self.ambient + self.diffuse + self.specular
    }
}
