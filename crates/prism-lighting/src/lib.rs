//! Single-light surface lighting: a simplified Cook-Torrance evaluator, the
//! earlier Lambert/Phong evaluator, and the per-material strategy selecting
//! between them.

mod geometry;
mod legacy;
mod model;
pub mod pbr;

pub use geometry::{Radiance, ShadingGeometry, SurfaceParams};
pub use legacy::{LEGACY_AMBIENT, LEGACY_SHININESS, LEGACY_SPECULAR_STRENGTH, evaluate_legacy};
pub use model::{LightParams, LightingModel};
pub use pbr::{AMBIENT_FACTOR, DIELECTRIC_F0, evaluate_pbr};
