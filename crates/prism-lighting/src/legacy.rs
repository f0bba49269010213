//! Earlier lighting mode: Lambert diffuse plus a fixed-exponent Phong highlight.

use glam::Vec3;

use crate::geometry::{Radiance, ShadingGeometry, SurfaceParams};
use crate::model::LightParams;

/// Constant ambient factor of the legacy mode.
pub const LEGACY_AMBIENT: f32 = 0.1;
/// Scale of the specular highlight.
pub const LEGACY_SPECULAR_STRENGTH: f32 = 0.5;
/// Phong exponent.
pub const LEGACY_SHININESS: i32 = 32;

/// Reflect `incident` about `normal` (GLSL `reflect`).
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

/// Evaluate the legacy response for one light.
///
/// The terms are untinted: colour comes only from the sampled texture the
/// caller multiplies in. `_surface` is accepted so both evaluators share a
/// signature. The highlight is suppressed when the light is behind the
/// surface.
pub fn evaluate_legacy(
    geom: &ShadingGeometry,
    _surface: &SurfaceParams,
    light: &LightParams,
) -> Radiance {
    let n_dot_l = geom.n_dot_l();

    let specular = if n_dot_l > 0.0 {
        let reflect_dir = reflect(-geom.light_dir, geom.normal);
        let v_dot_r = geom.view_dir.dot(reflect_dir).max(0.0);
        LEGACY_SPECULAR_STRENGTH * v_dot_r.powi(LEGACY_SHININESS) * light.intensity
    } else {
        0.0
    };

    Radiance {
        ambient: Vec3::splat(LEGACY_AMBIENT),
        diffuse: Vec3::splat(n_dot_l * light.intensity),
        specular: Vec3::splat(specular),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white() -> SurfaceParams {
        SurfaceParams {
            albedo: Vec3::ONE,
            roughness: 0.5,
            metallic: 0.0,
        }
    }

    #[test]
    fn test_reflect_mirrors_about_normal() {
        let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert!((r - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_head_on_light_gives_full_terms() {
        let geom = ShadingGeometry {
            normal: Vec3::Y,
            view_dir: Vec3::Y,
            light_dir: Vec3::Y,
        };
        let r = evaluate_legacy(&geom, &white(), &LightParams::default());
        assert!((r.ambient.x - 0.1).abs() < 1e-6);
        assert!((r.diffuse.x - 1.0).abs() < 1e-6);
        assert!((r.specular.x - 0.5).abs() < 1e-6);
        assert!((r.total().x - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_highlight_falls_off_sharply() {
        let geom = ShadingGeometry {
            normal: Vec3::Y,
            view_dir: Vec3::new(0.5, 1.0, 0.0).normalize(),
            light_dir: Vec3::Y,
        };
        let r = evaluate_legacy(&geom, &white(), &LightParams::default());
        // V·R ≈ 0.894, 0.5 · 0.894^32 ≈ 0.014
        assert!(r.specular.x < 0.02, "specular {}", r.specular.x);
        assert!(r.specular.x > 0.0);
    }

    #[test]
    fn test_back_facing_light_leaves_only_ambient() {
        let geom = ShadingGeometry {
            normal: Vec3::Y,
            view_dir: Vec3::NEG_Y,
            light_dir: Vec3::NEG_Y,
        };
        let r = evaluate_legacy(&geom, &white(), &LightParams::default());
        assert_eq!(r.diffuse, Vec3::ZERO);
        assert_eq!(r.specular, Vec3::ZERO);
        assert!((r.ambient.x - LEGACY_AMBIENT).abs() < 1e-6);
    }

    #[test]
    fn test_terms_ignore_material_albedo() {
        let geom = ShadingGeometry {
            normal: Vec3::Y,
            view_dir: Vec3::Y,
            light_dir: Vec3::Y,
        };
        let grey = SurfaceParams {
            albedo: Vec3::splat(0.5),
            ..white()
        };
        let r = evaluate_legacy(&geom, &grey, &LightParams::default());
        assert_eq!(r.ambient, Vec3::splat(LEGACY_AMBIENT));
        assert_eq!(r.diffuse, Vec3::ONE);
        assert!((r.specular - Vec3::splat(0.5)).length() < 1e-6);
        assert_eq!(r, evaluate_legacy(&geom, &white(), &LightParams::default()));
    }
}
