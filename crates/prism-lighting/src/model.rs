//! Lighting strategy selection.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Radiance, ShadingGeometry, SurfaceParams};
use crate::legacy::evaluate_legacy;
use crate::pbr::{AMBIENT_FACTOR, evaluate_pbr};

/// Which evaluator shades a material. Chosen per material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingModel {
    /// GGX + Schlick, no geometry term.
    #[default]
    Pbr,
    /// Lambert + Phong (exponent 32).
    Legacy,
}

impl LightingModel {
    /// Evaluate this model for one light.
    pub fn evaluate(
        self,
        geom: &ShadingGeometry,
        surface: &SurfaceParams,
        light: &LightParams,
    ) -> Radiance {
        match self {
            Self::Pbr => evaluate_pbr(geom, surface, light),
            Self::Legacy => evaluate_legacy(geom, surface, light),
        }
    }

    /// Value written into GPU uniforms (`0` = PBR, `1` = legacy).
    pub fn gpu_tag(self) -> u32 {
        match self {
            Self::Pbr => 0,
            Self::Legacy => 1,
        }
    }
}

impl FromStr for LightingModel {
    type Err = String;

    /// Accepts the same snake_case names the RON and JSON encodings use.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pbr" => Ok(Self::Pbr),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown lighting model `{other}` (expected `pbr` or `legacy`)")),
        }
    }
}

/// Scalar light parameters shared by both evaluators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightParams {
    /// Light intensity (1.0 = the unit-intensity reference light).
    pub intensity: f32,
    /// Ambient factor of the physically-based evaluator.
    pub ambient: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            ambient: AMBIENT_FACTOR,
        }
    }
}
