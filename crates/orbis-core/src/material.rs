//! Shaded surface materials produced by bodies

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Bump intensity applied whenever a relief map is bound
pub const FIXED_BUMP_SCALE: f32 = 0.005;
/// Specular tint applied whenever a specular map is bound
pub const FIXED_SPECULAR_TINT: Rgb = Rgb::GREY;

pub const DEFAULT_SPECULAR_TINT: Rgb = Rgb::from_hex(0x111111);
pub const DEFAULT_SHININESS: f32 = 30.0;
pub const DEFAULT_BUMP_SCALE: f32 = 1.0;

/// Blinn-Phong style surface description with optional texture maps
///
/// `T` is the engine's texture type. Every map is only present once its load
/// has resolved, so a constructed material never refers to pending data.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMaterial<T> {
    pub base_color: Rgb,
    pub albedo_map: Option<T>,
    pub bump_map: Option<T>,
    pub bump_scale: f32,
    pub specular_map: Option<T>,
    pub specular_tint: Rgb,
    pub shininess: f32,
    /// Map whose green channel drives per-texel opacity
    pub alpha_map: Option<T>,
    pub transparent: bool,
    /// Skip lighting entirely (emissive bodies)
    pub unlit: bool,
}

impl<T> Default for SurfaceMaterial<T> {
    fn default() -> Self {
        Self {
            base_color: Rgb::WHITE,
            albedo_map: None,
            bump_map: None,
            bump_scale: DEFAULT_BUMP_SCALE,
            specular_map: None,
            specular_tint: DEFAULT_SPECULAR_TINT,
            shininess: DEFAULT_SHININESS,
            alpha_map: None,
            transparent: false,
            unlit: false,
        }
    }
}

impl<T> SurfaceMaterial<T> {
    /// Number of texture maps bound to this material
    pub fn bound_maps(&self) -> usize {
        [
            self.albedo_map.is_some(),
            self.bump_map.is_some(),
            self.specular_map.is_some(),
            self.alpha_map.is_some(),
        ]
        .into_iter()
        .filter(|bound| *bound)
        .count()
    }
}

/// How configured bump scale and specular tint are treated
///
/// `Fixed` reproduces the long-standing scene behaviour: a bound relief map
/// always gets [`FIXED_BUMP_SCALE`] and a bound specular map always gets
/// [`FIXED_SPECULAR_TINT`], whatever the body was configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialPolicy {
    #[default]
    Fixed,
    Configured,
}

impl MaterialPolicy {
    pub fn bump_scale(self, configured: Option<f32>) -> f32 {
        match (self, configured) {
            (Self::Configured, Some(scale)) => scale,
            _ => FIXED_BUMP_SCALE,
        }
    }

    pub fn specular_tint(self, configured: Option<Rgb>) -> Rgb {
        match (self, configured) {
            (Self::Configured, Some(tint)) => tint,
            _ => FIXED_SPECULAR_TINT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material_has_no_maps() {
        let material = SurfaceMaterial::<String>::default();
        assert_eq!(material.bound_maps(), 0);
        assert_eq!(material.base_color, Rgb::WHITE);
        assert_eq!(material.shininess, DEFAULT_SHININESS);
        assert!(!material.transparent);
    }

    #[test]
    fn test_fixed_policy_ignores_configuration() {
        let policy = MaterialPolicy::Fixed;
        assert_eq!(policy.bump_scale(Some(0.2)), FIXED_BUMP_SCALE);
        assert_eq!(policy.specular_tint(Some(Rgb::WHITE)), FIXED_SPECULAR_TINT);
    }

    #[test]
    fn test_configured_policy_falls_back_to_fixed() {
        let policy = MaterialPolicy::Configured;
        assert_eq!(policy.bump_scale(Some(0.2)), 0.2);
        assert_eq!(policy.bump_scale(None), FIXED_BUMP_SCALE);
        assert_eq!(policy.specular_tint(Some(Rgb::WHITE)), Rgb::WHITE);
        assert_eq!(policy.specular_tint(None), FIXED_SPECULAR_TINT);
    }
}
