//! Procedural starfield: points scattered over a distant sphere shell

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::ops::Range;

use crate::error::ConfigurationError;

pub const STAR_COUNT: usize = 4000;
pub const STARFIELD_RADIUS: f32 = 100.0;

/// Star tints, from hot blue-white through yellow to cool orange
pub const STAR_PALETTE: [[f32; 3]; 10] = [
    [0.61, 0.69, 1.00],
    [0.67, 0.75, 1.00],
    [0.79, 0.84, 1.00],
    [0.97, 0.97, 1.00],
    [1.00, 1.00, 1.00],
    [1.00, 0.96, 0.92],
    [1.00, 0.93, 0.80],
    [1.00, 0.87, 0.68],
    [1.00, 0.82, 0.63],
    [1.00, 0.74, 0.52],
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    pub count: usize,
    pub radius: f32,
    pub size_range: Range<f32>,
    pub opacity_range: Range<f32>,
    /// Fixed seed for a reproducible sky; entropy-seeded when absent
    pub seed: Option<u64>,
    /// World-space edge length of a size-1 star sprite
    pub sprite_scale: f32,
    pub twinkle: bool,
    /// Radians per second
    pub twinkle_speed: f32,
    /// Fraction of the base opacity removed at the bottom of a twinkle
    pub twinkle_depth: f32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            count: STAR_COUNT,
            radius: STARFIELD_RADIUS,
            size_range: 1.0..1.6,
            opacity_range: 0.2..1.0,
            seed: None,
            sprite_scale: 0.25,
            twinkle: false,
            twinkle_speed: 2.0,
            twinkle_depth: 0.5,
        }
    }
}

impl StarfieldConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |msg: String| Err(ConfigurationError::Starfield(msg));

        if self.count == 0 {
            return invalid("star count must be at least 1".to_string());
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return invalid(format!("radius must be positive, got {}", self.radius));
        }
        if !is_valid_range(&self.size_range) || self.size_range.start <= 0.0 {
            return invalid(format!("invalid size range {:?}", self.size_range));
        }
        if !is_valid_range(&self.opacity_range)
            || self.opacity_range.start < 0.0
            || self.opacity_range.end > 1.0
        {
            return invalid(format!("invalid opacity range {:?}", self.opacity_range));
        }
        if !(self.sprite_scale.is_finite() && self.sprite_scale > 0.0) {
            return invalid(format!(
                "sprite scale must be positive, got {}",
                self.sprite_scale
            ));
        }
        if !self.twinkle_speed.is_finite() || !(0.0..=1.0).contains(&self.twinkle_depth) {
            return invalid(format!(
                "invalid twinkle speed {} / depth {}",
                self.twinkle_speed, self.twinkle_depth
            ));
        }
        Ok(())
    }
}

fn is_valid_range(range: &Range<f32>) -> bool {
    range.start.is_finite() && range.end.is_finite() && range.start < range.end
}

/// Star attributes packed as parallel arrays, one entry per star
#[derive(Debug, Clone, PartialEq)]
pub struct Starfield {
    pub positions: Vec<[f32; 3]>,
    pub sizes: Vec<f32>,
    pub colors: Vec<[f32; 3]>,
    pub opacities: Vec<f32>,
    base_opacities: Vec<f32>,
}

/// Camera-independent quads, four vertices per star
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl Starfield {
    /// Build from configuration, seeding the generator if a seed is set
    pub fn from_config(config: &StarfieldConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::generate(config, &mut rng))
    }

    /// Scatter `config.count` stars using `rng`
    ///
    /// Directions are uniform over the sphere: `θ = 2π·u`, `φ = acos(2v - 1)`.
    pub fn generate<R: Rng + ?Sized>(config: &StarfieldConfig, rng: &mut R) -> Self {
        let count = config.count;
        let mut positions = Vec::with_capacity(count);
        let mut sizes = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        let mut opacities = Vec::with_capacity(count);

        for _ in 0..count {
            let theta = TAU * rng.gen::<f32>();
            let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
            let (sin_phi, cos_phi) = phi.sin_cos();
            let (sin_theta, cos_theta) = theta.sin_cos();

            positions.push([
                config.radius * sin_phi * cos_theta,
                config.radius * sin_phi * sin_theta,
                config.radius * cos_phi,
            ]);
            sizes.push(rng.gen_range(config.size_range.clone()));
            colors.push(STAR_PALETTE[rng.gen_range(0..STAR_PALETTE.len())]);
            opacities.push(rng.gen_range(config.opacity_range.clone()));
        }

        Self {
            positions,
            sizes,
            colors,
            base_opacities: opacities.clone(),
            opacities,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn base_opacities(&self) -> &[f32] {
        &self.base_opacities
    }

    /// Modulate every opacity for time `elapsed` (seconds)
    ///
    /// Each star gets a fixed phase offset so the field does not pulse in
    /// unison. Opacities stay within `[base * (1 - depth), base]`.
    pub fn twinkle(&mut self, elapsed: f32, speed: f32, depth: f32) {
        for (i, (opacity, base)) in self
            .opacities
            .iter_mut()
            .zip(&self.base_opacities)
            .enumerate()
        {
            let wave = 0.5 + 0.5 * (elapsed * speed + star_phase(i)).sin();
            *opacity = base * (1.0 - depth * wave);
        }
    }

    /// RGBA per sprite vertex, alpha carrying the current opacity
    pub fn sprite_colors(&self) -> Vec<[f32; 4]> {
        self.colors
            .iter()
            .zip(&self.opacities)
            .flat_map(|(c, a)| [[c[0], c[1], c[2], *a]; 4])
            .collect()
    }

    /// Expand each star into a quad facing the origin, `size * scale` wide
    pub fn sprite_mesh(&self, scale: f32) -> SpriteMesh {
        let count = self.len();
        let mut positions = Vec::with_capacity(count * 4);
        let mut normals = Vec::with_capacity(count * 4);
        let mut uvs = Vec::with_capacity(count * 4);
        let mut indices = Vec::with_capacity(count * 6);

        for (i, (position, size)) in self.positions.iter().zip(&self.sizes).enumerate() {
            let center = Vec3::from_array(*position);
            let normal = (-center).normalize_or(Vec3::Z);
            let reference = if normal.y.abs() > 0.99 { Vec3::X } else { Vec3::Y };
            let right = reference.cross(normal).normalize();
            let up = normal.cross(right);
            let half = 0.5 * size * scale;

            for (dx, dy, uv) in [
                (-1.0, -1.0, [0.0, 1.0]),
                (1.0, -1.0, [1.0, 1.0]),
                (1.0, 1.0, [1.0, 0.0]),
                (-1.0, 1.0, [0.0, 0.0]),
            ] {
                let corner = center + right * (dx * half) + up * (dy * half);
                positions.push(corner.to_array());
                normals.push(normal.to_array());
                uvs.push(uv);
            }

            let base = (i * 4) as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        SpriteMesh {
            positions,
            normals,
            uvs,
            colors: self.sprite_colors(),
            indices,
        }
    }
}

fn star_phase(index: usize) -> f32 {
    const GOLDEN: f32 = 0.618_034;
    (index as f32 * GOLDEN).fract() * TAU
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(count: usize, seed: u64) -> Starfield {
        let config = StarfieldConfig {
            count,
            seed: Some(seed),
            ..StarfieldConfig::default()
        };
        Starfield::from_config(&config).unwrap()
    }

    #[test]
    fn test_generate_default_field() {
        let field = seeded(STAR_COUNT, 7);
        assert_eq!(field.len(), 4000);
        assert_eq!(field.sizes.len(), 4000);
        assert_eq!(field.colors.len(), 4000);
        assert_eq!(field.opacities.len(), 4000);

        for position in &field.positions {
            let distance = Vec3::from_array(*position).length();
            assert!((distance - 100.0).abs() < 1e-3, "star at distance {distance}");
        }
        assert!(field.sizes.iter().all(|s| (1.0..1.6).contains(s)));
        assert!(field.opacities.iter().all(|o| (0.2..1.0).contains(o)));
        assert!(field.colors.iter().all(|c| STAR_PALETTE.contains(c)));
    }

    #[test]
    fn test_seed_is_reproducible() {
        assert_eq!(seeded(200, 42), seeded(200, 42));
        assert_ne!(seeded(200, 42).positions, seeded(200, 43).positions);
    }

    #[test]
    fn test_directions_cover_both_hemispheres() {
        let field = seeded(2000, 3);
        let north = field.positions.iter().filter(|p| p[2] > 0.0).count();
        // Uniform sampling puts roughly half the stars on each side
        assert!((800..1200).contains(&north), "north count {north}");
    }

    #[test]
    fn test_validate() {
        assert!(StarfieldConfig::default().validate().is_ok());

        let cases = [
            StarfieldConfig { count: 0, ..StarfieldConfig::default() },
            StarfieldConfig { radius: -1.0, ..StarfieldConfig::default() },
            StarfieldConfig { size_range: 1.6..1.0, ..StarfieldConfig::default() },
            StarfieldConfig { opacity_range: 0.2..1.5, ..StarfieldConfig::default() },
            StarfieldConfig { twinkle_depth: 2.0, ..StarfieldConfig::default() },
        ];
        for config in cases {
            assert!(matches!(
                Starfield::from_config(&config),
                Err(ConfigurationError::Starfield(_))
            ));
        }
    }

    #[test]
    fn test_twinkle_stays_in_band() {
        let mut field = seeded(500, 11);
        let base = field.base_opacities().to_vec();
        for t in [0.0, 0.4, 1.3, 9.7] {
            field.twinkle(t, 2.0, 0.5);
            for (opacity, base) in field.opacities.iter().zip(&base) {
                assert!(*opacity <= *base + 1e-6);
                assert!(*opacity >= base * 0.5 - 1e-6);
            }
        }
        field.twinkle(3.0, 2.0, 0.0);
        assert_eq!(field.opacities, base);
    }

    #[test]
    fn test_sprite_mesh() {
        let field = seeded(10, 5);
        let mesh = field.sprite_mesh(0.5);
        assert_eq!(mesh.positions.len(), 40);
        assert_eq!(mesh.colors.len(), 40);
        assert_eq!(mesh.indices.len(), 60);
        assert!(mesh.indices.iter().all(|&i| i < 40));

        // Each quad is centred on its star and faces the origin
        for (star, quad) in field.positions.iter().zip(mesh.positions.chunks(4)) {
            let center = quad.iter().map(|p| Vec3::from_array(*p)).sum::<Vec3>() / 4.0;
            assert!((center - Vec3::from_array(*star)).length() < 1e-3);
        }
        for (star, normal) in field.positions.iter().zip(mesh.normals.chunks(4)) {
            let facing = Vec3::from_array(normal[0]).dot(Vec3::from_array(*star).normalize());
            assert!((facing + 1.0).abs() < 1e-5);
        }
        assert_eq!(mesh.colors[0][3], field.opacities[0]);
    }
}
