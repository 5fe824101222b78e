//! UV sphere tessellation shared by every body

use std::f32::consts::{PI, TAU};

/// Segments around and along every body sphere
pub const SPHERE_SEGMENTS: u32 = 64;

/// Triangulated UV sphere centred on the origin
///
/// Vertices are laid out row by row from the north pole (`+Y`) to the south
/// pole, `width_segments + 1` per row so the seam carries both `u = 0` and
/// `u = 1`. UVs use a top-left origin: `v = 0` is the north pole.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereGeometry {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl SphereGeometry {
    /// Sphere with the standard body tessellation
    pub fn new(radius: f32) -> Self {
        Self::with_segments(radius, SPHERE_SEGMENTS, SPHERE_SEGMENTS)
    }

    pub fn with_segments(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let row = width_segments + 1;
        let vertex_count = (row * (height_segments + 1)) as usize;

        let mut positions = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let (sin_theta, cos_theta) = (v * PI).sin_cos();

            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let (sin_phi, cos_phi) = (u * TAU).sin_cos();

                let normal = [-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta];
                positions.push([normal[0] * radius, normal[1] * radius, normal[2] * radius]);
                normals.push(normal);
                uvs.push([u, v]);
            }
        }

        let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;

                // The pole rows collapse to a single point, so each only
                // contributes one triangle per segment.
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self {
            radius,
            width_segments,
            height_segments,
            positions,
            normals,
            uvs,
            indices,
        }
    }

    /// Radius of the smallest origin-centred sphere enclosing every vertex
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt())
            .fold(0.0, f32::max)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
