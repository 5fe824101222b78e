//! Conversions from the engine-independent scene model to Bevy assets

use bevy::asset::RenderAssetUsages;
use bevy::mesh::Indices;
use bevy::prelude::*;
use bevy::render::render_resource::{PrimitiveTopology, TextureFormat};
use orbis_core::{Rgb, SphereGeometry, SpriteMesh, SurfaceMaterial};

/// Minimum roughness StandardMaterial shades without artifacts
const MIN_ROUGHNESS: f32 = 0.089;

pub fn color(rgb: Rgb) -> Color {
    Color::srgb(rgb.r, rgb.g, rgb.b)
}

pub fn sphere_mesh(geometry: &SphereGeometry) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, geometry.positions.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, geometry.normals.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, geometry.uvs.clone())
        .with_inserted_indices(Indices::U32(geometry.indices.clone()));

    // Relief is applied through a parallax depth map, which needs tangents
    if let Err(e) = mesh.generate_tangents() {
        tracing::warn!("Could not generate sphere tangents: {:?}", e);
    }
    mesh
}

pub fn star_mesh(sprites: SpriteMesh) -> Mesh {
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, sprites.positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, sprites.normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, sprites.uvs)
        .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, sprites.colors)
        .with_inserted_indices(Indices::U32(sprites.indices))
}

/// Unlit, alpha-blended material whose colour comes from the star vertices
pub fn star_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::WHITE,
        unlit: true,
        alpha_mode: AlphaMode::Blend,
        cull_mode: None,
        double_sided: true,
        ..default()
    }
}

/// Blinn-Phong exponent to perceptual roughness
pub fn roughness_from_shininess(shininess: f32) -> f32 {
    (2.0 / (shininess.max(0.0) + 2.0)).sqrt().clamp(MIN_ROUGHNESS, 1.0)
}

/// Specular tint to StandardMaterial reflectance (`F0 = 0.16 * reflectance²`)
pub fn reflectance_from_tint(tint: Rgb) -> f32 {
    (tint.luminance().max(0.0) / 0.16).sqrt().clamp(0.0, 1.0)
}

/// Map a surface description onto a StandardMaterial
///
/// `alpha` is the cloud opacity texture, already converted with
/// [`alpha_from_green`]. `depth` is the relief map converted with
/// [`depth_from_height`]; without it no relief is applied. StandardMaterial
/// has no bump-mapping input, so relief becomes parallax occlusion with the
/// bump scale as its depth scale. This displaces texture lookups rather than
/// perturbing normals, which reads as bump shading at these small scales.
/// The specular map has no StandardMaterial slot; only its tint reaches the
/// shader, through reflectance.
pub fn standard_material(
    material: &SurfaceMaterial<Handle<Image>>,
    alpha: Option<Handle<Image>>,
    depth: Option<Handle<Image>>,
) -> StandardMaterial {
    let mut standard = StandardMaterial {
        base_color: color(material.base_color),
        base_color_texture: material.albedo_map.clone(),
        perceptual_roughness: roughness_from_shininess(material.shininess),
        reflectance: reflectance_from_tint(material.specular_tint),
        metallic: 0.0,
        unlit: material.unlit,
        ..default()
    };

    if material.bump_map.is_some() && depth.is_some() {
        standard.depth_map = depth;
        standard.parallax_depth_scale = material.bump_scale;
    }

    if material.transparent {
        standard.alpha_mode = AlphaMode::Blend;
        if alpha.is_some() {
            standard.base_color_texture = alpha;
        }
    }

    if material.unlit {
        standard.emissive = color(material.base_color).into();
    }

    standard
}

/// White image whose alpha is the source's green channel
///
/// Cloud maps store coverage as brightness; the renderer wants it as alpha.
pub fn alpha_from_green(source: &Image) -> Option<Image> {
    let mut image = source.convert(TextureFormat::Rgba8UnormSrgb)?;
    let data = image.data.as_mut()?;
    for pixel in data.chunks_exact_mut(4) {
        let coverage = pixel[1];
        pixel.copy_from_slice(&[255, 255, 255, coverage]);
    }
    Some(image)
}

/// Depth map from a height map: bright (high) becomes shallow
///
/// Relief textures store elevation, while the parallax depth map reads its
/// red channel as depth below the surface.
pub fn depth_from_height(source: &Image) -> Option<Image> {
    let mut image = source.convert(TextureFormat::Rgba8Unorm)?;
    let data = image.data.as_mut()?;
    for pixel in data.chunks_exact_mut(4) {
        let depth = 255 - pixel[0];
        pixel.copy_from_slice(&[depth, depth, depth, 255]);
    }
    Some(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::render_resource::{Extent3d, TextureDimension};
    use orbis_core::{BodyConfig, CelestialBody, Planet, Starfield, StarfieldConfig};

    #[test]
    fn test_sphere_mesh_attributes() {
        let geometry = SphereGeometry::with_segments(1.0, 8, 6);
        let mesh = sphere_mesh(&geometry);
        assert_eq!(mesh.count_vertices(), geometry.vertex_count());
        assert!(mesh.attribute(Mesh::ATTRIBUTE_TANGENT).is_some());
        assert_eq!(mesh.indices().map(|i| i.len()), Some(geometry.indices.len()));
    }

    #[test]
    fn test_star_mesh_carries_vertex_colors() {
        let config = StarfieldConfig {
            count: 12,
            seed: Some(2),
            ..StarfieldConfig::default()
        };
        let field = Starfield::from_config(&config).unwrap();
        let mesh = star_mesh(field.sprite_mesh(0.25));
        assert_eq!(mesh.count_vertices(), 48);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_COLOR).is_some());
    }

    #[test]
    fn test_roughness_and_reflectance() {
        assert_eq!(roughness_from_shininess(0.0), 1.0);
        assert!((roughness_from_shininess(30.0) - 0.25).abs() < 1e-6);
        assert_eq!(roughness_from_shininess(1.0e6), MIN_ROUGHNESS);
        assert_eq!(reflectance_from_tint(Rgb::GREY), 1.0);
        assert_eq!(reflectance_from_tint(Rgb::BLACK), 0.0);
    }

    #[test]
    fn test_standard_material_mapping() {
        let surface = SurfaceMaterial {
            albedo_map: Some(Handle::<Image>::default()),
            bump_map: Some(Handle::<Image>::default()),
            bump_scale: 0.005,
            ..SurfaceMaterial::default()
        };
        let standard = standard_material(&surface, None, Some(Handle::<Image>::default()));
        assert!(standard.base_color_texture.is_some());
        assert!(standard.depth_map.is_some());
        assert_eq!(standard.parallax_depth_scale, 0.005);
        assert!(matches!(standard.alpha_mode, AlphaMode::Opaque));

        // An unconverted relief map is not bound as depth
        assert!(standard_material(&surface, None, None).depth_map.is_none());

        let clouds = SurfaceMaterial::<Handle<Image>> {
            transparent: true,
            ..SurfaceMaterial::default()
        };
        assert!(matches!(
            standard_material(&clouds, None, None).alpha_mode,
            AlphaMode::Blend
        ));
    }

    #[test]
    fn test_sun_material_is_unlit() {
        let sun = SurfaceMaterial::<Handle<Image>> {
            base_color: Rgb::from_hex(0xffdd55),
            unlit: true,
            ..SurfaceMaterial::default()
        };
        let standard = standard_material(&sun, None, None);
        assert!(standard.unlit);
        assert!(standard.base_color_texture.is_none());
    }

    #[test]
    fn test_alpha_from_green() {
        let source = Image::new(
            Extent3d {
                width: 2,
                height: 1,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            vec![10, 200, 30, 255, 0, 0, 0, 255],
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::default(),
        );
        let converted = alpha_from_green(&source).unwrap();
        assert_eq!(
            converted.data.as_deref(),
            Some(&[255, 255, 255, 200, 255, 255, 255, 0][..])
        );
    }

    #[test]
    fn test_depth_from_height_inverts() {
        let source = Image::new(
            Extent3d {
                width: 2,
                height: 1,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            vec![255, 255, 255, 255, 40, 40, 40, 255],
            TextureFormat::Rgba8Unorm,
            RenderAssetUsages::default(),
        );
        let depth = depth_from_height(&source).unwrap();
        assert_eq!(depth.texture_descriptor.format, TextureFormat::Rgba8Unorm);
        assert_eq!(
            depth.data.as_deref(),
            Some(&[0, 0, 0, 255, 215, 215, 215, 255][..])
        );
    }

    #[test]
    fn test_planet_geometry_converts() {
        let planet = Planet::new(BodyConfig::new("moon", 1.36)).unwrap();
        let mesh = sphere_mesh(&planet.geometry());
        assert_eq!(mesh.count_vertices(), 65 * 65);
    }
}
