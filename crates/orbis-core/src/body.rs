//! Celestial bodies: configuration, validation and mesh construction
//!
//! Every body is a sphere. Geometry is derived from the radius once, when the
//! body is created; the material is assembled asynchronously because it waits
//! on texture loads. Variants share behaviour through the [`CelestialBody`]
//! trait and composition:
//! - [`Planet`] - any textured body (surface, relief and specular maps)
//! - [`CloudShell`] - translucent sphere layered over another body
//! - [`Earth`] - a planet plus its cloud shell
//! - [`Sun`] - flat-coloured body with no textures

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::color::Rgb;
use crate::error::{AssetLoadError, ConfigurationError};
use crate::geometry::SphereGeometry;
use crate::material::{MaterialPolicy, SurfaceMaterial, FIXED_BUMP_SCALE, FIXED_SPECULAR_TINT};
use crate::texture::TextureLoader;

/// Gap between a planet's surface and its cloud shell
pub const CLOUD_SHELL_OFFSET: f32 = 0.006;

/// Declarative description of a textured body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub name: String,
    pub radius: f32,
    /// Albedo texture
    #[serde(default)]
    pub surface_texture: Option<String>,
    /// Height map used for bump shading
    #[serde(default)]
    pub relief_texture: Option<String>,
    #[serde(default)]
    pub relief_scale: Option<f32>,
    /// Map of specular intensity (bright = shiny)
    #[serde(default)]
    pub specular_texture: Option<String>,
    #[serde(default)]
    pub specular_tint: Option<Rgb>,
    #[serde(default)]
    pub shininess: Option<f32>,
}

impl BodyConfig {
    pub fn new(name: impl Into<String>, radius: f32) -> Self {
        Self {
            name: name.into(),
            radius,
            surface_texture: None,
            relief_texture: None,
            relief_scale: None,
            specular_texture: None,
            specular_tint: None,
            shininess: None,
        }
    }

    pub fn with_surface(mut self, path: impl Into<String>) -> Self {
        self.surface_texture = Some(path.into());
        self
    }

    pub fn with_relief(mut self, path: impl Into<String>, scale: Option<f32>) -> Self {
        self.relief_texture = Some(path.into());
        self.relief_scale = scale;
        self
    }

    pub fn with_specular(mut self, path: impl Into<String>, tint: Option<Rgb>) -> Self {
        self.specular_texture = Some(path.into());
        self.specular_tint = tint;
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = Some(shininess);
        self
    }

    /// Check every field that could only fail later as degenerate output
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_radius(&self.name, self.radius)?;
        validate_path(&self.name, "surface texture", self.surface_texture.as_deref())?;
        validate_path(&self.name, "relief texture", self.relief_texture.as_deref())?;
        validate_path(&self.name, "specular texture", self.specular_texture.as_deref())?;

        if let Some(scale) = self.relief_scale {
            if !scale.is_finite() {
                return Err(ConfigurationError::NonFinite {
                    body: self.name.clone(),
                    field: "relief scale",
                    value: scale,
                });
            }
        }

        if let Some(shininess) = self.shininess {
            if !shininess.is_finite() {
                return Err(ConfigurationError::NonFinite {
                    body: self.name.clone(),
                    field: "shininess",
                    value: shininess,
                });
            }
            if shininess < 0.0 {
                return Err(ConfigurationError::NegativeShininess {
                    body: self.name.clone(),
                    value: shininess,
                });
            }
        }

        Ok(())
    }
}

fn validate_radius(body: &str, radius: f32) -> Result<(), ConfigurationError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidRadius {
            body: body.to_string(),
            radius,
        })
    }
}

fn validate_path(
    body: &str,
    field: &'static str,
    path: Option<&str>,
) -> Result<(), ConfigurationError> {
    match path {
        Some(path) if path.trim().is_empty() => Err(ConfigurationError::EmptyTexturePath {
            body: body.to_string(),
            field,
        }),
        _ => Ok(()),
    }
}

/// Geometry and material ready to be placed in a scene
#[derive(Debug, Clone, PartialEq)]
pub struct BodyMesh<T> {
    pub name: String,
    pub geometry: Arc<SphereGeometry>,
    pub material: SurfaceMaterial<T>,
}

/// Shared capability of every renderable body
pub trait CelestialBody {
    fn name(&self) -> &str;

    fn geometry(&self) -> Arc<SphereGeometry>;

    /// Resolve the body's material, waiting on each texture it needs
    fn material<L: TextureLoader>(
        &self,
        loader: &L,
    ) -> impl Future<Output = Result<SurfaceMaterial<L::Texture>, AssetLoadError>>;

    fn radius(&self) -> f32 {
        self.geometry().radius
    }

    fn mesh<L: TextureLoader>(
        &self,
        loader: &L,
    ) -> impl Future<Output = Result<BodyMesh<L::Texture>, AssetLoadError>> {
        async move {
            let material = self.material(loader).await?;
            Ok(BodyMesh {
                name: self.name().to_string(),
                geometry: self.geometry(),
                material,
            })
        }
    }
}

async fn load_texture<L: TextureLoader>(
    loader: &L,
    body: &str,
    role: &'static str,
    path: &str,
) -> Result<L::Texture, AssetLoadError> {
    debug!(body, role, path, "Loading texture");
    let texture = loader.load(path).await?;
    debug!(body, role, path, "Texture ready");
    Ok(texture)
}

/// Textured body with optional relief and specular maps
#[derive(Debug, Clone)]
pub struct Planet {
    config: BodyConfig,
    policy: MaterialPolicy,
    geometry: Arc<SphereGeometry>,
}

impl Planet {
    pub fn new(config: BodyConfig) -> Result<Self, ConfigurationError> {
        Self::with_policy(config, MaterialPolicy::default())
    }

    pub fn with_policy(
        config: BodyConfig,
        policy: MaterialPolicy,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let geometry = Arc::new(SphereGeometry::new(config.radius));
        Ok(Self {
            config,
            policy,
            geometry,
        })
    }

    pub fn config(&self) -> &BodyConfig {
        &self.config
    }

    pub fn policy(&self) -> MaterialPolicy {
        self.policy
    }
}

impl CelestialBody for Planet {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn geometry(&self) -> Arc<SphereGeometry> {
        Arc::clone(&self.geometry)
    }

    fn material<L: TextureLoader>(
        &self,
        loader: &L,
    ) -> impl Future<Output = Result<SurfaceMaterial<L::Texture>, AssetLoadError>> {
        async move {
            let config = &self.config;
            let name = config.name.as_str();
            let mut material = SurfaceMaterial::default();

            if let Some(path) = &config.surface_texture {
                material.albedo_map = Some(load_texture(loader, name, "surface", path).await?);
            }

            if let Some(path) = &config.relief_texture {
                material.bump_map = Some(load_texture(loader, name, "relief", path).await?);
                material.bump_scale = self.policy.bump_scale(config.relief_scale);
                if let Some(scale) = config.relief_scale {
                    if material.bump_scale != scale {
                        warn!(
                            body = name,
                            configured = scale,
                            applied = FIXED_BUMP_SCALE,
                            "Configured relief scale ignored"
                        );
                    }
                }
            }

            if let Some(path) = &config.specular_texture {
                material.specular_map = Some(load_texture(loader, name, "specular", path).await?);
                material.specular_tint = self.policy.specular_tint(config.specular_tint);
                if let Some(tint) = config.specular_tint {
                    if material.specular_tint != tint {
                        warn!(
                            body = name,
                            configured = ?tint.to_array(),
                            applied = ?FIXED_SPECULAR_TINT.to_array(),
                            "Configured specular tint ignored"
                        );
                    }
                }
            }

            if let Some(shininess) = config.shininess {
                material.shininess = shininess;
            }

            Ok(material)
        }
    }
}

/// Translucent sphere whose opacity comes from a texture
#[derive(Debug, Clone)]
pub struct CloudShell {
    name: String,
    texture: String,
    geometry: Arc<SphereGeometry>,
}

impl CloudShell {
    /// Shell sitting [`CLOUD_SHELL_OFFSET`] above a body of `base_radius`
    pub fn around(
        name: impl Into<String>,
        base_radius: f32,
        texture: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        let texture = texture.into();
        validate_radius(&name, base_radius)?;
        validate_path(&name, "cloud texture", Some(&texture))?;
        Ok(Self {
            geometry: Arc::new(SphereGeometry::new(base_radius + CLOUD_SHELL_OFFSET)),
            name,
            texture,
        })
    }

    pub fn texture(&self) -> &str {
        &self.texture
    }
}

impl CelestialBody for CloudShell {
    fn name(&self) -> &str {
        &self.name
    }

    fn geometry(&self) -> Arc<SphereGeometry> {
        Arc::clone(&self.geometry)
    }

    fn material<L: TextureLoader>(
        &self,
        loader: &L,
    ) -> impl Future<Output = Result<SurfaceMaterial<L::Texture>, AssetLoadError>> {
        async move {
            let alpha = load_texture(loader, &self.name, "clouds", &self.texture).await?;
            Ok(SurfaceMaterial {
                alpha_map: Some(alpha),
                transparent: true,
                ..SurfaceMaterial::default()
            })
        }
    }
}

/// Earth configuration: a planet plus the texture of its cloud layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthConfig {
    #[serde(flatten)]
    pub body: BodyConfig,
    pub cloud_texture: String,
}

/// A planet and its cloud shell, built as two independent bodies
#[derive(Debug, Clone)]
pub struct Earth {
    surface: Planet,
    clouds: CloudShell,
}

impl Earth {
    pub fn new(config: EarthConfig) -> Result<Self, ConfigurationError> {
        Self::with_policy(config, MaterialPolicy::default())
    }

    pub fn with_policy(
        config: EarthConfig,
        policy: MaterialPolicy,
    ) -> Result<Self, ConfigurationError> {
        config.body.validate()?;
        let clouds = CloudShell::around(
            format!("{}-clouds", config.body.name),
            config.body.radius,
            config.cloud_texture,
        )?;
        let surface = Planet::with_policy(config.body, policy)?;
        Ok(Self { surface, clouds })
    }

    pub fn surface(&self) -> &Planet {
        &self.surface
    }

    pub fn clouds(&self) -> &CloudShell {
        &self.clouds
    }

    pub fn cloud_geometry(&self) -> Arc<SphereGeometry> {
        self.clouds.geometry()
    }

    pub async fn cloud_material<L: TextureLoader>(
        &self,
        loader: &L,
    ) -> Result<SurfaceMaterial<L::Texture>, AssetLoadError> {
        self.clouds.material(loader).await
    }

    pub async fn cloud_mesh<L: TextureLoader>(
        &self,
        loader: &L,
    ) -> Result<BodyMesh<L::Texture>, AssetLoadError> {
        self.clouds.mesh(loader).await
    }
}

impl CelestialBody for Earth {
    fn name(&self) -> &str {
        self.surface.name()
    }

    fn geometry(&self) -> Arc<SphereGeometry> {
        self.surface.geometry()
    }

    fn material<L: TextureLoader>(
        &self,
        loader: &L,
    ) -> impl Future<Output = Result<SurfaceMaterial<L::Texture>, AssetLoadError>> {
        self.surface.material(loader)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunConfig {
    pub name: String,
    pub radius: f32,
    pub color: Rgb,
    /// World position of the body when attached to the scene
    pub position: [f32; 3],
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            name: "sun".to_string(),
            radius: 5.0,
            color: Rgb::from_hex(0xffdd55),
            position: [0.0, 0.0, -80.0],
        }
    }
}

/// Self-lit body with a flat base colour
#[derive(Debug, Clone)]
pub struct Sun {
    config: SunConfig,
    geometry: Arc<SphereGeometry>,
}

impl Sun {
    pub fn new(config: SunConfig) -> Result<Self, ConfigurationError> {
        validate_radius(&config.name, config.radius)?;
        Ok(Self {
            geometry: Arc::new(SphereGeometry::new(config.radius)),
            config,
        })
    }

    pub fn config(&self) -> &SunConfig {
        &self.config
    }
}

impl CelestialBody for Sun {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn geometry(&self) -> Arc<SphereGeometry> {
        Arc::clone(&self.geometry)
    }

    fn material<L: TextureLoader>(
        &self,
        _loader: &L,
    ) -> impl Future<Output = Result<SurfaceMaterial<L::Texture>, AssetLoadError>> {
        let color = self.config.color;
        async move {
            Ok(SurfaceMaterial {
                base_color: color,
                unlit: true,
                ..SurfaceMaterial::default()
            })
        }
    }
}
