//! Scene configuration loading and validation

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::body::{BodyConfig, EarthConfig, SunConfig};
use crate::color::Rgb;
use crate::error::ConfigurationError;
use crate::material::MaterialPolicy;
use crate::motion::MotionConfig;
use crate::starfield::StarfieldConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigurationError),
}

/// Complete description of the orbital scene
///
/// Sections missing from a file keep their defaults, including the default
/// Earth and Moon. `[bodies]` switches either of them off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub viewport: Viewport,
    pub camera: CameraConfig,
    pub bodies: BodiesConfig,
    /// Earth and its cloud layer; omitted from the scene when absent
    pub earth: Option<EarthConfig>,
    pub moon: Option<BodyConfig>,
    /// Additional textured bodies placed at fixed positions
    pub planets: Vec<PlacedBody>,
    pub sun: Option<SunConfig>,
    pub starfield: StarfieldConfig,
    pub motion: MotionConfig,
    pub lighting: LightingConfig,
    pub materials: MaterialsConfig,
    pub assets: AssetsConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            camera: CameraConfig::default(),
            bodies: BodiesConfig::default(),
            earth: Some(default_earth()),
            moon: Some(default_moon()),
            planets: Vec::new(),
            sun: None,
            starfield: StarfieldConfig::default(),
            motion: MotionConfig::default(),
            lighting: LightingConfig::default(),
            materials: MaterialsConfig::default(),
            assets: AssetsConfig::default(),
        }
    }
}

fn default_earth() -> EarthConfig {
    EarthConfig {
        body: BodyConfig::new("earth", 5.0)
            .with_surface("textures/earth_day.jpg")
            .with_relief("textures/earth_bump.jpg", None)
            .with_specular("textures/earth_specular.jpg", None)
            .with_shininess(10.0),
        cloud_texture: "textures/earth_clouds.png".to_string(),
    }
}

fn default_moon() -> BodyConfig {
    BodyConfig::new("moon", 1.36)
        .with_surface("textures/moon.jpg")
        .with_relief("textures/moon_bump.jpg", None)
}

impl SceneConfig {
    /// Load from a TOML file, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content)?;
            info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        } else {
            info!(
                path = %path.display(),
                "Configuration file not found, using defaults"
            );
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.apply_body_switches();
        config.validate()?;
        Ok(config)
    }

    /// Serialize; an absent Earth or Moon is written as switched off
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        let mut out = self.clone();
        out.bodies.earth &= self.earth.is_some();
        out.bodies.moon &= self.moon.is_some();
        Ok(toml::to_string_pretty(&out)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml_string()?)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Drop the default bodies that `[bodies]` switches off
    fn apply_body_switches(&mut self) {
        if !self.bodies.earth {
            self.earth = None;
        }
        if !self.bodies.moon {
            self.moon = None;
        }
    }

    /// Check every section; bodies are checked before anything else
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if let Some(earth) = &self.earth {
            earth.body.validate()?;
            if earth.cloud_texture.trim().is_empty() {
                return Err(ConfigurationError::EmptyTexturePath {
                    body: earth.body.name.clone(),
                    field: "cloud texture",
                });
            }
        }
        if let Some(moon) = &self.moon {
            moon.validate()?;
        }
        for planet in &self.planets {
            planet.body.validate()?;
        }
        if let Some(sun) = &self.sun {
            if !(sun.radius.is_finite() && sun.radius > 0.0) {
                return Err(ConfigurationError::InvalidRadius {
                    body: sun.name.clone(),
                    radius: sun.radius,
                });
            }
        }

        self.starfield.validate()?;
        self.viewport.validate()?;
        self.camera.validate()?;
        validate_motion(&self.motion)?;
        self.assets.validate()?;
        Ok(())
    }
}

fn validate_motion(motion: &MotionConfig) -> Result<(), ConfigurationError> {
    let fields = [
        ("earth_spin", motion.earth_spin),
        ("cloud_spin", motion.cloud_spin),
        ("moon_spin", motion.moon_spin),
        ("moon_orbit_step", motion.moon_orbit_step),
        ("moon_orbit_radius", motion.moon_orbit_radius),
        ("initial_moon_phase", motion.initial_moon_phase),
    ];
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some(&(field, value)) => Err(ConfigurationError::InvalidSetting {
            section: "motion",
            field,
            reason: format!("must be finite, got {value}"),
        }),
        None => Ok(()),
    }
}

/// Which of the default bodies a configuration file keeps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodiesConfig {
    pub earth: bool,
    pub moon: bool,
}

impl Default for BodiesConfig {
    fn default() -> Self {
        Self {
            earth: true,
            moon: true,
        }
    }
}

/// Size of the render surface in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidViewport {
                width: self.width,
                height: self.height,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub target: [f32; 3],
    /// Mouse drag and wheel orbit the camera around its target
    #[serde(default = "default_true")]
    pub orbit_controls: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
            position: default_camera_position(),
            target: [0.0; 3],
            orbit_controls: true,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |field, reason: String| {
            Err(ConfigurationError::InvalidSetting {
                section: "camera",
                field,
                reason,
            })
        };
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return invalid(
                "fov_degrees",
                format!("must be in (0, 180), got {}", self.fov_degrees),
            );
        }
        if !(self.near.is_finite() && self.near > 0.0) {
            return invalid("near", format!("must be positive, got {}", self.near));
        }
        if !(self.far.is_finite() && self.far > self.near) {
            return invalid(
                "far",
                format!("must exceed near ({}), got {}", self.near, self.far),
            );
        }
        Ok(())
    }
}

fn default_fov() -> f32 {
    75.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 8.0, 24.0]
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingConfig {
    #[serde(default = "default_ambient_color")]
    pub ambient_color: Rgb,
    #[serde(default = "default_ambient_intensity")]
    pub ambient_intensity: f32,
    #[serde(default = "default_key_color")]
    pub key_color: Rgb,
    #[serde(default = "default_key_intensity")]
    pub key_intensity: f32,
    /// Key light shines from here towards the origin
    #[serde(default = "default_key_position")]
    pub key_position: [f32; 3],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: default_ambient_color(),
            ambient_intensity: default_ambient_intensity(),
            key_color: default_key_color(),
            key_intensity: default_key_intensity(),
            key_position: default_key_position(),
        }
    }
}

fn default_ambient_color() -> Rgb {
    Rgb::from_hex(0x333333)
}

fn default_ambient_intensity() -> f32 {
    1.0
}

fn default_key_color() -> Rgb {
    Rgb::WHITE
}

fn default_key_intensity() -> f32 {
    1.0
}

fn default_key_position() -> [f32; 3] {
    [50.0, 20.0, 30.0]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialsConfig {
    /// Use configured relief scale and specular tint instead of the fixed values
    #[serde(default)]
    pub honor_configured: bool,
}

impl MaterialsConfig {
    pub fn policy(&self) -> MaterialPolicy {
        if self.honor_configured {
            MaterialPolicy::Configured
        } else {
            MaterialPolicy::Fixed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory texture paths are resolved against
    #[serde(default = "default_asset_root")]
    pub root: String,
    /// Give up on the scene build if textures are still loading after this
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: f64,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_asset_root(),
            load_timeout_secs: default_load_timeout(),
        }
    }
}

impl AssetsConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.load_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.load_timeout_secs.is_finite() && self.load_timeout_secs > 0.0 {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidSetting {
                section: "assets",
                field: "load_timeout_secs",
                reason: format!("must be positive, got {}", self.load_timeout_secs),
            })
        }
    }
}

fn default_asset_root() -> String {
    "assets".to_string()
}

fn default_load_timeout() -> f64 {
    30.0
}

/// A textured body with a fixed world position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedBody {
    #[serde(flatten)]
    pub body: BodyConfig,
    #[serde(default)]
    pub position: [f32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = SceneConfig::default();
        config.validate().unwrap();
        assert_eq!(config.earth.as_ref().unwrap().body.radius, 5.0);
        assert_eq!(config.moon.as_ref().unwrap().radius, 1.36);
        assert_eq!(config.materials.policy(), MaterialPolicy::Fixed);
        assert_eq!(config.assets.load_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_sections() {
        let config = SceneConfig::from_toml_str(
            r#"
            [camera]
            fov_degrees = 60.0

            [bodies]
            moon = false

            [earth]
            name = "earth"
            radius = 6.0
            surface_texture = "day.jpg"
            cloud_texture = "clouds.png"

            [[planets]]
            name = "mars"
            radius = 2.0
            surface_texture = "mars.jpg"
            position = [30.0, 0.0, -10.0]

            [starfield]
            seed = 9
            twinkle = true

            [materials]
            honor_configured = true
            "#,
        )
        .unwrap();

        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.near, 0.1);
        let earth = config.earth.unwrap();
        assert_eq!(earth.body.radius, 6.0);
        assert_eq!(earth.cloud_texture, "clouds.png");
        assert!(config.moon.is_none());
        assert_eq!(config.planets.len(), 1);
        assert_eq!(config.planets[0].body.name, "mars");
        assert_eq!(config.planets[0].position, [30.0, 0.0, -10.0]);
        assert_eq!(config.starfield.seed, Some(9));
        assert!(config.starfield.twinkle);
        assert_eq!(config.starfield.count, 4000);
        assert_eq!(config.materials.policy(), MaterialPolicy::Configured);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = SceneConfig::from_toml_str(
            r#"
            [moon]
            name = "moon"
            radius = -1.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigurationError::InvalidRadius { .. })
        ));

        let err = SceneConfig::from_toml_str("[camera]\nnear = 10.0\nfar = 5.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigurationError::InvalidSetting { section: "camera", .. })
        ));

        let err = SceneConfig::from_toml_str("[viewport]\nwidth = 0.0\nheight = 10.0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigurationError::InvalidViewport { .. })
        ));
    }

    #[test]
    fn test_partial_file_keeps_default_bodies() {
        assert_eq!(SceneConfig::from_toml_str("").unwrap(), SceneConfig::default());

        let config = SceneConfig::from_toml_str("[motion]\nearth_spin = 0.01\n").unwrap();
        assert!(config.earth.is_some());
        assert!(config.moon.is_some());
        assert_eq!(config.motion.earth_spin, 0.01);
    }

    #[test]
    fn test_bodies_can_be_switched_off() {
        let config = SceneConfig::from_toml_str("[bodies]\nearth = false\n").unwrap();
        assert!(config.earth.is_none());
        assert!(config.moon.is_some());

        let config =
            SceneConfig::from_toml_str("[bodies]\nearth = false\nmoon = false\n").unwrap();
        assert!(config.earth.is_none());
        assert!(config.moon.is_none());
        assert!(!config.bodies.moon);
    }

    #[test]
    fn test_parse_error() {
        let err = SceneConfig::from_toml_str("[camera\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SceneConfig::load(&dir.path().join("orbis.toml")).unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[motion]\nearth_spin = 0.01\n\n[assets]\nload_timeout_secs = 5.0").unwrap();

        let config = SceneConfig::load(file.path()).unwrap();
        assert_eq!(config.earth, SceneConfig::default().earth);
        assert_eq!(config.moon, SceneConfig::default().moon);
        assert_eq!(config.motion.earth_spin, 0.01);
        assert_eq!(config.motion.cloud_spin, 0.0005);
        assert_eq!(config.assets.load_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orbis.toml");
        let mut config = SceneConfig::default();
        config.starfield.seed = Some(1234);
        config.save(&path).unwrap();

        assert_eq!(SceneConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_save_without_moon_reloads_without_moon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orbis.toml");
        let config = SceneConfig {
            moon: None,
            ..SceneConfig::default()
        };
        config.save(&path).unwrap();

        let reloaded = SceneConfig::load(&path).unwrap();
        assert!(reloaded.moon.is_none());
        assert!(reloaded.earth.is_some());
    }
}
