//! Orbis Core - engine-independent model of the orbital scene
//!
//! This crate provides:
//! - Celestial bodies (planets, the Earth and its clouds, a sun) and their
//!   sphere geometry and materials
//! - Procedural starfield generation
//! - A retained scene graph and camera model
//! - The animation driver that builds the scene and advances it per frame
//! - TOML scene configuration

pub mod body;
pub mod color;
pub mod config;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod material;
pub mod motion;
pub mod scene;
pub mod starfield;
pub mod texture;

#[cfg(test)]
pub(crate) mod testing;

pub use body::{BodyConfig, BodyMesh, CelestialBody, CloudShell, Earth, EarthConfig, Planet, Sun, SunConfig};
pub use color::Rgb;
pub use config::{BodiesConfig, ConfigError, PlacedBody, SceneConfig, Viewport};
pub use driver::{
    build_scene, AnimationDriver, DriverState, FrameOutcome, LoopHandle, Renderer, SceneContext,
    SceneNodes,
};
pub use error::{AssetLoadError, ConfigurationError, SceneError};
pub use geometry::SphereGeometry;
pub use material::{MaterialPolicy, SurfaceMaterial};
pub use motion::{AnimationState, MotionConfig};
pub use scene::{Camera, Light, LightKind, NodeId, NodeKind, SceneGraph, SceneNode, Transform};
pub use starfield::{SpriteMesh, Starfield, StarfieldConfig};
pub use texture::TextureLoader;
