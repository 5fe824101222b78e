//! Error taxonomy shared by body construction, asset loading and the driver

use std::time::Duration;
use thiserror::Error;

/// Invalid construction parameters, reported before any asynchronous work
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("{body}: radius must be a positive finite number, got {radius}")]
    InvalidRadius { body: String, radius: f32 },
    #[error("{body}: {field} path is empty")]
    EmptyTexturePath { body: String, field: &'static str },
    #[error("{body}: shininess must be non-negative, got {value}")]
    NegativeShininess { body: String, value: f32 },
    #[error("{body}: {field} must be a finite number, got {value}")]
    NonFinite {
        body: String,
        field: &'static str,
        value: f32,
    },
    #[error("starfield: {0}")]
    Starfield(String),
    #[error("viewport must be non-empty, got {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },
    #[error("[{section}] {field}: {reason}")]
    InvalidSetting {
        section: &'static str,
        field: &'static str,
        reason: String,
    },
}

/// A texture that could not be made available to a material
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetLoadError {
    #[error("failed to load texture {path}: {reason}")]
    Failed { path: String, reason: String },
    #[error("texture {path} did not finish loading within {timeout:?}")]
    TimedOut { path: String, timeout: Duration },
}

impl AssetLoadError {
    pub fn path(&self) -> &str {
        match self {
            Self::Failed { path, .. } | Self::TimedOut { path, .. } => path,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    AssetLoad(#[from] AssetLoadError),
    #[error("cannot {action} while the driver is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}
