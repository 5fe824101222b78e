//! Texture loading seam between the body model and the rendering engine

use std::future::Future;

use crate::error::AssetLoadError;

/// Asynchronous texture source
///
/// `load` resolves once the pixel data behind `path` is usable by the
/// engine. The returned texture type is whatever the engine binds into a
/// material (a Bevy `Handle<Image>`, a path in tests, ...).
pub trait TextureLoader {
    type Texture: Clone + std::fmt::Debug;

    fn load(&self, path: &str) -> impl Future<Output = Result<Self::Texture, AssetLoadError>>;
}
