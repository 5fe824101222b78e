//! Texture loading through Bevy's asset server

use bevy::prelude::*;
use orbis_core::{AssetLoadError, TextureLoader};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// [`TextureLoader`] that resolves once the asset server has the image ready
#[derive(Clone)]
pub struct BevyTextureLoader {
    asset_server: AssetServer,
    /// Path of the load currently being awaited
    current: Arc<Mutex<Option<String>>>,
}

impl BevyTextureLoader {
    pub fn new(asset_server: AssetServer) -> Self {
        Self {
            asset_server,
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Shared view of the in-flight path, readable while the build runs elsewhere
    pub fn current_path(&self) -> Arc<Mutex<Option<String>>> {
        Arc::clone(&self.current)
    }
}

impl TextureLoader for BevyTextureLoader {
    type Texture = Handle<Image>;

    fn load(&self, path: &str) -> impl Future<Output = Result<Handle<Image>, AssetLoadError>> {
        let asset_server = self.asset_server.clone();
        let handle: Handle<Image> = asset_server.load(path.to_string());
        if let Ok(mut current) = self.current.lock() {
            *current = Some(path.to_string());
        }
        let current = Arc::clone(&self.current);
        let path = path.to_string();

        async move {
            let result = asset_server.wait_for_asset(&handle).await;
            if let Ok(mut current) = current.lock() {
                *current = None;
            }
            result.map(|()| handle).map_err(|err| AssetLoadError::Failed {
                path,
                reason: format!("{err:?}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::tasks::{block_on, futures_lite::future};
    use std::time::Duration;

    #[test]
    fn test_missing_texture_fails_with_its_path() {
        let dir = std::env::temp_dir().join("orbis-loader-test");
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            AssetPlugin {
                file_path: dir.display().to_string(),
                ..default()
            },
        ))
        .init_asset::<Image>();

        let loader = BevyTextureLoader::new(app.world().resource::<AssetServer>().clone());
        let current = loader.current_path();
        let mut load = Box::pin(loader.load("textures/missing.png"));
        assert_eq!(
            current.lock().unwrap().as_deref(),
            Some("textures/missing.png")
        );

        let mut result = None;
        for _ in 0..500 {
            app.update();
            if let Some(done) = block_on(future::poll_once(&mut load)) {
                result = Some(done);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        match result {
            Some(Err(AssetLoadError::Failed { path, .. })) => {
                assert_eq!(path, "textures/missing.png")
            }
            other => panic!("expected a failed load, got {other:?}"),
        }
        assert!(current.lock().unwrap().is_none());
    }
}
