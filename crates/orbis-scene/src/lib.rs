//! Orbis Scene - Bevy front end for the orbital scene
//!
//! The scene itself (bodies, starfield, motion) lives in `orbis-core`. This
//! crate loads its textures through the asset server, mirrors the scene graph
//! into ECS entities, drives it each frame, and adds the orbit camera and a
//! debug panel. Both the browser build and the desktop binary run the app
//! built by [`app::build_app`].

pub mod app;
pub mod assembly;
pub mod camera;
pub mod convert;
pub mod frame;
pub mod loader;
pub mod ui;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;
use orbis_core::SceneConfig;

pub use app::{build_app, run};
pub use assembly::{OrbitalScene, SceneSettings};
pub use camera::CameraSettings;

/// Plugin that builds the scene from a [`SceneConfig`] and animates it
pub struct OrbisScenePlugin {
    pub config: SceneConfig,
}

impl Plugin for OrbisScenePlugin {
    fn build(&self, app: &mut App) {
        use assembly::{poll_scene_build, spawn_scene_entities, start_scene_build, upload_dirty_starfield};
        use frame::{advance_scene, handle_resize};

        app.insert_resource(SceneSettings(self.config.clone()))
            .init_resource::<OrbitalScene>()
            .init_resource::<ui::DebugPanel>()
            .add_systems(Startup, (camera::setup_camera, start_scene_build))
            .add_systems(
                Update,
                (
                    poll_scene_build,
                    spawn_scene_entities.after(poll_scene_build),
                    advance_scene.after(spawn_scene_entities),
                    upload_dirty_starfield.after(advance_scene),
                    handle_resize.after(advance_scene),
                    camera::update_camera,
                ),
            )
            // The panel runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
            .add_systems(EguiPrimaryContextPass, ui::ui_system);
    }
}
