//! Per-frame driving of the scene and viewport tracking

use bevy::prelude::*;
use bevy::window::{RequestRedraw, WindowResized};
use orbis_core::{Camera as SceneCamera, Renderer, SceneGraph};

use crate::assembly::{to_bevy_transform, OrbitalScene, SceneNodeLink};

/// Entities linked to scene graph nodes, with their transforms
pub type LinkedTransforms<'w, 's> =
    Query<'w, 's, (&'static SceneNodeLink, &'static mut Transform)>;

/// Presents the scene graph by copying node transforms onto linked entities
///
/// Bevy renders every frame on its own; "drawing" here means making the ECS
/// match the graph.
pub struct EntityMirror<'a, 'w, 's> {
    transforms: &'a mut LinkedTransforms<'w, 's>,
}

impl<'a, 'w, 's> EntityMirror<'a, 'w, 's> {
    pub fn new(transforms: &'a mut LinkedTransforms<'w, 's>) -> Self {
        Self { transforms }
    }
}

impl Renderer<Handle<Image>> for EntityMirror<'_, '_, '_> {
    fn draw(&mut self, graph: &SceneGraph<Handle<Image>>, _camera: &SceneCamera) {
        for (link, mut transform) in self.transforms.iter_mut() {
            if let Some(node) = graph.transform(link.0) {
                *transform = to_bevy_transform(node);
            }
        }
    }
}

pub fn advance_scene(
    mut scene: ResMut<OrbitalScene>,
    time: Res<Time>,
    mut transforms: LinkedTransforms,
) {
    let OrbitalScene {
        driver, context, ..
    } = &mut *scene;
    let Some(context) = context.as_mut() else { return };

    let mut mirror = EntityMirror::new(&mut transforms);
    driver.tick(context, &mut mirror, time.delta_secs());
}

/// Keep the scene camera's aspect in step with the window
pub fn handle_resize(
    mut resized: MessageReader<WindowResized>,
    mut scene: ResMut<OrbitalScene>,
    mut transforms: LinkedTransforms,
    mut redraw: MessageWriter<RequestRedraw>,
) {
    // Only the final size of a burst of resizes matters
    let Some(last) = resized.read().last() else { return };
    let (width, height) = (last.width, last.height);

    let OrbitalScene {
        driver, context, ..
    } = &mut *scene;
    let Some(context) = context.as_mut() else { return };

    let mut mirror = EntityMirror::new(&mut transforms);
    match driver.resize(context, &mut mirror, width, height) {
        Ok(()) => {
            redraw.write(RequestRedraw);
        }
        Err(e) => tracing::debug!("Resize to {}x{} ignored: {}", width, height, e),
    }
}
