//! Asynchronous scene build and ECS mirroring of the scene graph

use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future, IoTaskPool, Task};
use orbis_core::scene::Transform as NodeTransform;
use orbis_core::{
    build_scene, AnimationDriver, AssetLoadError, LightKind, NodeId, NodeKind, SceneConfig,
    SceneContext, SceneError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::convert;
use crate::loader::BevyTextureLoader;

/// Illuminance of a unit-intensity key light, in lux
const KEY_LIGHT_LUX: f32 = 10_000.0;
/// Ambient brightness of a unit-intensity ambient light
const AMBIENT_BRIGHTNESS: f32 = 400.0;

/// Scene configuration the app was started with
#[derive(Resource, Debug, Clone)]
pub struct SceneSettings(pub SceneConfig);

/// The animation driver and, once built, the scene it drives
#[derive(Resource)]
pub struct OrbitalScene {
    pub driver: AnimationDriver,
    pub context: Option<SceneContext<Handle<Image>>>,
    /// Why the build failed, shown in the debug panel
    pub error: Option<String>,
    spawned: bool,
}

impl Default for OrbitalScene {
    fn default() -> Self {
        Self {
            driver: AnimationDriver::new(),
            context: None,
            error: None,
            spawned: false,
        }
    }
}

/// Build future running on the IO task pool
#[derive(Resource)]
pub struct SceneBuildTask {
    task: Task<Result<SceneContext<Handle<Image>>, SceneError>>,
    started: Duration,
    current_path: Arc<Mutex<Option<String>>>,
}

/// Links an entity to the scene graph node it mirrors
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneNodeLink(pub NodeId);

/// Marker for the starfield entity
#[derive(Component)]
pub struct StarfieldEntity;

pub fn start_scene_build(
    mut commands: Commands,
    settings: Res<SceneSettings>,
    asset_server: Res<AssetServer>,
    mut scene: ResMut<OrbitalScene>,
    time: Res<Time<Real>>,
) {
    if let Err(e) = scene.driver.begin_build() {
        tracing::error!("Cannot start scene build: {}", e);
        return;
    }

    let config = settings.0.clone();
    let loader = BevyTextureLoader::new(asset_server.clone());
    let current_path = loader.current_path();
    let task = IoTaskPool::get().spawn(async move { build_scene(&config, &loader).await });

    tracing::info!("Scene build started");
    commands.insert_resource(SceneBuildTask {
        task,
        started: time.elapsed(),
        current_path,
    });
}

/// Collect the finished build, or give up once the load timeout passes
pub fn poll_scene_build(
    mut commands: Commands,
    build: Option<ResMut<SceneBuildTask>>,
    mut scene: ResMut<OrbitalScene>,
    settings: Res<SceneSettings>,
    time: Res<Time<Real>>,
) {
    let Some(mut build) = build else { return };

    let result = match block_on(future::poll_once(&mut build.task)) {
        Some(result) => result,
        None => {
            let in_flight = build
                .current_path
                .lock()
                .ok()
                .and_then(|current| current.clone());
            let elapsed = time.elapsed().saturating_sub(build.started);
            match build_timeout(elapsed, settings.0.assets.load_timeout(), in_flight) {
                Some(err) => Err(SceneError::AssetLoad(err)),
                None => return,
            }
        }
    };

    // Dropping the task cancels a build that is still running
    commands.remove_resource::<SceneBuildTask>();

    match scene.driver.finish_build(result) {
        Ok(context) => scene.context = Some(context),
        Err(e) => scene.error = Some(e.to_string()),
    }
}

/// The error for a build still pending after `elapsed`, if it has run out of time
///
/// Between two loads nothing is in flight and the path is empty.
pub fn build_timeout(
    elapsed: Duration,
    timeout: Duration,
    in_flight: Option<String>,
) -> Option<AssetLoadError> {
    (elapsed >= timeout).then(|| AssetLoadError::TimedOut {
        path: in_flight.unwrap_or_default(),
        timeout,
    })
}

/// Spawn one entity per renderable node once the scene is built
pub fn spawn_scene_entities(
    mut commands: Commands,
    mut scene: ResMut<OrbitalScene>,
    settings: Res<SceneSettings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
) {
    if scene.spawned {
        return;
    }
    let Some(context) = scene.context.as_ref() else { return };

    let graph = &context.graph;
    let mut entities: HashMap<NodeId, Entity> = HashMap::new();

    for id in graph.walk() {
        let Some(node) = graph.node(id) else { continue };
        let transform = to_bevy_transform(&node.transform);

        let entity = match &node.kind {
            NodeKind::Body(body) => {
                let alpha = body
                    .material
                    .alpha_map
                    .as_ref()
                    .and_then(|handle| images.get(handle))
                    .and_then(convert::alpha_from_green)
                    .map(|image| images.add(image));
                if body.material.alpha_map.is_some() && alpha.is_none() {
                    tracing::warn!(body = %body.name, "Cloud texture could not be converted to alpha");
                }
                let depth = body
                    .material
                    .bump_map
                    .as_ref()
                    .and_then(|handle| images.get(handle))
                    .and_then(convert::depth_from_height)
                    .map(|image| images.add(image));
                if body.material.bump_map.is_some() && depth.is_none() {
                    tracing::warn!(body = %body.name, "Relief texture could not be converted to depth");
                }

                let entity = commands
                    .spawn((
                        Mesh3d(meshes.add(convert::sphere_mesh(&body.geometry))),
                        MeshMaterial3d(materials.add(convert::standard_material(&body.material, alpha, depth))),
                        transform,
                        SceneNodeLink(id),
                        Name::new(node.name.clone()),
                    ))
                    .id();
                Some(entity)
            }
            NodeKind::Starfield(field) => {
                let sprites = field.sprite_mesh(settings.0.starfield.sprite_scale);
                let entity = commands
                    .spawn((
                        Mesh3d(meshes.add(convert::star_mesh(sprites))),
                        MeshMaterial3d(materials.add(convert::star_material())),
                        transform,
                        SceneNodeLink(id),
                        StarfieldEntity,
                        Name::new(node.name.clone()),
                    ))
                    .id();
                Some(entity)
            }
            NodeKind::Light(light) => match light.kind {
                LightKind::Ambient => {
                    commands.insert_resource(AmbientLight {
                        color: convert::color(light.color),
                        brightness: light.intensity * AMBIENT_BRIGHTNESS,
                        ..default()
                    });
                    None
                }
                LightKind::Directional => {
                    // Lights keep their own orientation, so they are not linked
                    let entity = commands
                        .spawn((
                            DirectionalLight {
                                color: convert::color(light.color),
                                illuminance: light.intensity * KEY_LIGHT_LUX,
                                ..default()
                            },
                            Transform::from_translation(node.transform.position)
                                .looking_at(Vec3::ZERO, Vec3::Y),
                            Name::new(node.name.clone()),
                        ))
                        .id();
                    Some(entity)
                }
            },
        };

        let Some(entity) = entity else { continue };
        if let Some(parent) = node.parent().and_then(|parent| entities.get(&parent)) {
            commands.entity(*parent).add_child(entity);
        }
        entities.insert(id, entity);
    }

    tracing::info!(entities = entities.len(), "Scene entities spawned");
    scene.spawned = true;
}

/// Re-upload star colours for starfield nodes flagged since the last frame
pub fn upload_dirty_starfield(
    mut scene: ResMut<OrbitalScene>,
    stars: Query<(&SceneNodeLink, &Mesh3d), With<StarfieldEntity>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let Some(context) = scene.context.as_mut() else { return };
    let dirty = context.graph.take_dirty();
    if dirty.is_empty() {
        return;
    }

    for (link, mesh) in stars.iter() {
        if !dirty.contains(&link.0) {
            continue;
        }
        let Some(NodeKind::Starfield(field)) = context.graph.node(link.0).map(|node| &node.kind)
        else {
            continue;
        };
        if let Some(mesh) = meshes.get_mut(&mesh.0) {
            mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, field.sprite_colors());
        }
    }
}

pub fn to_bevy_transform(transform: &NodeTransform) -> Transform {
    Transform {
        translation: transform.position,
        rotation: transform.rotation_quat(),
        scale: transform.scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_timeout() {
        let timeout = Duration::from_secs(30);
        assert!(build_timeout(Duration::from_secs(29), timeout, None).is_none());

        let err = build_timeout(timeout, timeout, Some("textures/moon.jpg".to_string()));
        assert_eq!(
            err,
            Some(AssetLoadError::TimedOut {
                path: "textures/moon.jpg".to_string(),
                timeout,
            })
        );

        // Timed out between two loads
        let err = build_timeout(Duration::from_secs(31), timeout, None).unwrap();
        assert_eq!(err.path(), "");
    }

    #[test]
    fn test_stalled_build_fails_the_driver() {
        let mut config = SceneConfig::default();
        config.assets.load_timeout_secs = 0.01;

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(SceneSettings(config))
            .init_resource::<OrbitalScene>()
            .add_systems(Update, poll_scene_build);

        app.world_mut()
            .resource_mut::<OrbitalScene>()
            .driver
            .begin_build()
            .unwrap();
        let task = IoTaskPool::get().spawn(future::pending());
        app.insert_resource(SceneBuildTask {
            task,
            started: Duration::ZERO,
            current_path: Arc::new(Mutex::new(Some("textures/earth_bump.jpg".to_string()))),
        });

        for _ in 0..100 {
            app.update();
            if !app.world().contains_resource::<SceneBuildTask>() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        assert!(!app.world().contains_resource::<SceneBuildTask>());
        let scene = app.world().resource::<OrbitalScene>();
        assert_eq!(scene.driver.state(), orbis_core::DriverState::Failed);
        assert!(scene.context.is_none());
        let error = scene.error.as_deref().unwrap();
        assert!(error.contains("textures/earth_bump.jpg"), "{error}");
    }

    #[test]
    fn test_node_transform_conversion() {
        let mut node = NodeTransform::from_position(Vec3::new(1.0, 2.0, 3.0));
        node.rotation.y = std::f32::consts::PI;
        node.scale = Vec3::splat(2.0);

        let transform = to_bevy_transform(&node);
        assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.scale, Vec3::splat(2.0));
        assert!((transform.rotation * Vec3::X - Vec3::NEG_X).length() < 1e-5);
    }
}
