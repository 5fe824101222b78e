//! Scene camera and orbit navigation

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use orbis_core::config::CameraConfig;

use crate::assembly::SceneSettings;

/// Orbit controller state, Y up
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub enabled: bool,
    pub distance: f32,
    pub target_distance: f32,
    pub azimuth: f32,
    pub elevation: f32,
    pub target: Vec3,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl CameraSettings {
    /// Orbit parameters that place the camera at the configured position
    pub fn from_config(config: &CameraConfig) -> Self {
        let target = Vec3::from_array(config.target);
        let offset = Vec3::from_array(config.position) - target;
        let distance = offset.length().max(config.near * 10.0);

        Self {
            enabled: config.orbit_controls,
            distance,
            target_distance: distance,
            azimuth: offset.z.atan2(offset.x),
            elevation: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            target,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: 0.15,
            min_distance: 2.0,
            max_distance: config.far * 0.5,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        self.target + self.distance * Vec3::new(cos_el * cos_az, sin_el, cos_el * sin_az)
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

pub fn setup_camera(mut commands: Commands, settings: Res<SceneSettings>) {
    let config = &settings.0.camera;
    let orbit = CameraSettings::from_config(config);

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: config.fov_degrees.to_radians(),
            near: config.near,
            far: config.far,
            ..default()
        }),
        Transform::from_translation(orbit.eye()).looking_at(orbit.target, Vec3::Y),
        MainCamera,
    ));
    commands.insert_resource(orbit);
}

pub fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut settings: ResMut<CameraSettings>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    time: Res<Time>,
    mut contexts: bevy_egui::EguiContexts,
) {
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);
    let active = settings.enabled && !egui_wants_pointer;

    let total_motion: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();

    if active && mouse_button.pressed(MouseButton::Left) {
        settings.azimuth += total_motion.x * settings.sensitivity;
        settings.elevation =
            (settings.elevation + total_motion.y * settings.sensitivity).clamp(-1.5, 1.5);
    }

    // Drain the wheel even when the UI has the pointer
    for scroll in mouse_wheel.read() {
        if active {
            let zoom_factor = 1.0 - scroll.y * settings.zoom_speed;
            settings.target_distance = (settings.target_distance * zoom_factor)
                .clamp(settings.min_distance, settings.max_distance);
        }
    }

    if active && touch_input.iter().count() == 1 {
        for touch in touch_input.iter() {
            let delta = touch.delta();
            settings.azimuth += delta.x * settings.sensitivity;
            settings.elevation =
                (settings.elevation + delta.y * settings.sensitivity).clamp(-1.5, 1.5);
        }
    }

    // Pinch to zoom
    if active && touch_input.iter().count() == 2 {
        let touches: Vec<_> = touch_input.iter().collect();
        let curr_dist = touches[0].position().distance(touches[1].position());
        let prev_dist = (touches[0].position() - touches[0].delta())
            .distance(touches[1].position() - touches[1].delta());
        let zoom_factor = prev_dist / curr_dist.max(1.0);
        settings.target_distance = (settings.target_distance * zoom_factor)
            .clamp(settings.min_distance, settings.max_distance);
    }

    let dt = time.delta_secs();
    let lerp_factor = 1.0 - (-settings.smooth_factor * 60.0 * dt).exp();
    settings.distance += (settings.target_distance - settings.distance) * lerp_factor;

    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = settings.eye();
        transform.look_at(settings.target, Vec3::Y);
    }
}
