//! Debug panel using bevy_egui

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use orbis_core::{DriverState, NodeId};
use std::f32::consts::TAU;

use crate::assembly::OrbitalScene;
use crate::camera::CameraSettings;

#[derive(Resource, Debug, Clone)]
pub struct DebugPanel {
    pub open: bool,
}

impl Default for DebugPanel {
    fn default() -> Self {
        Self { open: true }
    }
}

#[derive(SystemParam)]
pub struct UiParams<'w, 's> {
    pub contexts: EguiContexts<'w, 's>,
    pub scene: ResMut<'w, OrbitalScene>,
    pub camera: ResMut<'w, CameraSettings>,
    pub panel: ResMut<'w, DebugPanel>,
    pub keys: Res<'w, ButtonInput<KeyCode>>,
}

pub fn ui_system(mut params: UiParams) {
    if params.keys.just_pressed(KeyCode::F1) {
        params.panel.open = !params.panel.open;
    }
    if !params.panel.open {
        return;
    }

    let Ok(ctx) = params.contexts.ctx_mut() else { return };
    let scene = &mut *params.scene;
    let camera = &mut *params.camera;

    egui::Window::new("Orbis")
        .default_pos([12.0, 12.0])
        .default_width(260.0)
        .resizable(false)
        .show(ctx, |ui| {
            status_section(ui, scene);

            let OrbitalScene {
                driver, context, ..
            } = scene;
            let Some(context) = context.as_mut() else { return };

            ui.separator();
            let paused = driver.is_paused();
            let label = if paused { "▶ Resume" } else { "⏸ Pause" };
            if ui.button(label).clicked() {
                driver.set_paused(!paused);
            }

            if let Some(earth) = context.nodes.earth {
                egui::CollapsingHeader::new("Earth")
                    .default_open(true)
                    .show(ui, |ui| transform_controls(ui, &mut context.graph, earth));
            }

            egui::CollapsingHeader::new("Motion").show(ui, |ui| {
                let motion = &mut context.motion;
                rate_slider(ui, "Earth spin", &mut motion.earth_spin);
                rate_slider(ui, "Cloud spin", &mut motion.cloud_spin);
                rate_slider(ui, "Moon spin", &mut motion.moon_spin);
                rate_slider(ui, "Moon orbit", &mut motion.moon_orbit_step);
                ui.add(
                    egui::Slider::new(&mut motion.moon_orbit_radius, 10.0..=90.0)
                        .text("Orbit radius"),
                );
            });

            egui::CollapsingHeader::new("Camera").show(ui, |ui| {
                ui.checkbox(&mut camera.enabled, "Orbit controls");
                ui.add(
                    egui::DragValue::new(&mut camera.target_distance)
                        .speed(0.5)
                        .range(camera.min_distance..=camera.max_distance)
                        .prefix("distance "),
                );
            });
        });
}

fn status_section(ui: &mut egui::Ui, scene: &OrbitalScene) {
    let state = scene.driver.state();
    let color = match state {
        DriverState::Running => egui::Color32::GREEN,
        DriverState::Failed => egui::Color32::RED,
        _ => egui::Color32::YELLOW,
    };
    ui.horizontal(|ui| {
        ui.label("State:");
        ui.colored_label(color, state.as_str());
    });

    if let Some(error) = &scene.error {
        ui.colored_label(egui::Color32::RED, error);
    }

    if let Some(context) = &scene.context {
        ui.label(format!("Frames: {}", context.animation.frames));
        ui.label(format!("Draws: {}", context.draw_count()));
        ui.label(format!(
            "Moon phase: {:.1}°",
            context.animation.moon_phase.to_degrees()
        ));
        ui.label(format!("Aspect: {:.3}", context.camera.aspect));
    }
}

fn transform_controls<T>(ui: &mut egui::Ui, graph: &mut orbis_core::SceneGraph<T>, node: NodeId) {
    let Some(transform) = graph.transform_mut(node) else { return };

    ui.label("Position");
    ui.horizontal(|ui| {
        for (axis, value) in ["x", "y", "z"].into_iter().zip(transform.position.as_mut()) {
            ui.add(egui::DragValue::new(value).speed(0.1).range(-50.0..=50.0).prefix(axis));
        }
    });

    ui.label("Rotation");
    for (axis, value) in ["x", "y", "z"].into_iter().zip(transform.rotation.as_mut()) {
        ui.add(egui::Slider::new(value, 0.0..=TAU).text(axis));
    }

    ui.label("Scale");
    for (axis, value) in ["x", "y", "z"].into_iter().zip(transform.scale.as_mut()) {
        ui.add(egui::Slider::new(value, 0.1..=3.0).text(axis));
    }
}

fn rate_slider(ui: &mut egui::Ui, label: &str, value: &mut f32) {
    ui.add(
        egui::Slider::new(value, 0.0..=0.05)
            .text(label)
            .step_by(0.0001),
    );
}
