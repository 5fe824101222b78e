//! Scene assembly and the per-frame animation driver
//!
//! The driver is a small state machine:
//!
//! ```text
//! Uninitialized -> Building -> Running -> Stopped
//!                      \
//!                       -> Failed
//! ```
//!
//! Building is asynchronous (it waits on texture loads) and is kept out of
//! the driver itself so the engine can run it wherever it runs futures. The
//! engine calls [`AnimationDriver::begin_build`], runs [`build_scene`], then
//! hands the result to [`AnimationDriver::finish_build`].

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::body::{CelestialBody, Earth, Planet, Sun};
use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::motion::{orbit_position, wrap_phase, AnimationState, MotionConfig};
use crate::scene::{Camera, Light, LightKind, NodeId, NodeKind, SceneGraph, Transform};
use crate::starfield::Starfield;
use crate::texture::TextureLoader;
use glam::Vec3;

/// Something that can present the scene graph
pub trait Renderer<T> {
    fn draw(&mut self, graph: &SceneGraph<T>, camera: &Camera);

    /// The render surface changed size
    fn set_viewport(&mut self, _width: f32, _height: f32) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Building,
    Running,
    Stopped,
    Failed,
}

impl DriverState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Building => "building",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

/// Cloneable handle that stops the frame loop from outside the driver
#[derive(Debug, Clone)]
pub struct LoopHandle {
    token: CancellationToken,
}

impl LoopHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Result of a single [`AnimationDriver::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    Paused,
    /// No scene is running yet (or the build failed)
    Idle,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwinkleSettings {
    pub speed: f32,
    pub depth: f32,
}

/// Nodes the frame loop animates or the debug panel edits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneNodes {
    pub earth: Option<NodeId>,
    pub clouds: Option<NodeId>,
    pub moon: Option<NodeId>,
    pub planets: Vec<NodeId>,
    pub sun: Option<NodeId>,
    pub starfield: Option<NodeId>,
    pub lights: Vec<NodeId>,
}

/// The single active scene
#[derive(Debug, Clone)]
pub struct SceneContext<T> {
    pub graph: SceneGraph<T>,
    pub camera: Camera,
    pub motion: MotionConfig,
    pub animation: AnimationState,
    pub twinkle: Option<TwinkleSettings>,
    pub nodes: SceneNodes,
    draws: u64,
}

impl<T> SceneContext<T> {
    /// Apply one frame of motion, in a fixed order
    pub fn advance(&mut self, delta: f32) {
        let motion = self.motion;

        spin(&mut self.graph, self.nodes.earth, motion.earth_spin);
        spin(&mut self.graph, self.nodes.clouds, motion.cloud_spin);
        spin(&mut self.graph, self.nodes.moon, motion.moon_spin);

        let moon_position = self.animation.advance_moon(&motion);
        if let Some(transform) = self.nodes.moon.and_then(|id| self.graph.transform_mut(id)) {
            transform.position = moon_position;
        }

        self.animation.frames += 1;
        self.animation.elapsed += delta;

        if let (Some(twinkle), Some(id)) = (self.twinkle, self.nodes.starfield) {
            if let Some(node) = self.graph.node_mut(id) {
                if let NodeKind::Starfield(field) = &mut node.kind {
                    field.twinkle(self.animation.elapsed, twinkle.speed, twinkle.depth);
                }
            }
            self.graph.mark_dirty(id);
        }
    }

    pub fn draw<R: Renderer<T>>(&mut self, renderer: &mut R) {
        renderer.draw(&self.graph, &self.camera);
        self.draws += 1;
    }

    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    /// Drop every node; the context can no longer be animated
    pub fn teardown(&mut self) {
        info!(nodes = self.graph.len(), "Tearing down scene");
        self.graph.clear();
        self.nodes = SceneNodes::default();
    }
}

fn spin<T>(graph: &mut SceneGraph<T>, node: Option<NodeId>, amount: f32) {
    if let Some(transform) = node.and_then(|id| graph.transform_mut(id)) {
        transform.rotation.y = wrap_phase(transform.rotation.y + amount);
    }
}

/// Validate configuration, load every body and assemble the scene graph
///
/// All configuration errors surface before the first texture is requested.
/// Meshes are awaited one body at a time.
pub async fn build_scene<L: TextureLoader>(
    config: &SceneConfig,
    loader: &L,
) -> Result<SceneContext<L::Texture>, SceneError> {
    config.validate()?;

    let policy = config.materials.policy();
    let earth = config
        .earth
        .clone()
        .map(|earth| Earth::with_policy(earth, policy))
        .transpose()?;
    let moon = config
        .moon
        .clone()
        .map(|moon| Planet::with_policy(moon, policy))
        .transpose()?;
    let planets = config
        .planets
        .iter()
        .map(|placed| {
            Planet::with_policy(placed.body.clone(), policy).map(|planet| (planet, placed.position))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let sun = config.sun.clone().map(Sun::new).transpose()?;
    let starfield = Starfield::from_config(&config.starfield)?;
    let camera = Camera::new(&config.camera, config.viewport);
    let animation = AnimationState::new(config.motion.initial_moon_phase);

    info!(
        earth = earth.is_some(),
        moon = moon.is_some(),
        planets = planets.len(),
        stars = starfield.len(),
        "Building scene"
    );

    let mut graph = SceneGraph::new();
    let mut nodes = SceneNodes::default();

    if let Some(earth) = &earth {
        let surface = earth.mesh(loader).await?;
        let clouds = earth.cloud_mesh(loader).await?;
        let id = graph.add_root(surface.name.clone(), NodeKind::Body(surface), Transform::default());
        nodes.clouds = graph.add_child(
            id,
            clouds.name.clone(),
            NodeKind::Body(clouds),
            Transform::default(),
        );
        nodes.earth = Some(id);
        debug!("Earth attached");
    }

    if let Some(moon) = &moon {
        let mesh = moon.mesh(loader).await?;
        let position = orbit_position(animation.moon_phase, config.motion.moon_orbit_radius);
        nodes.moon = Some(graph.add_root(
            mesh.name.clone(),
            NodeKind::Body(mesh),
            Transform::from_position(position),
        ));
        debug!("Moon attached");
    }

    for (planet, position) in &planets {
        let mesh = planet.mesh(loader).await?;
        nodes.planets.push(graph.add_root(
            mesh.name.clone(),
            NodeKind::Body(mesh),
            Transform::from_position(Vec3::from_array(*position)),
        ));
    }

    if let Some(sun) = &sun {
        let mesh = sun.mesh(loader).await?;
        nodes.sun = Some(graph.add_root(
            mesh.name.clone(),
            NodeKind::Body(mesh),
            Transform::from_position(Vec3::from_array(sun.config().position)),
        ));
    }

    nodes.starfield = Some(graph.add_root(
        "starfield",
        NodeKind::Starfield(starfield),
        Transform::default(),
    ));

    let lighting = &config.lighting;
    nodes.lights.push(graph.add_root(
        "ambient-light",
        NodeKind::Light(Light {
            kind: LightKind::Ambient,
            color: lighting.ambient_color,
            intensity: lighting.ambient_intensity,
        }),
        Transform::default(),
    ));
    nodes.lights.push(graph.add_root(
        "key-light",
        NodeKind::Light(Light {
            kind: LightKind::Directional,
            color: lighting.key_color,
            intensity: lighting.key_intensity,
        }),
        Transform::from_position(Vec3::from_array(lighting.key_position)),
    ));

    let twinkle = config.starfield.twinkle.then_some(TwinkleSettings {
        speed: config.starfield.twinkle_speed,
        depth: config.starfield.twinkle_depth,
    });

    info!(nodes = graph.len(), "Scene built");

    Ok(SceneContext {
        graph,
        camera,
        motion: config.motion,
        animation,
        twinkle,
        nodes,
        draws: 0,
    })
}

/// Drives a [`SceneContext`] through its lifecycle
#[derive(Debug)]
pub struct AnimationDriver {
    state: DriverState,
    token: CancellationToken,
    paused: bool,
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self {
            state: DriverState::Uninitialized,
            token: CancellationToken::new(),
            paused: false,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            token: self.token.clone(),
        }
    }

    fn transition_error(&self, action: &'static str) -> SceneError {
        SceneError::InvalidTransition {
            action,
            state: self.state.as_str(),
        }
    }

    pub fn begin_build(&mut self) -> Result<(), SceneError> {
        if self.state != DriverState::Uninitialized {
            return Err(self.transition_error("build"));
        }
        self.state = DriverState::Building;
        Ok(())
    }

    /// Accept the outcome of [`build_scene`], entering `Running` or `Failed`
    pub fn finish_build<T>(
        &mut self,
        result: Result<SceneContext<T>, SceneError>,
    ) -> Result<SceneContext<T>, SceneError> {
        if self.state != DriverState::Building {
            return Err(self.transition_error("finish build"));
        }
        match result {
            Ok(context) => {
                self.state = DriverState::Running;
                info!("Animation running");
                Ok(context)
            }
            Err(e) => {
                self.state = DriverState::Failed;
                error!("Scene build failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            debug!(paused, "Animation pause toggled");
        }
        self.paused = paused;
    }

    pub fn stop(&mut self) {
        self.token.cancel();
        self.sync_cancellation();
    }

    fn sync_cancellation(&mut self) {
        if self.token.is_cancelled() && self.state != DriverState::Stopped {
            info!(from = self.state.as_str(), "Animation stopped");
            self.state = DriverState::Stopped;
        }
    }

    /// Run one frame: advance motion then draw once
    pub fn tick<T, R: Renderer<T>>(
        &mut self,
        context: &mut SceneContext<T>,
        renderer: &mut R,
        delta: f32,
    ) -> FrameOutcome {
        self.sync_cancellation();
        match self.state {
            DriverState::Running => {}
            DriverState::Stopped => return FrameOutcome::Stopped,
            _ => return FrameOutcome::Idle,
        }
        if self.paused {
            return FrameOutcome::Paused;
        }

        context.advance(delta);
        context.draw(renderer);
        FrameOutcome::Drawn
    }

    /// Run up to `frames` frames, returning how many were drawn
    pub fn run_frames<T, R: Renderer<T>>(
        &mut self,
        context: &mut SceneContext<T>,
        renderer: &mut R,
        frames: usize,
        delta: f32,
    ) -> usize {
        let mut drawn = 0;
        for _ in 0..frames {
            match self.tick(context, renderer, delta) {
                FrameOutcome::Drawn => drawn += 1,
                FrameOutcome::Paused => {}
                FrameOutcome::Idle | FrameOutcome::Stopped => break,
            }
        }
        drawn
    }

    /// Track a new viewport and redraw once
    pub fn resize<T, R: Renderer<T>>(
        &mut self,
        context: &mut SceneContext<T>,
        renderer: &mut R,
        width: f32,
        height: f32,
    ) -> Result<(), SceneError> {
        self.sync_cancellation();
        if self.state != DriverState::Running {
            return Err(self.transition_error("resize"));
        }
        context.camera.resize(width, height)?;
        renderer.set_viewport(width, height);
        context.draw(renderer);
        debug!(width, height, "Viewport resized");
        Ok(())
    }
}
