//! Retained scene graph: an arena of nodes with parent/child ownership

use glam::{EulerRot, Quat, Vec3};

use crate::body::BodyMesh;
use crate::color::Rgb;
use crate::config::{CameraConfig, Viewport};
use crate::error::ConfigurationError;
use crate::starfield::Starfield;

/// Handle to a node in a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Local transform of a node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied in XYZ order
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    Directional,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Rgb,
    pub intensity: f32,
}

/// What a node draws
#[derive(Debug, Clone)]
pub enum NodeKind<T> {
    Body(BodyMesh<T>),
    Starfield(Starfield),
    Light(Light),
}

impl<T> NodeKind<T> {
    /// Lights affect the frame but produce no geometry of their own
    pub fn is_renderable(&self) -> bool {
        !matches!(self, NodeKind::Light(_))
    }
}

/// A node in the scene graph
#[derive(Debug, Clone)]
pub struct SceneNode<T> {
    pub name: String,
    pub kind: NodeKind<T>,
    pub transform: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl<T> SceneNode<T> {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Tree of renderable nodes
///
/// The graph owns its top-level nodes and each node owns its children;
/// removing a node removes its whole subtree. Ids are never reused.
#[derive(Debug, Clone)]
pub struct SceneGraph<T> {
    nodes: Vec<Option<SceneNode<T>>>,
    roots: Vec<NodeId>,
    dirty: Vec<NodeId>,
}

impl<T> Default for SceneGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SceneGraph<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            dirty: Vec::new(),
        }
    }

    fn insert(
        &mut self,
        parent: Option<NodeId>,
        name: String,
        kind: NodeKind<T>,
        transform: Transform,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(SceneNode {
            name,
            kind,
            transform,
            parent,
            children: Vec::new(),
        }));
        id
    }

    /// Attach a node at the top level of the scene
    pub fn add_root(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind<T>,
        transform: Transform,
    ) -> NodeId {
        let id = self.insert(None, name.into(), kind, transform);
        self.roots.push(id);
        id
    }

    /// Attach a node under `parent`; `None` if the parent does not exist
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind<T>,
        transform: Transform,
    ) -> Option<NodeId> {
        self.node(parent)?;
        let id = self.insert(Some(parent), name.into(), kind, transform);
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.push(id);
        }
        Some(id)
    }

    /// Detach a node and its subtree, returning the node itself
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode<T>> {
        let node = self.nodes.get_mut(id.0)?.take()?;

        match node.parent {
            Some(parent) => {
                if let Some(parent_node) = self.node_mut(parent) {
                    parent_node.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }
        self.dirty.retain(|dirty| *dirty != id);

        let mut pending = node.children.clone();
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.nodes.get_mut(child.0).and_then(Option::take) {
                self.dirty.retain(|dirty| *dirty != child);
                pending.extend(removed.children);
            }
        }

        Some(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode<T>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode<T>> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.node(id).map(|node| &node.transform)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.node_mut(id).map(|node| &mut node.transform)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Top-level nodes that draw geometry
    pub fn renderable_roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots
            .iter()
            .copied()
            .filter(|id| self.node(*id).is_some_and(|node| node.kind.is_renderable()))
    }

    /// Every live node, parents before their children
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                order.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Flag a node's per-vertex data for re-upload by the engine
    pub fn mark_dirty(&mut self, id: NodeId) {
        if self.node(id).is_some() && !self.dirty.contains(&id) {
            self.dirty.push(id);
        }
    }

    /// Drain the set of nodes flagged since the last call
    pub fn take_dirty(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.dirty)
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Remove every node; slots stay vacant so old ids never alias new nodes
    pub fn clear(&mut self) {
        self.nodes.iter_mut().for_each(|slot| *slot = None);
        self.roots.clear();
        self.dirty.clear();
    }
}

/// Perspective camera and the viewport it renders into
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    pub viewport: Viewport,
    pub transform: Transform,
    pub target: Vec3,
}

impl Camera {
    pub fn new(config: &CameraConfig, viewport: Viewport) -> Self {
        Self {
            fov_y_degrees: config.fov_degrees,
            near: config.near,
            far: config.far,
            aspect: viewport.aspect(),
            viewport,
            transform: Transform::from_position(Vec3::from_array(config.position)),
            target: Vec3::from_array(config.target),
        }
    }

    /// Track a new viewport size; aspect becomes exactly `width / height`
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), ConfigurationError> {
        let viewport = Viewport { width, height };
        viewport.validate()?;
        self.viewport = viewport;
        self.aspect = viewport.aspect();
        Ok(())
    }
}
