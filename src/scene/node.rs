//! Scene-graph node.

use super::Transform;
use crate::gr::{Id, Primitive, Shader};
use crate::light::LightParams;
use crate::math::{Matrix4, Vector3};
use std::sync::{Arc, RwLock, Weak};

/// Shared handle to a scene node.
pub type NodeHandle = Arc<RwLock<Node>>;

/// Node kind tag, for cheap queries without matching the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Pure grouping node.
    Group,
    /// Dynamic light source.
    Light,
    /// Renderable object.
    Visual,
}

/// Renderable payload: geometry, shader, and draw-order priority.
pub struct VisualParams {
    /// Geometry to submit.
    pub primitive: Option<Arc<dyn Primitive>>,
    /// Shader applied before the draw.
    pub shader: Option<Arc<RwLock<Shader>>>,
    /// Draw-order bucket this visual belongs to.
    pub priority: i32,
}

impl VisualParams {
    /// An empty visual with priority zero.
    pub fn new() -> Self {
        Self {
            primitive: None,
            shader: None,
            priority: 0,
        }
    }
}

impl Default for VisualParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-kind payload of a node.
pub enum NodeData {
    /// Pure grouping node.
    Group,
    /// Dynamic light source.
    Light(LightParams),
    /// Renderable object.
    Visual(VisualParams),
}

/// A node in the scene graph.
///
/// Children are held by shared handle; the parent link is a weak
/// back-reference so the graph has no ownership cycles.
pub struct Node {
    /// Unique identifier.
    id: Id,
    /// Node name.
    name: String,
    /// Per-kind payload.
    data: NodeData,
    /// Disabled nodes are skipped by traversal, light collection, and draw
    /// submission; their children are skipped too.
    enabled: bool,
    /// Transform component.
    pub transform: Transform,
    /// Parent node.
    parent: Option<Weak<RwLock<Node>>>,
    /// Child nodes.
    children: Vec<NodeHandle>,
}

impl Node {
    /// Create a new node.
    pub fn new(data: NodeData) -> Self {
        Self {
            id: Id::new(),
            name: String::new(),
            data,
            enabled: true,
            transform: Transform::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Create a new node with a name.
    pub fn with_name(data: NodeData, name: impl Into<String>) -> Self {
        let mut node = Self::new(data);
        node.name = name.into();
        node
    }

    /// Wrap into a shared handle.
    pub fn into_handle(self) -> NodeHandle {
        Arc::new(RwLock::new(self))
    }

    /// Get the unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the node name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the node name.
    #[inline]
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The node's kind tag.
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Group => NodeKind::Group,
            NodeData::Light(_) => NodeKind::Light,
            NodeData::Visual(_) => NodeKind::Visual,
        }
    }

    /// The per-kind payload.
    #[inline]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Mutable per-kind payload.
    #[inline]
    pub fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    /// Light payload, if this is a light node.
    pub fn as_light(&self) -> Option<&LightParams> {
        match &self.data {
            NodeData::Light(params) => Some(params),
            _ => None,
        }
    }

    /// Visual payload, if this is a visual node.
    pub fn as_visual(&self) -> Option<&VisualParams> {
        match &self.data {
            NodeData::Visual(params) => Some(params),
            _ => None,
        }
    }

    /// Whether this node participates in traversal and rendering.
    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable this node (and, transitively, its subtree).
    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether this node has a live parent.
    pub fn has_parent(&self) -> bool {
        self.parent
            .as_ref()
            .map(|p| p.strong_count() > 0)
            .unwrap_or(false)
    }

    /// The parent handle, if still alive.
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent.as_ref().and_then(|p| p.upgrade())
    }

    /// Child nodes.
    #[inline]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// World-space position as of the last world-matrix update.
    #[inline]
    pub fn world_position(&self) -> Vector3 {
        self.transform.world_position()
    }

    /// Attach `child` under `parent`, setting the weak back-reference.
    pub fn attach(parent: &NodeHandle, child: NodeHandle) {
        if let Ok(mut child_guard) = child.write() {
            child_guard.parent = Some(Arc::downgrade(parent));
        }
        if let Ok(mut parent_guard) = parent.write() {
            parent_guard.children.push(child);
        }
    }

    /// Detach `child` from `parent`.
    pub fn detach(parent: &NodeHandle, child: &NodeHandle) {
        if let Ok(mut parent_guard) = parent.write() {
            parent_guard
                .children
                .retain(|c| !Arc::ptr_eq(c, child));
        }
        if let Ok(mut child_guard) = child.write() {
            child_guard.parent = None;
        }
    }

    /// Recompute world matrices for `node` and its subtree.
    pub fn update_world_matrices(node: &NodeHandle, parent_world: Option<&Matrix4>) {
        let children;
        let world;
        {
            let Ok(mut guard) = node.write() else { return };
            guard.transform.update_world_matrix(parent_world);
            world = *guard.transform.world_matrix();
            children = guard.children.clone();
        }
        for child in &children {
            Self::update_world_matrices(child, Some(&world));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_sets_parent_backref() {
        let parent = Node::new(NodeData::Group).into_handle();
        let child = Node::new(NodeData::Group).into_handle();
        Node::attach(&parent, child.clone());

        let guard = child.read().unwrap();
        assert!(guard.has_parent());
        assert!(Arc::ptr_eq(&guard.parent().unwrap(), &parent));
        assert_eq!(parent.read().unwrap().children().len(), 1);
    }

    #[test]
    fn test_detach_clears_parent() {
        let parent = Node::new(NodeData::Group).into_handle();
        let child = Node::new(NodeData::Group).into_handle();
        Node::attach(&parent, child.clone());
        Node::detach(&parent, &child);

        assert!(!child.read().unwrap().has_parent());
        assert!(parent.read().unwrap().children().is_empty());
    }

    #[test]
    fn test_world_matrices_chain() {
        let parent = Node::new(NodeData::Group).into_handle();
        let child = Node::new(NodeData::Group).into_handle();
        parent.write().unwrap().transform.set_position(1.0, 0.0, 0.0);
        child.write().unwrap().transform.set_position(0.0, 0.0, 5.0);
        Node::attach(&parent, child.clone());

        Node::update_world_matrices(&parent, None);
        let p = child.read().unwrap().world_position();
        assert!(p.approx_eq(&Vector3::new(1.0, 0.0, 5.0), 1e-6));
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(Node::new(NodeData::Group).kind(), NodeKind::Group);
        assert_eq!(
            Node::new(NodeData::Light(LightParams::default())).kind(),
            NodeKind::Light
        );
        assert_eq!(
            Node::new(NodeData::Visual(VisualParams::new())).kind(),
            NodeKind::Visual
        );
    }
}
