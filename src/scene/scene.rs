//! Scene container and fog state.

use super::{Node, NodeHandle};
use crate::math::Color;

/// Distance fog applied by the forward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fog {
    /// No fog.
    None,
    /// Linear fog between two view distances.
    Linear {
        /// Fog color.
        color: Color,
        /// Distance where fog starts.
        near: f32,
        /// Distance where fog is fully opaque.
        far: f32,
    },
    /// Exponential fog by density.
    Exponential {
        /// Fog color.
        color: Color,
        /// Fog density.
        density: f32,
    },
}

/// The scene graph: a root node plus scene-wide render state.
pub struct Scene {
    root: NodeHandle,
    fog: Fog,
}

impl Scene {
    /// Create an empty scene with a group root.
    pub fn new() -> Self {
        Self {
            root: Node::new(super::NodeData::Group).into_handle(),
            fog: Fog::None,
        }
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> &NodeHandle {
        &self.root
    }

    /// Current fog state.
    #[inline]
    pub fn fog(&self) -> Fog {
        self.fog
    }

    /// Set the fog state.
    #[inline]
    pub fn set_fog(&mut self, fog: Fog) {
        self.fog = fog;
    }

    /// Add a node under the root.
    pub fn add(&self, node: NodeHandle) {
        Node::attach(&self.root, node);
    }

    /// Recompute world matrices for the whole graph.
    pub fn update_world_matrices(&self) {
        Node::update_world_matrices(&self.root, None);
    }

    /// Depth-first walk over every enabled node, root first.
    ///
    /// Disabled nodes and their subtrees are skipped.
    pub fn traverse<F: FnMut(&Node)>(&self, mut callback: F) {
        Self::traverse_inner(&self.root, &mut callback);
    }

    fn traverse_inner<F: FnMut(&Node)>(node: &NodeHandle, callback: &mut F) {
        let children;
        {
            let Ok(guard) = node.read() else { return };
            if !guard.enabled() {
                return;
            }
            callback(&guard);
            children = guard.children().to_vec();
        }
        for child in &children {
            Self::traverse_inner(child, callback);
        }
    }

    /// Depth-first walk yielding node handles instead of borrows.
    pub fn traverse_handles<F: FnMut(&NodeHandle)>(&self, mut callback: F) {
        Self::traverse_handles_inner(&self.root, &mut callback);
    }

    fn traverse_handles_inner<F: FnMut(&NodeHandle)>(node: &NodeHandle, callback: &mut F) {
        let children;
        {
            let Ok(guard) = node.read() else { return };
            if !guard.enabled() {
                return;
            }
            children = guard.children().to_vec();
        }
        callback(node);
        for child in &children {
            Self::traverse_handles_inner(child, callback);
        }
    }

    /// Find the first enabled node with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        let mut found = None;
        self.traverse_handles(|handle| {
            if found.is_none() {
                if let Ok(guard) = handle.read() {
                    if guard.name() == name {
                        found = Some(handle.clone());
                    }
                }
            }
        });
        found
    }

    /// Count enabled nodes, the root included.
    pub fn count_objects(&self) -> usize {
        let mut count = 0;
        self.traverse(|_| count += 1);
        count
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeData;

    #[test]
    fn test_traverse_skips_disabled_subtree() {
        let scene = Scene::new();
        let group = Node::new(NodeData::Group).into_handle();
        let inner = Node::new(NodeData::Group).into_handle();
        Node::attach(&group, inner);
        scene.add(group.clone());
        scene.add(Node::new(NodeData::Group).into_handle());

        assert_eq!(scene.count_objects(), 4);

        group.write().unwrap().set_enabled(false);
        // Root + the second child; the disabled group and its subtree vanish.
        assert_eq!(scene.count_objects(), 2);
    }

    #[test]
    fn test_find_by_name() {
        let scene = Scene::new();
        scene.add(Node::with_name(NodeData::Group, "player").into_handle());

        let found = scene.find_by_name("player");
        assert!(found.is_some());
        assert!(scene.find_by_name("missing").is_none());
    }

    #[test]
    fn test_fog_defaults_to_none() {
        let mut scene = Scene::new();
        assert_eq!(scene.fog(), Fog::None);
        scene.set_fog(Fog::Linear {
            color: Color::WHITE,
            near: 10.0,
            far: 100.0,
        });
        assert!(matches!(scene.fog(), Fog::Linear { .. }));
    }
}
