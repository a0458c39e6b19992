//! Nearest-K light selection.

use crate::math::Vector3;
use crate::scene::{NodeHandle, NodeKind, Scene};

/// One collected light: world position plus the node that owns it.
struct LightEntry {
    position: Vector3,
    node: NodeHandle,
}

/// Collects enabled lights from a scene graph and ranks them by squared
/// distance to a query point.
///
/// All internal buffers are reused call-to-call; a single sorter is meant to
/// serve many per-object queries per frame without reallocating.
pub struct LightSorter {
    /// Collected lights.
    entries: Vec<LightEntry>,
    /// Squared-distance scratch, parallel to `entries`.
    distances: Vec<f32>,
    /// Sort indices into `entries`.
    order: Vec<u32>,
    /// Last query output, nearest first.
    selected: Vec<NodeHandle>,
}

impl LightSorter {
    /// Create an empty sorter.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            distances: Vec::new(),
            order: Vec::new(),
            selected: Vec::new(),
        }
    }

    /// Walk the scene and record every enabled light node, replacing the
    /// previous collection.
    ///
    /// The scene root must not be parented anywhere.
    pub fn collect_lights(&mut self, scene: &Scene) {
        if let Ok(root) = scene.root().read() {
            assert!(!root.has_parent(), "light collection requires an unparented root");
        }
        self.remove_lights();
        let mut collected = Vec::new();
        scene.traverse_handles(|handle| {
            if let Ok(guard) = handle.read() {
                if guard.kind() == NodeKind::Light {
                    collected.push((handle.clone(), guard.world_position()));
                }
            }
        });
        for (node, position) in collected {
            self.add_light(node, position);
        }
    }

    /// Record a single light at a world position.
    pub fn add_light(&mut self, node: NodeHandle, position: Vector3) {
        self.entries.push(LightEntry { position, node });
    }

    /// Number of lights in the current collection.
    #[inline]
    pub fn light_count(&self) -> usize {
        self.entries.len()
    }

    /// The up-to-`max` collected lights nearest to `position`, ascending by
    /// squared distance.
    ///
    /// Returns at most `min(max, collected)` lights. Order among exactly
    /// equal distances is unspecified.
    pub fn get_lights_by_distance(&mut self, position: &Vector3, max: usize) -> &[NodeHandle] {
        self.distances.clear();
        self.order.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.distances.push(entry.position.distance_squared(position));
            self.order.push(i as u32);
        }

        let distances = &self.distances;
        self.order
            .sort_unstable_by(|&a, &b| distances[a as usize].total_cmp(&distances[b as usize]));

        self.selected.clear();
        for &i in self.order.iter().take(max) {
            self.selected.push(self.entries[i as usize].node.clone());
        }
        &self.selected
    }

    /// Clear every internal buffer for a full re-collection.
    pub fn remove_lights(&mut self) {
        self.entries.clear();
        self.distances.clear();
        self.order.clear();
        self.selected.clear();
    }
}

impl Default for LightSorter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::LightParams;
    use crate::scene::{Node, NodeData};

    fn light_at(x: f32) -> NodeHandle {
        let mut node = Node::new(NodeData::Light(LightParams::default()));
        node.transform.set_position(x, 0.0, 0.0);
        node.into_handle()
    }

    fn scene_with_lights(xs: &[f32]) -> (Scene, Vec<NodeHandle>) {
        let scene = Scene::new();
        let mut handles = Vec::new();
        for &x in xs {
            let light = light_at(x);
            scene.add(light.clone());
            handles.push(light);
        }
        scene.update_world_matrices();
        (scene, handles)
    }

    #[test]
    fn test_nearest_three_of_five() {
        let (scene, _handles) = scene_with_lights(&[1.0, 5.0, 2.0, 4.0, 3.0]);
        let mut sorter = LightSorter::new();
        sorter.collect_lights(&scene);
        assert_eq!(sorter.light_count(), 5);

        let nearest = sorter.get_lights_by_distance(&Vector3::ZERO, 3);
        let xs: Vec<f32> = nearest
            .iter()
            .map(|n| n.read().unwrap().world_position().x)
            .collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_max_exceeding_collection_returns_all() {
        let (scene, _handles) = scene_with_lights(&[2.0, 1.0]);
        let mut sorter = LightSorter::new();
        sorter.collect_lights(&scene);

        let nearest = sorter.get_lights_by_distance(&Vector3::ZERO, 10);
        assert_eq!(nearest.len(), 2);
        assert!(nearest[0].read().unwrap().world_position().x < 2.0);
    }

    #[test]
    fn test_disabled_lights_are_never_returned() {
        let (scene, handles) = scene_with_lights(&[1.0, 2.0, 3.0]);
        handles[0].write().unwrap().set_enabled(false);

        let mut sorter = LightSorter::new();
        sorter.collect_lights(&scene);
        assert_eq!(sorter.light_count(), 2);

        let nearest = sorter.get_lights_by_distance(&Vector3::ZERO, 3);
        let xs: Vec<f32> = nearest
            .iter()
            .map(|n| n.read().unwrap().world_position().x)
            .collect();
        assert_eq!(xs, vec![2.0, 3.0]);
    }

    #[test]
    fn test_empty_after_remove() {
        let (scene, _handles) = scene_with_lights(&[1.0]);
        let mut sorter = LightSorter::new();
        sorter.collect_lights(&scene);
        sorter.remove_lights();

        assert_eq!(sorter.light_count(), 0);
        assert!(sorter.get_lights_by_distance(&Vector3::ZERO, 4).is_empty());
    }

    #[test]
    fn test_query_with_no_collection_is_empty() {
        let mut sorter = LightSorter::new();
        assert!(sorter.get_lights_by_distance(&Vector3::ZERO, 4).is_empty());
    }

    #[test]
    fn test_non_light_nodes_are_ignored() {
        let scene = Scene::new();
        scene.add(Node::new(NodeData::Group).into_handle());
        scene.add(light_at(1.0));
        scene.update_world_matrices();

        let mut sorter = LightSorter::new();
        sorter.collect_lights(&scene);
        assert_eq!(sorter.light_count(), 1);
    }
}
