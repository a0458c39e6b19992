//! # Camera Module
//!
//! The view point and the draw-submission step: priority filtering, depth
//! ordering through a [`SortBuffer`], and per-object nearest-light binding.

use crate::gr::{Context, SortBuffer};
use crate::light::{LightSorter, MAX_LIGHTS_PER_DRAW};
use crate::math::consts::PI;
use crate::math::{Matrix4, Quaternion, Vector3, Vector4};
use crate::scene::{NodeData, NodeHandle};

/// A view point that submits visible objects to a [`Context`].
///
/// The camera owns the per-frame scratch buffers for depth sorting and light
/// selection, reused across frames.
pub struct Camera {
    /// World-space position.
    pub position: Vector3,
    /// World-space orientation.
    pub rotation: Quaternion,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Draw-order scratch.
    sort_buffer: SortBuffer,
    /// Per-object light selection scratch.
    sorter: LightSorter,
}

impl Camera {
    /// Create a camera at the origin with a 60 degree field of view.
    pub fn new() -> Self {
        Self {
            position: Vector3::ZERO,
            rotation: Quaternion::IDENTITY,
            fov: PI / 3.0,
            near: 0.1,
            far: 1000.0,
            sort_buffer: SortBuffer::new(),
            sorter: LightSorter::new(),
        }
    }

    /// Projection matrix for the given aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Matrix4 {
        Matrix4::perspective(self.fov, aspect, self.near, self.far)
    }

    /// Submit every visual in the inclusive priority range, nearest first.
    ///
    /// `visuals` and `priorities` are parallel arrays and must be the same
    /// length. Disabled nodes and visuals without geometry are skipped. Each
    /// submitted visual gets the nearest lights bound as shader uniforms
    /// before its draw, up to [`MAX_LIGHTS_PER_DRAW`].
    pub fn render(
        &mut self,
        context: &mut dyn Context,
        min_priority: i32,
        max_priority: i32,
        visuals: &[NodeHandle],
        priorities: &[i32],
        lights: &[NodeHandle],
    ) {
        assert_eq!(
            visuals.len(),
            priorities.len(),
            "visuals and priorities must be parallel arrays"
        );

        // Candidates in range, with their world positions.
        let mut candidates: Vec<(&NodeHandle, Vector3)> = Vec::new();
        for (handle, &priority) in visuals.iter().zip(priorities) {
            if priority < min_priority || priority > max_priority {
                continue;
            }
            let Ok(guard) = handle.read() else { continue };
            if !guard.enabled() {
                continue;
            }
            let has_geometry = guard
                .as_visual()
                .map(|v| v.primitive.is_some())
                .unwrap_or(false);
            if !has_geometry {
                continue;
            }
            candidates.push((handle, guard.world_position()));
        }

        self.sort_buffer.reset(candidates.len(), candidates.len());
        for (i, (_, position)) in candidates.iter().enumerate() {
            self.sort_buffer.keys_mut()[i] = self.position.distance_squared(position);
        }
        self.sort_buffer.sort();

        self.sorter.remove_lights();
        for handle in lights {
            if let Ok(guard) = handle.read() {
                if guard.enabled() {
                    let position = guard.world_position();
                    drop(guard);
                    self.sorter.add_light(handle.clone(), position);
                }
            }
        }

        for i in 0..candidates.len() {
            let index = self.sort_buffer.indices()[i] as usize;
            let (handle, position) = &candidates[index];
            let Ok(guard) = handle.read() else { continue };
            let NodeData::Visual(visual) = guard.data() else { continue };
            let (Some(primitive), Some(shader)) = (&visual.primitive, &visual.shader) else {
                continue;
            };

            let nearest = self.sorter.get_lights_by_distance(position, MAX_LIGHTS_PER_DRAW);
            if let Ok(mut shader_guard) = shader.write() {
                for (slot, light) in nearest.iter().enumerate() {
                    let Ok(light_guard) = light.read() else { continue };
                    let Some(params) = light_guard.as_light() else { continue };
                    let p = light_guard.world_position();
                    shader_guard.set_vector(
                        &format!("lightPosition{}", slot),
                        Vector4::new(p.x, p.y, p.z, params.range),
                    );
                    shader_guard.set_vector(
                        &format!("lightColor{}", slot),
                        Vector4::new(params.color.r, params.color.g, params.color.b, params.intensity),
                    );
                }
                // Unused slots carry zero so shaders need no light count.
                for slot in nearest.len()..MAX_LIGHTS_PER_DRAW {
                    shader_guard.set_vector(&format!("lightPosition{}", slot), Vector4::ZERO);
                    shader_guard.set_vector(&format!("lightColor{}", slot), Vector4::ZERO);
                }
                context.apply_shader(&shader_guard);
            }
            context.draw_primitive(primitive.as_ref());
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
