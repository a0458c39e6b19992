//! # Pipe Module
//!
//! Render-pass composition. Each [`Pipe`] renders one draw-order priority
//! band of the scene; the application establishes a fixed pipe order per
//! frame and calls [`Pipe::render`] on each in sequence. All pipes of a
//! frame share one [`PipeSetup`], the per-frame render plan.

mod default_pipe;
mod glow_pipe;

pub use default_pipe::DefaultPipe;
pub use glow_pipe::{GlowPipe, GlowSettings};

use crate::camera::Camera;
use crate::gr::{Context, Name, RenderTexture, Shader};
use crate::scene::{NodeData, NodeHandle, Scene};
use std::sync::{Arc, RwLock};

/// Shared handle to the per-frame render plan.
pub type SharedPipeSetup = Arc<RwLock<PipeSetup>>;

/// The per-frame render plan: shaders, visible objects, per-object
/// priorities, and active lights.
///
/// Filled once per frame from the scene traversal, then read by every pipe
/// in sequence.
pub struct PipeSetup {
    /// Shaders referenced by this frame's visuals.
    pub shaders: Vec<Arc<RwLock<Shader>>>,
    /// Visible objects considered for submission.
    pub visuals: Vec<NodeHandle>,
    /// Draw priority per visual, parallel to `visuals`.
    pub priorities: Vec<i32>,
    /// Active lights for this frame.
    pub lights: Vec<NodeHandle>,
}

impl PipeSetup {
    /// Create an empty render plan.
    pub fn new() -> Self {
        Self {
            shaders: Vec::new(),
            visuals: Vec::new(),
            priorities: Vec::new(),
            lights: Vec::new(),
        }
    }

    /// Wrap into the shared handle passed to pipes.
    pub fn into_shared(self) -> SharedPipeSetup {
        Arc::new(RwLock::new(self))
    }

    /// Select a named rendering technique on every shader in the plan.
    pub fn set_technique(&self, technique: &Name) {
        for shader in &self.shaders {
            if let Ok(mut guard) = shader.write() {
                guard.set_technique(technique);
            }
        }
    }

    /// Rebuild the plan from a scene walk, replacing the previous contents.
    ///
    /// Visual nodes contribute their handle, priority, and shader; light
    /// nodes contribute to the light list. Shaders are deduplicated.
    pub fn collect_from_scene(&mut self, scene: &Scene) {
        self.shaders.clear();
        self.visuals.clear();
        self.priorities.clear();
        self.lights.clear();

        let mut visuals = Vec::new();
        let mut lights = Vec::new();
        scene.traverse_handles(|handle| {
            if let Ok(guard) = handle.read() {
                match guard.data() {
                    NodeData::Visual(params) => {
                        visuals.push((handle.clone(), params.priority, params.shader.clone()));
                    }
                    NodeData::Light(_) => lights.push(handle.clone()),
                    _ => {}
                }
            }
        });

        for (handle, priority, shader) in visuals {
            self.visuals.push(handle);
            self.priorities.push(priority);
            if let Some(shader) = shader {
                if !self.shaders.iter().any(|s| Arc::ptr_eq(s, &shader)) {
                    self.shaders.push(shader);
                }
            }
        }
        self.lights = lights;
    }
}

impl Default for PipeSetup {
    fn default() -> Self {
        Self::new()
    }
}

/// One rendering pass over a bounded priority range.
pub trait Pipe {
    /// Pipe name, for diagnostics.
    fn name(&self) -> &str;

    /// The inclusive priority range this pipe submits.
    fn priority_range(&self) -> (i32, i32);

    /// Render this pipe's priority band of `scene` to `target` (`None` for
    /// the frame buffer).
    fn render(
        &mut self,
        target: Option<&Arc<dyn RenderTexture>>,
        context: &mut dyn Context,
        scene: &Scene,
        camera: &mut Camera,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gr::device::SwContext;
    use crate::light::LightParams;
    use crate::scene::{Node, VisualParams};

    #[test]
    fn test_collect_from_scene_fills_parallel_arrays() {
        let mut context = SwContext::new(640, 480);
        let shader = context.create_shader("shared").unwrap();

        let scene = Scene::new();
        for priority in [3, 7] {
            scene.add(
                Node::new(NodeData::Visual(VisualParams {
                    primitive: None,
                    shader: Some(shader.clone()),
                    priority,
                }))
                .into_handle(),
            );
        }
        scene.add(Node::new(NodeData::Light(LightParams::default())).into_handle());

        let mut setup = PipeSetup::new();
        setup.collect_from_scene(&scene);

        assert_eq!(setup.visuals.len(), 2);
        assert_eq!(setup.priorities, vec![3, 7]);
        assert_eq!(setup.lights.len(), 1);
        // The shared shader appears once.
        assert_eq!(setup.shaders.len(), 1);
    }

    #[test]
    fn test_set_technique_broadcasts() {
        let mut context = SwContext::new(640, 480);
        let mut setup = PipeSetup::new();
        setup.shaders.push(context.create_shader("a").unwrap());
        setup.shaders.push(context.create_shader("b").unwrap());

        let technique = Name::new("Glow").unwrap();
        setup.set_technique(&technique);
        for shader in &setup.shaders {
            assert_eq!(shader.read().unwrap().technique().as_str(), "Glow");
        }
    }

    #[test]
    fn test_collect_replaces_previous_plan() {
        let scene = Scene::new();
        scene.add(
            Node::new(NodeData::Visual(VisualParams::new())).into_handle(),
        );

        let mut setup = PipeSetup::new();
        setup.collect_from_scene(&scene);
        setup.collect_from_scene(&scene);
        assert_eq!(setup.visuals.len(), 1);
        assert_eq!(setup.priorities.len(), 1);
    }
}
