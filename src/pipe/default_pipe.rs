//! Forward-shaded scene pass.

use super::{Pipe, SharedPipeSetup};
use crate::camera::Camera;
use crate::gr::{Context, GraphicsError, Name, RenderTexture};
use crate::math::Vector4;
use crate::scene::{Fog, Scene};
use std::sync::Arc;

/// The forward pass: binds a target, pushes scene fog uniforms to every
/// shader in the plan, selects a named technique, and delegates submission
/// to the camera.
pub struct DefaultPipe {
    setup: SharedPipeSetup,
    technique: Name,
    min_priority: i32,
    max_priority: i32,
}

impl DefaultPipe {
    /// Create a forward pass for the given priority range.
    ///
    /// The technique name is bounded; over-long names are rejected with
    /// [`GraphicsError::NameTooLong`], never truncated.
    pub fn new(
        setup: SharedPipeSetup,
        technique: &str,
        min_priority: i32,
        max_priority: i32,
    ) -> Result<Self, GraphicsError> {
        Ok(Self {
            setup,
            technique: Name::new(technique)?,
            min_priority,
            max_priority,
        })
    }

    /// The technique this pipe selects on the plan's shaders.
    #[inline]
    pub fn technique(&self) -> &Name {
        &self.technique
    }

    /// Fog uniforms for the scene's fog state: a range vector
    /// `[near, far, 1/(far-near), 0]` and a premultiplied color. Any fog
    /// mode other than linear broadcasts zero vectors.
    fn fog_uniforms(scene: &Scene) -> (Vector4, Vector4) {
        match scene.fog() {
            Fog::Linear { color, near, far } => (
                Vector4::new(near, far, 1.0 / (far - near), 0.0),
                color.to_premultiplied(1.0),
            ),
            _ => (Vector4::ZERO, Vector4::ZERO),
        }
    }
}

impl Pipe for DefaultPipe {
    fn name(&self) -> &str {
        "default"
    }

    fn priority_range(&self) -> (i32, i32) {
        (self.min_priority, self.max_priority)
    }

    fn render(
        &mut self,
        target: Option<&Arc<dyn RenderTexture>>,
        context: &mut dyn Context,
        scene: &Scene,
        camera: &mut Camera,
    ) {
        context.set_render_target(target);

        let Ok(setup) = self.setup.read() else { return };
        let (fog_range, fog_color) = Self::fog_uniforms(scene);
        for shader in &setup.shaders {
            if let Ok(mut guard) = shader.write() {
                guard.set_vector("fogRange", fog_range);
                guard.set_vector("fogColor", fog_color);
            }
        }
        setup.set_technique(&self.technique);

        camera.render(
            context,
            self.min_priority,
            self.max_priority,
            &setup.visuals,
            &setup.priorities,
            &setup.lights,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gr::device::SwContext;
    use crate::gr::RenderScene;
    use crate::math::Color;
    use crate::pipe::PipeSetup;

    fn setup_with_shaders(context: &mut SwContext, count: usize) -> SharedPipeSetup {
        let mut setup = PipeSetup::new();
        for i in 0..count {
            setup.shaders.push(context.create_shader(&format!("s{}", i)).unwrap());
        }
        setup.into_shared()
    }

    #[test]
    fn test_no_fog_broadcasts_zero_vectors() {
        let mut context = SwContext::new(640, 480);
        let setup = setup_with_shaders(&mut context, 2);
        let scene = Scene::new();
        let mut camera = Camera::new();

        let mut pipe = DefaultPipe::new(setup.clone(), "Default", 0, 10).unwrap();
        {
            let mut scope = RenderScene::new(&mut context);
            pipe.render(None, scope.context(), &scene, &mut camera);
        }

        for shader in &setup.read().unwrap().shaders {
            let guard = shader.read().unwrap();
            assert_eq!(guard.vector("fogRange").unwrap(), Vector4::ZERO);
            assert_eq!(guard.vector("fogColor").unwrap(), Vector4::ZERO);
        }
    }

    #[test]
    fn test_linear_fog_packing() {
        let mut context = SwContext::new(640, 480);
        let setup = setup_with_shaders(&mut context, 1);
        let mut scene = Scene::new();
        scene.set_fog(Fog::Linear {
            color: Color::new(1.0, 0.5, 0.0),
            near: 10.0,
            far: 110.0,
        });
        let mut camera = Camera::new();

        let mut pipe = DefaultPipe::new(setup.clone(), "Default", 0, 10).unwrap();
        {
            let mut scope = RenderScene::new(&mut context);
            pipe.render(None, scope.context(), &scene, &mut camera);
        }

        let setup_guard = setup.read().unwrap();
        let guard = setup_guard.shaders[0].read().unwrap();
        let range = guard.vector("fogRange").unwrap();
        assert_eq!(range.x, 10.0);
        assert_eq!(range.y, 110.0);
        assert!((range.z - 0.01).abs() < 1e-6);
        assert_eq!(range.w, 0.0);
        let color = guard.vector("fogColor").unwrap();
        assert_eq!(color.x, 1.0);
        assert_eq!(color.w, 1.0);
    }

    #[test]
    fn test_technique_selected_on_every_shader() {
        let mut context = SwContext::new(640, 480);
        let setup = setup_with_shaders(&mut context, 3);
        let scene = Scene::new();
        let mut camera = Camera::new();

        let mut pipe = DefaultPipe::new(setup.clone(), "Skinned", 0, 10).unwrap();
        {
            let mut scope = RenderScene::new(&mut context);
            pipe.render(None, scope.context(), &scene, &mut camera);
        }

        for shader in &setup.read().unwrap().shaders {
            assert_eq!(shader.read().unwrap().technique().as_str(), "Skinned");
        }
    }

    #[test]
    fn test_over_capacity_technique_name_is_rejected() {
        let setup = PipeSetup::new().into_shared();
        let name = "a".repeat(32);
        let result = DefaultPipe::new(setup, &name, 0, 10);
        assert!(matches!(
            result,
            Err(GraphicsError::NameTooLong { len: 32, .. })
        ));
    }

    #[test]
    fn test_max_length_technique_name_is_accepted() {
        let setup = PipeSetup::new().into_shared();
        let name = "a".repeat(31);
        assert!(DefaultPipe::new(setup, &name, 0, 10).is_ok());
    }
}
