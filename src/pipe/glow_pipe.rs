//! Glow post-process pass.

use super::{Pipe, SharedPipeSetup};
use crate::camera::Camera;
use crate::gr::{BaseTexture, Context, GraphicsError, Name, RenderTexture, Shader, SurfaceFormat};
use crate::math::{Color, Vector4};
use crate::scene::Scene;
use std::sync::{Arc, RwLock};

const DOWNSAMPLE: Name = Name::from_static("Downsample");
const BLUR_H: Name = Name::from_static("BlurH");
const BLUR_V: Name = Name::from_static("BlurV");
const COMBINE: Name = Name::from_static("Combine");

/// Glow tuning parameters.
#[derive(Debug, Clone, Copy)]
pub struct GlowSettings {
    /// Brightness multiplier applied at the composite stage.
    pub intensity: f32,
    /// Exponential trail blend factor in `[0, 1]`; higher values fade the
    /// previous frame's glow faster.
    pub trail: f32,
}

impl Default for GlowSettings {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            trail: 0.7,
        }
    }
}

/// Multi-stage glow: capture the priority band off-screen, downsample,
/// blur, accumulate an exponential trail, and composite additively onto the
/// caller's target.
///
/// The stage topology is fixed. All targets and shaders are allocated at
/// construction; any allocation failure aborts construction.
pub struct GlowPipe {
    setup: SharedPipeSetup,
    min_priority: i32,
    max_priority: i32,
    settings: GlowSettings,
    /// Full-resolution scene capture.
    capture: Arc<dyn RenderTexture>,
    /// Half-resolution downsample.
    downsampled: Arc<dyn RenderTexture>,
    /// Horizontal blur output.
    blurred: Arc<dyn RenderTexture>,
    /// Vertical blur output, accumulated across frames for the trail.
    accumulation: Arc<dyn RenderTexture>,
    downsample_shader: Arc<RwLock<Shader>>,
    blur_h_shader: Arc<RwLock<Shader>>,
    blur_v_shader: Arc<RwLock<Shader>>,
    combine_shader: Arc<RwLock<Shader>>,
}

impl GlowPipe {
    /// Create a glow pass for the given priority range, allocating all
    /// intermediate targets and shaders through `context`.
    pub fn new(
        context: &mut dyn Context,
        setup: SharedPipeSetup,
        min_priority: i32,
        max_priority: i32,
        settings: GlowSettings,
    ) -> Result<Self, GraphicsError> {
        let width = context.width();
        let height = context.height();
        let half_width = (width / 2).max(1);
        let half_height = (height / 2).max(1);

        let capture = context.create_render_texture(width, height, SurfaceFormat::R8G8B8A8)?;
        let downsampled =
            context.create_render_texture(half_width, half_height, SurfaceFormat::R8G8B8A8)?;
        let blurred =
            context.create_render_texture(half_width, half_height, SurfaceFormat::R8G8B8A8)?;
        let accumulation =
            context.create_render_texture(half_width, half_height, SurfaceFormat::R8G8B8A8)?;

        let downsample_shader = Self::stage_shader(context, "glow downsample", &DOWNSAMPLE)?;
        let blur_h_shader = Self::stage_shader(context, "glow blur h", &BLUR_H)?;
        let blur_v_shader = Self::stage_shader(context, "glow blur v", &BLUR_V)?;
        let combine_shader = Self::stage_shader(context, "glow combine", &COMBINE)?;

        Ok(Self {
            setup,
            min_priority,
            max_priority,
            settings,
            capture,
            downsampled,
            blurred,
            accumulation,
            downsample_shader,
            blur_h_shader,
            blur_v_shader,
            combine_shader,
        })
    }

    /// Current glow tuning.
    #[inline]
    pub fn settings(&self) -> GlowSettings {
        self.settings
    }

    /// Adjust glow tuning; applies from the next frame.
    #[inline]
    pub fn set_settings(&mut self, settings: GlowSettings) {
        self.settings = settings;
    }

    fn stage_shader(
        context: &mut dyn Context,
        name: &str,
        technique: &Name,
    ) -> Result<Arc<RwLock<Shader>>, GraphicsError> {
        let shader = context.create_shader(name)?;
        if let Ok(mut guard) = shader.write() {
            guard.set_technique(technique);
        }
        Ok(shader)
    }

    /// Draw one fullscreen stage reading `source` into the bound target.
    fn run_stage(
        &self,
        context: &mut dyn Context,
        shader: &Arc<RwLock<Shader>>,
        source: Arc<dyn BaseTexture>,
    ) {
        if let Ok(mut guard) = shader.write() {
            guard.set_texture("source", source);
            guard.set_vector(
                "params",
                Vector4::new(self.settings.intensity, self.settings.trail, 0.0, 0.0),
            );
            context.draw_fullscreen(&guard);
        }
    }
}

impl Pipe for GlowPipe {
    fn name(&self) -> &str {
        "glow"
    }

    fn priority_range(&self) -> (i32, i32) {
        (self.min_priority, self.max_priority)
    }

    fn render(
        &mut self,
        target: Option<&Arc<dyn RenderTexture>>,
        context: &mut dyn Context,
        _scene: &Scene,
        camera: &mut Camera,
    ) {
        // Capture the band into the full-resolution target. The target keeps
        // its contents across frames, so clear last frame's capture first.
        context.set_render_target(Some(&self.capture));
        context.clear_render_target(Color::BLACK);
        {
            let Ok(setup) = self.setup.read() else { return };
            camera.render(
                context,
                self.min_priority,
                self.max_priority,
                &setup.visuals,
                &setup.priorities,
                &setup.lights,
            );
        }

        // Downsample to half resolution.
        context.set_render_target(Some(&self.downsampled));
        self.run_stage(context, &self.downsample_shader, self.capture.clone());

        // Separable blur; the vertical stage accumulates the trail.
        context.set_render_target(Some(&self.blurred));
        self.run_stage(context, &self.blur_h_shader, self.downsampled.clone());

        context.set_render_target(Some(&self.accumulation));
        self.run_stage(context, &self.blur_v_shader, self.blurred.clone());

        // Additive composite onto the caller's target.
        context.set_render_target(target);
        self.run_stage(context, &self.combine_shader, self.accumulation.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gr::device::SwContext;
    use crate::gr::RenderScene;
    use crate::pipe::PipeSetup;

    fn glow(context: &mut SwContext) -> GlowPipe {
        GlowPipe::new(
            context,
            PipeSetup::new().into_shared(),
            0,
            10,
            GlowSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_construction_allocates_four_targets() {
        let mut context = SwContext::new(640, 480);
        let before = context.live_objects();
        let _pipe = glow(&mut context);
        assert_eq!(context.live_objects(), before + 4);
    }

    #[test]
    fn test_half_resolution_intermediates() {
        let mut context = SwContext::new(640, 480);
        let pipe = glow(&mut context);
        assert_eq!(pipe.capture.width(), 640);
        assert_eq!(pipe.downsampled.width(), 320);
        assert_eq!(pipe.downsampled.height(), 240);
        assert_eq!(pipe.accumulation.width(), 320);
    }

    #[test]
    fn test_render_drives_four_fullscreen_stages() {
        let mut context = SwContext::new(640, 480);
        let mut pipe = glow(&mut context);
        let scene = Scene::new();
        let mut camera = Camera::new();

        {
            let mut scope = RenderScene::new(&mut context);
            pipe.render(None, scope.context(), &scene, &mut camera);
        }
        // No visuals in the band; the four fullscreen stages still run.
        assert_eq!(context.statistics().draw_calls, 4);
        // Final composite leaves the caller's target bound.
        assert!(context.render_target().is_none());
    }

    #[test]
    fn test_capture_cleared_every_frame() {
        let mut context = SwContext::new(640, 480);
        let mut pipe = glow(&mut context);
        let scene = Scene::new();
        let mut camera = Camera::new();

        for _ in 0..2 {
            let mut scope = RenderScene::new(&mut context);
            pipe.render(None, scope.context(), &scene, &mut camera);
        }
        // One clear per frame keeps stale capture pixels out of the
        // downsample chain; the trail lives only in the accumulation target.
        assert_eq!(context.clear_count(), 2);
        assert_eq!(context.last_clear(), Some(Color::BLACK));
    }

    #[test]
    fn test_stage_shaders_carry_fixed_techniques() {
        let mut context = SwContext::new(640, 480);
        let pipe = glow(&mut context);
        assert_eq!(pipe.downsample_shader.read().unwrap().technique().as_str(), "Downsample");
        assert_eq!(pipe.blur_h_shader.read().unwrap().technique().as_str(), "BlurH");
        assert_eq!(pipe.blur_v_shader.read().unwrap().technique().as_str(), "BlurV");
        assert_eq!(pipe.combine_shader.read().unwrap().technique().as_str(), "Combine");
    }

    #[test]
    fn test_tiny_context_clamps_intermediates() {
        let mut context = SwContext::new(1, 1);
        let pipe = glow(&mut context);
        assert_eq!(pipe.downsampled.width(), 1);
        assert_eq!(pipe.downsampled.height(), 1);
    }
}
