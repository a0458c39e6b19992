//! Rendering-device abstraction: platform identity, frame scoping, draw
//! submission, and resource factories.

use super::{BaseTexture, GraphicsError, Primitive, RenderTexture, Shader, SurfaceFormat, TextureData};
use crate::math::{Color, Vector3};
use std::sync::{Arc, RwLock};

/// The graphics back-end a context drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// DirectX back-end.
    Dx,
    /// OpenGL ES / EGL back-end.
    Egl,
    /// PSP back-end.
    Psp,
    /// Software reference back-end.
    Sw,
    /// wgpu back-end.
    Wgpu,
}

impl Platform {
    /// Short identifier string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dx => "dx",
            Self::Egl => "egl",
            Self::Psp => "psp",
            Self::Sw => "sw",
            Self::Wgpu => "wgpu",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Dx => "DirectX rendering device",
            Self::Egl => "OpenGL ES rendering device",
            Self::Psp => "PSP rendering device",
            Self::Sw => "Software rendering device",
            Self::Wgpu => "wgpu rendering device",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-frame rendering statistics.
///
/// Reset once per frame by the caller before submitting draws.
#[derive(Debug, Clone, Copy, Default)]
pub struct Statistics {
    /// Number of draw calls submitted.
    pub draw_calls: u32,
    /// Number of triangles submitted.
    pub triangles: u32,
    /// Number of device state changes (shader binds, target binds).
    pub state_changes: u32,
}

impl Statistics {
    /// Zero all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Back-end creation options.
#[derive(Debug, Clone)]
pub struct GraphicsConfig {
    /// Frame buffer width in pixels.
    pub width: u32,
    /// Frame buffer height in pixels.
    pub height: u32,
    /// Prefer the high-performance adapter.
    pub high_performance: bool,
    /// Enable depth testing resources.
    pub depth: bool,
    /// Clear color for frame targets.
    pub clear_color: Color,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            high_performance: true,
            depth: true,
            clear_color: Color::new(0.1, 0.1, 0.1),
        }
    }
}

/// The per-frame rendering-device abstraction.
///
/// One context exclusively owns its device state. A context is designed for
/// single rendering-thread use; multiple contexts may coexist but must not
/// be driven concurrently without external locking.
///
/// Created resources are tracked by weak reference; on teardown the context
/// invalidates every still-live object.
pub trait Context {
    /// Which back-end this context drives.
    fn platform(&self) -> Platform;

    /// Frame buffer width in pixels.
    fn width(&self) -> u32;

    /// Frame buffer height in pixels.
    fn height(&self) -> u32;

    /// Frame buffer aspect ratio (width / height).
    fn aspect(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }

    /// Begin the device frame scope. Must be paired with
    /// [`end_scene`](Context::end_scene); unbalanced calls are a contract
    /// violation. Prefer the [`RenderScene`] guard.
    fn begin_scene(&mut self);

    /// End the device frame scope.
    fn end_scene(&mut self);

    /// Bind a render target, or `None` for the frame buffer.
    ///
    /// The target must have been created by this context.
    fn set_render_target(&mut self, target: Option<&Arc<dyn RenderTexture>>);

    /// Clear the currently bound render target (or the frame buffer) to
    /// `color`. Must be called inside a frame scope.
    ///
    /// Geometry passes load the target's existing contents, so off-screen
    /// targets that are only partially covered each frame must be cleared
    /// explicitly before drawing into them.
    fn clear_render_target(&mut self, color: Color);

    /// Enable or disable wireframe rendering.
    ///
    /// Back-ends without wireframe support silently ignore the request.
    fn set_wireframe_enabled(&mut self, enabled: bool) {
        log::debug!("wireframe mode not supported on {}, ignoring ({})", self.platform(), enabled);
    }

    /// Bind a shader's technique, uniforms, and textures for the next draw.
    fn apply_shader(&mut self, shader: &Shader);

    /// Submit one primitive draw with the currently applied shader.
    fn draw_primitive(&mut self, primitive: &dyn Primitive);

    /// Draw a fullscreen quad with the given shader; used by post-process
    /// pipes.
    fn draw_fullscreen(&mut self, shader: &Shader);

    /// Create a texture from CPU pixel data.
    fn create_texture(&mut self, data: &TextureData) -> Result<Arc<dyn BaseTexture>, GraphicsError>;

    /// Create a render-target-capable texture.
    fn create_render_texture(
        &mut self,
        width: u32,
        height: u32,
        format: SurfaceFormat,
    ) -> Result<Arc<dyn RenderTexture>, GraphicsError>;

    /// Create an indexed triangle-list primitive.
    fn create_primitive(
        &mut self,
        vertices: &[Vector3],
        indices: &[u16],
    ) -> Result<Arc<dyn Primitive>, GraphicsError>;

    /// Create a shader by name.
    fn create_shader(&mut self, name: &str) -> Result<Arc<RwLock<Shader>>, GraphicsError>;

    /// Current frame statistics.
    fn statistics(&self) -> &Statistics;

    /// Mutable frame statistics (for the per-frame reset).
    fn statistics_mut(&mut self) -> &mut Statistics;

    /// Number of live objects created by this context, after pruning
    /// dropped ones.
    fn live_objects(&mut self) -> usize;
}

/// Scope guard bracketing a device frame.
///
/// Constructing the guard calls [`Context::begin_scene`]; dropping it calls
/// [`Context::end_scene`], on every exit path. Nesting is the caller's
/// responsibility to avoid.
pub struct RenderScene<'a> {
    context: &'a mut dyn Context,
}

impl<'a> RenderScene<'a> {
    /// Begin a frame scope on `context`.
    pub fn new(context: &'a mut dyn Context) -> Self {
        context.begin_scene();
        Self { context }
    }

    /// Access the scoped context.
    #[inline]
    pub fn context(&mut self) -> &mut dyn Context {
        self.context
    }
}

impl Drop for RenderScene<'_> {
    fn drop(&mut self) {
        self.context.end_scene();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_lookup_is_total() {
        for platform in [Platform::Dx, Platform::Egl, Platform::Psp, Platform::Sw, Platform::Wgpu] {
            assert!(!platform.name().is_empty());
            assert!(!platform.description().is_empty());
        }
    }

    #[test]
    fn test_statistics_reset() {
        let mut stats = Statistics {
            draw_calls: 10,
            triangles: 3000,
            state_changes: 7,
        };
        stats.reset();
        assert_eq!(stats.draw_calls, 0);
        assert_eq!(stats.triangles, 0);
        assert_eq!(stats.state_changes, 0);
    }
}
