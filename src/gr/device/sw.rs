//! Software reference back-end.
//!
//! Keeps every resource CPU-resident with genuine lock bookkeeping, which
//! makes it the back-end of choice for tests and headless tooling. Draw
//! submission updates statistics only.

use crate::gr::{
    BaseTexture, ClassId, Context, ContextObject, GraphicsError, Id, Name, Platform, Primitive,
    RenderTexture, Shader, Statistics, SurfaceFormat, TextureData,
};
use crate::math::{Color, Vector3};
use std::any::Any;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::sync::{Arc, RwLock, Weak};

/// Lock bookkeeping shared by all software resources.
#[derive(Debug)]
struct LockState {
    lock: Cell<crate::gr::LockType>,
    valid: Cell<bool>,
}

impl LockState {
    fn new() -> Self {
        Self {
            lock: Cell::new(crate::gr::LockType::None),
            valid: Cell::new(true),
        }
    }

    fn lock(&self, lock: crate::gr::LockType) -> crate::gr::LockType {
        let current = self.lock.get();
        assert!(
            !current.is_exclusive(),
            "resource is already exclusively locked"
        );
        assert!(
            !(lock.is_exclusive() && current.is_locked()),
            "cannot take an exclusive lock on a locked resource"
        );
        self.lock.set(lock);
        lock
    }

    fn unlock(&self) {
        assert!(self.lock.get().is_locked(), "unlock without a matching lock");
        self.lock.set(crate::gr::LockType::None);
    }
}

/// A CPU-resident texture.
pub struct SwTexture {
    id: Id,
    width: u32,
    height: u32,
    format: SurfaceFormat,
    pixels: RefCell<Vec<u8>>,
    state: LockState,
}

impl SwTexture {
    fn new(width: u32, height: u32, format: SurfaceFormat, pixels: Vec<u8>) -> Self {
        Self {
            id: Id::new(),
            width,
            height,
            format,
            pixels: RefCell::new(pixels),
            state: LockState::new(),
        }
    }

    /// Read the pixel bytes. Requires a held lock.
    pub fn pixels(&self) -> Ref<'_, Vec<u8>> {
        debug_assert!(self.state.lock.get().is_locked(), "texture read without lock");
        self.pixels.borrow()
    }

    /// Mutate the pixel bytes. Requires a held exclusive lock.
    pub fn pixels_mut(&self) -> RefMut<'_, Vec<u8>> {
        debug_assert!(
            self.state.lock.get().is_exclusive(),
            "texture write without exclusive lock"
        );
        self.pixels.borrow_mut()
    }

    /// Whether the owning context still considers this texture live.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.state.valid.get()
    }
}

impl ContextObject for SwTexture {
    fn class_id(&self) -> ClassId {
        ClassId::Texture
    }

    fn id(&self) -> Id {
        self.id
    }

    fn lock(&self, lock: crate::gr::LockType) -> crate::gr::LockType {
        self.state.lock(lock)
    }

    fn unlock(&self) {
        self.state.unlock();
    }

    fn lock_type(&self) -> crate::gr::LockType {
        self.state.lock.get()
    }

    fn invalidate(&self) {
        self.state.valid.set(false);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl BaseTexture for SwTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> SurfaceFormat {
        self.format
    }
}

/// A CPU-resident render-target texture.
pub struct SwRenderTexture {
    inner: SwTexture,
}

impl SwRenderTexture {
    fn new(width: u32, height: u32, format: SurfaceFormat) -> Self {
        let size = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            inner: SwTexture::new(width, height, format, vec![0; size]),
        }
    }
}

impl ContextObject for SwRenderTexture {
    fn class_id(&self) -> ClassId {
        ClassId::Texture
    }

    fn id(&self) -> Id {
        self.inner.id
    }

    fn lock(&self, lock: crate::gr::LockType) -> crate::gr::LockType {
        self.inner.state.lock(lock)
    }

    fn unlock(&self) {
        self.inner.state.unlock();
    }

    fn lock_type(&self) -> crate::gr::LockType {
        self.inner.state.lock.get()
    }

    fn invalidate(&self) {
        self.inner.state.valid.set(false);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl BaseTexture for SwRenderTexture {
    fn width(&self) -> u32 {
        self.inner.width
    }

    fn height(&self) -> u32 {
        self.inner.height
    }

    fn format(&self) -> SurfaceFormat {
        self.inner.format
    }
}

impl RenderTexture for SwRenderTexture {}

/// A CPU-resident indexed triangle-list primitive.
pub struct SwPrimitive {
    id: Id,
    vertices: Vec<Vector3>,
    indices: Vec<u16>,
    state: LockState,
}

impl SwPrimitive {
    /// Vertex positions. Requires a held lock.
    pub fn vertices(&self) -> &[Vector3] {
        debug_assert!(self.state.lock.get().is_locked(), "primitive read without lock");
        &self.vertices
    }

    /// Triangle indices. Requires a held lock.
    pub fn indices(&self) -> &[u16] {
        debug_assert!(self.state.lock.get().is_locked(), "primitive read without lock");
        &self.indices
    }
}

impl ContextObject for SwPrimitive {
    fn class_id(&self) -> ClassId {
        ClassId::Primitive
    }

    fn id(&self) -> Id {
        self.id
    }

    fn lock(&self, lock: crate::gr::LockType) -> crate::gr::LockType {
        self.state.lock(lock)
    }

    fn unlock(&self) {
        self.state.unlock();
    }

    fn lock_type(&self) -> crate::gr::LockType {
        self.state.lock.get()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Primitive for SwPrimitive {
    fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    fn triangle_count(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }
}

/// Software rendering context.
pub struct SwContext {
    width: u32,
    height: u32,
    stats: Statistics,
    in_scene: bool,
    current_target: Option<Arc<dyn RenderTexture>>,
    last_technique: Option<Name>,
    clears: u32,
    last_clear: Option<Color>,
    live: Vec<Weak<dyn ContextObject>>,
}

impl SwContext {
    /// Create a software context with the given frame buffer size.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "frame buffer must be non-empty");
        log::debug!("created software context {}x{}", width, height);
        Self {
            width,
            height,
            stats: Statistics::default(),
            in_scene: false,
            current_target: None,
            last_technique: None,
            clears: 0,
            last_clear: None,
            live: Vec::new(),
        }
    }

    /// The currently bound render target.
    #[inline]
    pub fn render_target(&self) -> Option<&Arc<dyn RenderTexture>> {
        self.current_target.as_ref()
    }

    /// The technique of the most recently applied shader.
    #[inline]
    pub fn last_technique(&self) -> Option<&Name> {
        self.last_technique.as_ref()
    }

    /// Number of target clears issued so far.
    #[inline]
    pub fn clear_count(&self) -> u32 {
        self.clears
    }

    /// The color of the most recent target clear.
    #[inline]
    pub fn last_clear(&self) -> Option<Color> {
        self.last_clear
    }

    fn register(&mut self, object: Weak<dyn ContextObject>) {
        self.live.push(object);
    }
}

impl Context for SwContext {
    fn platform(&self) -> Platform {
        Platform::Sw
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn begin_scene(&mut self) {
        assert!(!self.in_scene, "begin_scene inside an open scene");
        self.in_scene = true;
    }

    fn end_scene(&mut self) {
        assert!(self.in_scene, "end_scene without begin_scene");
        self.in_scene = false;
    }

    fn set_render_target(&mut self, target: Option<&Arc<dyn RenderTexture>>) {
        if let Some(target) = target {
            debug_assert!(
                target.as_any().is::<SwRenderTexture>(),
                "render target was not created by a software context"
            );
        }
        self.current_target = target.cloned();
        self.stats.state_changes += 1;
    }

    fn clear_render_target(&mut self, color: Color) {
        assert!(self.in_scene, "clear outside begin_scene/end_scene");
        self.clears += 1;
        self.last_clear = Some(color);
        self.stats.state_changes += 1;
    }

    fn apply_shader(&mut self, shader: &Shader) {
        self.last_technique = Some(*shader.technique());
        self.stats.state_changes += 1;
    }

    fn draw_primitive(&mut self, primitive: &dyn Primitive) {
        assert!(self.in_scene, "draw outside begin_scene/end_scene");
        self.stats.draw_calls += 1;
        self.stats.triangles += primitive.triangle_count();
    }

    fn draw_fullscreen(&mut self, shader: &Shader) {
        assert!(self.in_scene, "draw outside begin_scene/end_scene");
        self.last_technique = Some(*shader.technique());
        self.stats.state_changes += 1;
        self.stats.draw_calls += 1;
        self.stats.triangles += 2;
    }

    fn create_texture(&mut self, data: &TextureData) -> Result<Arc<dyn BaseTexture>, GraphicsError> {
        if data.pixels.len() != data.expected_len() {
            return Err(GraphicsError::TextureAllocation {
                width: data.width,
                height: data.height,
                reason: format!(
                    "pixel data is {} bytes, expected {}",
                    data.pixels.len(),
                    data.expected_len()
                ),
            });
        }
        let texture = Arc::new(SwTexture::new(
            data.width,
            data.height,
            data.format,
            data.pixels.clone(),
        ));
        let weak: Weak<dyn ContextObject> =
            Arc::downgrade(&(Arc::clone(&texture) as Arc<dyn ContextObject>));
        self.register(weak);
        Ok(texture)
    }

    fn create_render_texture(
        &mut self,
        width: u32,
        height: u32,
        format: SurfaceFormat,
    ) -> Result<Arc<dyn RenderTexture>, GraphicsError> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::TextureAllocation {
                width,
                height,
                reason: "render target must be non-empty".to_owned(),
            });
        }
        let texture = Arc::new(SwRenderTexture::new(width, height, format));
        let weak: Weak<dyn ContextObject> =
            Arc::downgrade(&(Arc::clone(&texture) as Arc<dyn ContextObject>));
        self.register(weak);
        Ok(texture)
    }

    fn create_primitive(
        &mut self,
        vertices: &[Vector3],
        indices: &[u16],
    ) -> Result<Arc<dyn Primitive>, GraphicsError> {
        let primitive = Arc::new(SwPrimitive {
            id: Id::new(),
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
            state: LockState::new(),
        });
        let weak: Weak<dyn ContextObject> =
            Arc::downgrade(&(Arc::clone(&primitive) as Arc<dyn ContextObject>));
        self.register(weak);
        Ok(primitive)
    }

    fn create_shader(&mut self, name: &str) -> Result<Arc<RwLock<Shader>>, GraphicsError> {
        let name = Name::new(name)?;
        Ok(Arc::new(RwLock::new(Shader::new(name))))
    }

    fn statistics(&self) -> &Statistics {
        &self.stats
    }

    fn statistics_mut(&mut self) -> &mut Statistics {
        &mut self.stats
    }

    fn live_objects(&mut self) -> usize {
        self.live.retain(|weak| weak.strong_count() > 0);
        self.live.len()
    }
}

impl Drop for SwContext {
    fn drop(&mut self) {
        let mut invalidated = 0usize;
        for weak in &self.live {
            if let Some(object) = weak.upgrade() {
                object.invalidate();
                invalidated += 1;
            }
        }
        if invalidated > 0 {
            log::debug!("software context dropped with {} live objects", invalidated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gr::{Lock, LockType, RenderScene};

    #[test]
    fn test_aspect() {
        let context = SwContext::new(1280, 720);
        assert!((context.aspect() - 1280.0 / 720.0).abs() < 1e-6);
    }

    #[test]
    fn test_render_scene_guard_pairs() {
        let mut context = SwContext::new(64, 64);
        {
            let _scene = RenderScene::new(&mut context);
        }
        // Guard ended the scene; a fresh begin must succeed.
        context.begin_scene();
        context.end_scene();
    }

    #[test]
    #[should_panic(expected = "begin_scene inside an open scene")]
    fn test_nested_begin_asserts() {
        let mut context = SwContext::new(64, 64);
        context.begin_scene();
        context.begin_scene();
    }

    #[test]
    #[should_panic(expected = "end_scene without begin_scene")]
    fn test_unmatched_end_asserts() {
        let mut context = SwContext::new(64, 64);
        context.end_scene();
    }

    #[test]
    fn test_draw_statistics() {
        let mut context = SwContext::new(64, 64);
        let primitive = context
            .create_primitive(
                &[Vector3::ZERO, Vector3::UNIT_X, Vector3::UNIT_Y],
                &[0, 1, 2],
            )
            .unwrap();

        context.statistics_mut().reset();
        {
            let mut scene = RenderScene::new(&mut context);
            scene.context().draw_primitive(primitive.as_ref());
        }
        assert_eq!(context.statistics().draw_calls, 1);
        assert_eq!(context.statistics().triangles, 1);
    }

    #[test]
    fn test_texture_lock_discipline() {
        let mut context = SwContext::new(64, 64);
        let data = TextureData::new(2, 2, SurfaceFormat::R8G8B8A8);
        let texture = context.create_texture(&data).unwrap();

        {
            let guard = Lock::new(texture.as_ref(), LockType::Read);
            assert_eq!(guard.granted(), LockType::Read);
            assert_eq!(texture.lock_type(), LockType::Read);
        }
        assert_eq!(texture.lock_type(), LockType::None);
    }

    #[test]
    fn test_live_objects_and_teardown_invalidate() {
        let mut context = SwContext::new(64, 64);
        let data = TextureData::new(2, 2, SurfaceFormat::R8G8B8A8);
        let kept = context.create_texture(&data).unwrap();
        let dropped = context.create_texture(&data).unwrap();
        assert_eq!(context.live_objects(), 2);

        drop(dropped);
        assert_eq!(context.live_objects(), 1);

        drop(context);
        let kept = kept
            .as_any()
            .downcast_ref::<SwTexture>()
            .expect("software texture");
        assert!(!kept.is_valid());
    }

    #[test]
    fn test_create_texture_rejects_bad_payload() {
        let mut context = SwContext::new(64, 64);
        let mut data = TextureData::new(2, 2, SurfaceFormat::R8G8B8A8);
        data.pixels.pop();
        assert!(matches!(
            context.create_texture(&data),
            Err(GraphicsError::TextureAllocation { .. })
        ));
    }

    #[test]
    fn test_clear_render_target_records() {
        let mut context = SwContext::new(64, 64);
        {
            let mut scene = RenderScene::new(&mut context);
            scene.context().clear_render_target(Color::BLACK);
        }
        assert_eq!(context.clear_count(), 1);
        assert_eq!(context.last_clear(), Some(Color::BLACK));
        // A clear is a state change, not a draw.
        assert_eq!(context.statistics().draw_calls, 0);
    }

    #[test]
    #[should_panic(expected = "clear outside begin_scene/end_scene")]
    fn test_clear_outside_scene_asserts() {
        let mut context = SwContext::new(64, 64);
        context.clear_render_target(Color::BLACK);
    }

    #[test]
    fn test_wireframe_is_silent_noop() {
        let mut context = SwContext::new(64, 64);
        context.set_wireframe_enabled(true);
        context.set_wireframe_enabled(false);
    }
}
