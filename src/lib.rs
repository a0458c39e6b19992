//! # hgr - Real-Time 3D Scene-Graph Rendering Engine
//!
//! hgr is a scene-graph rendering engine layered on a platform-abstraction
//! graphics library ("gr") with pluggable back-ends.
//!
//! ## Features
//!
//! - **Math**: vectors, quaternions, column-major matrices, colors
//! - **Gr**: the [`gr::Context`] device abstraction, resource locking,
//!   textures, primitives, shaders, and draw-order scratch buffers
//! - **Scene**: node hierarchy with transforms, fog, and traversal
//! - **Light**: nearest-K dynamic light selection per draw call
//! - **Pipe**: multi-pass frame composition (forward pass, glow
//!   post-process) over draw-priority bands
//!
//! ## Example
//!
//! ```ignore
//! use hgr::prelude::*;
//!
//! let mut context = GpuContext::new(&GraphicsConfig::default())?;
//! let scene = Scene::new();
//! let mut camera = Camera::new();
//!
//! let setup = PipeSetup::new().into_shared();
//! let mut forward = DefaultPipe::new(setup.clone(), "Default", 0, 100)?;
//!
//! setup.write().unwrap().collect_from_scene(&scene);
//! let mut scope = RenderScene::new(&mut context);
//! forward.render(None, scope.context(), &scene, &mut camera);
//! ```

#![warn(missing_docs)]

pub mod camera;
pub mod gr;
pub mod light;
pub mod math;
pub mod pipe;
pub mod scene;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::camera::*;
    pub use crate::gr::device::*;
    pub use crate::gr::*;
    pub use crate::light::*;
    pub use crate::math::*;
    pub use crate::pipe::*;
    pub use crate::scene::*;
}

/// Engine version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const NAME: &str = "hgr";
