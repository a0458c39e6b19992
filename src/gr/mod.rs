//! # Graphics Module
//!
//! Platform-abstraction graphics layer: the [`Context`] device abstraction,
//! the [`ContextObject`] resource/locking contract, texture and primitive
//! resources, shaders, and the draw-order scratch buffers. Concrete
//! back-ends live in [`device`].

mod context;
mod error;
mod id;
mod name;
mod object;
mod primitive;
mod shader;
mod sort_buffer;
mod texture;

pub mod device;

pub use context::{Context, GraphicsConfig, Platform, RenderScene, Statistics};
pub use error::GraphicsError;
pub use id::Id;
pub use name::{Name, MAX_NAME_LEN};
pub use object::{ClassId, ContextObject, Lock, LockType};
pub use primitive::Primitive;
pub use shader::{Shader, DEFAULT_TECHNIQUE};
pub use sort_buffer::SortBuffer;
pub use texture::{BaseTexture, RenderTexture, SurfaceFormat, TextureData};
