//! # Math Module
//!
//! Value-type math support for the hgr engine: vectors, quaternions,
//! matrices, and colors. Only the subset the rendering core consumes.

mod vector3;
mod vector4;
mod quaternion;
mod matrix4;
mod color;

pub use vector3::Vector3;
pub use vector4::Vector4;
pub use quaternion::Quaternion;
pub use matrix4::Matrix4;
pub use color::Color;

/// Common math constants.
pub mod consts {
    /// Pi constant.
    pub const PI: f32 = std::f32::consts::PI;
}
