//! Concrete graphics back-ends.
//!
//! [`sw`] is the fully software-resident reference back-end; [`gpu`] drives
//! a headless wgpu device.

pub mod gpu;
pub mod sw;

pub use gpu::GpuContext;
pub use sw::SwContext;
