//! Graphics error types.

use thiserror::Error;

/// Errors that can occur in the graphics layer.
///
/// These are the recoverable resource/environment failures: a caller can
/// react by aborting construction of a pipeline or falling back to a simpler
/// one. Programming-contract violations (lock misuse, unbalanced scene
/// bracketing) are asserted instead and are not represented here.
#[derive(Error, Debug)]
pub enum GraphicsError {
    /// Failed to request a GPU adapter.
    #[error("Failed to request adapter: no suitable GPU found")]
    AdapterRequest,

    /// Failed to request a GPU device.
    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// Texture allocation failed.
    #[error("Failed to allocate {width}x{height} texture: {reason}")]
    TextureAllocation {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Failure description.
        reason: String,
    },

    /// A surface format is not supported by the active back-end.
    #[error("Surface format {0} not supported by this back-end")]
    UnsupportedFormat(&'static str),

    /// A name exceeded the fixed capacity of the bounded name buffer.
    #[error("Name \"{name}\" is {len} bytes, exceeds maximum of {max}")]
    NameTooLong {
        /// The offending name (truncated for display).
        name: String,
        /// Actual byte length.
        len: usize,
        /// Maximum allowed byte length.
        max: usize,
    },

    /// Image decoding failed.
    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}
