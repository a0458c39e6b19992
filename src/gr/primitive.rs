//! Geometry resource contract.

use super::ContextObject;

/// An indexed triangle-list geometry resource owned by a back-end.
pub trait Primitive: ContextObject {
    /// Number of vertices in the vertex buffer.
    fn vertex_count(&self) -> u32;

    /// Number of triangles in the index buffer.
    fn triangle_count(&self) -> u32;
}
