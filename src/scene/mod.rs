//! # Scene Module
//!
//! The scene graph: nodes with transforms, parent/child links, and per-kind
//! payloads, plus the [`Scene`] container with fog state and traversal.

mod node;
mod scene;
mod transform;

pub use node::{Node, NodeData, NodeHandle, NodeKind, VisualParams};
pub use scene::{Fog, Scene};
pub use transform::Transform;
