//! Transform component for scene nodes.

use crate::math::{Matrix4, Quaternion, Vector3};

/// Position, rotation, and scale with cached local and world matrices.
#[derive(Debug, Clone)]
pub struct Transform {
    /// Local position.
    pub position: Vector3,
    /// Local rotation.
    pub rotation: Quaternion,
    /// Local scale.
    pub scale: Vector3,
    /// Local transformation matrix.
    local_matrix: Matrix4,
    /// World transformation matrix.
    world_matrix: Matrix4,
    /// Whether the local matrix needs recomposing.
    local_dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Create a new identity transform.
    pub fn new() -> Self {
        Self {
            position: Vector3::ZERO,
            rotation: Quaternion::IDENTITY,
            scale: Vector3::ONE,
            local_matrix: Matrix4::IDENTITY,
            world_matrix: Matrix4::IDENTITY,
            local_dirty: false,
        }
    }

    /// Create a transform from position.
    pub fn from_position(position: Vector3) -> Self {
        let mut t = Self::new();
        t.position = position;
        t.local_dirty = true;
        t
    }

    /// Set position.
    #[inline]
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vector3::new(x, y, z);
        self.local_dirty = true;
    }

    /// Set position from vector.
    #[inline]
    pub fn set_position_vec(&mut self, position: Vector3) {
        self.position = position;
        self.local_dirty = true;
    }

    /// Set rotation.
    #[inline]
    pub fn set_rotation(&mut self, rotation: Quaternion) {
        self.rotation = rotation;
        self.local_dirty = true;
    }

    /// Set scale.
    #[inline]
    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.scale = Vector3::new(x, y, z);
        self.local_dirty = true;
    }

    /// Recompose the local matrix if components changed, and return it.
    pub fn update_local_matrix(&mut self) -> &Matrix4 {
        if self.local_dirty {
            self.local_matrix = Matrix4::compose(&self.position, &self.rotation, &self.scale);
            self.local_dirty = false;
        }
        &self.local_matrix
    }

    /// The local matrix as last composed.
    #[inline]
    pub fn local_matrix(&self) -> &Matrix4 {
        &self.local_matrix
    }

    /// The world matrix as last updated by the scene walk.
    #[inline]
    pub fn world_matrix(&self) -> &Matrix4 {
        &self.world_matrix
    }

    /// Recompute the world matrix from the parent's world matrix.
    pub fn update_world_matrix(&mut self, parent_world: Option<&Matrix4>) {
        self.update_local_matrix();
        self.world_matrix = match parent_world {
            Some(parent) => parent.multiply(&self.local_matrix),
            None => self.local_matrix,
        };
    }

    /// World-space position (translation of the world matrix).
    #[inline]
    pub fn world_position(&self) -> Vector3 {
        self.world_matrix.translation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_matrix_composes_through_parent() {
        let mut parent = Transform::from_position(Vector3::new(1.0, 0.0, 0.0));
        parent.update_world_matrix(None);

        let mut child = Transform::from_position(Vector3::new(0.0, 2.0, 0.0));
        child.update_world_matrix(Some(parent.world_matrix()));

        let p = child.world_position();
        assert!(p.approx_eq(&Vector3::new(1.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn test_local_matrix_recomposes_after_set() {
        let mut t = Transform::new();
        t.set_position(3.0, 0.0, 0.0);
        t.update_world_matrix(None);
        assert!(t.world_position().approx_eq(&Vector3::new(3.0, 0.0, 0.0), 1e-6));
    }
}
