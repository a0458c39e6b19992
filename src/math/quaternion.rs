//! Quaternion implementation for rotations.

use super::Vector3;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A quaternion representing a 3D rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Quaternion {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// W component.
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// Identity quaternion (no rotation).
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Create a new quaternion.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Create from an axis and an angle in radians.
    pub fn from_axis_angle(axis: &Vector3, angle: f32) -> Self {
        let half = angle * 0.5;
        let s = half.sin();
        let a = axis.normalized();
        Self {
            x: a.x * s,
            y: a.y * s,
            z: a.z * s,
            w: half.cos(),
        }
    }

    /// Get the squared length.
    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Return a normalized copy.
    pub fn normalized(&self) -> Self {
        let len = self.length_squared().sqrt();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
                w: self.w / len,
            }
        } else {
            Self::IDENTITY
        }
    }

    /// Rotate a vector by this quaternion.
    pub fn rotate_vector(&self, v: &Vector3) -> Vector3 {
        // v' = v + 2 * cross(q.xyz, cross(q.xyz, v) + q.w * v)
        let qv = Vector3::new(self.x, self.y, self.z);
        let uv = qv.cross(v);
        let uuv = qv.cross(&uv);
        *v + (uv * self.w + uuv) * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::consts::PI;

    #[test]
    fn test_axis_angle_rotation() {
        let q = Quaternion::from_axis_angle(&Vector3::UNIT_Y, PI / 2.0);
        let v = q.rotate_vector(&Vector3::UNIT_X);
        assert!(v.approx_eq(&Vector3::new(0.0, 0.0, -1.0), 1e-5));
    }

    #[test]
    fn test_identity_rotation() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert!(Quaternion::IDENTITY.rotate_vector(&v).approx_eq(&v, 1e-6));
    }
}
