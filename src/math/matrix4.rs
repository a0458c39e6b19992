//! 4x4 Matrix implementation.

use super::{Quaternion, Vector3};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A 4x4 matrix stored in column-major order.
/// Used for 3D transformations (model, view, projection matrices).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Matrix4 {
    /// Matrix elements in column-major order.
    /// [m00, m10, m20, m30, m01, m11, m21, m31, m02, m12, m22, m32, m03, m13, m23, m33]
    pub elements: [f32; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        elements: [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Create a translation matrix.
    pub fn from_translation(v: &Vector3) -> Self {
        let mut m = Self::IDENTITY;
        m.elements[12] = v.x;
        m.elements[13] = v.y;
        m.elements[14] = v.z;
        m
    }

    /// Compose a matrix from position, rotation, and scale.
    pub fn compose(position: &Vector3, quaternion: &Quaternion, scale: &Vector3) -> Self {
        let (x, y, z, w) = (quaternion.x, quaternion.y, quaternion.z, quaternion.w);
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, xy, xz) = (x * x2, x * y2, x * z2);
        let (yy, yz, zz) = (y * y2, y * z2, z * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);
        let (sx, sy, sz) = (scale.x, scale.y, scale.z);

        Self {
            elements: [
                (1.0 - (yy + zz)) * sx,
                (xy + wz) * sx,
                (xz - wy) * sx,
                0.0,
                (xy - wz) * sy,
                (1.0 - (xx + zz)) * sy,
                (yz + wx) * sy,
                0.0,
                (xz + wy) * sz,
                (yz - wx) * sz,
                (1.0 - (xx + yy)) * sz,
                0.0,
                position.x,
                position.y,
                position.z,
                1.0,
            ],
        }
    }

    /// Extract the translation component.
    #[inline]
    pub fn translation(&self) -> Vector3 {
        Vector3 {
            x: self.elements[12],
            y: self.elements[13],
            z: self.elements[14],
        }
    }

    /// Multiply with another matrix (self * other).
    pub fn multiply(&self, other: &Matrix4) -> Self {
        let a = &self.elements;
        let b = &other.elements;
        let mut out = [0.0f32; 16];

        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = a[row] * b[col * 4]
                    + a[4 + row] * b[col * 4 + 1]
                    + a[8 + row] * b[col * 4 + 2]
                    + a[12 + row] * b[col * 4 + 3];
            }
        }

        Self { elements: out }
    }

    /// Transform a point (applies translation).
    pub fn transform_point(&self, v: &Vector3) -> Vector3 {
        let e = &self.elements;
        Vector3 {
            x: e[0] * v.x + e[4] * v.y + e[8] * v.z + e[12],
            y: e[1] * v.x + e[5] * v.y + e[9] * v.z + e[13],
            z: e[2] * v.x + e[6] * v.y + e[10] * v.z + e[14],
        }
    }

    /// Create a right-handed perspective projection matrix.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y * 0.5).tan();
        let range_inv = 1.0 / (near - far);
        let mut m = Self { elements: [0.0; 16] };
        m.elements[0] = f / aspect;
        m.elements[5] = f;
        m.elements[10] = (near + far) * range_inv;
        m.elements[11] = -1.0;
        m.elements[14] = 2.0 * near * far * range_inv;
        m
    }

    /// Check approximate equality within an epsilon.
    pub fn approx_eq(&self, other: &Matrix4, epsilon: f32) -> bool {
        self.elements
            .iter()
            .zip(other.elements.iter())
            .all(|(a, b)| (a - b).abs() < epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_compose() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        let m = Matrix4::compose(&p, &Quaternion::IDENTITY, &Vector3::ONE);
        assert!(m.translation().approx_eq(&p, 1e-6));
        assert!(m.approx_eq(&Matrix4::from_translation(&p), 1e-6));
    }

    #[test]
    fn test_multiply_chains_translations() {
        let a = Matrix4::from_translation(&Vector3::new(1.0, 0.0, 0.0));
        let b = Matrix4::from_translation(&Vector3::new(0.0, 2.0, 0.0));
        let c = a.multiply(&b);
        assert!(c.translation().approx_eq(&Vector3::new(1.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn test_transform_point() {
        let m = Matrix4::from_translation(&Vector3::new(5.0, 0.0, 0.0));
        let p = m.transform_point(&Vector3::new(1.0, 1.0, 1.0));
        assert!(p.approx_eq(&Vector3::new(6.0, 1.0, 1.0), 1e-6));
    }
}
