//! RGB color implementation.

use super::Vector4;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// An RGB color with floating point components in the 0.0 - 1.0 range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
}

impl Color {
    /// Black (0, 0, 0).
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0 };
    /// White (1, 1, 1).
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0 };

    /// Create a new color.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create from a 24-bit hex value (0xRRGGBB).
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
        }
    }

    /// Convert to a 24-bit hex value.
    pub fn to_hex(&self) -> u32 {
        let r = (self.r.clamp(0.0, 1.0) * 255.0).round() as u32;
        let g = (self.g.clamp(0.0, 1.0) * 255.0).round() as u32;
        let b = (self.b.clamp(0.0, 1.0) * 255.0).round() as u32;
        (r << 16) | (g << 8) | b
    }

    /// Pack into a Vector4 with the given alpha, components premultiplied
    /// by the alpha value.
    #[inline]
    pub fn to_premultiplied(&self, alpha: f32) -> Vector4 {
        Vector4::new(self.r * alpha, self.g * alpha, self.b * alpha, alpha)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let c = Color::from_hex(0xFF8040);
        assert_eq!(c.to_hex(), 0xFF8040);
    }

    #[test]
    fn test_premultiplied() {
        let c = Color::new(1.0, 0.5, 0.0);
        let v = c.to_premultiplied(0.5);
        assert!(v.approx_eq(&Vector4::new(0.5, 0.25, 0.0, 0.5), 1e-6));
    }
}
