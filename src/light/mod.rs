//! # Light Module
//!
//! Dynamic light data and the nearest-K selection used to assign lights to
//! each draw call.

mod sorter;

pub use sorter::LightSorter;

use crate::math::Color;

/// Hard per-draw-call light budget.
pub const MAX_LIGHTS_PER_DRAW: usize = 4;

/// Parameters of a dynamic light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    /// Light color.
    pub color: Color,
    /// Brightness multiplier.
    pub intensity: f32,
    /// Influence radius in world units.
    pub range: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            range: 10.0,
        }
    }
}
