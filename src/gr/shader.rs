//! CPU-side shader object: named uniforms and technique selection.

use super::{BaseTexture, Id, Name};
use crate::math::Vector4;
use std::collections::HashMap;
use std::sync::Arc;

/// Default technique selected on newly created shaders.
pub const DEFAULT_TECHNIQUE: Name = Name::from_static("Default");

/// A shader program handle.
///
/// Holds the CPU-visible state pushed to the back-end at draw time: vector
/// uniforms, texture bindings, and the active named technique. The actual
/// program objects live inside the back-end context that created the shader.
pub struct Shader {
    id: Id,
    name: Name,
    technique: Name,
    vectors: HashMap<String, Vector4>,
    textures: HashMap<String, Arc<dyn BaseTexture>>,
}

impl Shader {
    /// Create a new shader with the given name.
    pub fn new(name: Name) -> Self {
        Self {
            id: Id::new(),
            name,
            technique: DEFAULT_TECHNIQUE,
            vectors: HashMap::new(),
            textures: HashMap::new(),
        }
    }

    /// Unique shader ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Shader name.
    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Select the active rendering technique.
    #[inline]
    pub fn set_technique(&mut self, technique: &Name) {
        self.technique = *technique;
    }

    /// The active rendering technique.
    #[inline]
    pub fn technique(&self) -> &Name {
        &self.technique
    }

    /// Set a vector uniform by name.
    pub fn set_vector(&mut self, name: &str, value: Vector4) {
        self.vectors.insert(name.to_owned(), value);
    }

    /// Get a vector uniform by name.
    pub fn vector(&self, name: &str) -> Option<Vector4> {
        self.vectors.get(name).copied()
    }

    /// Bind a texture by sampler name.
    pub fn set_texture(&mut self, name: &str, texture: Arc<dyn BaseTexture>) {
        self.textures.insert(name.to_owned(), texture);
    }

    /// Get a bound texture by sampler name.
    pub fn texture(&self, name: &str) -> Option<&Arc<dyn BaseTexture>> {
        self.textures.get(name)
    }
}

impl std::fmt::Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("technique", &self.technique)
            .field("vectors", &self.vectors.len())
            .field("textures", &self.textures.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_default_technique() {
        let shader = Shader::new(Name::from_static("Scene"));
        assert_eq!(shader.technique().as_str(), "Default");
    }

    #[test]
    fn test_vector_uniforms() {
        let mut shader = Shader::new(Name::from_static("Scene"));
        assert!(shader.vector("fogRange").is_none());
        shader.set_vector("fogRange", Vector4::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(
            shader.vector("fogRange"),
            Some(Vector4::new(1.0, 2.0, 3.0, 4.0))
        );
    }
}
