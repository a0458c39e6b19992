//! Bounded inline name type for graphics resources and techniques.

use super::GraphicsError;
use std::fmt;

/// Maximum byte length of a [`Name`].
///
/// Matches a 32-byte inline buffer with one byte reserved, so a 32-byte
/// input does not fit and is rejected.
pub const MAX_NAME_LEN: usize = 31;

/// A bounded, inline, copyable name.
///
/// Used for shader technique names and resource labels that must fit a fixed
/// small buffer. Over-long names are rejected at construction, never
/// truncated.
#[derive(Clone, Copy)]
pub struct Name {
    buf: [u8; 32],
    len: u8,
}

impl Name {
    /// Create a name, rejecting inputs longer than [`MAX_NAME_LEN`] bytes.
    pub fn new(s: &str) -> Result<Self, GraphicsError> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_NAME_LEN {
            return Err(GraphicsError::NameTooLong {
                name: s.chars().take(MAX_NAME_LEN).collect(),
                len: bytes.len(),
                max: MAX_NAME_LEN,
            });
        }
        let mut buf = [0u8; 32];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self { buf, len: bytes.len() as u8 })
    }

    /// Create a name from a static string literal.
    ///
    /// Panics if the literal exceeds [`MAX_NAME_LEN`] bytes; intended for
    /// compile-time-known names only.
    pub const fn from_static(s: &'static str) -> Self {
        let bytes = s.as_bytes();
        assert!(bytes.len() <= MAX_NAME_LEN, "static name exceeds capacity");
        let mut buf = [0u8; 32];
        let mut i = 0;
        while i < bytes.len() {
            buf[i] = bytes[i];
            i += 1;
        }
        Self { buf, len: bytes.len() as u8 }
    }

    /// Get the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        // Construction only accepts valid UTF-8.
        std::str::from_utf8(&self.buf[..self.len as usize]).unwrap_or("")
    }

    /// Byte length of the name.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Check if the name is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Name {
    fn default() -> Self {
        Self { buf: [0; 32], len: 0 }
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Name {}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_up_to_capacity() {
        let s = "a".repeat(31);
        let name = Name::new(&s).unwrap();
        assert_eq!(name.as_str(), s);
        assert_eq!(name.len(), 31);
    }

    #[test]
    fn test_rejects_over_capacity() {
        let s = "a".repeat(32);
        assert!(matches!(
            Name::new(&s),
            Err(GraphicsError::NameTooLong { len: 32, max: 31, .. })
        ));
    }

    #[test]
    fn test_empty_default() {
        assert!(Name::default().is_empty());
        assert_eq!(Name::default().as_str(), "");
    }

    #[test]
    fn test_from_static() {
        let name = Name::from_static("Default");
        assert_eq!(name.as_str(), "Default");
    }
}
