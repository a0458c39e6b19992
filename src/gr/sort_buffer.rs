//! Reusable scratch buffers for depth-sorting draw submissions.

/// Sentinel appended to the index buffer in debug builds.
#[cfg(debug_assertions)]
const INDEX_SENTINEL: u16 = 0xBEEF;

/// Sentinel appended to the key buffer in debug builds.
#[cfg(debug_assertions)]
const KEY_SENTINEL: f32 = f32::from_bits(0xDEAD_BEEF);

/// A scratch double buffer: a 16-bit index array and a 32-bit float key
/// array, reused across frames to sort draw order without reallocating.
///
/// Both arrays are always resized together. [`reset`](SortBuffer::reset) may
/// grow the backing storage but never implicitly shrinks it. In debug builds
/// each array is tagged with a trailing sentinel to catch buffer overruns;
/// [`check`](SortBuffer::check) verifies them.
///
/// Owned by a single caller per frame; not meant to be shared across
/// concurrent sort operations.
#[derive(Debug, Default)]
pub struct SortBuffer {
    indices: Vec<u16>,
    keys: Vec<f32>,
    index_count: usize,
    key_count: usize,
}

impl SortBuffer {
    /// Create an empty sort buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize to exactly `index_count` indices and `key_count` keys.
    ///
    /// The indices are initialized to 0..index_count, the keys to zero.
    /// Previous contents are discarded; capacity is retained.
    pub fn reset(&mut self, index_count: usize, key_count: usize) {
        assert!(
            index_count <= u16::MAX as usize + 1,
            "sort buffer index count exceeds 16-bit range"
        );

        self.indices.clear();
        self.indices
            .extend((0..index_count).map(|i| i as u16));
        self.keys.clear();
        self.keys.resize(key_count, 0.0);
        self.index_count = index_count;
        self.key_count = key_count;

        #[cfg(debug_assertions)]
        {
            self.indices.push(INDEX_SENTINEL);
            self.keys.push(KEY_SENTINEL);
        }
    }

    /// The index array.
    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices[..self.index_count]
    }

    /// The mutable index array.
    #[inline]
    pub fn indices_mut(&mut self) -> &mut [u16] {
        let n = self.index_count;
        &mut self.indices[..n]
    }

    /// The key array.
    #[inline]
    pub fn keys(&self) -> &[f32] {
        &self.keys[..self.key_count]
    }

    /// The mutable key array.
    #[inline]
    pub fn keys_mut(&mut self) -> &mut [f32] {
        let n = self.key_count;
        &mut self.keys[..n]
    }

    /// Sort the index array ascending by the key each index refers to.
    ///
    /// Unstable sort; ties land in unspecified order.
    pub fn sort(&mut self) {
        let keys = &self.keys;
        self.indices[..self.index_count]
            .sort_unstable_by(|&a, &b| keys[a as usize].total_cmp(&keys[b as usize]));
        self.check();
    }

    /// Verify the debug sentinels are intact. No-op in release builds.
    pub fn check(&self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(
                self.indices.get(self.index_count) == Some(&INDEX_SENTINEL),
                "sort buffer index array overrun"
            );
            debug_assert!(
                self.keys.get(self.key_count).map(|k| k.to_bits())
                    == Some(KEY_SENTINEL.to_bits()),
                "sort buffer key array overrun"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_exact_sizes() {
        let mut buffer = SortBuffer::new();
        buffer.reset(3, 5);
        assert_eq!(buffer.indices().len(), 3);
        assert_eq!(buffer.keys().len(), 5);
        assert_eq!(buffer.indices(), &[0, 1, 2]);
        buffer.check();
    }

    #[test]
    fn test_reset_regrows_without_stale_data() {
        let mut buffer = SortBuffer::new();
        buffer.reset(2, 2);
        buffer.keys_mut()[0] = 42.0;
        buffer.reset(4, 4);
        assert_eq!(buffer.keys(), &[0.0; 4]);
        assert_eq!(buffer.indices(), &[0, 1, 2, 3]);
        buffer.reset(1, 1);
        assert_eq!(buffer.indices().len(), 1);
        assert_eq!(buffer.keys().len(), 1);
        buffer.check();
    }

    #[test]
    fn test_sort_orders_indices_by_key() {
        let mut buffer = SortBuffer::new();
        buffer.reset(5, 5);
        buffer
            .keys_mut()
            .copy_from_slice(&[1.0, 5.0, 2.0, 4.0, 3.0]);
        buffer.sort();
        assert_eq!(buffer.indices(), &[0, 2, 4, 3, 1]);
    }

    #[test]
    fn test_empty_reset() {
        let mut buffer = SortBuffer::new();
        buffer.reset(0, 0);
        assert!(buffer.indices().is_empty());
        assert!(buffer.keys().is_empty());
        buffer.sort();
    }
}
