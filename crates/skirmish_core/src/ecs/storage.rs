//! # Component Storage
//!
//! Pre-allocated, flat component storage with zero runtime allocations.
//!
//! Each store is one `capacity × STRIDE` array of `f32`:
//! - All slots are zero-filled at creation
//! - Access is O(1) via `id * STRIDE + field`
//! - Out-of-range ids and fields are rejected, never wrapped into a
//!   neighbouring entity's row

use tracing::debug;

/// Flat scalar table with `STRIDE` fields per entity.
///
/// This storage guarantees:
/// - Zero allocations after initialization
/// - O(1) access by entity index
/// - No write ever lands outside the addressed entity's row
///
/// # Example
///
/// ```rust
/// use skirmish_core::StridedStore;
///
/// let mut store: StridedStore<4> = StridedStore::new(16);
/// assert!(store.set(3, 1, 2.5));
/// assert_eq!(store.get(3, 1), Some(2.5));
/// assert!(!store.set(16, 0, 1.0));
/// ```
pub struct StridedStore<const STRIDE: usize> {
    /// The flat array, `capacity * STRIDE` long.
    data: Box<[f32]>,
    /// Capacity (max entities).
    capacity: usize,
}

impl<const STRIDE: usize> StridedStore<STRIDE> {
    /// Creates a zero-filled store for `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity or `STRIDE` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(STRIDE > 0, "Stride must be greater than zero");

        Self {
            data: vec![0.0; capacity * STRIDE].into_boxed_slice(),
            capacity,
        }
    }

    /// Returns the capacity of this storage.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of fields per entity.
    #[inline]
    #[must_use]
    pub const fn stride(&self) -> usize {
        STRIDE
    }

    #[inline]
    fn offset(&self, id: u32, field: usize) -> Option<usize> {
        let id = id as usize;
        if id < self.capacity && field < STRIDE {
            Some(id * STRIDE + field)
        } else {
            if cfg!(debug_assertions) {
                debug!(id, field, capacity = self.capacity, stride = STRIDE, "store access rejected");
            }
            None
        }
    }

    /// Reads one field, or `None` when out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, id: u32, field: usize) -> Option<f32> {
        self.offset(id, field).map(|i| self.data[i])
    }

    /// Reads one field, or `0.0` when out of range.
    #[inline]
    #[must_use]
    pub fn get_or_zero(&self, id: u32, field: usize) -> f32 {
        self.get(id, field).unwrap_or(0.0)
    }

    /// Writes one field.
    ///
    /// This is a **zero-allocation** operation.
    ///
    /// # Returns
    ///
    /// `true` if the field was written, `false` if the id or field was out
    /// of range (nothing is modified).
    #[inline]
    pub fn set(&mut self, id: u32, field: usize, value: f32) -> bool {
        match self.offset(id, field) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    /// Adds `delta` to one field. Returns `false` when out of range.
    #[inline]
    pub fn add(&mut self, id: u32, field: usize, delta: f32) -> bool {
        match self.offset(id, field) {
            Some(i) => {
                self.data[i] += delta;
                true
            }
            None => false,
        }
    }

    /// Returns the whole row for `id`.
    #[inline]
    #[must_use]
    pub fn row(&self, id: u32) -> Option<&[f32]> {
        let base = self.offset(id, 0)?;
        Some(&self.data[base..base + STRIDE])
    }

    /// Returns the whole row for `id`, mutably.
    #[inline]
    pub fn row_mut(&mut self, id: u32) -> Option<&mut [f32]> {
        let base = self.offset(id, 0)?;
        Some(&mut self.data[base..base + STRIDE])
    }

    /// Overwrites the whole row for `id`. Returns `false` when out of range.
    #[inline]
    pub fn set_row(&mut self, id: u32, values: &[f32; STRIDE]) -> bool {
        match self.row_mut(id) {
            Some(row) => {
                row.copy_from_slice(values);
                true
            }
            None => false,
        }
    }

    /// Zeroes the row for `id`.
    #[inline]
    pub fn reset(&mut self, id: u32) {
        if let Some(row) = self.row_mut(id) {
            row.fill(0.0);
        }
    }

    /// Zero-fills every row.
    ///
    /// This is a **zero-allocation** operation - no memory is freed or allocated.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Returns the raw flat array.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_creation() {
        let store: StridedStore<8> = StridedStore::new(1000);
        assert_eq!(store.capacity(), 1000);
        assert_eq!(store.as_slice().len(), 8000);
        assert!(store.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_rows_do_not_alias() {
        let mut store: StridedStore<4> = StridedStore::new(3);
        assert!(store.set_row(1, &[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(store.row(0), Some(&[0.0; 4][..]));
        assert_eq!(store.row(1), Some(&[1.0, 2.0, 3.0, 4.0][..]));
        assert_eq!(store.row(2), Some(&[0.0; 4][..]));
    }

    #[test]
    fn test_out_of_range_writes_change_nothing() {
        let mut store: StridedStore<4> = StridedStore::new(4);
        for id in 0..4 {
            store.set_row(id, &[id as f32; 4]);
        }
        let before = store.as_slice().to_vec();

        assert!(!store.set(4, 0, 9.0));
        assert!(!store.set(u32::MAX, 0, 9.0));
        assert!(!store.set(0, 4, 9.0));
        assert!(!store.add(7, 1, 9.0));
        assert!(!store.set_row(4, &[9.0; 4]));
        store.reset(99);

        assert_eq!(store.as_slice(), &before[..]);
    }

    #[test]
    fn test_add_and_reset() {
        let mut store: StridedStore<2> = StridedStore::new(2);
        store.add(1, 0, 1.5);
        store.add(1, 0, 1.5);
        assert_eq!(store.get(1, 0), Some(3.0));
        store.reset(1);
        assert_eq!(store.get(1, 0), Some(0.0));
    }
}
