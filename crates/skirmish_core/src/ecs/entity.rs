//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into component arrays
//! - A generation counter for safe reuse
//!
//! The [`EntityAllocator`] owns the free stack and the generation table for
//! one contiguous slice of the id space. Two allocators may partition the
//! same stores (e.g. local spawns and network mirrors) as long as their
//! ranges do not overlap.

use tracing::warn;

/// Handle to an entity slot.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into component arrays
/// - Upper 32 bits: Generation at allocation time
///
/// A handle is only valid while the allocator's generation for its index
/// still matches, which rules out ABA reuse of a recycled index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns the packed 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

/// Fixed-capacity generational allocator for `[min, max)`.
///
/// All memory is pre-allocated at creation. `allocate` and `release` are
/// O(1) and never touch the heap.
///
/// # Example
///
/// ```rust
/// use skirmish_core::EntityAllocator;
///
/// let mut allocator = EntityAllocator::new(0, 8);
/// let a = allocator.allocate().unwrap();
/// assert_eq!(a.index(), 0);
///
/// allocator.release(a.index());
/// assert!(!allocator.is_valid(a));
///
/// let b = allocator.allocate().unwrap();
/// assert_eq!(b.index(), 0);
/// assert_eq!(b.generation(), a.generation() + 1);
/// ```
pub struct EntityAllocator {
    /// Generation per slot, indexed by `index - min`.
    generations: Box<[u32]>,
    /// Whether each slot is currently handed out.
    live: Box<[bool]>,
    /// Free stack; the top is the most recently freed index, or the
    /// lowest untouched one before anything is freed.
    free_indices: Vec<u32>,
    /// First index owned by this allocator.
    min: u32,
    /// One past the last index owned by this allocator.
    max: u32,
    /// Number of live slots.
    alive_count: usize,
}

impl EntityAllocator {
    /// Creates an allocator owning indices `[min, max)`.
    ///
    /// # Panics
    ///
    /// Panics if the range is empty.
    #[must_use]
    pub fn new(min: u32, max: u32) -> Self {
        assert!(min < max, "Allocator range must not be empty");
        let len = (max - min) as usize;

        Self {
            generations: vec![0; len].into_boxed_slice(),
            live: vec![false; len].into_boxed_slice(),
            free_indices: (min..max).rev().collect(),
            min,
            max,
            alive_count: 0,
        }
    }

    /// Returns the owned range as `(min, max)`.
    #[inline]
    #[must_use]
    pub const fn range(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    /// Returns the number of slots this allocator owns.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        (self.max - self.min) as usize
    }

    /// Returns the number of currently live slots.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Returns the number of free slots.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_indices.len()
    }

    /// Returns true if `index` falls inside this allocator's range.
    #[inline]
    #[must_use]
    pub const fn owns(&self, index: u32) -> bool {
        index >= self.min && index < self.max
    }

    /// Allocates the most recently freed index. A fresh allocator hands
    /// out indices lowest first.
    ///
    /// This is a **zero-allocation** operation - it pops a pre-allocated
    /// free stack.
    ///
    /// # Returns
    ///
    /// The new handle, or `None` when every slot is in use. Callers treat
    /// `None` as "nothing spawned" and skip the spawn.
    #[inline]
    pub fn allocate(&mut self) -> Option<EntityId> {
        let index = self.free_indices.pop()?;
        let slot = (index - self.min) as usize;

        self.live[slot] = true;
        self.alive_count += 1;

        Some(EntityId::new(index, self.generations[slot]))
    }

    /// Releases an index back to the free stack.
    ///
    /// The slot's generation is incremented before the index is reused,
    /// invalidating every handle issued for it so far.
    ///
    /// Indices outside `[min, max)` and indices that are not live are
    /// ignored with a warning.
    ///
    /// # Returns
    ///
    /// `true` if the slot was released.
    pub fn release(&mut self, index: u32) -> bool {
        if !self.owns(index) {
            warn!(
                index,
                min = self.min,
                max = self.max,
                "release ignored: index outside allocator range"
            );
            return false;
        }

        let slot = (index - self.min) as usize;
        if !self.live[slot] {
            warn!(index, "release ignored: index is not live");
            return false;
        }

        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.live[slot] = false;
        self.alive_count -= 1;

        // Capacity was reserved up front; this never reallocates.
        self.free_indices.push(index);
        true
    }

    /// Checks whether a handle still refers to a live slot.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, id: EntityId) -> bool {
        if id.is_null() || !self.owns(id.index()) {
            return false;
        }
        let slot = (id.index() - self.min) as usize;
        self.live[slot] && self.generations[slot] == id.generation()
    }

    /// Returns true if `index` is currently handed out.
    #[inline]
    #[must_use]
    pub fn is_live(&self, index: u32) -> bool {
        self.owns(index) && self.live[(index - self.min) as usize]
    }

    /// Returns the current generation of `index`, if owned.
    #[inline]
    #[must_use]
    pub fn generation(&self, index: u32) -> Option<u32> {
        if self.owns(index) {
            Some(self.generations[(index - self.min) as usize])
        } else {
            None
        }
    }

    /// Returns the live handle for `index`, if any.
    #[inline]
    #[must_use]
    pub fn handle(&self, index: u32) -> Option<EntityId> {
        if self.is_live(index) {
            self.generation(index).map(|generation| EntityId::new(index, generation))
        } else {
            None
        }
    }

    /// Frees every slot.
    ///
    /// Live slots have their generation bumped, so handles issued before the
    /// reset are invalid afterwards.
    pub fn reset(&mut self) {
        for (generation, live) in self.generations.iter_mut().zip(self.live.iter_mut()) {
            if *live {
                *generation = generation.wrapping_add(1);
                *live = false;
            }
        }
        self.free_indices.clear();
        self.free_indices.extend((self.min..self.max).rev());
        self.alive_count = 0;
    }

    /// Frees every slot and re-ranges the allocator to `[min, max)`.
    ///
    /// This is a setup-time operation (it may reallocate). Generations in the
    /// new range start above every generation seen so far, so no handle from
    /// before the reset can validate.
    ///
    /// # Panics
    ///
    /// Panics if the range is empty.
    pub fn reset_range(&mut self, min: u32, max: u32) {
        assert!(min < max, "Allocator range must not be empty");
        if (min, max) == (self.min, self.max) {
            self.reset();
            return;
        }

        let floor = self
            .generations
            .iter()
            .copied()
            .max()
            .unwrap_or(0)
            .wrapping_add(1);
        let len = (max - min) as usize;

        self.generations = vec![floor; len].into_boxed_slice();
        self.live = vec![false; len].into_boxed_slice();
        self.free_indices = (min..max).rev().collect();
        self.min = min;
        self.max = max;
        self.alive_count = 0;
    }
}
