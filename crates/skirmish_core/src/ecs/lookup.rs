//! # Reverse Lookup
//!
//! Index → rich logic object, for the few entities that need state the flat
//! tables cannot express (a bot's brain, for example).

use super::entity::{EntityAllocator, EntityId};

/// Generation-stamped secondary index keyed by entity index.
///
/// Every entry remembers the generation it was inserted under. Reads
/// through a handle or an allocator only succeed while that stamp matches,
/// so an entry left behind by a released entity is never served to the
/// slot's next occupant.
///
/// # Example
///
/// ```rust
/// use skirmish_core::{EntityAllocator, EntityLookup};
///
/// let mut allocator = EntityAllocator::new(0, 8);
/// let mut brains: EntityLookup<&str> = EntityLookup::new(8);
///
/// let id = allocator.allocate().expect("room");
/// brains.insert(id, "hunter");
/// assert_eq!(brains.get(id), Some(&"hunter"));
///
/// allocator.release(id.index());
/// let reused = allocator.allocate().expect("room");
/// assert_eq!(reused.index(), id.index());
/// assert_eq!(brains.get(reused), None);
/// ```
pub struct EntityLookup<T> {
    /// One optional `(generation, value)` per entity index.
    slots: Box<[Option<(u32, T)>]>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> EntityLookup<T> {
    /// Creates an empty lookup for `capacity` indices.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        let slots: Vec<Option<(u32, T)>> = (0..capacity).map(|_| None).collect();
        Self {
            slots: slots.into_boxed_slice(),
            len: 0,
        }
    }

    /// Returns the number of indices covered.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no slot is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `value` for `id`, stamped with its generation.
    ///
    /// Returns the previous value in that slot, if any. An out-of-range
    /// handle gives the value back untouched.
    pub fn insert(&mut self, id: EntityId, value: T) -> Result<Option<T>, T> {
        let Some(slot) = self.slots.get_mut(id.index() as usize) else {
            return Err(value);
        };
        let previous = slot.replace((id.generation(), value));
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous.map(|(_, old)| old))
    }

    /// Returns the value for `id` if its generation stamp matches.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        match self.slots.get(id.index() as usize)? {
            Some((generation, value)) if *generation == id.generation() => Some(value),
            _ => None,
        }
    }

    /// Mutable variant of [`get`](Self::get).
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        match self.slots.get_mut(id.index() as usize)? {
            Some((generation, value)) if *generation == id.generation() => Some(value),
            _ => None,
        }
    }

    /// Resolves `index` against the allocator's current generation.
    ///
    /// Returns `None` if the slot is not live or the entry is stale.
    #[inline]
    pub fn get_live_mut(&mut self, allocator: &EntityAllocator, index: u32) -> Option<&mut T> {
        let handle = allocator.handle(index)?;
        self.get_mut(handle)
    }

    /// Removes the entry at `index` whatever its stamp.
    pub fn remove(&mut self, index: u32) -> Option<T> {
        let (_, value) = self.slots.get_mut(index as usize)?.take()?;
        self.len -= 1;
        Some(value)
    }

    /// Empties every slot. The backing array is kept.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.len = 0;
    }
}
