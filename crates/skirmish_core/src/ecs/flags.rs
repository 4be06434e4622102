//! # State Flags
//!
//! One exact-integer bitmask per entity. Flags are never stored as floats:
//! an `f32` column would silently lose bits above 24.
//!
//! Gameplay systems visit an entity only when [`ACTIVE`] is set and
//! [`DEAD`] is clear. [`DEAD`] is a soft-delete marker set before the id is
//! released at end of tick.

use tracing::debug;

/// Slot is in use and participates in the simulation.
pub const ACTIVE: u32 = 1 << 0;
/// Controlled by a local or remote player.
pub const PLAYER: u32 = 1 << 1;
/// Controlled by the AI.
pub const BOT: u32 = 1 << 2;
/// Edible pickup.
pub const FOOD: u32 = 1 << 3;
/// Projectile.
pub const PROJECTILE: u32 = 1 << 4;
/// Soft-deleted; released at end of tick.
pub const DEAD: u32 = 1 << 5;
/// Immobile blocker.
pub const OBSTACLE: u32 = 1 << 6;
/// Escalation boss.
pub const BOSS: u32 = 1 << 7;

/// First bit available for domain-specific flags.
pub const DOMAIN_SHIFT: u32 = 8;

/// Member of the static grid partition.
pub const STATIC: u32 = 1 << DOMAIN_SHIFT;
/// Mirrored from the network; not driven by local AI or input.
pub const REMOTE: u32 = 1 << (DOMAIN_SHIFT + 1);
/// Pickup that grants a shield instead of growth.
pub const POWERUP: u32 = 1 << (DOMAIN_SHIFT + 2);

/// Any entity that moves under its own will and can fight.
pub const UNIT: u32 = PLAYER | BOT | BOSS;

/// Returns the flag for domain bit `n` (counted from [`DOMAIN_SHIFT`]).
#[inline]
#[must_use]
pub const fn domain_bit(n: u32) -> u32 {
    1 << (DOMAIN_SHIFT + n)
}

/// Returns true if a mask describes an entity systems should visit.
#[inline]
#[must_use]
pub const fn is_simulated(mask: u32) -> bool {
    mask & (ACTIVE | DEAD) == ACTIVE
}

/// Fixed-capacity `u32` bitmask column.
pub struct FlagStore {
    bits: Box<[u32]>,
}

impl FlagStore {
    /// Creates a zeroed flag column for `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self {
            bits: vec![0; capacity].into_boxed_slice(),
        }
    }

    /// Returns the capacity of this column.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    /// Returns the full mask for `id`, or 0 when out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, id: u32) -> u32 {
        self.bits.get(id as usize).copied().unwrap_or(0)
    }

    /// Returns true if every bit of `mask` is set on `id`.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: u32, mask: u32) -> bool {
        self.get(id) & mask == mask
    }

    /// Returns true if any bit of `mask` is set on `id`.
    #[inline]
    #[must_use]
    pub fn intersects(&self, id: u32, mask: u32) -> bool {
        self.get(id) & mask != 0
    }

    /// Returns true if `id` is ACTIVE and not DEAD.
    #[inline]
    #[must_use]
    pub fn is_simulated(&self, id: u32) -> bool {
        is_simulated(self.get(id))
    }

    /// Overwrites the whole mask. Returns `false` when out of range.
    #[inline]
    pub fn set(&mut self, id: u32, mask: u32) -> bool {
        self.update(id, |_| mask)
    }

    /// Sets the bits of `mask` (bitwise OR). Returns `false` when out of range.
    #[inline]
    pub fn insert(&mut self, id: u32, mask: u32) -> bool {
        self.update(id, |bits| bits | mask)
    }

    /// Clears the bits of `mask` (bitwise AND-NOT). Returns `false` when out
    /// of range.
    #[inline]
    pub fn remove(&mut self, id: u32, mask: u32) -> bool {
        self.update(id, |bits| bits & !mask)
    }

    /// Soft-deletes `id`: clears ACTIVE and sets DEAD.
    #[inline]
    pub fn mark_dead(&mut self, id: u32) -> bool {
        self.update(id, |bits| (bits & !ACTIVE) | DEAD)
    }

    /// Zeroes the mask for `id`.
    #[inline]
    pub fn reset(&mut self, id: u32) {
        self.update(id, |_| 0);
    }

    /// Zero-fills the column.
    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    /// Returns the raw column.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.bits
    }

    /// Iterates ids whose mask is simulated and intersects `mask`.
    pub fn iter_simulated(&self, mask: u32) -> impl Iterator<Item = u32> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(move |(_, bits)| is_simulated(**bits) && **bits & mask != 0)
            .map(|(id, _)| id as u32)
    }

    #[inline]
    fn update(&mut self, id: u32, f: impl FnOnce(u32) -> u32) -> bool {
        if let Some(slot) = self.bits.get_mut(id as usize) {
            *slot = f(*slot);
            true
        } else {
            if cfg!(debug_assertions) {
                debug!(id, capacity = self.bits.len(), "flag write rejected: id out of range");
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut flags = FlagStore::new(8);
        flags.insert(3, ACTIVE | BOT);
        assert!(flags.contains(3, ACTIVE | BOT));
        assert!(flags.is_simulated(3));

        flags.remove(3, BOT);
        assert!(!flags.intersects(3, BOT));
        assert!(flags.contains(3, ACTIVE));
    }

    #[test]
    fn test_mark_dead_stops_simulation() {
        let mut flags = FlagStore::new(8);
        flags.set(1, ACTIVE | FOOD);
        flags.mark_dead(1);
        assert!(!flags.is_simulated(1));
        assert!(flags.contains(1, DEAD | FOOD));
        assert!(!flags.intersects(1, ACTIVE));
    }

    #[test]
    fn test_high_domain_bits_are_exact() {
        let mut flags = FlagStore::new(4);
        let high = domain_bit(23);
        flags.set(0, ACTIVE | high);
        assert_eq!(flags.get(0), ACTIVE | high);
        assert_eq!(high, 1 << 31);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let mut flags = FlagStore::new(4);
        assert!(!flags.insert(4, ACTIVE));
        assert!(!flags.set(u32::MAX, ACTIVE));
        assert!(flags.as_slice().iter().all(|bits| *bits == 0));
        assert_eq!(flags.get(4), 0);
    }

    #[test]
    fn test_iter_simulated() {
        let mut flags = FlagStore::new(6);
        flags.set(0, ACTIVE | BOT);
        flags.set(1, ACTIVE | FOOD);
        flags.set(2, ACTIVE | BOT | DEAD);
        flags.set(4, BOT);
        let bots: Vec<u32> = flags.iter_simulated(BOT).collect();
        assert_eq!(bots, vec![0]);
    }
}
