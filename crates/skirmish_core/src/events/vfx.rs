//! # Visual-Effect Queue
//!
//! Fixed-capacity, single-consumer queue of [`VfxEvent`] records. The
//! simulation pushes during a tick; one consumer drains once per frame.
//! Overflowing events are dropped, never wrapped over older ones.

use bytemuck::{Pod, Zeroable};
use tracing::warn;

/// What a [`VfxEvent`] depicts. Stored as `u32` in the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VfxKind {
    /// Entity entered the world.
    Spawn = 0,
    /// Unit died.
    Death = 1,
    /// Pickup consumed.
    Eat = 2,
    /// Damage landed.
    Hit = 3,
    /// Projectile launched.
    ProjectileFired = 4,
    /// Projectile expired without hitting anything.
    ProjectileExpired = 5,
    /// Director escalation.
    WorldEvent = 6,
    /// Dash skill used.
    Dash = 7,
}

impl VfxKind {
    /// Decodes a raw kind value.
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Spawn),
            1 => Some(Self::Death),
            2 => Some(Self::Eat),
            3 => Some(Self::Hit),
            4 => Some(Self::ProjectileFired),
            5 => Some(Self::ProjectileExpired),
            6 => Some(Self::WorldEvent),
            7 => Some(Self::Dash),
            _ => None,
        }
    }
}

/// One visual effect: position, packed RGBA colour, kind and a free
/// scalar (damage, score, radius...).
///
/// Plain old data, 20 bytes, so a drained batch can be cast straight to
/// bytes for a GPU or a network buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct VfxEvent {
    /// World X.
    pub x: f32,
    /// World Y.
    pub y: f32,
    /// Packed `0xRRGGBBAA`.
    pub color: u32,
    /// [`VfxKind`] as `u32`.
    pub kind: u32,
    /// Kind-specific value.
    pub payload: f32,
}

impl VfxEvent {
    /// Returns the decoded kind, if known.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> Option<VfxKind> {
        VfxKind::from_u32(self.kind)
    }
}

/// Bounded VFX queue.
///
/// # Example
///
/// ```rust
/// use skirmish_core::{VfxEvent, VfxKind, VfxQueue};
///
/// let mut queue = VfxQueue::new(2);
/// assert!(queue.push(1.0, 2.0, 0xFF00_00FF, VfxKind::Hit, 10.0));
///
/// let mut frame = [VfxEvent::default(); 8];
/// assert_eq!(queue.drain_into(&mut frame), 1);
/// assert_eq!(frame[0].kind(), Some(VfxKind::Hit));
/// assert_eq!(queue.drain_into(&mut frame), 0);
/// ```
pub struct VfxQueue {
    events: Box<[VfxEvent]>,
    len: usize,
    /// Set on the first drop of an overflow episode.
    overflowed: bool,
    /// Events dropped since construction.
    dropped: u64,
}

impl VfxQueue {
    /// Creates an empty queue holding at most `capacity` events.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self {
            events: vec![VfxEvent::default(); capacity].into_boxed_slice(),
            len: 0,
            overflowed: false,
            dropped: 0,
        }
    }

    /// Maximum queued events.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    /// Queued events.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is queued.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total events dropped to overflow.
    #[inline]
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Queues one event.
    ///
    /// Returns `false` and drops the event when full. The first drop of an
    /// overflow episode logs a warning; the episode ends at the next drain
    /// or clear.
    #[inline]
    pub fn push(&mut self, x: f32, y: f32, color: u32, kind: VfxKind, payload: f32) -> bool {
        let Some(slot) = self.events.get_mut(self.len) else {
            self.dropped += 1;
            if !self.overflowed {
                self.overflowed = true;
                warn!(capacity = self.events.len(), "vfx queue full, dropping events");
            }
            return false;
        };

        *slot = VfxEvent {
            x,
            y,
            color,
            kind: kind as u32,
            payload,
        };
        self.len += 1;
        true
    }

    /// Returns the queued events without consuming them.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[VfxEvent] {
        &self.events[..self.len]
    }

    /// Copies queued events into `target` in push order and empties the
    /// queue.
    ///
    /// Returns the number written. If `target` is shorter than the queue,
    /// the excess is discarded.
    pub fn drain_into(&mut self, target: &mut [VfxEvent]) -> usize {
        let count = self.len.min(target.len());
        target[..count].copy_from_slice(&self.events[..count]);
        self.clear();
        count
    }

    /// Empties the queue and ends any overflow episode.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
        self.overflowed = false;
    }
}
