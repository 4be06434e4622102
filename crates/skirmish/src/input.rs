//! # Input Staging
//!
//! Inputs arrive whenever the transport delivers them, but the simulation
//! only reads them at the start of a tick. [`InputQueue`] buffers commands
//! between ticks and writes the whole batch into the input store in one
//! call, so no stage ever sees half a batch.

use skirmish_core::ecs::{layout, InputStore};
use skirmish_core::{EntityAllocator, EntityId};
use skirmish_networking::InputPacket;
use skirmish_shared::Vec2;
use tracing::warn;

/// One entity's input for the coming tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputCommand {
    /// Target entity.
    pub entity: EntityId,
    /// Desired move direction; longer than 1 is clamped when steering.
    pub move_dir: Vec2,
    /// Aim point in world units.
    pub aim: Vec2,
    /// Action bitmask (`layout::input::ACTION_*`).
    pub actions: u32,
}

impl InputCommand {
    /// Builds a command from a decoded wire packet.
    #[must_use]
    pub fn from_packet(entity: EntityId, packet: &InputPacket) -> Self {
        let mut actions = 0;
        if packet.is_firing() {
            actions |= layout::input::ACTION_FIRE;
        }
        if packet.is_dashing() {
            actions |= layout::input::ACTION_DASH;
        }
        Self {
            entity,
            move_dir: packet.move_dir(),
            aim: packet.aim(),
            actions,
        }
    }
}

/// Bounded staging buffer, flushed once per tick.
pub struct InputQueue {
    pending: Vec<InputCommand>,
    capacity: usize,
    overflowed: bool,
}

impl InputQueue {
    /// Creates a queue holding at most `capacity` commands per tick.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Vec::with_capacity(capacity),
            capacity,
            overflowed: false,
        }
    }

    /// Commands waiting for the next flush.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is staged.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Stages a command. Returns `false` (and drops it) when full.
    pub fn push(&mut self, command: InputCommand) -> bool {
        if self.pending.len() >= self.capacity {
            if !self.overflowed {
                self.overflowed = true;
                warn!(capacity = self.capacity, "input queue full, dropping commands");
            }
            return false;
        }
        self.pending.push(command);
        true
    }

    /// Writes every staged command whose handle is still valid into
    /// `store`, in arrival order, then empties the queue.
    ///
    /// Returns the number of commands applied. Commands for released
    /// entities are dropped silently.
    pub fn flush_into(&mut self, store: &mut InputStore, allocators: &[&EntityAllocator]) -> usize {
        let mut applied = 0;
        for command in self.pending.drain(..) {
            let valid = allocators.iter().any(|a| a.is_valid(command.entity));
            if valid
                && store.set(command.entity.index(), command.move_dir, command.aim, command.actions)
            {
                applied += 1;
            }
        }
        self.overflowed = false;
        applied
    }

    /// Drops every staged command.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.overflowed = false;
    }
}
