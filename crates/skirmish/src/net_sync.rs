//! # Transform Mirroring
//!
//! Glue between a [`Simulation`] and the transform frame codec.
//!
//! ```text
//! HOST sim ── write_transform_frame ──> bytes ──> apply_transform_frame ── PEER sim
//!   local units, id = wire_name(handle)           bound REMOTE units only
//! ```
//!
//! A peer learns which names to bind out of band (a join message, a lobby).
//! Records for names nobody bound are skipped.

use std::fmt::Write as _;

use skirmish_core::{flags, EntityId};
use skirmish_networking::protocol::MAX_ID_LEN;
use skirmish_networking::{decode_transform_frame, ProtocolError, TransformRecord};
use skirmish_shared::Vec2;
use tracing::debug;

use crate::simulation::Simulation;

/// Writes the frame id a host uses for `handle` into `out`.
///
/// The id is the decimal form of the handle's packed bits, so a recycled
/// slot never reuses a name.
pub fn wire_name(handle: EntityId, out: &mut String) {
    out.clear();
    // Writing into a String cannot fail.
    let _ = write!(out, "{}", handle.to_bits());
}

/// What [`Simulation::apply_transform_frame`] did with a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameApplied {
    /// Timestamp from the frame header.
    pub timestamp: u32,
    /// Records written into the stores.
    pub applied: usize,
    /// Records skipped: unbound name, stale handle or non-finite values.
    pub skipped: usize,
}

impl Simulation {
    /// Binds a frame id to a live entity and marks it REMOTE, so AI and
    /// input stop driving it. Rebinding a name replaces the old handle.
    ///
    /// Returns `false` if the handle is stale or the name cannot appear in
    /// a frame.
    pub fn bind_remote(&mut self, name: &str, handle: EntityId) -> bool {
        if name.len() > MAX_ID_LEN || !self.is_valid(handle) {
            debug!(name, "bind_remote rejected");
            return false;
        }
        self.stores.flags.insert(handle.index(), flags::REMOTE);
        self.remote_names.insert(name.to_owned(), handle);
        true
    }

    /// Removes a binding. The entity keeps its REMOTE flag.
    pub fn unbind_remote(&mut self, name: &str) -> Option<EntityId> {
        self.remote_names.remove(name)
    }

    /// Entity bound to `name`, if the binding is still current.
    #[must_use]
    pub fn remote_handle(&self, name: &str) -> Option<EntityId> {
        self.remote_names
            .get(name)
            .copied()
            .filter(|handle| self.is_valid(*handle))
    }

    /// Encodes every live, locally driven unit into the reusable frame
    /// buffer.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::TooManyEntities`] if more than 65535 units qualify.
    pub fn write_transform_frame(&mut self, timestamp: u32) -> Result<&[u8], ProtocolError> {
        self.encoder.begin(timestamp);
        let capacity = self.stores.capacity() as u32;

        for index in 0..capacity {
            let mask = self.stores.flags.get(index);
            if !flags::is_simulated(mask) || mask & flags::UNIT == 0 || mask & flags::REMOTE != 0 {
                continue;
            }
            let Some(handle) = self.handle(index) else {
                continue;
            };
            let (Some(position), Some(velocity)) = (
                self.stores.transform.position(index),
                self.stores.physics.velocity(index),
            ) else {
                continue;
            };

            wire_name(handle, &mut self.id_buf);
            self.encoder.push(&TransformRecord {
                id: &self.id_buf,
                x: position.x,
                y: position.y,
                vx: velocity.x,
                vy: velocity.y,
            })?;
        }
        Ok(self.encoder.finish())
    }

    /// Decodes a transform frame and writes position and velocity into
    /// every bound entity it names.
    ///
    /// Returns `None`, with nothing written, if the frame is malformed.
    pub fn apply_transform_frame(&mut self, bytes: &[u8]) -> Option<FrameApplied> {
        let names = &self.remote_names;
        let stores = &mut self.stores;
        let (local, remote) = (&self.local, self.remote.as_ref());
        let is_valid =
            |h: EntityId| local.is_valid(h) || remote.is_some_and(|r| r.is_valid(h));

        let mut applied = 0;
        let mut skipped = 0;
        let timestamp = decode_transform_frame(bytes, |id, x, y, vx, vy| {
            let target = names.get(id).copied().filter(|h| is_valid(*h));
            let finite = [x, y, vx, vy].iter().all(|v| v.is_finite());
            match target {
                Some(handle) if finite => {
                    let index = handle.index();
                    stores.transform.set_position(index, x, y);
                    stores.physics.set_velocity(index, Vec2::new(vx, vy));
                    applied += 1;
                }
                _ => skipped += 1,
            }
        })?;

        Some(FrameApplied {
            timestamp,
            applied,
            skipped,
        })
    }
}
