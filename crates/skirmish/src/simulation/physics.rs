//! Stage 2: explicit Euler integration.
//!
//! The only writer of the `PREV_*` transform fields. Projectiles get their
//! previous-position snapshot here but are advanced in their own stage.

use skirmish_core::ecs::layout::{physics, transform};
use skirmish_core::flags;

use super::{Simulation, Stage};
use crate::error::SimError;

pub(super) fn integrate(sim: &mut Simulation) -> Result<(), SimError> {
    let dt = sim.dt;
    let capacity = sim.stores.capacity() as u32;

    for id in 0..capacity {
        let mask = sim.stores.flags.get(id);
        if !flags::is_simulated(mask) {
            continue;
        }

        let (Some(pos), Some(vel)) = (sim.stores.transform.row_mut(id), sim.stores.physics.row(id))
        else {
            continue;
        };

        pos[transform::PREV_X] = pos[transform::X];
        pos[transform::PREV_Y] = pos[transform::Y];
        pos[transform::PREV_ROTATION] = pos[transform::ROTATION];

        if mask & (flags::PROJECTILE | flags::STATIC) != 0 {
            continue;
        }

        let x = pos[transform::X] + vel[physics::VX] * dt;
        let y = pos[transform::Y] + vel[physics::VY] * dt;
        if !(x.is_finite() && y.is_finite()) {
            return Err(SimError::NonFinite {
                stage: Stage::Physics,
                id,
                field: "position",
            });
        }
        pos[transform::X] = x;
        pos[transform::Y] = y;
    }
    Ok(())
}
