//! Stage 7: projectile flight, impact and expiry.
//!
//! Projectiles move here rather than in physics so they fly through the
//! positions units hold after collision. A projectile expires on the first
//! unit it hits, on an obstacle, or once it is `MAX_DISTANCE` from where it
//! was fired.

use skirmish_core::ecs::layout::projectile;
use skirmish_core::{flags, EntityId, VfxKind};

use super::collision::apply_damage;
use super::spawn::colors;
use super::{is_unit, Simulation, Stage};
use crate::error::SimError;

pub(super) fn update(sim: &mut Simulation) -> Result<(), SimError> {
    let dt = sim.dt;
    let capacity = sim.stores.capacity() as u32;
    let pad = sim.contact_pad();
    let mut candidates = std::mem::take(&mut sim.scratch);

    for id in 0..capacity {
        let mask = sim.stores.flags.get(id);
        if !flags::is_simulated(mask) || mask & flags::PROJECTILE == 0 {
            continue;
        }
        let (Some(position), Some(velocity)) =
            (sim.stores.transform.position(id), sim.stores.physics.velocity(id))
        else {
            continue;
        };

        let next = position + velocity * dt;
        if !next.is_finite() {
            sim.scratch = candidates;
            return Err(SimError::NonFinite {
                stage: Stage::Projectiles,
                id,
                field: "position",
            });
        }
        sim.stores.transform.set_position(id, next.x, next.y);

        let radius = sim.stores.physics.radius(id);
        // A shooter that died and had its slot reused no longer owns the shot.
        let owner = sim
            .stores
            .projectile
            .owner(id)
            .filter(|handle| sim.is_valid(*handle))
            .map(EntityId::index);
        candidates.clear();
        sim.grid
            .query_radius_into(next.x, next.y, radius + pad, &mut candidates);

        let mut nearest: Option<(u32, f32)> = None;
        let mut blocked = false;
        for &other in &candidates {
            if other == id || Some(other) == owner {
                continue;
            }
            let other_mask = sim.stores.flags.get(other);
            if !flags::is_simulated(other_mask) {
                continue;
            }
            let Some(at) = sim.stores.transform.position(other) else {
                continue;
            };
            let reach = radius + sim.stores.physics.radius(other);
            let distance_sq = next.distance_squared(at);
            if distance_sq >= reach * reach {
                continue;
            }
            if is_unit(other_mask) {
                if nearest.map_or(true, |(_, best)| distance_sq < best) {
                    nearest = Some((other, distance_sq));
                }
            } else if other_mask & flags::OBSTACLE != 0 {
                blocked = true;
            }
        }

        if let Some((target, _)) = nearest {
            let damage = sim.stores.projectile.get_or_zero(id, projectile::DAMAGE);
            apply_damage(sim, owner, target, damage, true);
            sim.soft_delete(id);
            continue;
        }
        if blocked {
            sim.soft_delete(id);
            continue;
        }

        let max_distance = sim.stores.projectile.get_or_zero(id, projectile::MAX_DISTANCE);
        let origin = sim.stores.projectile.origin(id).unwrap_or(next);
        if origin.distance_squared(next) > max_distance * max_distance {
            sim.soft_delete(id);
            sim.vfx
                .push(next.x, next.y, colors::PROJECTILE, VfxKind::ProjectileExpired, 0.0);
        }
    }

    sim.scratch = candidates;
    Ok(())
}
