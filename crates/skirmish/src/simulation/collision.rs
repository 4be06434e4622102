//! Stage 5: pickups, unit contact and obstacles.
//!
//! Every unit queries its own radius plus the widest radius in the world
//! (never less than `MAX_UNIT_RADIUS`), which is wide enough to see
//! anything it can touch. A unit pair is handled only by its lower index,
//! so each unordered pair resolves once per tick.

use skirmish_core::ecs::layout::{physics, stats, status};
use skirmish_core::{flags, VfxKind};
use skirmish_shared::constants::MAX_UNIT_RADIUS;
use skirmish_shared::Vec2;

use super::spawn::colors;
use super::{is_unit, Simulation};
use crate::error::SimError;

/// Direction from `from` to `to`, or +X when they coincide.
#[inline]
fn contact_normal(from: Vec2, to: Vec2, distance: f32) -> Vec2 {
    if distance > f32::EPSILON {
        (to - from) * (1.0 / distance)
    } else {
        Vec2::new(1.0, 0.0)
    }
}

/// Applies `amount` damage from `attacker` to `target`, after defense.
///
/// Invulnerable or shielded targets take nothing. Returns true if the hit
/// killed the target; the kill is credited to the attacker, if there is one.
pub(super) fn apply_damage(
    sim: &mut Simulation,
    attacker: Option<u32>,
    target: u32,
    amount: f32,
    emit_hit: bool,
) -> bool {
    if amount <= 0.0
        || !sim.stores.flags.is_simulated(target)
        || sim.stores.status.is_protected(target)
    {
        return false;
    }

    let defense = sim.stores.stats.get_or_zero(target, stats::DEFENSE).max(0.0);
    let dealt = amount * 100.0 / (100.0 + defense);
    sim.stores.stats.add(target, stats::HEALTH, -dealt);

    let position = sim.stores.transform.position(target).unwrap_or_default();
    if emit_hit {
        sim.vfx.push(position.x, position.y, colors::HIT, VfxKind::Hit, dealt);
    }

    if sim.stores.stats.health(target) > 0.0 {
        return false;
    }

    sim.soft_delete(target);
    let radius = sim.stores.physics.radius(target);
    sim.vfx.push(position.x, position.y, colors::HIT, VfxKind::Death, radius);
    if let Some(attacker) = attacker {
        sim.stores.stats.add(attacker, stats::SCORE, sim.config.combat.kill_score);
        sim.stores.stats.add(attacker, stats::KILLS, 1.0);
    }
    true
}

fn eat(sim: &mut Simulation, eater: u32, food: u32, food_mask: u32) {
    let value = sim.stores.stats.get_or_zero(food, stats::FOOD_VALUE);
    sim.stores.stats.add(eater, stats::SCORE, value);

    let growth = sim.config.combat.growth_per_food * value;
    if let Some(row) = sim.stores.physics.row_mut(eater) {
        let current = row[physics::RADIUS];
        let radius = (current + growth).min(MAX_UNIT_RADIUS).max(current);
        row[physics::RADIUS] = radius;
        row[physics::MASS] = radius * radius;
    }

    if food_mask & flags::POWERUP != 0 {
        let shield = sim.config.combat.shield_duration;
        if let Some(row) = sim.stores.status.row_mut(eater) {
            row[status::SHIELD] = row[status::SHIELD].max(shield);
        }
    }

    sim.soft_delete(food);
    let at = sim.stores.transform.position(food).unwrap_or_default();
    let color = if food_mask & flags::POWERUP != 0 { colors::POWERUP } else { colors::FOOD };
    sim.vfx.push(at.x, at.y, color, VfxKind::Eat, value);
}

fn unit_contact(sim: &mut Simulation, a: u32, b: u32, pa: Vec2, pb: Vec2, distance: f32, reach: f32) {
    let combat = sim.config.combat;
    let scale = combat.contact_damage_scale * sim.dt;
    let damage_a = sim.stores.stats.get_or_zero(a, stats::DAMAGE) * scale;
    let damage_b = sim.stores.stats.get_or_zero(b, stats::DAMAGE) * scale;

    // Contact is simultaneous: both hits land even if one of them kills.
    apply_damage(sim, Some(a), b, damage_a, false);
    apply_damage(sim, Some(b), a, damage_b, false);

    let push = (reach - distance) * combat.knockback * 0.5;
    if push <= 0.0 {
        return;
    }
    let normal = contact_normal(pa, pb, distance);
    let na = pa - normal * push;
    let nb = pb + normal * push;
    sim.stores.transform.set_position(a, na.x, na.y);
    sim.stores.transform.set_position(b, nb.x, nb.y);
}

fn push_out_of_obstacle(sim: &mut Simulation, unit: u32, position: Vec2, rock: Vec2, distance: f32, reach: f32) {
    let normal = contact_normal(rock, position, distance);
    let out = rock + normal * reach;
    sim.stores.transform.set_position(unit, out.x, out.y);

    if let Some(velocity) = sim.stores.physics.velocity(unit) {
        let into = velocity.dot(normal);
        if into < 0.0 {
            sim.stores.physics.set_velocity(unit, velocity - normal * into);
        }
    }
}

pub(super) fn resolve(sim: &mut Simulation) -> Result<(), SimError> {
    let capacity = sim.stores.capacity() as u32;
    let mut candidates = std::mem::take(&mut sim.scratch);

    let pad = sim.contact_pad();

    for id in 0..capacity {
        let mask = sim.stores.flags.get(id);
        if !flags::is_simulated(mask) || !is_unit(mask) {
            continue;
        }
        let Some(position) = sim.stores.transform.position(id) else {
            continue;
        };

        candidates.clear();
        sim.grid.query_radius_into(
            position.x,
            position.y,
            sim.stores.physics.radius(id) + pad,
            &mut candidates,
        );

        for &other in &candidates {
            if other == id {
                continue;
            }
            if !sim.stores.flags.is_simulated(id) {
                break;
            }
            let other_mask = sim.stores.flags.get(other);
            if !flags::is_simulated(other_mask) {
                continue;
            }

            // Knockback and growth move the numbers, so re-read every time.
            let (Some(pa), Some(pb)) =
                (sim.stores.transform.position(id), sim.stores.transform.position(other))
            else {
                continue;
            };
            let reach = sim.stores.physics.radius(id) + sim.stores.physics.radius(other);
            let distance = pa.distance_squared(pb).sqrt();
            if distance >= reach {
                continue;
            }

            if other_mask & flags::FOOD != 0 {
                eat(sim, id, other, other_mask);
            } else if is_unit(other_mask) {
                if other > id {
                    unit_contact(sim, id, other, pa, pb, distance, reach);
                }
            } else if other_mask & flags::OBSTACLE != 0 {
                push_out_of_obstacle(sim, id, pa, pb, distance, reach);
            }
        }
    }

    sim.scratch = candidates;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_shared::SimConfig;

    fn sim() -> Simulation {
        Simulation::new(SimConfig {
            max_entities: 16,
            ..SimConfig::default()
        })
        .unwrap()
    }

    fn unit(sim: &mut Simulation, x: f32, y: f32, radius: f32, role: u32, damage: f32) -> u32 {
        let id = sim.allocate_local().unwrap().index();
        let stores = sim.stores_mut();
        stores.transform.set_position(id, x, y);
        stores.physics.set(id, 0.0, 0.0, radius * radius, radius, 0.0, 500.0);
        stores.stats.set(id, 100.0, damage, 0.0, 0.0);
        stores.flags.set(id, flags::ACTIVE | role);
        id
    }

    fn run(sim: &mut Simulation) {
        sim.grid.rebuild(&sim.stores);
        resolve(sim).unwrap();
    }

    #[test]
    fn test_eating_grows_scores_and_soft_deletes() {
        let mut sim = sim();
        let eater = unit(&mut sim, 100.0, 100.0, 20.0, flags::PLAYER, 0.0);
        let food = sim.spawn_food(110.0, 100.0, false).unwrap().index();
        run(&mut sim);

        let s = sim.stores();
        assert!(s.flags.contains(food, flags::DEAD));
        assert_eq!(s.stats.get(eater, stats::SCORE), Some(1.0));
        let radius = s.physics.radius(eater);
        assert!((radius - (20.0 + sim.config().combat.growth_per_food)).abs() < 1e-5);
        assert!((s.physics.get_or_zero(eater, physics::MASS) - radius * radius).abs() < 1e-3);
        assert!(sim.vfx().as_slice().iter().any(|e| e.kind() == Some(VfxKind::Eat)));
    }

    #[test]
    fn test_food_out_of_reach_survives() {
        let mut sim = sim();
        unit(&mut sim, 100.0, 100.0, 20.0, flags::PLAYER, 0.0);
        let food = sim.spawn_food(130.0, 100.0, false).unwrap().index();
        run(&mut sim);
        assert!(sim.stores().flags.is_simulated(food));
    }

    #[test]
    fn test_powerup_grants_shield() {
        let mut sim = sim();
        let eater = unit(&mut sim, 100.0, 100.0, 20.0, flags::BOT, 0.0);
        sim.spawn_food(105.0, 100.0, true).unwrap();
        run(&mut sim);
        assert!(sim.stores().status.is_active(eater, status::SHIELD));
    }

    #[test]
    fn test_food_is_eaten_once() {
        let mut sim = sim();
        let a = unit(&mut sim, 100.0, 100.0, 20.0, flags::BOT, 0.0);
        let b = unit(&mut sim, 100.0, 100.0, 20.0, flags::BOT | flags::REMOTE, 0.0);
        sim.spawn_food(100.0, 100.0, false).unwrap();
        run(&mut sim);

        let score = |id| sim.stores().stats.get_or_zero(id, stats::SCORE);
        assert_eq!(score(a) + score(b), 1.0);
    }

    #[test]
    fn test_unit_pair_resolves_once_per_tick() {
        let mut sim = sim();
        let a = unit(&mut sim, 100.0, 100.0, 20.0, flags::BOT, 60.0);
        let b = unit(&mut sim, 130.0, 100.0, 20.0, flags::PLAYER, 30.0);
        run(&mut sim);

        let dt = sim.dt();
        let health = |id| sim.stores().stats.health(id);
        assert!((health(b) - (100.0 - 60.0 * dt)).abs() < 1e-4);
        assert!((health(a) - (100.0 - 30.0 * dt)).abs() < 1e-4);

        // Overlap of 10 split evenly: 10 * 0.5 * 0.5 each way.
        let pa = sim.stores().transform.position(a).unwrap();
        let pb = sim.stores().transform.position(b).unwrap();
        assert!((pa.x - 97.5).abs() < 1e-4);
        assert!((pb.x - 132.5).abs() < 1e-4);
    }

    #[test]
    fn test_oversized_unit_meets_lower_index() {
        let mut sim = sim();
        let small = unit(&mut sim, 100.0, 100.0, 20.0, flags::BOT, 10.0);
        let big = unit(&mut sim, 400.0, 100.0, 400.0, flags::BOT, 30.0);
        assert!(small < big);
        run(&mut sim);

        let dt = sim.dt();
        let s = sim.stores();
        assert!((s.stats.health(small) - (100.0 - 30.0 * dt)).abs() < 1e-4);
        assert!((s.stats.health(big) - (100.0 - 10.0 * dt)).abs() < 1e-4);
    }

    #[test]
    fn test_eating_never_shrinks_oversized_unit() {
        let mut sim = sim();
        let eater = unit(&mut sim, 1000.0, 1000.0, 300.0, flags::BOT, 0.0);
        sim.spawn_food(1010.0, 1000.0, false).unwrap();
        run(&mut sim);
        assert_eq!(sim.stores().physics.radius(eater), 300.0);
    }

    #[test]
    fn test_protection_and_defense() {
        let mut sim = sim();
        let attacker = unit(&mut sim, 0.0, 0.0, 10.0, flags::BOT, 0.0);
        let shielded = unit(&mut sim, 500.0, 0.0, 10.0, flags::BOT, 0.0);
        let armored = unit(&mut sim, 900.0, 0.0, 10.0, flags::BOT, 0.0);
        sim.stores_mut().status.set(shielded, 0.0, 0.0, 0.0, 2.0);
        sim.stores_mut().stats.add(armored, stats::DEFENSE, 100.0);

        assert!(!apply_damage(&mut sim, Some(attacker), shielded, 50.0, true));
        assert_eq!(sim.stores().stats.health(shielded), 100.0);

        apply_damage(&mut sim, Some(attacker), armored, 50.0, true);
        assert!((sim.stores().stats.health(armored) - 75.0).abs() < 1e-5);
    }

    #[test]
    fn test_kill_credits_attacker() {
        let mut sim = sim();
        let attacker = unit(&mut sim, 0.0, 0.0, 10.0, flags::PLAYER, 0.0);
        let victim = unit(&mut sim, 500.0, 0.0, 10.0, flags::BOT, 0.0);

        assert!(apply_damage(&mut sim, Some(attacker), victim, 150.0, false));
        let s = sim.stores();
        assert!(s.flags.contains(victim, flags::DEAD));
        assert_eq!(s.stats.get(attacker, stats::KILLS), Some(1.0));
        assert_eq!(s.stats.get(attacker, stats::SCORE), Some(sim.config().combat.kill_score));
        assert!(sim.vfx().as_slice().iter().any(|e| e.kind() == Some(VfxKind::Death)));

        // Already dead: no second credit.
        assert!(!apply_damage(&mut sim, Some(attacker), victim, 150.0, false));
        assert_eq!(sim.stores().stats.get(attacker, stats::KILLS), Some(1.0));
    }

    #[test]
    fn test_obstacle_pushes_unit_out() {
        let mut sim = sim();
        let u = unit(&mut sim, 120.0, 100.0, 20.0, flags::BOT, 0.0);
        sim.stores_mut().physics.set_velocity(u, Vec2::new(-50.0, 10.0));
        sim.spawn_obstacle(100.0, 100.0, 30.0).unwrap();
        run(&mut sim);

        let p = sim.stores().transform.position(u).unwrap();
        assert!((p.x - 150.0).abs() < 1e-4);
        assert_eq!(sim.stores().physics.velocity(u), Some(Vec2::new(0.0, 10.0)));
    }
}
