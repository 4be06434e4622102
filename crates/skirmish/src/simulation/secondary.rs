//! Stage 6: timers, world bounds, the director and the match outcome.

use rand::Rng;
use skirmish_core::ecs::layout::{stats, transform};
use skirmish_core::{flags, VfxKind};
use skirmish_shared::constants::FOOD_RADIUS;
use tracing::info;

use super::spawn::colors;
use super::{MatchState, Simulation, Stage};
use crate::diagnostics::Diagnostic;
use crate::error::SimError;

/// Bosses appear at least this far from the walls.
const BOSS_SPAWN_MARGIN: f32 = 200.0;

pub(super) fn update(sim: &mut Simulation) -> Result<(), SimError> {
    tick_timers_and_clamp(sim)?;
    sim.elapsed += sim.dt;
    respawn_food(sim);
    escalate(sim);
    evaluate_match(sim);
    Ok(())
}

fn tick_timers_and_clamp(sim: &mut Simulation) -> Result<(), SimError> {
    let dt = sim.dt;
    let width = sim.config.world_width;
    let height = sim.config.world_height;
    let capacity = sim.stores.capacity() as u32;

    for id in 0..capacity {
        let mask = sim.stores.flags.get(id);
        if !flags::is_simulated(mask) {
            continue;
        }
        sim.stores.skill.tick(id, dt);
        sim.stores.status.decay(id, dt);

        if mask & (flags::PROJECTILE | flags::STATIC) != 0 {
            continue;
        }
        let radius = sim.stores.physics.radius(id);
        let Some(row) = sim.stores.transform.row_mut(id) else {
            continue;
        };
        let (x, y) = (row[transform::X], row[transform::Y]);
        if !(x.is_finite() && y.is_finite()) {
            return Err(SimError::NonFinite {
                stage: Stage::Secondary,
                id,
                field: "position",
            });
        }
        // max then min: a body wider than the world ends up centred on the far wall.
        row[transform::X] = x.max(radius).min(width - radius);
        row[transform::Y] = y.max(radius).min(height - radius);
    }
    Ok(())
}

fn respawn_food(sim: &mut Simulation) {
    let director = sim.config.director;
    let alive = sim.food_count() as u32;
    let missing = director.target_food.saturating_sub(alive);

    for _ in 0..missing.min(director.respawn_per_tick) {
        let powerup = director.powerup_one_in > 0 && sim.rng.gen_range(0..director.powerup_one_in) == 0;
        let at = sim.random_point(FOOD_RADIUS);
        if sim.spawn_food(at.x, at.y, powerup).is_none() {
            break;
        }
    }
}

fn escalate(sim: &mut Simulation) {
    let director = sim.config.director;
    if director.escalation_interval <= 0.0 || sim.elapsed < sim.director.next_escalation {
        return;
    }

    sim.director.level += 1;
    sim.director.next_escalation += director.escalation_interval;
    let level = sim.director.level;

    let mut bosses = 0;
    for _ in 0..director.bosses_per_level {
        let at = sim.random_point(BOSS_SPAWN_MARGIN);
        if sim.spawn_boss(at.x, at.y).is_some() {
            bosses += 1;
        }
    }

    info!(tick = sim.tick, level, bosses, "world event: escalation");
    let centre = sim.world_centre();
    sim.vfx
        .push(centre.x, centre.y, colors::BOSS, VfxKind::WorldEvent, level as f32);
    sim.report(Diagnostic::WorldEvent {
        tick: sim.tick,
        level,
        bosses,
    });
}

fn evaluate_match(sim: &mut Simulation) {
    if sim.match_state != MatchState::Running {
        return;
    }
    let Some(player) = sim.local_player else {
        return;
    };

    let index = player.index();
    let outcome = if !sim.is_valid(player) || sim.stores.flags.contains(index, flags::DEAD) {
        MatchState::Lost
    } else if sim.stores.stats.get_or_zero(index, stats::SCORE) >= sim.config.director.win_score {
        MatchState::Won
    } else {
        return;
    };

    sim.match_state = outcome;
    info!(tick = sim.tick, ?outcome, "match over");
    sim.report(Diagnostic::MatchOver {
        tick: sim.tick,
        outcome,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::ecs::layout::{skill, status};
    use skirmish_shared::{DirectorConfig, SimConfig, Vec2};

    fn quiet_director() -> DirectorConfig {
        DirectorConfig {
            target_food: 0,
            escalation_interval: 0.0,
            ..DirectorConfig::default()
        }
    }

    fn sim_with(director: DirectorConfig) -> Simulation {
        Simulation::new(SimConfig {
            max_entities: 64,
            world_width: 1000.0,
            world_height: 1000.0,
            director,
            ..SimConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_timers_count_down() {
        let mut sim = sim_with(quiet_director());
        let player = sim.spawn_player(500.0, 500.0).unwrap().index();
        assert!(sim.stores_mut().skill.trigger(player, 0.0));
        update(&mut sim).unwrap();

        let dt = sim.dt();
        let s = sim.stores();
        let cooldown = s.skill.get_or_zero(player, skill::COOLDOWN);
        assert!((cooldown - (sim.config().combat.fire_cooldown - dt)).abs() < 1e-5);
        let inv = s.status.get_or_zero(player, status::INVULNERABLE);
        assert!((inv - (sim.config().combat.spawn_invulnerability - dt)).abs() < 1e-5);
        assert!((sim.elapsed() - dt).abs() < 1e-7);
    }

    #[test]
    fn test_world_clamp_respects_radius() {
        let mut sim = sim_with(quiet_director());
        let player = sim.spawn_player(500.0, 500.0).unwrap().index();
        sim.stores_mut().transform.set_position(player, -50.0, 2000.0);
        update(&mut sim).unwrap();

        let r = sim.stores().physics.radius(player);
        assert_eq!(sim.stores().transform.position(player), Some(Vec2::new(r, 1000.0 - r)));
    }

    #[test]
    fn test_projectiles_are_not_clamped() {
        let mut sim = sim_with(quiet_director());
        let player = sim.spawn_player(500.0, 500.0).unwrap();
        let shot = sim.spawn_projectile(player, Vec2::new(1.0, 0.0)).unwrap().index();
        sim.stores_mut().transform.set_position(shot, 1200.0, 500.0);
        update(&mut sim).unwrap();
        assert_eq!(sim.stores().transform.position(shot), Some(Vec2::new(1200.0, 500.0)));
    }

    #[test]
    fn test_nan_position_is_a_fault() {
        let mut sim = sim_with(quiet_director());
        let player = sim.spawn_player(500.0, 500.0).unwrap().index();
        sim.stores_mut().transform.set_position(player, f32::NAN, 0.0);
        let err = update(&mut sim).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Secondary));
    }

    #[test]
    fn test_food_respawns_toward_target_at_rate() {
        let mut sim = sim_with(DirectorConfig {
            target_food: 10,
            respawn_per_tick: 4,
            ..quiet_director()
        });
        update(&mut sim).unwrap();
        assert_eq!(sim.food_count(), 4);
        update(&mut sim).unwrap();
        update(&mut sim).unwrap();
        assert_eq!(sim.food_count(), 10);
        update(&mut sim).unwrap();
        assert_eq!(sim.food_count(), 10);
    }

    #[test]
    fn test_escalation_spawns_boss_and_reports() {
        let mut sim = sim_with(DirectorConfig {
            escalation_interval: 0.01,
            bosses_per_level: 2,
            ..quiet_director()
        });
        let rx = sim.diagnostics();
        update(&mut sim).unwrap();

        assert_eq!(sim.director_level(), 1);
        assert_eq!(sim.boss_count(), 2);
        assert!(sim.vfx().as_slice().iter().any(|e| e.kind() == Some(VfxKind::WorldEvent)));
        assert_eq!(
            rx.try_recv(),
            Some(Diagnostic::WorldEvent { tick: 0, level: 1, bosses: 2 })
        );
    }

    #[test]
    fn test_match_lost_when_player_dies() {
        let mut sim = sim_with(quiet_director());
        let rx = sim.diagnostics();
        let player = sim.spawn_player(500.0, 500.0).unwrap();
        update(&mut sim).unwrap();
        assert_eq!(sim.match_state(), MatchState::Running);

        sim.stores_mut().flags.mark_dead(player.index());
        update(&mut sim).unwrap();
        assert_eq!(sim.match_state(), MatchState::Lost);
        assert!(matches!(
            rx.try_recv(),
            Some(Diagnostic::MatchOver { outcome: MatchState::Lost, .. })
        ));
    }

    #[test]
    fn test_match_won_at_score() {
        let mut sim = sim_with(DirectorConfig {
            win_score: 10.0,
            ..quiet_director()
        });
        let player = sim.spawn_player(500.0, 500.0).unwrap().index();
        sim.stores_mut().stats.add(player, stats::SCORE, 10.0);
        update(&mut sim).unwrap();
        assert_eq!(sim.match_state(), MatchState::Won);
    }
}
