//! # Pipeline Verification Tests
//!
//! End-to-end checks through `Simulation::step()`:
//!
//! 1. **Tick ordering**: input, physics, AI and collision see each other's
//!    writes in the documented order
//! 2. **Soft delete**: DEAD during tick N is released before tick N+1
//! 3. **Fault boundary**: a non-finite value pauses the world
//! 4. **Buffers**: VFX overflow, transform frames, grid consistency
//! 5. **Determinism**: same seed, same checksum
//!
//! Run with: cargo test -p skirmish --test pipeline_test

use skirmish::core::layout::{input, transform};
use skirmish::core::{flags, VfxEvent, VfxKind};
use skirmish::{wire_name, Diagnostic, InputCommand, SimError, Simulation, Stage};
use skirmish_networking::decode_transform_frame;
use skirmish_shared::{DirectorConfig, SimConfig, Vec2};

/// Small arena with the director switched off.
fn quiet_config() -> SimConfig {
    SimConfig {
        max_entities: 64,
        world_width: 1000.0,
        world_height: 1000.0,
        director: DirectorConfig {
            target_food: 0,
            escalation_interval: 0.0,
            ..DirectorConfig::default()
        },
        ..SimConfig::default()
    }
}

fn quiet_sim() -> Simulation {
    Simulation::new(quiet_config()).expect("valid config")
}

fn hand_built(sim: &mut Simulation, x: f32, y: f32, radius: f32, role: u32) -> u32 {
    let id = sim.allocate_local().expect("room").index();
    let stores = sim.stores_mut();
    stores.transform.set(id, x, y, 0.0, 1.0);
    stores.physics.set(id, 0.0, 0.0, radius * radius, radius, 0.0, 500.0);
    stores.flags.set(id, flags::ACTIVE | role);
    id
}

// ============================================================================
// 1. TICK ORDERING
// ============================================================================

#[test]
fn example_scenario_bot_turns_toward_food() {
    let mut sim = quiet_sim();
    let bot = hand_built(&mut sim, 0.0, 0.0, 20.0, flags::BOT);
    let food = hand_built(&mut sim, 5.0, 5.0, 6.0, flags::FOOD);
    let spare = sim.allocate_local().expect("room").index();
    assert_eq!((bot, food, spare), (0, 1, 2));

    sim.step().expect("tick runs");

    let v = sim.stores().physics.velocity(bot).expect("in range");
    assert!(v.x > 0.0 && v.y > 0.0, "velocity {v:?} should point at the food");
    assert!((v.x - v.y).abs() < 1e-4);

    // The pickup was in reach, so it was consumed and released in the same tick.
    assert!(!sim.is_live(food));
    let recycled = sim.allocate_local().expect("room");
    assert_eq!(recycled.index(), 1);
    assert_eq!(recycled.generation(), 1);
}

#[test]
fn physics_snapshots_before_moving() {
    let mut sim = quiet_sim();
    let id = hand_built(&mut sim, 100.0, 100.0, 10.0, flags::OBSTACLE);
    sim.stores_mut().physics.set_velocity(id, Vec2::new(60.0, 0.0));

    sim.step().expect("tick runs");

    let t = &sim.stores().transform;
    assert_eq!(t.get(id, transform::PREV_X), Some(100.0));
    let x = t.get(id, transform::X).expect("in range");
    assert!((x - 101.0).abs() < 1e-4);
}

#[test]
fn staged_input_reaches_the_same_tick() {
    let mut sim = quiet_sim();
    let player = sim.spawn_player(500.0, 500.0).expect("room");
    assert!(sim.push_input(InputCommand {
        entity: player,
        move_dir: Vec2::new(-1.0, 0.0),
        aim: Vec2::new(900.0, 500.0),
        actions: input::ACTION_FIRE,
    }));

    sim.step().expect("tick runs");

    let v = sim.stores().physics.velocity(player.index()).expect("in range");
    assert!(v.x < 0.0 && v.y.abs() < 1e-6);
    assert_eq!(sim.projectile_count(), 1);
}

#[test]
fn stale_input_is_dropped() {
    let mut sim = quiet_sim();
    let player = sim.spawn_player(500.0, 500.0).expect("room");
    sim.stores_mut().flags.mark_dead(player.index());
    sim.step().expect("tick runs");

    sim.push_input(InputCommand {
        entity: player,
        move_dir: Vec2::new(1.0, 0.0),
        aim: Vec2::ZERO,
        actions: 0,
    });
    sim.step().expect("tick runs");
    assert_eq!(sim.stores().input.move_dir(player.index()), Some(Vec2::ZERO));
}

// ============================================================================
// 2. SOFT DELETE
// ============================================================================

#[test]
fn dead_entities_are_released_by_next_tick() {
    let mut sim = quiet_sim();
    let bot = sim.spawn_bot(300.0, 300.0, None).expect("room");
    let food = sim.spawn_food(700.0, 700.0, false).expect("room");

    sim.stores_mut().flags.mark_dead(bot.index());
    sim.stores_mut().flags.mark_dead(food.index());
    sim.step().expect("tick runs");

    assert!(!sim.is_valid(bot));
    assert!(!sim.is_valid(food));
    assert!(sim.brain(bot).is_none());
    assert_eq!(sim.food_count(), 0);
    assert!(sim.stores().flags.as_slice().iter().all(|f| f & flags::DEAD == 0));

    let a = sim.allocate_local().expect("room");
    let b = sim.allocate_local().expect("room");
    assert_eq!((a.index(), a.generation()), (bot.index(), bot.generation() + 1));
    assert_eq!((b.index(), b.generation()), (food.index(), food.generation() + 1));
}

// ============================================================================
// 3. FAULT BOUNDARY
// ============================================================================

#[test]
fn non_finite_velocity_pauses_until_resume() {
    let mut sim = quiet_sim();
    let diagnostics = sim.diagnostics();
    let id = hand_built(&mut sim, 10.0, 10.0, 10.0, flags::BOT);
    sim.stores_mut().physics.set_velocity(id, Vec2::new(f32::NAN, 0.0));

    let err = sim.step().expect_err("NaN must fault");
    assert!(matches!(err, SimError::NonFinite { stage: Stage::Physics, .. }));
    assert!(sim.is_paused());
    assert_eq!(sim.tick(), 0);

    match diagnostics.try_recv() {
        Some(Diagnostic::TickFault { tick, stage, .. }) => {
            assert_eq!(tick, 0);
            assert_eq!(stage, Some(Stage::Physics));
        }
        other => panic!("expected a tick fault, got {other:?}"),
    }
    assert!(matches!(sim.step(), Err(SimError::Paused)));

    sim.stores_mut().physics.set_velocity(id, Vec2::ZERO);
    sim.resume();
    sim.step().expect("runs again after resume");
    assert_eq!(sim.tick(), 1);
}

// ============================================================================
// 4. BUFFERS
// ============================================================================

#[test]
fn vfx_overflow_keeps_capacity_events() {
    let mut sim = Simulation::new(SimConfig {
        vfx_capacity: 4,
        ..quiet_config()
    })
    .expect("valid config");

    for i in 0..5 {
        sim.spawn_food(100.0 + i as f32 * 50.0, 100.0, false);
    }
    assert_eq!(sim.vfx().len(), 4);
    assert_eq!(sim.vfx().dropped(), 1);
    assert!(sim.vfx().as_slice().iter().all(|e| e.kind() == Some(VfxKind::Spawn)));

    let mut out = [VfxEvent::default(); 8];
    assert_eq!(sim.vfx_mut().drain_into(&mut out), 4);
    assert_eq!(sim.vfx_mut().drain_into(&mut out), 0);
}

#[test]
fn transform_frame_matches_store() {
    let mut sim = quiet_sim();
    let player = sim.spawn_player(100.0, 100.0).expect("room");
    let bot = sim.spawn_bot(600.0, 600.0, None).expect("room");
    sim.spawn_food(300.0, 300.0, false);
    for _ in 0..10 {
        sim.step().expect("tick runs");
    }

    let mut names = [String::new(), String::new()];
    wire_name(player, &mut names[0]);
    wire_name(bot, &mut names[1]);
    let expected: Vec<(String, Vec2)> = [player, bot]
        .iter()
        .zip(&names)
        .map(|(h, n)| (n.clone(), sim.stores().transform.position(h.index()).expect("in range")))
        .collect();

    let frame = sim.write_transform_frame(99).expect("fits").to_vec();
    let mut seen = Vec::new();
    let timestamp = decode_transform_frame(&frame, |id, x, y, _, _| {
        seen.push((id.to_owned(), Vec2::new(x, y)));
    });
    assert_eq!(timestamp, Some(99));
    assert_eq!(seen, expected);
}

#[test]
fn grid_holds_every_simulated_entity_once() {
    let mut sim = Simulation::new(SimConfig {
        director: DirectorConfig {
            target_food: 40,
            respawn_per_tick: 40,
            escalation_interval: 0.0,
            ..DirectorConfig::default()
        },
        ..quiet_config()
    })
    .expect("valid config");
    sim.spawn_player(500.0, 500.0);
    for i in 0..6 {
        sim.spawn_bot(150.0 * i as f32 + 100.0, 200.0, None);
    }
    sim.spawn_obstacle(800.0, 800.0, 40.0);
    sim.step().expect("tick runs");
    sim.step().expect("tick runs");

    // Ticks end with cleanup; rebuild against the final state before checking.
    let stores = sim.stores();
    let mut grid = skirmish::core::SpatialGrid::new(1000.0, 1000.0, 128.0, stores.capacity());
    grid.rebuild(stores);

    let mut dynamic = 0;
    let mut fixed = 0;
    let mut out = Vec::new();
    for id in 0..stores.capacity() as u32 {
        if !stores.flags.is_simulated(id) {
            continue;
        }
        if stores.flags.contains(id, flags::STATIC) {
            fixed += 1;
            assert!(sim.grid().is_static(id), "static entity {id}");
            continue;
        }
        dynamic += 1;
        let p = stores.transform.position(id).expect("in range");
        out.clear();
        grid.query_radius_into(p.x, p.y, 0.0, &mut out);
        assert_eq!(out.iter().filter(|c| **c == id).count(), 1, "entity {id}");
    }
    assert_eq!(grid.dynamic_count(), dynamic);
    assert_eq!(sim.grid().static_count(), fixed);
    assert_eq!(fixed, 1 + sim.food_count());
}

// ============================================================================
// 5. DETERMINISM
// ============================================================================

fn populated(seed: u64) -> Simulation {
    let mut sim = Simulation::new(SimConfig {
        max_entities: 512,
        seed,
        ..SimConfig::default()
    })
    .expect("valid config");
    sim.spawn_player(2000.0, 2000.0);
    for i in 0..24 {
        let angle = i as f32 * 0.26;
        sim.spawn_bot(2000.0 + 900.0 * angle.cos(), 2000.0 + 900.0 * angle.sin(), None);
    }
    sim
}

#[test]
fn same_seed_same_checksum() {
    let mut a = populated(7);
    let mut b = populated(7);
    let mut c = populated(8);
    for _ in 0..120 {
        a.step().expect("tick runs");
        b.step().expect("tick runs");
        c.step().expect("tick runs");
    }
    assert_eq!(a.checksum(), b.checksum());
    assert_ne!(a.checksum(), c.checksum());
}

#[test]
fn arenas_are_independent() {
    let mut a = quiet_sim();
    let b = quiet_sim();
    a.spawn_player(10.0, 10.0);
    a.step().expect("tick runs");
    assert_eq!(b.tick(), 0);
    assert_eq!(b.alive_count(), 0);
}
