//! # Headless Arena
//!
//! Runs a populated arena without a renderer and prints a summary.
//!
//! ```text
//! skirmish_headless [config.toml] [ticks]
//! ```
//!
//! With no config file the defaults are used; `ticks` defaults to one
//! simulated minute.

use std::f32::consts::TAU;
use std::process::ExitCode;
use std::time::Instant;

use skirmish::core::{flags, VfxEvent};
use skirmish::{Diagnostic, InputCommand, MatchState, Simulation};
use skirmish_shared::{SimConfig, Vec2};

/// Obstacles placed on a ring around the centre.
const OBSTACLES: u32 = 8;
/// Upper bound on spawned bots.
const MAX_BOTS: u32 = 96;

fn load_config(path: Option<&str>) -> Result<SimConfig, String> {
    match path {
        Some(path) => SimConfig::load(path).map_err(|e| format!("{path}: {e}")),
        None => Ok(SimConfig::default()),
    }
}

fn ring(centre: Vec2, radius: f32, i: u32, n: u32) -> Vec2 {
    let angle = TAU * i as f32 / n as f32;
    Vec2::new(centre.x + radius * angle.cos(), centre.y + radius * angle.sin())
}

fn populate(sim: &mut Simulation) -> u32 {
    let config = sim.config();
    let centre = Vec2::new(config.world_width * 0.5, config.world_height * 0.5);
    let span = config.world_width.min(config.world_height);
    let bots = (config.max_entities as u32 / 16).clamp(1, MAX_BOTS);

    sim.spawn_player(centre.x, centre.y);
    for i in 0..OBSTACLES {
        let at = ring(centre, span * 0.2, i, OBSTACLES);
        sim.spawn_obstacle(at.x, at.y, 40.0);
    }
    let mut spawned = 0;
    for i in 0..bots {
        let at = ring(centre, span * 0.35, i, bots);
        if sim.spawn_bot(at.x, at.y, None).is_some() {
            spawned += 1;
        }
    }
    spawned
}

/// Circles the player and fires outward once a second.
fn drive_player(sim: &mut Simulation) {
    let Some(player) = sim.local_player() else {
        return;
    };
    let Some(position) = sim.stores().transform.position(player.index()) else {
        return;
    };
    let t = sim.elapsed();
    let heading = Vec2::new(t.cos(), t.sin());
    let fire = sim.tick() % u64::from(sim.config().tick_rate) == 0;
    sim.push_input(InputCommand {
        entity: player,
        move_dir: heading,
        aim: position + heading * 100.0,
        actions: if fire { skirmish::core::layout::input::ACTION_FIRE } else { 0 },
    });
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match load_config(args.first().map(String::as_str)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let ticks = match args.get(1).map(|t| t.parse::<u64>()) {
        Some(Ok(ticks)) => ticks,
        Some(Err(e)) => {
            eprintln!("bad tick count: {e}");
            return ExitCode::FAILURE;
        }
        None => u64::from(config.tick_rate) * 60,
    };

    let mut sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let diagnostics = sim.diagnostics();
    let bots = populate(&mut sim);

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                    SKIRMISH HEADLESS ARENA                       ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!("Bots: {bots}  Obstacles: {OBSTACLES}  Ticks: {ticks}");
    println!();

    let mut vfx = vec![VfxEvent::default(); sim.vfx().capacity()];
    let mut vfx_total = 0usize;
    let mut world_events = 0u32;
    let start = Instant::now();

    for _ in 0..ticks {
        drive_player(&mut sim);
        if let Err(e) = sim.step() {
            eprintln!("tick {} failed: {e}", sim.tick());
            break;
        }
        vfx_total += sim.vfx_mut().drain_into(&mut vfx);
        for report in diagnostics.drain() {
            if let Diagnostic::WorldEvent { level, bosses, .. } = report {
                world_events += 1;
                println!("  world event: level {level}, {bosses} boss(es)");
            }
        }
        if sim.match_state() != MatchState::Running {
            break;
        }
    }

    let wall = start.elapsed();
    let per_tick_us = if sim.tick() > 0 {
        wall.as_micros() as f64 / sim.tick() as f64
    } else {
        0.0
    };
    let units = sim.stores().flags.iter_simulated(flags::UNIT).count();

    println!();
    println!("┌─ SUMMARY ──────────────────────────────────────────────────────┐");
    println!("│ Ticks run:          {}", sim.tick());
    println!("│ Simulated time:     {:.1} s", sim.elapsed());
    println!("│ Wall time:          {:.3} s ({per_tick_us:.1} µs/tick)", wall.as_secs_f64());
    println!("│ Live entities:      {}", sim.alive_count());
    println!("│ Units:              {units}");
    println!("│ Food:               {}", sim.food_count());
    println!("│ Bosses:             {}", sim.boss_count());
    println!("│ Projectiles:        {}", sim.projectile_count());
    println!("│ Director level:     {} ({world_events} events)", sim.director_level());
    println!("│ VFX drained:        {vfx_total} (dropped {})", sim.vfx().dropped());
    println!("│ Match:              {:?}", sim.match_state());
    println!("│ Checksum:           {:08x}", sim.checksum());
    println!("└──────────────────────────────────────────────────────────────────┘");

    if sim.is_paused() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
