//! Stage 4: bot decisions and player steering.
//!
//! Bots re-decide only when their reaction timer runs out. A decision is a
//! radius query around the bot whose candidates are sorted into the nearest
//! threat, the nearest prey and the best-scoring food; the bot's
//! [`Personality`] turns that into an intent. Between decisions the bot
//! keeps steering toward the last desired velocity.
//!
//! Steering is the same for everyone:
//!
//! ```text
//! v += (desired - v) * steer_factor
//! ```

use rand::Rng;
use skirmish_core::ecs::layout::{input, skill, stats, status};
use skirmish_core::{flags, VfxKind};
use skirmish_shared::{AiConfig, Vec2};

use super::spawn::colors;
use super::{Simulation, Stage};
use crate::error::SimError;

/// Closed set of bot temperaments, one decision function each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Personality {
    /// Flee threats, chase prey, eat, wander.
    Balanced,
    /// Chases prey first and only flees threats at close range. Dashes
    /// into prey.
    Aggressive,
    /// Flees threats, eats, never hunts.
    Timid,
    /// Prefers food over prey.
    Forager,
}

impl Personality {
    /// Every variant, in roll order.
    pub const ALL: [Self; 4] = [Self::Balanced, Self::Aggressive, Self::Timid, Self::Forager];

    /// Picks a personality uniformly.
    pub fn roll<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    fn decide(self, senses: &Senses, ai: &AiConfig) -> Intent {
        match self {
            Self::Balanced => decide_balanced(senses),
            Self::Aggressive => decide_aggressive(senses, ai),
            Self::Timid => decide_timid(senses),
            Self::Forager => decide_forager(senses),
        }
    }
}

/// Per-bot logic state kept in the reverse lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BotBrain {
    /// Temperament.
    pub personality: Personality,
    /// Seconds until the next decision.
    pub reaction: f32,
    /// Where the bot drifts when nothing is in range.
    pub wander_target: Vec2,
    /// Velocity the bot is currently steering toward.
    pub desired: Vec2,
}

impl BotBrain {
    /// A brain that decides on its first tick.
    #[must_use]
    pub const fn new(personality: Personality, wander_target: Vec2) -> Self {
        Self {
            personality,
            reaction: 0.0,
            wander_target,
            desired: Vec2::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Target {
    position: Vec2,
    distance_sq: f32,
}

#[derive(Debug, Default)]
struct Senses {
    threat: Option<Target>,
    prey: Option<Target>,
    food: Option<(Target, f32)>,
    wander: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Intent {
    Flee(Target),
    Chase(Target),
    Seek(Target),
    Wander(Vec2),
}

impl Intent {
    fn direction(self, from: Vec2) -> Vec2 {
        match self {
            Self::Flee(t) => {
                let away = (from - t.position).normalize_or_zero();
                if away == Vec2::ZERO {
                    Vec2::new(1.0, 0.0)
                } else {
                    away
                }
            }
            Self::Chase(t) | Self::Seek(t) => (t.position - from).normalize_or_zero(),
            Self::Wander(p) => (p - from).normalize_or_zero(),
        }
    }
}

fn decide_balanced(s: &Senses) -> Intent {
    if let Some(t) = s.threat {
        Intent::Flee(t)
    } else if let Some(t) = s.prey {
        Intent::Chase(t)
    } else if let Some((t, _)) = s.food {
        Intent::Seek(t)
    } else {
        Intent::Wander(s.wander)
    }
}

fn decide_aggressive(s: &Senses, ai: &AiConfig) -> Intent {
    let panic_sq = (ai.sense_radius * 0.5) * (ai.sense_radius * 0.5);
    match (s.threat, s.prey, s.food) {
        (Some(t), _, _) if t.distance_sq < panic_sq => Intent::Flee(t),
        (_, Some(p), _) => Intent::Chase(p),
        (_, _, Some((f, _))) => Intent::Seek(f),
        _ => Intent::Wander(s.wander),
    }
}

fn decide_timid(s: &Senses) -> Intent {
    if let Some(t) = s.threat {
        Intent::Flee(t)
    } else if let Some((t, _)) = s.food {
        Intent::Seek(t)
    } else {
        Intent::Wander(s.wander)
    }
}

fn decide_forager(s: &Senses) -> Intent {
    match (s.threat, s.food, s.prey) {
        (Some(t), _, _) => Intent::Flee(t),
        (_, Some((f, _)), _) => Intent::Seek(f),
        (_, _, Some(p)) => Intent::Chase(p),
        _ => Intent::Wander(s.wander),
    }
}

#[inline]
fn steer(velocity: Vec2, desired: Vec2, factor: f32) -> Vec2 {
    velocity.lerp(desired, factor)
}

/// Keeps the nearer of two targets.
fn nearer(current: Option<Target>, candidate: Target) -> Option<Target> {
    match current {
        Some(c) if c.distance_sq <= candidate.distance_sq => Some(c),
        _ => Some(candidate),
    }
}

/// Runs the sensing query for `id` and classifies every candidate.
fn sense(sim: &mut Simulation, id: u32, position: Vec2, radius: f32, wander: Vec2) -> Senses {
    let ai = sim.config.ai;
    let sense_sq = ai.sense_radius * ai.sense_radius;
    let mut senses = Senses {
        wander,
        ..Senses::default()
    };

    sim.scratch.clear();
    sim.grid
        .query_radius_into(position.x, position.y, ai.sense_radius, &mut sim.scratch);

    for &other in &sim.scratch {
        if other == id {
            continue;
        }
        let mask = sim.stores.flags.get(other);
        if !flags::is_simulated(mask) {
            continue;
        }
        let Some(other_pos) = sim.stores.transform.position(other) else {
            continue;
        };
        let distance_sq = position.distance_squared(other_pos);
        if distance_sq > sense_sq {
            continue;
        }
        let target = Target {
            position: other_pos,
            distance_sq,
        };

        if mask & flags::FOOD != 0 {
            let multiplier = if mask & flags::POWERUP != 0 {
                ai.powerup_multiplier
            } else {
                ai.food_multiplier
            };
            let score = multiplier / distance_sq.max(1.0);
            let better = match senses.food {
                Some((best, best_score)) => {
                    score > best_score || (score == best_score && distance_sq < best.distance_sq)
                }
                None => true,
            };
            if better {
                senses.food = Some((target, score));
            }
        } else if mask & flags::UNIT != 0 {
            let other_radius = sim.stores.physics.radius(other);
            if other_radius > radius * ai.threat_ratio {
                senses.threat = nearer(senses.threat, target);
            } else if other_radius * ai.prey_ratio < radius {
                senses.prey = nearer(senses.prey, target);
            }
        }
    }
    senses
}

fn roll_reaction(sim: &mut Simulation) -> f32 {
    let ai = sim.config.ai;
    if ai.reaction_max > ai.reaction_min {
        sim.rng.gen_range(ai.reaction_min..ai.reaction_max)
    } else {
        ai.reaction_min
    }
}

/// Base move speed for `id`, after stat and status multipliers.
fn move_speed(sim: &Simulation, id: u32, base: f32) -> f32 {
    let multiplier = sim.stores.stats.get_or_zero(id, stats::SPEED_MULTIPLIER);
    let multiplier = if multiplier > 0.0 { multiplier } else { 1.0 };
    let slow = if sim.stores.status.is_active(id, status::SLOW) { 0.5 } else { 1.0 };
    base * multiplier * slow
}

/// Triggers the dash skill if `id` has one ready.
fn try_dash(sim: &mut Simulation, id: u32, position: Vec2) -> bool {
    if sim.stores.skill.get_or_zero(id, skill::SKILL_KIND) != skill::KIND_DASH {
        return false;
    }
    if !sim.stores.skill.trigger(id, 0.25) {
        return false;
    }
    let mask = sim.stores.flags.get(id);
    sim.vfx.push(position.x, position.y, role_color(mask), VfxKind::Dash, 0.0);
    true
}

fn role_color(mask: u32) -> u32 {
    if mask & flags::BOSS != 0 {
        colors::BOSS
    } else if mask & flags::BOT != 0 {
        colors::BOT
    } else {
        colors::PLAYER
    }
}

fn write_velocity(sim: &mut Simulation, id: u32, velocity: Vec2) -> Result<(), SimError> {
    if !velocity.is_finite() {
        return Err(SimError::NonFinite {
            stage: Stage::Ai,
            id,
            field: "velocity",
        });
    }
    sim.stores.physics.set_velocity(id, velocity);
    Ok(())
}

fn steer_bot(sim: &mut Simulation, id: u32, mask: u32) -> Result<(), SimError> {
    let ai = sim.config.ai;
    let (Some(position), Some(velocity)) =
        (sim.stores.transform.position(id), sim.stores.physics.velocity(id))
    else {
        return Ok(());
    };
    let radius = sim.stores.physics.radius(id);

    let handle = sim.handle(id);
    let centre = sim.world_centre();
    let mut brain = handle
        .and_then(|h| sim.brains.get(h).copied())
        .unwrap_or_else(|| BotBrain::new(Personality::Balanced, centre));

    brain.reaction -= sim.dt;
    let mut dashed = false;
    if brain.reaction <= 0.0 {
        let senses = sense(sim, id, position, radius, brain.wander_target);
        let intent = brain.personality.decide(&senses, &ai);
        let base = if mask & flags::BOSS != 0 { ai.boss_speed } else { ai.bot_speed };
        brain.desired = intent.direction(position) * move_speed(sim, id, base);

        let wants_dash = match intent {
            Intent::Flee(t) => t.distance_sq < (radius * 4.0) * (radius * 4.0),
            Intent::Chase(_) => brain.personality == Personality::Aggressive,
            Intent::Seek(_) | Intent::Wander(_) => false,
        };
        dashed = wants_dash && try_dash(sim, id, position);
        brain.reaction = roll_reaction(sim);
    }

    let desired = if sim.stores.status.is_active(id, status::STUN) {
        Vec2::ZERO
    } else {
        brain.desired
    };
    let mut next = steer(velocity, desired, ai.steer_factor);
    if dashed {
        next = next * sim.config.combat.dash_boost;
    }
    write_velocity(sim, id, next)?;

    if let Some(slot) = handle.and_then(|h| sim.brains.get_mut(h)) {
        *slot = brain;
    }
    Ok(())
}

fn steer_player(sim: &mut Simulation, id: u32) -> Result<(), SimError> {
    let (Some(position), Some(velocity)) =
        (sim.stores.transform.position(id), sim.stores.physics.velocity(id))
    else {
        return Ok(());
    };

    let stunned = sim.stores.status.is_active(id, status::STUN);
    let move_dir = sim.stores.input.move_dir(id).unwrap_or_default().clamp_length(1.0);
    let desired = if stunned {
        Vec2::ZERO
    } else {
        move_dir * move_speed(sim, id, sim.config.ai.player_speed)
    };
    let mut next = steer(velocity, desired, sim.config.ai.steer_factor);

    let actions = sim.stores.input.actions(id);
    if !stunned && actions & input::ACTION_DASH != 0 && try_dash(sim, id, position) {
        next = next * sim.config.combat.dash_boost;
    }
    if !stunned
        && actions & input::ACTION_FIRE != 0
        && sim.stores.skill.get_or_zero(id, skill::SKILL_KIND) == skill::KIND_SHOOT
        && sim.stores.skill.trigger(id, 0.0)
    {
        let aim = sim.stores.input.aim(id).unwrap_or_default();
        sim.shots.push((id, aim - position));
    }

    write_velocity(sim, id, next)
}

pub(super) fn decide(sim: &mut Simulation) -> Result<(), SimError> {
    let capacity = sim.stores.capacity() as u32;
    for id in 0..capacity {
        let mask = sim.stores.flags.get(id);
        if !flags::is_simulated(mask) || mask & flags::REMOTE != 0 {
            continue;
        }
        if mask & flags::BOT != 0 {
            steer_bot(sim, id, mask)?;
        } else if mask & flags::PLAYER != 0 {
            steer_player(sim, id)?;
        }
    }

    let mut shots = std::mem::take(&mut sim.shots);
    for &(owner, direction) in &shots {
        sim.spawn_projectile_from(owner, direction);
    }
    shots.clear();
    sim.shots = shots;
    Ok(())
}
