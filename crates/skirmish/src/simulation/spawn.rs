//! Spawn helpers: allocate, fill every table, register side structures.
//!
//! All helpers return `None` when the pool is exhausted; the caller skips
//! the spawn.

use rand::Rng;
use skirmish_core::ecs::layout::skill;
use skirmish_core::{flags, EntityId, VfxKind};
use skirmish_shared::constants::{
    FOOD_RADIUS, MAX_UNIT_RADIUS, PROJECTILE_RADIUS, UNIT_BASE_RADIUS,
};
use skirmish_shared::Vec2;
use tracing::debug;

use super::ai::{BotBrain, Personality};
use super::Simulation;

const PLAYER_HEALTH: f32 = 100.0;
const PLAYER_DAMAGE: f32 = 20.0;
const BOT_HEALTH: f32 = 80.0;
const BOT_DAMAGE: f32 = 15.0;
const BOSS_HEALTH: f32 = 600.0;
const BOSS_DAMAGE: f32 = 40.0;
const BOSS_DEFENSE: f32 = 50.0;
const BOSS_RADIUS: f32 = UNIT_BASE_RADIUS * 3.0;
const OBSTACLE_MASS: f32 = f32::MAX;
const POWERUP_FOOD_VALUE: f32 = 3.0;

/// Packed `0xRRGGBBAA` colours for spawn effects.
pub(crate) mod colors {
    pub(crate) const PLAYER: u32 = 0x4FC3_F7FF;
    pub(crate) const BOT: u32 = 0xE573_73FF;
    pub(crate) const BOSS: u32 = 0xAB47_BCFF;
    pub(crate) const FOOD: u32 = 0x81C7_84FF;
    pub(crate) const POWERUP: u32 = 0xFFD5_4FFF;
    pub(crate) const PROJECTILE: u32 = 0xFFFF_FFFF;
    pub(crate) const HIT: u32 = 0xFF70_43FF;
}

impl Simulation {
    fn allocate_or_log(&mut self, what: &'static str) -> Option<EntityId> {
        let id = self.local.allocate();
        if id.is_none() {
            debug!(what, "spawn skipped: entity pool exhausted");
        }
        id
    }

    /// Writes the rows every moving body shares.
    fn write_body(&mut self, index: u32, position: Vec2, radius: f32, max_speed: f32) {
        self.stores.transform.set(index, position.x, position.y, 0.0, 1.0);
        self.stores
            .physics
            .set(index, 0.0, 0.0, radius * radius, radius, 0.0, max_speed);
    }

    /// Spawns a locally controlled player. The first player spawned becomes
    /// the local player the match outcome follows.
    pub fn spawn_player(&mut self, x: f32, y: f32) -> Option<EntityId> {
        let id = self.allocate_or_log("player")?;
        let index = id.index();
        let combat = self.config.combat;

        self.write_body(index, Vec2::new(x, y), UNIT_BASE_RADIUS, self.config.ai.player_speed);
        self.stores.stats.set(index, PLAYER_HEALTH, PLAYER_DAMAGE, 0.0, 0.0);
        self.stores.skill.set(index, skill::KIND_SHOOT, combat.fire_cooldown);
        self.stores.status.set(index, combat.spawn_invulnerability, 0.0, 0.0, 0.0);
        self.stores.flags.set(index, flags::ACTIVE | flags::PLAYER);

        if self.local_player.is_none() {
            self.local_player = Some(id);
        }
        self.vfx.push(x, y, colors::PLAYER, VfxKind::Spawn, UNIT_BASE_RADIUS);
        Some(id)
    }

    /// Spawns a unit mirrored from a peer and binds it to `name`, the id
    /// the peer uses in its transform frames. The slot comes from the remote
    /// partition when the store is split.
    pub fn spawn_remote(&mut self, name: &str, x: f32, y: f32) -> Option<EntityId> {
        let Some(id) = self.allocate_remote() else {
            debug!(name, "spawn skipped: remote pool exhausted");
            return None;
        };
        let index = id.index();

        self.write_body(index, Vec2::new(x, y), UNIT_BASE_RADIUS, self.config.ai.player_speed);
        self.stores.stats.set(index, PLAYER_HEALTH, PLAYER_DAMAGE, 0.0, 0.0);
        self.stores.flags.set(index, flags::ACTIVE | flags::PLAYER);
        if !self.bind_remote(name, id) {
            self.stores.flags.mark_dead(index);
            return None;
        }
        self.vfx.push(x, y, colors::PLAYER, VfxKind::Spawn, UNIT_BASE_RADIUS);
        Some(id)
    }

    /// Spawns an AI bot. `None` personality rolls one.
    pub fn spawn_bot(&mut self, x: f32, y: f32, personality: Option<Personality>) -> Option<EntityId> {
        let id = self.allocate_or_log("bot")?;
        let index = id.index();
        let personality = personality.unwrap_or_else(|| Personality::roll(&mut self.rng));
        let radius = UNIT_BASE_RADIUS * self.rng.gen_range(0.7..1.5);
        let combat = self.config.combat;

        self.write_body(index, Vec2::new(x, y), radius, self.config.ai.bot_speed);
        self.stores.stats.set(index, BOT_HEALTH, BOT_DAMAGE, 0.0, 0.0);
        self.stores.skill.set(index, skill::KIND_DASH, combat.dash_cooldown);
        self.stores.status.set(index, combat.spawn_invulnerability, 0.0, 0.0, 0.0);
        self.stores.flags.set(index, flags::ACTIVE | flags::BOT);

        let centre = self.world_centre();
        let _ = self.brains.insert(id, BotBrain::new(personality, centre));
        self.vfx.push(x, y, colors::BOT, VfxKind::Spawn, radius);
        Some(id)
    }

    /// Spawns an escalation boss: a large, slow, aggressive bot.
    pub fn spawn_boss(&mut self, x: f32, y: f32) -> Option<EntityId> {
        let id = self.allocate_or_log("boss")?;
        let index = id.index();

        self.write_body(index, Vec2::new(x, y), BOSS_RADIUS, self.config.ai.boss_speed);
        self.stores.stats.set(index, BOSS_HEALTH, BOSS_DAMAGE, BOSS_DEFENSE, 0.0);
        self.stores.skill.set(index, skill::KIND_DASH, self.config.combat.dash_cooldown);
        self.stores.flags.set(index, flags::ACTIVE | flags::BOT | flags::BOSS);

        let centre = self.world_centre();
        let _ = self.brains.insert(id, BotBrain::new(Personality::Aggressive, centre));
        self.rosters.bosses.push(index);
        self.vfx.push(x, y, colors::BOSS, VfxKind::Spawn, BOSS_RADIUS);
        Some(id)
    }

    /// Spawns a pickup. Pickups never move, so they live in the static grid
    /// partition. Powerups grant a shield instead of plain growth.
    pub fn spawn_food(&mut self, x: f32, y: f32, powerup: bool) -> Option<EntityId> {
        let id = self.allocate_or_log("food")?;
        let index = id.index();
        let (value, extra, color) = if powerup {
            (POWERUP_FOOD_VALUE, flags::POWERUP, colors::POWERUP)
        } else {
            (1.0, 0, colors::FOOD)
        };

        self.write_body(index, Vec2::new(x, y), FOOD_RADIUS, 0.0);
        self.stores.stats.set(index, 1.0, 0.0, 0.0, value);
        self.stores
            .flags
            .set(index, flags::ACTIVE | flags::FOOD | flags::STATIC | extra);
        self.grid.insert_static(index, x, y);

        self.rosters.food.push(index);
        self.vfx.push(x, y, color, VfxKind::Spawn, FOOD_RADIUS);
        Some(id)
    }

    /// Spawns an immobile blocker in the static grid partition.
    pub fn spawn_obstacle(&mut self, x: f32, y: f32, radius: f32) -> Option<EntityId> {
        let id = self.allocate_or_log("obstacle")?;
        let index = id.index();
        let radius = radius.clamp(1.0, MAX_UNIT_RADIUS);

        self.stores.transform.set(index, x, y, 0.0, 1.0);
        self.stores.physics.set(index, 0.0, 0.0, OBSTACLE_MASS, radius, 0.0, 0.0);
        self.stores
            .flags
            .set(index, flags::ACTIVE | flags::OBSTACLE | flags::STATIC);
        self.grid.insert_static(index, x, y);
        Some(id)
    }

    /// Fires a projectile from `owner` along `direction`.
    ///
    /// Returns `None` if the owner is stale, the direction is degenerate or
    /// the pool is exhausted.
    pub fn spawn_projectile(&mut self, owner: EntityId, direction: Vec2) -> Option<EntityId> {
        if !self.is_valid(owner) {
            return None;
        }
        self.spawn_projectile_from(owner.index(), direction)
    }

    pub(crate) fn spawn_projectile_from(&mut self, owner: u32, direction: Vec2) -> Option<EntityId> {
        let direction = direction.normalize_or_zero();
        if direction == Vec2::ZERO || !self.stores.flags.is_simulated(owner) {
            return None;
        }
        let shooter = self.handle(owner)?;
        let origin = self.stores.transform.position(owner)?;
        let owner_radius = self.stores.physics.radius(owner);

        let id = self.allocate_or_log("projectile")?;
        let index = id.index();
        let combat = self.config.combat;
        let start = origin + direction * (owner_radius + PROJECTILE_RADIUS);
        let velocity = direction * combat.projectile_speed;

        self.write_body(index, start, PROJECTILE_RADIUS, combat.projectile_speed);
        self.stores.physics.set_velocity(index, velocity);
        self.stores.projectile.set(
            index,
            shooter,
            start,
            combat.projectile_damage,
            combat.projectile_range,
            combat.projectile_speed,
        );
        self.stores.flags.set(index, flags::ACTIVE | flags::PROJECTILE);

        self.rosters.projectiles.push(index);
        self.vfx
            .push(start.x, start.y, colors::PROJECTILE, VfxKind::ProjectileFired, 0.0);
        Some(id)
    }

    /// Uniform random point at least `margin` inside the world bounds.
    pub(crate) fn random_point(&mut self, margin: f32) -> Vec2 {
        let w = self.config.world_width;
        let h = self.config.world_height;
        let mx = margin.min(w * 0.5);
        let my = margin.min(h * 0.5);
        let x = if w - mx > mx { self.rng.gen_range(mx..w - mx) } else { w * 0.5 };
        let y = if h - my > my { self.rng.gen_range(my..h - my) } else { h * 0.5 };
        Vec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::ecs::layout::{physics, projectile};
    use skirmish_shared::SimConfig;

    fn sim() -> Simulation {
        Simulation::new(SimConfig {
            max_entities: 8,
            ..SimConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_lowest_ids_first_and_exhaustion() {
        let mut sim = sim();
        for expected in 0..8 {
            assert_eq!(sim.spawn_food(10.0, 10.0, false).unwrap().index(), expected);
        }
        assert!(sim.spawn_food(10.0, 10.0, false).is_none());
        assert!(sim.spawn_bot(10.0, 10.0, None).is_none());
    }

    #[test]
    fn test_bot_has_brain() {
        let mut sim = sim();
        let bot = sim.spawn_bot(10.0, 10.0, Some(Personality::Timid)).unwrap();
        assert_eq!(sim.brain(bot).unwrap().personality, Personality::Timid);
        assert!(sim.stores().flags.contains(bot.index(), flags::ACTIVE | flags::BOT));
    }

    #[test]
    fn test_food_is_static() {
        let mut sim = sim();
        let food = sim.spawn_food(200.0, 200.0, true).unwrap();
        assert!(sim.grid().is_static(food.index()));
        assert!(sim
            .stores()
            .flags
            .contains(food.index(), flags::FOOD | flags::POWERUP | flags::STATIC));
    }

    #[test]
    fn test_obstacle_is_static() {
        let mut sim = sim();
        let rock = sim.spawn_obstacle(200.0, 200.0, 30.0).unwrap();
        assert!(sim.grid().is_static(rock.index()));
        assert!(sim.stores().flags.contains(rock.index(), flags::STATIC));
    }

    #[test]
    fn test_projectile_starts_outside_owner() {
        let mut sim = sim();
        let player = sim.spawn_player(100.0, 100.0).unwrap();
        let shot = sim.spawn_projectile(player, Vec2::new(2.0, 0.0)).unwrap();
        let i = shot.index();

        let start = sim.stores().transform.position(i).unwrap();
        assert_eq!(start, Vec2::new(100.0 + UNIT_BASE_RADIUS + PROJECTILE_RADIUS, 100.0));
        assert_eq!(sim.stores().projectile.owner(i), Some(player));
        assert_eq!(
            sim.stores().projectile.get(i, projectile::SPEED),
            Some(sim.config().combat.projectile_speed)
        );
        assert!(sim.stores().physics.get_or_zero(i, physics::VX) > 0.0);
        assert!(sim.spawn_projectile(player, Vec2::ZERO).is_none());
    }
}
