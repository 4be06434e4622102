//! # Component Tables
//!
//! Typed views over [`StridedStore`], one per concern. Each table derefs to
//! its raw store, so generic field access is always available; the typed
//! methods exist for the combinations systems read together.

use std::ops::{Deref, DerefMut};

use skirmish_shared::Vec2;
use tracing::debug;

use super::entity::EntityId;
use super::flags::FlagStore;
use super::layout::{input, physics, projectile, skill, stats, status, transform};
use super::storage::StridedStore;

macro_rules! table_deref {
    ($table:ident, $stride:expr) => {
        impl Deref for $table {
            type Target = StridedStore<{ $stride }>;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl DerefMut for $table {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }
    };
}

/// Transform table (see [`layout::transform`](super::layout::transform)).
pub struct TransformStore(StridedStore<{ transform::STRIDE }>);
table_deref!(TransformStore, transform::STRIDE);

impl TransformStore {
    /// Creates a zero-filled table.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self(StridedStore::new(capacity))
    }

    /// Writes position, rotation and scale. The `PREV_*` fields are left to
    /// physics integration.
    pub fn set(&mut self, id: u32, x: f32, y: f32, rotation: f32, scale: f32) -> bool {
        let Some(row) = self.0.row_mut(id) else {
            return false;
        };
        row[transform::X] = x;
        row[transform::Y] = y;
        row[transform::ROTATION] = rotation;
        row[transform::SCALE] = scale;
        true
    }

    /// Current position.
    #[inline]
    #[must_use]
    pub fn position(&self, id: u32) -> Option<Vec2> {
        let row = self.0.row(id)?;
        Some(Vec2::new(row[transform::X], row[transform::Y]))
    }

    /// Position at the start of the last integration step.
    #[inline]
    #[must_use]
    pub fn previous_position(&self, id: u32) -> Option<Vec2> {
        let row = self.0.row(id)?;
        Some(Vec2::new(row[transform::PREV_X], row[transform::PREV_Y]))
    }

    /// Writes X and Y.
    #[inline]
    pub fn set_position(&mut self, id: u32, x: f32, y: f32) -> bool {
        let Some(row) = self.0.row_mut(id) else {
            return false;
        };
        row[transform::X] = x;
        row[transform::Y] = y;
        true
    }
}

/// Physics table (see [`layout::physics`](super::layout::physics)).
pub struct PhysicsStore(StridedStore<{ physics::STRIDE }>);
table_deref!(PhysicsStore, physics::STRIDE);

impl PhysicsStore {
    /// Creates a zero-filled table.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self(StridedStore::new(capacity))
    }

    /// Writes the body: velocity, mass, radius, friction and speed cap.
    #[allow(clippy::too_many_arguments)]
    pub fn set(
        &mut self,
        id: u32,
        vx: f32,
        vy: f32,
        mass: f32,
        radius: f32,
        friction: f32,
        max_speed: f32,
    ) -> bool {
        let Some(row) = self.0.row_mut(id) else {
            return false;
        };
        row[physics::VX] = vx;
        row[physics::VY] = vy;
        row[physics::MASS] = mass;
        row[physics::RADIUS] = radius;
        row[physics::FRICTION] = friction;
        row[physics::MAX_SPEED] = max_speed;
        true
    }

    /// Current velocity.
    #[inline]
    #[must_use]
    pub fn velocity(&self, id: u32) -> Option<Vec2> {
        let row = self.0.row(id)?;
        Some(Vec2::new(row[physics::VX], row[physics::VY]))
    }

    /// Writes the velocity.
    #[inline]
    pub fn set_velocity(&mut self, id: u32, velocity: Vec2) -> bool {
        let Some(row) = self.0.row_mut(id) else {
            return false;
        };
        row[physics::VX] = velocity.x;
        row[physics::VY] = velocity.y;
        true
    }

    /// Collision radius, or 0 when out of range.
    #[inline]
    #[must_use]
    pub fn radius(&self, id: u32) -> f32 {
        self.0.get_or_zero(id, physics::RADIUS)
    }
}

/// Stats table (see [`layout::stats`](super::layout::stats)).
pub struct StatsStore(StridedStore<{ stats::STRIDE }>);
table_deref!(StatsStore, stats::STRIDE);

impl StatsStore {
    /// Creates a zero-filled table.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self(StridedStore::new(capacity))
    }

    /// Initializes a combat row: full health, damage, defense, neutral speed,
    /// zero score and kills.
    pub fn set(&mut self, id: u32, health: f32, damage: f32, defense: f32, food_value: f32) -> bool {
        self.0.set_row(
            id,
            &[health, health, damage, defense, 0.0, food_value, 1.0, 0.0],
        )
    }

    /// Current health, or 0 when out of range.
    #[inline]
    #[must_use]
    pub fn health(&self, id: u32) -> f32 {
        self.0.get_or_zero(id, stats::HEALTH)
    }
}

/// Skill timer table (see [`layout::skill`](super::layout::skill)).
pub struct SkillStore(StridedStore<{ skill::STRIDE }>);
table_deref!(SkillStore, skill::STRIDE);

impl SkillStore {
    /// Creates a zero-filled table.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self(StridedStore::new(capacity))
    }

    /// Equips a skill with its cooldown, ready to use.
    pub fn set(&mut self, id: u32, kind: f32, cooldown_max: f32) -> bool {
        self.0.set_row(id, &[0.0, cooldown_max, 0.0, kind])
    }

    /// Returns true if the skill is off cooldown.
    #[inline]
    #[must_use]
    pub fn is_ready(&self, id: u32) -> bool {
        self.0.get(id, skill::COOLDOWN).is_some_and(|cooldown| cooldown <= 0.0)
    }

    /// Puts the skill on cooldown. Returns `false` if it was not ready.
    pub fn trigger(&mut self, id: u32, active_for: f32) -> bool {
        if !self.is_ready(id) {
            return false;
        }
        let Some(row) = self.0.row_mut(id) else {
            return false;
        };
        row[skill::COOLDOWN] = row[skill::COOLDOWN_MAX];
        row[skill::ACTIVE_TIMER] = active_for;
        true
    }

    /// Counts down cooldown and activation timers, flooring at zero.
    pub fn tick(&mut self, id: u32, dt: f32) {
        if let Some(row) = self.0.row_mut(id) {
            row[skill::COOLDOWN] = (row[skill::COOLDOWN] - dt).max(0.0);
            row[skill::ACTIVE_TIMER] = (row[skill::ACTIVE_TIMER] - dt).max(0.0);
        }
    }
}

/// Status-effect table (see [`layout::status`](super::layout::status)).
pub struct StatusStore(StridedStore<{ status::STRIDE }>);
table_deref!(StatusStore, status::STRIDE);

impl StatusStore {
    /// Creates a zero-filled table.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self(StridedStore::new(capacity))
    }

    /// Writes every timer.
    pub fn set(&mut self, id: u32, invulnerable: f32, stun: f32, slow: f32, shield: f32) -> bool {
        self.0.set_row(id, &[invulnerable, stun, slow, shield])
    }

    /// Returns true if the timer at `field` is still running.
    #[inline]
    #[must_use]
    pub fn is_active(&self, id: u32, field: usize) -> bool {
        self.0.get(id, field).is_some_and(|t| t > 0.0)
    }

    /// Returns true if damage should be ignored for `id`.
    #[inline]
    #[must_use]
    pub fn is_protected(&self, id: u32) -> bool {
        self.is_active(id, status::INVULNERABLE) || self.is_active(id, status::SHIELD)
    }

    /// Decays every timer by `dt`, flooring at zero.
    pub fn decay(&mut self, id: u32, dt: f32) {
        if let Some(row) = self.0.row_mut(id) {
            for timer in row.iter_mut() {
                *timer = (*timer - dt).max(0.0);
            }
        }
    }
}

/// Projectile table (see [`layout::projectile`](super::layout::projectile)).
pub struct ProjectileStore(StridedStore<{ projectile::STRIDE }>);
table_deref!(ProjectileStore, projectile::STRIDE);

impl ProjectileStore {
    /// Creates a zero-filled table.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self(StridedStore::new(capacity))
    }

    /// Writes owner, origin, damage, range and speed.
    #[allow(clippy::too_many_arguments)]
    pub fn set(
        &mut self,
        id: u32,
        owner: EntityId,
        origin: Vec2,
        damage: f32,
        max_distance: f32,
        speed: f32,
    ) -> bool {
        self.0.set_row(
            id,
            &[
                owner.index() as f32,
                origin.x,
                origin.y,
                damage,
                max_distance,
                speed,
                f32::from_bits(owner.generation()),
                0.0,
            ],
        )
    }

    /// Handle of the entity that fired the projectile, as it was at the
    /// time of firing. Check it against the allocator before trusting it.
    #[inline]
    #[must_use]
    pub fn owner(&self, id: u32) -> Option<EntityId> {
        let row = self.0.row(id)?;
        Some(EntityId::new(
            row[projectile::OWNER] as u32,
            row[projectile::OWNER_GENERATION].to_bits(),
        ))
    }

    /// Spawn position.
    #[inline]
    #[must_use]
    pub fn origin(&self, id: u32) -> Option<Vec2> {
        let row = self.0.row(id)?;
        Some(Vec2::new(row[projectile::ORIGIN_X], row[projectile::ORIGIN_Y]))
    }
}

/// Per-entity input snapshot: four scalars plus an exact action bitmask.
pub struct InputStore {
    axes: StridedStore<{ input::STRIDE }>,
    actions: Box<[u32]>,
}

impl InputStore {
    /// Creates a zero-filled table.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            axes: StridedStore::new(capacity),
            actions: vec![0; capacity].into_boxed_slice(),
        }
    }

    /// Returns the capacity of this table.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.axes.capacity()
    }

    /// Writes one full input snapshot.
    pub fn set(&mut self, id: u32, move_dir: Vec2, aim: Vec2, actions: u32) -> bool {
        let Some(slot) = self.actions.get_mut(id as usize) else {
            if cfg!(debug_assertions) {
                debug!(id, "input write rejected: id out of range");
            }
            return false;
        };
        *slot = actions;
        self.axes.set_row(id, &[move_dir.x, move_dir.y, aim.x, aim.y])
    }

    /// Desired move direction.
    #[inline]
    #[must_use]
    pub fn move_dir(&self, id: u32) -> Option<Vec2> {
        let row = self.axes.row(id)?;
        Some(Vec2::new(row[input::MOVE_X], row[input::MOVE_Y]))
    }

    /// Aim point.
    #[inline]
    #[must_use]
    pub fn aim(&self, id: u32) -> Option<Vec2> {
        let row = self.axes.row(id)?;
        Some(Vec2::new(row[input::AIM_X], row[input::AIM_Y]))
    }

    /// Action bitmask, or 0 when out of range.
    #[inline]
    #[must_use]
    pub fn actions(&self, id: u32) -> u32 {
        self.actions.get(id as usize).copied().unwrap_or(0)
    }

    /// Raw axis store.
    #[inline]
    #[must_use]
    pub fn axes(&self) -> &StridedStore<{ input::STRIDE }> {
        &self.axes
    }

    /// Zeroes one snapshot.
    pub fn reset(&mut self, id: u32) {
        self.axes.reset(id);
        if let Some(slot) = self.actions.get_mut(id as usize) {
            *slot = 0;
        }
    }

    /// Zero-fills the table.
    pub fn clear(&mut self) {
        self.axes.clear();
        self.actions.fill(0);
    }
}

/// Every component table of one world, sized to the same capacity.
pub struct Stores {
    capacity: usize,
    /// Spatial transform.
    pub transform: TransformStore,
    /// Velocity and body.
    pub physics: PhysicsStore,
    /// Health, damage and score.
    pub stats: StatsStore,
    /// Skill cooldowns.
    pub skill: SkillStore,
    /// Status-effect timers.
    pub status: StatusStore,
    /// Projectile metadata.
    pub projectile: ProjectileStore,
    /// Input snapshot.
    pub input: InputStore,
    /// State bitmask.
    pub flags: FlagStore,
}

impl Stores {
    /// Pre-allocates every table for `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            transform: TransformStore::new(capacity),
            physics: PhysicsStore::new(capacity),
            stats: StatsStore::new(capacity),
            skill: SkillStore::new(capacity),
            status: StatusStore::new(capacity),
            projectile: ProjectileStore::new(capacity),
            input: InputStore::new(capacity),
            flags: FlagStore::new(capacity),
        }
    }

    /// Returns the shared capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Zeroes every table's row for `id`.
    pub fn reset(&mut self, id: u32) {
        self.transform.reset(id);
        self.physics.reset(id);
        self.stats.reset(id);
        self.skill.reset(id);
        self.status.reset(id);
        self.projectile.reset(id);
        self.input.reset(id);
        self.flags.reset(id);
    }

    /// Zero-fills every table.
    pub fn clear(&mut self) {
        self.transform.clear();
        self.physics.clear();
        self.stats.clear();
        self.skill.clear();
        self.status.clear();
        self.projectile.clear();
        self.input.clear();
        self.flags.clear();
    }
}
