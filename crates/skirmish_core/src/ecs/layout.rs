//! # Store Layouts
//!
//! Field offsets for every component table. This module is the single
//! source of truth for the flat layout: every read and write computes
//! `base = id * STRIDE + FIELD`.

/// Spatial transform. Written by gameplay (X, Y, ROTATION, SCALE) and by
/// physics integration (the `PREV_*` shadow fields, nobody else).
pub mod transform {
    /// Scalars per entity.
    pub const STRIDE: usize = 8;
    /// World X.
    pub const X: usize = 0;
    /// World Y.
    pub const Y: usize = 1;
    /// Facing angle in radians.
    pub const ROTATION: usize = 2;
    /// Render scale.
    pub const SCALE: usize = 3;
    /// X at the start of the last integration step.
    pub const PREV_X: usize = 4;
    /// Y at the start of the last integration step.
    pub const PREV_Y: usize = 5;
    /// Rotation at the start of the last integration step.
    pub const PREV_ROTATION: usize = 6;
}

/// Velocity and body.
pub mod physics {
    /// Scalars per entity.
    pub const STRIDE: usize = 8;
    /// Velocity X (units per second).
    pub const VX: usize = 0;
    /// Velocity Y (units per second).
    pub const VY: usize = 1;
    /// Mass, used to split knockback.
    pub const MASS: usize = 2;
    /// Collision radius.
    pub const RADIUS: usize = 3;
    /// Per-second velocity damping in `0..=1`.
    pub const FRICTION: usize = 4;
    /// Speed cap (units per second).
    pub const MAX_SPEED: usize = 5;
}

/// Combat and scoring.
pub mod stats {
    /// Scalars per entity.
    pub const STRIDE: usize = 8;
    /// Current health.
    pub const HEALTH: usize = 0;
    /// Health cap.
    pub const MAX_HEALTH: usize = 1;
    /// Contact damage per second.
    pub const DAMAGE: usize = 2;
    /// Flat reduction applied to incoming damage.
    pub const DEFENSE: usize = 3;
    /// Accumulated score.
    pub const SCORE: usize = 4;
    /// Value granted when this entity is eaten (pickups).
    pub const FOOD_VALUE: usize = 5;
    /// Multiplier on cruise speed.
    pub const SPEED_MULTIPLIER: usize = 6;
    /// Number of kills.
    pub const KILLS: usize = 7;
}

/// Skill timers.
pub mod skill {
    /// Scalars per entity.
    pub const STRIDE: usize = 4;
    /// Seconds until the skill can be used again.
    pub const COOLDOWN: usize = 0;
    /// Cooldown applied after use.
    pub const COOLDOWN_MAX: usize = 1;
    /// Seconds the current activation still lasts.
    pub const ACTIVE_TIMER: usize = 2;
    /// Skill discriminator.
    pub const SKILL_KIND: usize = 3;

    /// Skill kind: fires a projectile.
    pub const KIND_SHOOT: f32 = 1.0;
    /// Skill kind: short velocity burst.
    pub const KIND_DASH: f32 = 2.0;
}

/// Status-effect timers (seconds remaining).
pub mod status {
    /// Scalars per entity.
    pub const STRIDE: usize = 4;
    /// Immune to contact and projectile damage.
    pub const INVULNERABLE: usize = 0;
    /// Cannot steer.
    pub const STUN: usize = 1;
    /// Cruise speed halved.
    pub const SLOW: usize = 2;
    /// Damage absorbed entirely.
    pub const SHIELD: usize = 3;
}

/// Projectile metadata.
pub mod projectile {
    /// Scalars per entity.
    pub const STRIDE: usize = 8;
    /// Index of the entity that fired it (exact below 2^24).
    pub const OWNER: usize = 0;
    /// Spawn X.
    pub const ORIGIN_X: usize = 1;
    /// Spawn Y.
    pub const ORIGIN_Y: usize = 2;
    /// Damage on impact.
    pub const DAMAGE: usize = 3;
    /// Distance from the origin at which it expires.
    pub const MAX_DISTANCE: usize = 4;
    /// Travel speed (units per second).
    pub const SPEED: usize = 5;
    /// Generation of the firing entity, stored bit-exact.
    pub const OWNER_GENERATION: usize = 6;
}

/// Per-entity input snapshot.
pub mod input {
    /// Scalars per entity.
    pub const STRIDE: usize = 4;
    /// Desired move direction X in `-1..=1`.
    pub const MOVE_X: usize = 0;
    /// Desired move direction Y in `-1..=1`.
    pub const MOVE_Y: usize = 1;
    /// Aim point X (world units).
    pub const AIM_X: usize = 2;
    /// Aim point Y (world units).
    pub const AIM_Y: usize = 3;

    /// Action bit: fire a projectile toward the aim point.
    pub const ACTION_FIRE: u32 = 1 << 0;
    /// Action bit: dash in the move direction.
    pub const ACTION_DASH: u32 = 1 << 1;
}
