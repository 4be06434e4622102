//! # Simulation Constants
//!
//! Compile-time defaults for the simulation core.
//!
//! **NOTE:** Most of these can be overridden per world through
//! [`SimConfig`](crate::SimConfig). The values here are what a world gets
//! when no configuration file is supplied.

// =============================================================================
// CAPACITY
// =============================================================================

/// Default number of entity slots per world.
///
/// Every component store is pre-sized to this capacity. Identifiers are
/// never re-ranged without a full reset.
pub const MAX_ENTITIES: usize = 4096;

/// Upper bound on configured entity slots.
///
/// Entity indices are stored in `f32` columns (projectile owner), which are
/// exact only below 2^24.
pub const MAX_ENTITY_CAPACITY: usize = 1 << 24;

/// Default capacity of the visual-effect event queue.
pub const DEFAULT_VFX_CAPACITY: usize = 1024;

/// Default capacity of the diagnostic channel.
pub const DEFAULT_DIAGNOSTIC_CAPACITY: usize = 64;

// =============================================================================
// TIMING
// =============================================================================

/// Tick rate (updates per second).
pub const TICK_RATE: u32 = 60;

/// Longest wall-clock frame the fixed-step driver will account for.
///
/// Anything longer is clamped to avoid the spiral of death after a stall.
pub const MAX_FRAME_TIME: f32 = 0.25;

// =============================================================================
// WORLD
// =============================================================================

/// Default world width in world units.
pub const DEFAULT_WORLD_WIDTH: f32 = 4000.0;

/// Default world height in world units.
pub const DEFAULT_WORLD_HEIGHT: f32 = 4000.0;

/// Default spatial grid cell size in world units.
///
/// Chosen so a cell holds a handful of entities at typical densities.
pub const DEFAULT_CELL_SIZE: f32 = 128.0;

/// Largest radius a unit may grow to by eating.
///
/// Collision queries pad their search radius by at least this amount so
/// that no overlapping pair is missed by the broad phase.
pub const MAX_UNIT_RADIUS: f32 = 160.0;

/// Upper bound on spatial grid cells (4M cells, 32 MiB of list heads).
pub const MAX_GRID_CELLS: usize = 1 << 22;

/// Default radius of a food pickup.
pub const FOOD_RADIUS: f32 = 6.0;

/// Default radius of a projectile.
pub const PROJECTILE_RADIUS: f32 = 4.0;

/// Default radius of a freshly spawned unit.
pub const UNIT_BASE_RADIUS: f32 = 20.0;
