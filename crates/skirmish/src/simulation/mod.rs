//! # Simulation Pipeline
//!
//! One [`Simulation`] is one arena. It owns every store, both allocators,
//! the grid, the reverse lookup and the event buffers; nothing is global,
//! so any number of arenas can run side by side.
//!
//! ## Tick Order
//!
//! ```text
//! step()
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. Input        staged InputQueue → input store (one batch)  │
//! │ 2. Physics      PREV_* ← current, pos += vel × dt            │
//! │ 3. Spatial      rebuild dynamic grid partition               │
//! │ 4. AI           bot decisions, player steering, firing       │
//! │ 5. Collision    pickups, unit pairs (once each), obstacles   │
//! │ 6. Secondary    timers, world clamp, director, match state   │
//! │ 7. Projectiles  advance, hit, expire                         │
//! │ 8. Cleanup      release DEAD ids, zero rows, compact rosters │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A stage that fails aborts the tick. The simulation logs the fault,
//! reports it on the diagnostics channel and pauses until
//! [`Simulation::resume`] is called. Mutations made before the fault are
//! kept.

mod ai;
mod cleanup;
mod collision;
mod physics;
mod projectiles;
mod secondary;
mod spawn;

use std::collections::HashMap;
use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::{
    flags, EntityAllocator, EntityId, EntityLookup, SpatialGrid, Stores, VfxQueue,
};
use skirmish_networking::FrameEncoder;
use skirmish_shared::constants::MAX_UNIT_RADIUS;
use skirmish_shared::{SimConfig, Vec2};
use tracing::{error, info};

use crate::diagnostics::{diagnostic_channel, Diagnostic, DiagnosticReceiver, DiagnosticSender};
use crate::error::SimError;
use crate::input::{InputCommand, InputQueue};

pub use ai::{BotBrain, Personality};

/// Pipeline stages in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Input ingestion.
    Input,
    /// Physics integration.
    Physics,
    /// Spatial rebuild.
    Spatial,
    /// AI decisions and player steering.
    Ai,
    /// Collision resolution.
    Collision,
    /// Timers, world clamp, director and match outcome.
    Secondary,
    /// Projectile lifecycle.
    Projectiles,
    /// End-of-tick cleanup.
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::Physics => "physics",
            Self::Spatial => "spatial",
            Self::Ai => "ai",
            Self::Collision => "collision",
            Self::Secondary => "secondary",
            Self::Projectiles => "projectiles",
            Self::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Outcome of the match for the local player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchState {
    /// Still playing (or no local player bound).
    #[default]
    Running,
    /// Local player reached the win score.
    Won,
    /// Local player died.
    Lost,
}

/// Escalation state of the world director.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Director {
    /// Current escalation level.
    pub(crate) level: u32,
    /// Elapsed time at which the next escalation fires.
    pub(crate) next_escalation: f32,
}

/// Ids spawned through the `spawn_*` helpers, by role.
///
/// Entries are compacted with `retain` at the end of every tick, so between
/// ticks each roster holds only live ids.
pub(crate) struct Rosters {
    pub(crate) food: Vec<u32>,
    pub(crate) bosses: Vec<u32>,
    pub(crate) projectiles: Vec<u32>,
}

impl Rosters {
    fn new(capacity: usize) -> Self {
        Self {
            food: Vec::with_capacity(capacity),
            bosses: Vec::with_capacity(capacity),
            projectiles: Vec::with_capacity(capacity),
        }
    }

    fn clear(&mut self) {
        self.food.clear();
        self.bosses.clear();
        self.projectiles.clear();
    }
}

/// One arena: all state plus the fixed tick pipeline.
///
/// # Example
///
/// ```rust
/// use skirmish::Simulation;
/// use skirmish_shared::SimConfig;
///
/// let mut sim = Simulation::new(SimConfig::default()).expect("default config is valid");
/// let player = sim.spawn_player(100.0, 100.0).expect("room");
/// sim.step().expect("tick runs");
/// assert!(sim.is_valid(player));
/// assert_eq!(sim.tick(), 1);
/// ```
pub struct Simulation {
    pub(crate) config: SimConfig,
    pub(crate) dt: f32,
    pub(crate) tick: u64,
    pub(crate) elapsed: f32,

    pub(crate) stores: Stores,
    pub(crate) local: EntityAllocator,
    pub(crate) remote: Option<EntityAllocator>,
    pub(crate) grid: SpatialGrid,
    pub(crate) brains: EntityLookup<BotBrain>,
    pub(crate) vfx: VfxQueue,
    pub(crate) input: InputQueue,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) rosters: Rosters,

    /// Grid query output, reused by every stage.
    pub(crate) scratch: Vec<u32>,
    /// Fire requests collected during the AI stage.
    pub(crate) shots: Vec<(u32, Vec2)>,

    pub(crate) director: Director,
    pub(crate) match_state: MatchState,
    pub(crate) local_player: Option<EntityId>,

    pub(crate) remote_names: HashMap<String, EntityId>,
    pub(crate) encoder: FrameEncoder,
    pub(crate) id_buf: String,

    diagnostics: DiagnosticSender,
    diagnostics_rx: DiagnosticReceiver,
    paused: bool,
}

impl Simulation {
    /// Builds an empty arena. Every buffer is allocated here.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the configuration does not validate.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;

        let capacity = config.max_entities;
        let max = capacity as u32;
        let (local, remote) = match config.local_partition {
            Some(split) => (EntityAllocator::new(0, split), Some(EntityAllocator::new(split, max))),
            None => (EntityAllocator::new(0, max), None),
        };
        let (diagnostics, diagnostics_rx) = diagnostic_channel(config.diagnostic_capacity);

        info!(
            capacity,
            local_partition = ?config.local_partition,
            seed = config.seed,
            "simulation created"
        );

        Ok(Self {
            dt: config.tick_dt(),
            tick: 0,
            elapsed: 0.0,
            stores: Stores::new(capacity),
            local,
            remote,
            grid: SpatialGrid::new(config.world_width, config.world_height, config.cell_size, capacity),
            brains: EntityLookup::new(capacity),
            vfx: VfxQueue::new(config.vfx_capacity),
            input: InputQueue::new(capacity),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            rosters: Rosters::new(capacity),
            scratch: Vec::with_capacity(capacity),
            shots: Vec::with_capacity(capacity),
            director: Director {
                level: 0,
                next_escalation: config.director.escalation_interval,
            },
            match_state: MatchState::Running,
            local_player: None,
            remote_names: HashMap::new(),
            encoder: FrameEncoder::new(),
            id_buf: String::with_capacity(32),
            diagnostics,
            diagnostics_rx,
            paused: false,
            config,
        })
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Runs one fixed tick of `1 / tick_rate` seconds.
    ///
    /// # Errors
    ///
    /// [`SimError::Paused`] if an earlier fault paused the simulation, or
    /// the fault raised by a stage. In the second case the simulation is
    /// paused, the fault is logged and a [`Diagnostic::TickFault`] is sent.
    pub fn step(&mut self) -> Result<(), SimError> {
        if self.paused {
            return Err(SimError::Paused);
        }

        match self.run_stages() {
            Ok(()) => {
                self.tick += 1;
                Ok(())
            }
            Err(err) => {
                error!(tick = self.tick, stage = ?err.stage(), error = %err, "tick fault, pausing");
                self.diagnostics.send(Diagnostic::TickFault {
                    tick: self.tick,
                    stage: err.stage(),
                    message: err.to_string(),
                });
                self.paused = true;
                Err(err)
            }
        }
    }

    fn run_stages(&mut self) -> Result<(), SimError> {
        self.ingest_input();
        physics::integrate(self)?;
        self.grid.rebuild(&self.stores);
        ai::decide(self)?;
        collision::resolve(self)?;
        secondary::update(self)?;
        projectiles::update(self)?;
        cleanup::sweep(self)
    }

    fn ingest_input(&mut self) {
        match &self.remote {
            Some(remote) => self.input.flush_into(&mut self.stores.input, &[&self.local, remote]),
            None => self.input.flush_into(&mut self.stores.input, &[&self.local]),
        };
    }

    /// Returns true if a fault paused the simulation.
    #[inline]
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Clears the paused state so `step()` runs again.
    pub fn resume(&mut self) {
        if self.paused {
            info!(tick = self.tick, "simulation resumed");
        }
        self.paused = false;
    }

    /// Returns the world to its freshly-built state without reallocating
    /// stores, grid or queues.
    pub fn reset(&mut self) {
        self.stores.clear();
        self.local.reset();
        if let Some(remote) = self.remote.as_mut() {
            remote.reset();
        }
        self.grid.clear();
        self.brains.clear();
        self.vfx.clear();
        self.input.clear();
        self.rosters.clear();
        self.scratch.clear();
        self.shots.clear();
        self.remote_names.clear();
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.director = Director {
            level: 0,
            next_escalation: self.config.director.escalation_interval,
        };
        self.match_state = MatchState::Running;
        self.local_player = None;
        self.tick = 0;
        self.elapsed = 0.0;
        self.paused = false;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Configuration the world was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Completed ticks.
    #[inline]
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Seconds of simulated time.
    #[inline]
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Fixed tick length in seconds.
    #[inline]
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// Read-only view of every store, for renderers.
    #[inline]
    #[must_use]
    pub const fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Direct store access for callers that build entities by hand.
    #[inline]
    pub fn stores_mut(&mut self) -> &mut Stores {
        &mut self.stores
    }

    /// The spatial grid as rebuilt by the last tick.
    #[inline]
    #[must_use]
    pub const fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Pending visual effects.
    #[inline]
    #[must_use]
    pub const fn vfx(&self) -> &VfxQueue {
        &self.vfx
    }

    /// Pending visual effects, for draining.
    #[inline]
    pub fn vfx_mut(&mut self) -> &mut VfxQueue {
        &mut self.vfx
    }

    /// A receiver for this world's diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticReceiver {
        self.diagnostics_rx.clone()
    }

    pub(crate) fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.send(diagnostic);
    }

    /// Stages an input for the next tick. Returns `false` when the staging
    /// buffer is full.
    pub fn push_input(&mut self, command: InputCommand) -> bool {
        self.input.push(command)
    }

    /// Current match outcome.
    #[inline]
    #[must_use]
    pub const fn match_state(&self) -> MatchState {
        self.match_state
    }

    /// The player whose fate decides the match, if any.
    #[inline]
    #[must_use]
    pub const fn local_player(&self) -> Option<EntityId> {
        self.local_player
    }

    /// Chooses the player the match outcome follows.
    pub fn set_local_player(&mut self, handle: Option<EntityId>) {
        self.local_player = handle;
    }

    /// Director escalation level.
    #[inline]
    #[must_use]
    pub const fn director_level(&self) -> u32 {
        self.director.level
    }

    /// Live pickups spawned through [`spawn_food`](Self::spawn_food).
    #[must_use]
    pub fn food_count(&self) -> usize {
        self.rosters
            .food
            .iter()
            .filter(|id| self.stores.flags.is_simulated(**id))
            .count()
    }

    /// Live bosses.
    #[must_use]
    pub fn boss_count(&self) -> usize {
        self.rosters
            .bosses
            .iter()
            .filter(|id| self.stores.flags.is_simulated(**id))
            .count()
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectile_count(&self) -> usize {
        self.rosters
            .projectiles
            .iter()
            .filter(|id| self.stores.flags.is_simulated(**id))
            .count()
    }

    /// Live entities across both partitions.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.local.alive_count() + self.remote.as_ref().map_or(0, EntityAllocator::alive_count)
    }

    /// The bot brain for `handle`, if it is still current.
    #[must_use]
    pub fn brain(&self, handle: EntityId) -> Option<&BotBrain> {
        self.brains.get(handle)
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocator owning `index`.
    pub(crate) fn allocator_for(&self, index: u32) -> Option<&EntityAllocator> {
        if self.local.owns(index) {
            return Some(&self.local);
        }
        self.remote.as_ref().filter(|r| r.owns(index))
    }

    pub(crate) fn allocator_for_mut(&mut self, index: u32) -> Option<&mut EntityAllocator> {
        if self.local.owns(index) {
            return Some(&mut self.local);
        }
        self.remote.as_mut().filter(|r| r.owns(index))
    }

    /// Allocates a bare id from the local partition. Rows start zeroed;
    /// nothing is simulated until flags are set.
    pub fn allocate_local(&mut self) -> Option<EntityId> {
        self.local.allocate()
    }

    /// Allocates a bare id from the remote partition (or the local one when
    /// the store is not partitioned).
    pub fn allocate_remote(&mut self) -> Option<EntityId> {
        match self.remote.as_mut() {
            Some(remote) => remote.allocate(),
            None => self.local.allocate(),
        }
    }

    /// Returns true if `handle` refers to a live entity.
    #[must_use]
    pub fn is_valid(&self, handle: EntityId) -> bool {
        self.allocator_for(handle.index())
            .is_some_and(|a| a.is_valid(handle))
    }

    /// Returns true if `index` is currently allocated.
    #[must_use]
    pub fn is_live(&self, index: u32) -> bool {
        self.allocator_for(index).is_some_and(|a| a.is_live(index))
    }

    /// Current handle for a live index.
    #[must_use]
    pub fn handle(&self, index: u32) -> Option<EntityId> {
        self.allocator_for(index)?.handle(index)
    }

    // =========================================================================
    // Desync detection
    // =========================================================================

    /// CRC-32 over the tick counter and the transform, physics and flag
    /// tables. Two hosts fed the same inputs report the same value.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.tick.to_le_bytes());
        hasher.update(bytemuck::cast_slice(self.stores.transform.as_slice()));
        hasher.update(bytemuck::cast_slice(self.stores.physics.as_slice()));
        hasher.update(bytemuck::cast_slice(self.stores.flags.as_slice()));
        hasher.finalize()
    }

    /// Marks an entity for end-of-tick release.
    pub(crate) fn soft_delete(&mut self, id: u32) {
        self.stores.flags.mark_dead(id);
    }

    /// Query padding that reaches every body a caller could overlap: the
    /// widest simulated radius, never less than `MAX_UNIT_RADIUS`. Bodies
    /// built through the store setters may exceed the spawn cap.
    pub(crate) fn contact_pad(&self) -> f32 {
        let bits = self.stores.flags.as_slice();
        bits.iter()
            .enumerate()
            .filter(|(_, mask)| flags::is_simulated(**mask))
            .map(|(id, _)| self.stores.physics.radius(id as u32))
            .fold(MAX_UNIT_RADIUS, f32::max)
    }

    pub(crate) fn world_centre(&self) -> Vec2 {
        Vec2::new(self.config.world_width * 0.5, self.config.world_height * 0.5)
    }
}

/// Whether a mask belongs to something that fights.
#[inline]
pub(crate) const fn is_unit(mask: u32) -> bool {
    mask & flags::UNIT != 0
}
