//! # Simulation Configuration
//!
//! All tunables are loaded once at startup from TOML. Every field has a
//! default, so an empty file (or no file at all) yields a playable arena.
//!
//! ```toml
//! max_entities = 4096
//! cell_size = 128.0
//! seed = 7
//!
//! [ai]
//! steer_factor = 0.1
//!
//! [director]
//! target_food = 300
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{
    DEFAULT_CELL_SIZE, DEFAULT_DIAGNOSTIC_CAPACITY, DEFAULT_VFX_CAPACITY, DEFAULT_WORLD_HEIGHT,
    DEFAULT_WORLD_WIDTH, MAX_ENTITIES, MAX_ENTITY_CAPACITY, MAX_GRID_CELLS, TICK_RATE,
};
use crate::math::grid_dimensions;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`SimConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its legal range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level world configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Entity slots per world.
    pub max_entities: usize,
    /// World width in world units.
    pub world_width: f32,
    /// World height in world units.
    pub world_height: f32,
    /// Spatial grid cell size in world units.
    pub cell_size: f32,
    /// Fixed ticks per second.
    pub tick_rate: u32,
    /// VFX queue capacity.
    pub vfx_capacity: usize,
    /// Diagnostic channel capacity.
    pub diagnostic_capacity: usize,
    /// Seed for the deterministic RNG.
    pub seed: u64,
    /// Splits the id space: `[0, n)` for locally spawned entities and
    /// `[n, max_entities)` for entities mirrored from the network.
    /// `None` gives the whole range to local spawns.
    pub local_partition: Option<u32>,
    /// Bot behaviour.
    pub ai: AiConfig,
    /// Contact and projectile combat.
    pub combat: CombatConfig,
    /// Food respawn, escalation and match rules.
    pub director: DirectorConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_entities: MAX_ENTITIES,
            world_width: DEFAULT_WORLD_WIDTH,
            world_height: DEFAULT_WORLD_HEIGHT,
            cell_size: DEFAULT_CELL_SIZE,
            tick_rate: TICK_RATE,
            vfx_capacity: DEFAULT_VFX_CAPACITY,
            diagnostic_capacity: DEFAULT_DIAGNOSTIC_CAPACITY,
            seed: 0x5EED,
            local_partition: None,
            ai: AiConfig::default(),
            combat: CombatConfig::default(),
            director: DirectorConfig::default(),
        }
    }
}

/// Sensing, steering and cruise speeds.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AiConfig {
    /// Radius of the sensing query.
    pub sense_radius: f32,
    /// `other.radius > self.radius * threat_ratio` marks a threat.
    pub threat_ratio: f32,
    /// `other.radius * prey_ratio < self.radius` marks prey.
    pub prey_ratio: f32,
    /// Per-tick blend factor toward the desired velocity.
    pub steer_factor: f32,
    /// Shortest delay between two decisions of one bot (seconds).
    pub reaction_min: f32,
    /// Longest delay between two decisions of one bot (seconds).
    pub reaction_max: f32,
    /// Score multiplier for plain food.
    pub food_multiplier: f32,
    /// Score multiplier for power-up pickups.
    pub powerup_multiplier: f32,
    /// Cruise speed of a player, local or remote (units per second).
    pub player_speed: f32,
    /// Cruise speed of a regular bot (units per second).
    pub bot_speed: f32,
    /// Cruise speed of a boss (units per second).
    pub boss_speed: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            sense_radius: 420.0,
            threat_ratio: 1.15,
            prey_ratio: 1.15,
            steer_factor: 0.1,
            reaction_min: 0.1,
            reaction_max: 0.35,
            food_multiplier: 1.0,
            powerup_multiplier: 4.0,
            player_speed: 260.0,
            bot_speed: 220.0,
            boss_speed: 140.0,
        }
    }
}

/// Damage, growth and projectile tuning.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CombatConfig {
    /// Multiplier on contact damage per second.
    pub contact_damage_scale: f32,
    /// Fraction of the overlap resolved per tick when two units touch.
    pub knockback: f32,
    /// Score awarded for a kill.
    pub kill_score: f32,
    /// Invulnerability granted on spawn (seconds).
    pub spawn_invulnerability: f32,
    /// Radius gained per unit of food value.
    pub growth_per_food: f32,
    /// Projectile speed (units per second).
    pub projectile_speed: f32,
    /// Projectile maximum travel distance.
    pub projectile_range: f32,
    /// Projectile damage on impact.
    pub projectile_damage: f32,
    /// Cooldown after firing (seconds).
    pub fire_cooldown: f32,
    /// Cooldown after dashing (seconds).
    pub dash_cooldown: f32,
    /// Velocity multiplier applied by a dash.
    pub dash_boost: f32,
    /// Shield duration granted by a power-up (seconds).
    pub shield_duration: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            contact_damage_scale: 1.0,
            knockback: 0.5,
            kill_score: 50.0,
            spawn_invulnerability: 1.5,
            growth_per_food: 0.5,
            projectile_speed: 600.0,
            projectile_range: 900.0,
            projectile_damage: 25.0,
            fire_cooldown: 0.4,
            dash_cooldown: 3.0,
            dash_boost: 2.5,
            shield_duration: 3.0,
        }
    }
}

/// World director: pickups, escalation, match rules.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DirectorConfig {
    /// Number of food pickups the director tries to keep alive.
    pub target_food: u32,
    /// Maximum pickups respawned in a single tick.
    pub respawn_per_tick: u32,
    /// One in `powerup_one_in` respawned pickups is a power-up (0 = never).
    pub powerup_one_in: u32,
    /// Seconds between escalation levels (0 disables escalation).
    pub escalation_interval: f32,
    /// Bosses spawned per escalation level.
    pub bosses_per_level: u32,
    /// Score at which the local player wins.
    pub win_score: f32,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            target_food: 300,
            respawn_per_tick: 4,
            powerup_one_in: 25,
            escalation_interval: 60.0,
            bosses_per_level: 1,
            win_score: 1000.0,
        }
    }
}

impl SimConfig {
    /// Parses a configuration from a TOML string and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`SimConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Fixed delta time of one tick, in seconds.
    #[must_use]
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entities == 0 || self.max_entities > MAX_ENTITY_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "max_entities must be in 1..={MAX_ENTITY_CAPACITY}, got {}",
                self.max_entities
            )));
        }
        if !(self.world_width > 0.0 && self.world_height > 0.0)
            || !(self.world_width.is_finite() && self.world_height.is_finite())
        {
            return Err(ConfigError::Invalid("world dimensions must be positive and finite".into()));
        }
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return Err(ConfigError::Invalid("cell_size must be positive and finite".into()));
        }
        if grid_dimensions(self.world_width, self.world_height, self.cell_size).is_none() {
            return Err(ConfigError::Invalid(format!(
                "world {} x {} needs more than {MAX_GRID_CELLS} cells of size {}",
                self.world_width, self.world_height, self.cell_size
            )));
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be non-zero".into()));
        }
        if self.vfx_capacity == 0 || self.diagnostic_capacity == 0 {
            return Err(ConfigError::Invalid("queue capacities must be non-zero".into()));
        }
        if let Some(split) = self.local_partition {
            if split == 0 || split as usize >= self.max_entities {
                return Err(ConfigError::Invalid(format!(
                    "local_partition must be in 1..{}, got {split}",
                    self.max_entities
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.ai.steer_factor) {
            return Err(ConfigError::Invalid("ai.steer_factor must be in 0..=1".into()));
        }
        if self.ai.reaction_min < 0.0 || self.ai.reaction_max < self.ai.reaction_min {
            return Err(ConfigError::Invalid(
                "ai.reaction_min must be >= 0 and <= ai.reaction_max".into(),
            ));
        }
        if self.ai.threat_ratio < 1.0 || self.ai.prey_ratio < 1.0 {
            return Err(ConfigError::Invalid("ai ratios must be >= 1".into()));
        }
        let speeds = [self.ai.player_speed, self.ai.bot_speed, self.ai.boss_speed];
        if !speeds.iter().all(|s| *s >= 0.0 && s.is_finite()) {
            return Err(ConfigError::Invalid("ai speeds must be finite and >= 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = SimConfig::from_toml_str(
            "max_entities = 512\nseed = 9\n[ai]\nsteer_factor = 0.25\n",
        )
        .unwrap();
        assert_eq!(config.max_entities, 512);
        assert_eq!(config.seed, 9);
        assert!((config.ai.steer_factor - 0.25).abs() < f32::EPSILON);
        assert_eq!(config.director, DirectorConfig::default());
    }

    #[test]
    fn test_rejects_unknown_field() {
        assert!(matches!(
            SimConfig::from_toml_str("max_entites = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let err = SimConfig::from_toml_str("world_width = 1000000.0\ncell_size = 1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(SimConfig::from_toml_str("world_width = 8000.0\ncell_size = 4.0").is_ok());
    }

    #[test]
    fn test_rejects_inexact_entity_count() {
        let config = SimConfig {
            max_entities: MAX_ENTITY_CAPACITY + 1,
            ..SimConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_partition() {
        let err = SimConfig::from_toml_str("max_entities = 16\nlocal_partition = 16").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_tick_dt() {
        let config = SimConfig::default();
        assert!((config.tick_dt() - 1.0 / 60.0).abs() < f32::EPSILON);
    }
}
