//! # SKIRMISH Shared
//!
//! Common types used by the core, the simulation and the transport layer.
//!
//! ## CRITICAL RULE
//!
//! This crate holds plain data only: constants, 2D math and the startup
//! configuration. It must never own simulation state.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod math;

pub use config::{AiConfig, CombatConfig, ConfigError, DirectorConfig, SimConfig};
pub use constants::{MAX_ENTITIES, TICK_RATE, DEFAULT_CELL_SIZE, DEFAULT_VFX_CAPACITY};
pub use math::{grid_dimensions, Vec2};
