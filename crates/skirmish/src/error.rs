//! # Simulation Error Types
//!
//! Faults that abort a tick. Recoverable conditions (exhausted pools,
//! out-of-range writes, malformed frames) never reach this type; they are
//! `None`/`false` at the call site.

use skirmish_shared::ConfigError;
use thiserror::Error;

use crate::simulation::Stage;

/// Errors raised by the simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// A stage produced a NaN or infinite value for an entity.
    #[error("non-finite {field} for entity {id} during {stage}")]
    NonFinite {
        /// Stage that detected the value.
        stage: Stage,
        /// Entity index.
        id: u32,
        /// Which quantity went bad.
        field: &'static str,
    },

    /// A roster referenced an index no allocator owns.
    #[error("roster entry {id} is outside every allocator during {stage}")]
    UnownedIndex {
        /// Stage that found the entry.
        stage: Stage,
        /// Entity index.
        id: u32,
    },

    /// `step()` was called while paused after an earlier fault.
    #[error("simulation is paused after a fault; call resume()")]
    Paused,

    /// The configuration was rejected at construction.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl SimError {
    /// Stage the fault came from, if any.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::NonFinite { stage, .. } | Self::UnownedIndex { stage, .. } => Some(*stage),
            Self::Paused | Self::Config(_) => None,
        }
    }
}
