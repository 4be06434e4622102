//! # SKIRMISH
//!
//! Arena simulation: players, bots, bosses, food, projectiles and
//! obstacles in a bounded 2D world, advanced one fixed tick at a time.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                              skirmish                                │
//! │                                                                      │
//! │  InputQueue ──> ┌────────────────────────────┐ ──> VfxQueue          │
//! │  (transport)    │        Simulation          │     (renderer)        │
//! │                 │  stores · allocators · grid│                       │
//! │  GameLoop ────> │  8-stage step()            │ ──> diagnostics       │
//! │  (frame time)   └─────────────┬──────────────┘     (supervisor)      │
//! │                               │                                      │
//! │                     net_sync: transform frames <──> peers            │
//! └───────────────────────────────┼──────────────────────────────────────┘
//!          skirmish_core (ECS, grid, VFX) · skirmish_networking (codec)
//!          skirmish_shared (math, config, constants)
//! ```
//!
//! ## Modules
//!
//! - `simulation`: the world object and its tick pipeline
//! - `input`: per-tick input staging
//! - `diagnostics`: out-of-band fault and event reports
//! - `game_loop`: fixed-timestep driver
//! - `net_sync`: transform frame export and remote mirroring
//!
//! ## Example
//!
//! ```rust
//! use skirmish::{Simulation, Personality};
//! use skirmish_shared::SimConfig;
//!
//! let mut sim = Simulation::new(SimConfig::default()).expect("valid config");
//! sim.spawn_player(200.0, 200.0).expect("room");
//! sim.spawn_bot(400.0, 400.0, Some(Personality::Forager)).expect("room");
//!
//! for _ in 0..60 {
//!     sim.step().expect("no fault");
//! }
//! assert_eq!(sim.tick(), 60);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod diagnostics;
pub mod error;
pub mod game_loop;
pub mod input;
pub mod net_sync;
pub mod simulation;

// Re-export the lower layers
pub use skirmish_core as core;
pub use skirmish_networking as networking;
pub use skirmish_shared as shared;

// Re-export commonly used types
pub use diagnostics::{Diagnostic, DiagnosticReceiver};
pub use error::SimError;
pub use game_loop::{GameLoop, LoopStats};
pub use input::{InputCommand, InputQueue};
pub use net_sync::{wire_name, FrameApplied};
pub use simulation::{BotBrain, MatchState, Personality, Simulation, Stage};
