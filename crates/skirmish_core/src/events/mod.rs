//! # Event Buffers
//!
//! Bounded, allocation-free buffers that carry per-tick side effects from
//! the simulation to whoever presents them.
//!
//! ```text
//! ┌─────────────┐  push   ┌─────────────┐  drain_into  ┌─────────────┐
//! │ Simulation  │────────>│  VfxQueue   │─────────────>│  Renderer   │
//! │  (8 stages) │         │ (fixed cap) │  once/frame  │  (external) │
//! └─────────────┘         └─────────────┘              └─────────────┘
//! ```

mod vfx;

pub use vfx::{VfxEvent, VfxKind, VfxQueue};
