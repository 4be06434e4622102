//! # SKIRMISH Core
//!
//! Zero-allocation entity store designed for:
//! - Thousands of entities per world at a fixed 60 Hz tick
//! - No heap traffic once the world is constructed
//! - Flat numeric tables readable by render and network layers
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations in hot path** - All memory is pre-allocated
//! 2. **Data-oriented design** - One flat array per concern, indexed by entity id
//! 3. **Reject, don't panic** - Out-of-range writes are refused locally
//!
//! ## Example
//!
//! ```rust
//! use skirmish_core::ecs::{layout, flags, EntityAllocator, Stores};
//!
//! let mut allocator = EntityAllocator::new(0, 64);
//! let mut stores = Stores::new(64);
//!
//! let id = allocator.allocate().expect("fresh allocator has room");
//! stores.transform.set_position(id.index(), 10.0, 20.0);
//! stores.flags.insert(id.index(), flags::ACTIVE | flags::BOT);
//! assert_eq!(stores.transform.get(id.index(), layout::transform::X), Some(10.0));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod events;
pub mod spatial;

pub use ecs::{
    flags, layout, EntityAllocator, EntityId, EntityLookup, FlagStore, StridedStore, Stores,
};
pub use events::{VfxEvent, VfxKind, VfxQueue};
pub use spatial::SpatialGrid;
