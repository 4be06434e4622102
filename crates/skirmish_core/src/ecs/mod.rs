//! # Entity Component System
//!
//! A flat, structure-of-arrays entity store.
//!
//! ## Design Philosophy
//!
//! - All storage is pre-allocated at world creation
//! - Each concern is one `capacity × STRIDE` scalar array
//! - Entity ids are plain indices; handles add a generation counter
//! - No per-entity objects except the reverse lookup's rich logic state

mod entity;
pub mod flags;
pub mod layout;
mod lookup;
mod storage;
mod tables;

pub use entity::{EntityAllocator, EntityId};
pub use flags::FlagStore;
pub use lookup::EntityLookup;
pub use storage::StridedStore;
pub use tables::{InputStore, Stores};
