//! # Spatial Partitioning
//!
//! Broad-phase neighbour lookup for collision, sensing and projectiles.

mod grid;

pub use grid::SpatialGrid;
