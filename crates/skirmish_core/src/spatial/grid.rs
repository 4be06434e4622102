//! # Uniform Spatial Hash Grid
//!
//! Fixed grid of square cells covering the world. Each cell heads two
//! intrusive singly-linked lists of entity ids, one per partition:
//!
//! - **Static**: obstacles and other immobile entries, maintained
//!   incrementally through [`SpatialGrid::insert_static`] and
//!   [`SpatialGrid::remove_static`]
//! - **Dynamic**: everything that moves, rebuilt from scratch every tick
//!
//! Links live in one `next` array indexed by entity id, so an entity can be
//! in at most one list at a time. Nothing allocates after construction.

use skirmish_shared::constants::MAX_GRID_CELLS;
use skirmish_shared::grid_dimensions;
use tracing::debug;

use crate::ecs::{flags, Stores};

/// End-of-list marker.
const NONE: u32 = u32::MAX;

/// Uniform grid with static and dynamic partitions.
///
/// # Example
///
/// ```rust
/// use skirmish_core::SpatialGrid;
///
/// let mut grid = SpatialGrid::new(1000.0, 1000.0, 100.0, 64);
/// let mut hits = Vec::with_capacity(64);
///
/// grid.insert_dynamic(3, 250.0, 250.0);
/// grid.query_radius_into(250.0, 250.0, 10.0, &mut hits);
/// assert_eq!(hits, vec![3]);
/// ```
pub struct SpatialGrid {
    cell_size: f32,
    inv_cell_size: f32,
    cols: u32,
    rows: u32,
    /// First id of each cell's dynamic list.
    dynamic_heads: Box<[u32]>,
    /// First id of each cell's static list.
    static_heads: Box<[u32]>,
    /// Intrusive link per entity id.
    next: Box<[u32]>,
    /// Cell of each static member, or [`NONE`].
    static_cell: Box<[u32]>,
    /// Cell of each dynamic member; valid only when the stamp matches.
    dynamic_cell: Box<[u32]>,
    dynamic_stamp: Box<[u32]>,
    epoch: u32,
    dynamic_count: usize,
    static_count: usize,
}

impl SpatialGrid {
    /// Creates a grid covering `[0, width) × [0, height)` for entity ids in
    /// `[0, capacity)`.
    ///
    /// # Panics
    ///
    /// Panics if any dimension, the cell size or the capacity is not
    /// positive and finite, or if the grid would need more than
    /// [`MAX_GRID_CELLS`] cells.
    #[must_use]
    pub fn new(width: f32, height: f32, cell_size: f32, capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        let Some((cols, rows)) = grid_dimensions(width, height, cell_size) else {
            panic!(
                "Grid {width} x {height} with cell {cell_size} is not positive, finite \
                 and within {MAX_GRID_CELLS} cells"
            );
        };
        let cells = cols as usize * rows as usize;

        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cols,
            rows,
            dynamic_heads: vec![NONE; cells].into_boxed_slice(),
            static_heads: vec![NONE; cells].into_boxed_slice(),
            next: vec![NONE; capacity].into_boxed_slice(),
            static_cell: vec![NONE; capacity].into_boxed_slice(),
            dynamic_cell: vec![NONE; capacity].into_boxed_slice(),
            dynamic_stamp: vec![0; capacity].into_boxed_slice(),
            epoch: 1,
            dynamic_count: 0,
            static_count: 0,
        }
    }

    /// Edge length of one cell in world units.
    #[inline]
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions as `(cols, rows)`.
    #[inline]
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// Number of ids this grid can index.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.next.len()
    }

    /// Number of entries in the dynamic partition.
    #[inline]
    #[must_use]
    pub const fn dynamic_count(&self) -> usize {
        self.dynamic_count
    }

    /// Number of entries in the static partition.
    #[inline]
    #[must_use]
    pub const fn static_count(&self) -> usize {
        self.static_count
    }

    /// Cell coordinates of a world position, clamped to the grid.
    #[inline]
    #[must_use]
    pub fn cell_coords(&self, x: f32, y: f32) -> (u32, u32) {
        (
            Self::axis_cell(x * self.inv_cell_size, self.cols),
            Self::axis_cell(y * self.inv_cell_size, self.rows),
        )
    }

    #[inline]
    fn axis_cell(scaled: f32, count: u32) -> u32 {
        // NaN casts to 0, infinities saturate; both end up clamped.
        (scaled.floor() as i64).clamp(0, i64::from(count) - 1) as u32
    }

    #[inline]
    fn cell_index(&self, x: f32, y: f32) -> u32 {
        let (cx, cy) = self.cell_coords(x, y);
        cy * self.cols + cx
    }

    #[inline]
    fn is_dynamic_member(&self, id: usize) -> bool {
        self.dynamic_stamp[id] == self.epoch
    }

    fn check_id(&self, id: u32, op: &'static str) -> Option<usize> {
        let index = id as usize;
        if index < self.next.len() {
            Some(index)
        } else {
            if cfg!(debug_assertions) {
                debug!(id, capacity = self.next.len(), op, "grid access rejected");
            }
            None
        }
    }

    /// Removes `id` from the list headed at `heads[cell]`.
    fn unlink(heads: &mut [u32], next: &mut [u32], cell: u32, id: u32) -> bool {
        let head = &mut heads[cell as usize];
        if *head == id {
            *head = next[id as usize];
            next[id as usize] = NONE;
            return true;
        }

        let mut cursor = *head;
        while cursor != NONE {
            let following = next[cursor as usize];
            if following == id {
                next[cursor as usize] = next[id as usize];
                next[id as usize] = NONE;
                return true;
            }
            cursor = following;
        }
        false
    }

    /// Empties the dynamic partition. O(cells); per-entity links are
    /// invalidated by bumping an epoch.
    pub fn clear_dynamic(&mut self) {
        self.dynamic_heads.fill(NONE);
        self.dynamic_count = 0;
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.dynamic_stamp.fill(0);
            self.epoch = 1;
        }
    }

    /// Empties both partitions.
    pub fn clear(&mut self) {
        self.clear_dynamic();
        self.static_heads.fill(NONE);
        self.static_cell.fill(NONE);
        self.next.fill(NONE);
        self.static_count = 0;
    }

    /// Adds `id` to the dynamic partition at `(x, y)`.
    ///
    /// Returns `false` (nothing inserted) for out-of-range ids, ids already
    /// in either partition, and ids already inserted since the last clear.
    pub fn insert_dynamic(&mut self, id: u32, x: f32, y: f32) -> bool {
        let Some(index) = self.check_id(id, "insert_dynamic") else {
            return false;
        };
        if self.is_dynamic_member(index) || self.static_cell[index] != NONE {
            return false;
        }

        let cell = self.cell_index(x, y);
        self.next[index] = self.dynamic_heads[cell as usize];
        self.dynamic_heads[cell as usize] = id;
        self.dynamic_cell[index] = cell;
        self.dynamic_stamp[index] = self.epoch;
        self.dynamic_count += 1;
        true
    }

    /// Adds `id` to the static partition at `(x, y)`, moving it if it was
    /// already there and pulling it out of the dynamic partition.
    pub fn insert_static(&mut self, id: u32, x: f32, y: f32) -> bool {
        let Some(index) = self.check_id(id, "insert_static") else {
            return false;
        };
        self.remove_static(id);
        if self.is_dynamic_member(index) {
            Self::unlink(&mut self.dynamic_heads, &mut self.next, self.dynamic_cell[index], id);
            self.dynamic_stamp[index] = 0;
            self.dynamic_count -= 1;
        }

        let cell = self.cell_index(x, y);
        self.next[index] = self.static_heads[cell as usize];
        self.static_heads[cell as usize] = id;
        self.static_cell[index] = cell;
        self.static_count += 1;
        true
    }

    /// Removes `id` from the static partition. Returns `false` if it was not
    /// a member.
    pub fn remove_static(&mut self, id: u32) -> bool {
        let Some(index) = self.check_id(id, "remove_static") else {
            return false;
        };
        let cell = self.static_cell[index];
        if cell == NONE {
            return false;
        }

        Self::unlink(&mut self.static_heads, &mut self.next, cell, id);
        self.static_cell[index] = NONE;
        self.static_count -= 1;
        true
    }

    /// Returns true if `id` is in the static partition.
    #[inline]
    #[must_use]
    pub fn is_static(&self, id: u32) -> bool {
        self.static_cell.get(id as usize).is_some_and(|cell| *cell != NONE)
    }

    /// Rebuilds the dynamic partition from the stores: every ACTIVE,
    /// non-DEAD, non-STATIC entity is inserted at its transform position.
    pub fn rebuild(&mut self, stores: &Stores) {
        self.clear_dynamic();

        let limit = stores.capacity().min(self.next.len());
        let bits = stores.flags.as_slice();
        for (id, mask) in bits.iter().enumerate().take(limit) {
            if !flags::is_simulated(*mask) || mask & flags::STATIC != 0 {
                continue;
            }
            let id = id as u32;
            if let Some(pos) = stores.transform.position(id) {
                self.insert_dynamic(id, pos.x, pos.y);
            }
        }
    }

    /// Appends every id in cells overlapping the square bounding the circle
    /// at `(x, y)` with `radius`, static entries included.
    ///
    /// Candidates are broad-phase only; callers do their own distance test.
    /// `out` is not cleared. Keep its capacity at least the grid capacity to
    /// avoid growth.
    pub fn query_radius_into(&self, x: f32, y: f32, radius: f32, out: &mut Vec<u32>) {
        let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
        let (min_x, min_y) = self.cell_coords(x - radius, y - radius);
        let (max_x, max_y) = self.cell_coords(x + radius, y + radius);

        for cy in min_y..=max_y {
            let row = cy * self.cols;
            for cx in min_x..=max_x {
                let cell = (row + cx) as usize;
                self.collect(self.dynamic_heads[cell], out);
                self.collect(self.static_heads[cell], out);
            }
        }
    }

    #[inline]
    fn collect(&self, head: u32, out: &mut Vec<u32>) {
        let mut cursor = head;
        while cursor != NONE {
            out.push(cursor);
            cursor = self.next[cursor as usize];
        }
    }
}
