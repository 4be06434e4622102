//! 2D math used by the simulation.
//!
//! The stores hold raw `f32` columns; `Vec2` is only a convenience for
//! systems that read a pair of fields and do vector arithmetic on them.

use serde::{Deserialize, Serialize};

/// 2D Vector - positions, velocities, directions
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Distance squared (avoids sqrt)
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Returns the unit vector in the same direction, or zero for a
    /// (near) zero-length vector.
    #[must_use]
    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len > f32::EPSILON {
            self * (1.0 / len)
        } else {
            Self::ZERO
        }
    }

    /// Clamps the length of the vector to `max`.
    #[must_use]
    pub fn clamp_length(self, max: f32) -> Self {
        let len_sq = self.length_squared();
        if len_sq > max * max && len_sq > 0.0 {
            self * (max / len_sq.sqrt())
        } else {
            self
        }
    }

    /// Linear interpolation toward `target` by factor `t`.
    #[must_use]
    pub fn lerp(self, target: Self, t: f32) -> Self {
        self + (target - self) * t
    }

    /// Returns true if both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Columns and rows of a grid of `cell_size` cells covering
/// `[0, width) × [0, height)`.
///
/// Returns `None` for non-positive or non-finite inputs and for grids of
/// more than [`MAX_GRID_CELLS`](crate::constants::MAX_GRID_CELLS) cells.
#[must_use]
pub fn grid_dimensions(width: f32, height: f32, cell_size: f32) -> Option<(u32, u32)> {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !(valid(width) && valid(height) && valid(cell_size)) {
        return None;
    }
    let cols = (f64::from(width) / f64::from(cell_size)).ceil().max(1.0);
    let rows = (f64::from(height) / f64::from(cell_size)).ceil().max(1.0);
    if cols * rows > crate::constants::MAX_GRID_CELLS as f64 {
        return None;
    }
    Some((cols as u32, rows as u32))
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_dimensions_round_up_and_cap() {
        assert_eq!(grid_dimensions(1050.0, 300.0, 100.0), Some((11, 3)));
        assert_eq!(grid_dimensions(10.0, 10.0, 128.0), Some((1, 1)));
        assert_eq!(grid_dimensions(1.0e6, 1.0e6, 1.0), None);
        assert_eq!(grid_dimensions(f32::INFINITY, 100.0, 10.0), None);
        assert_eq!(grid_dimensions(100.0, 100.0, 0.0), None);
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec2::ZERO.normalize_or_zero(), Vec2::ZERO);
    }

    #[test]
    fn test_clamp_length() {
        let v = Vec2::new(30.0, 40.0).clamp_length(5.0);
        assert!((v.length() - 5.0).abs() < 1e-4);
        assert!((v.x - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_lerp() {
        let v = Vec2::ZERO.lerp(Vec2::new(10.0, 0.0), 0.1);
        assert!((v.x - 1.0).abs() < f32::EPSILON);
    }
}
