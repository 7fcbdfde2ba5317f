//! Block locations on the voxel grid.
//!
//! A location is an integer triple. Conduits only ever bond across a shared
//! face, so the only movement a location supports is a single face step.

use std::ops::{Add, Neg, Sub};

use crate::Direction;

/// A block position in the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// East-west axis
    pub x: i32,
    /// Vertical axis
    pub y: i32,
    /// North-south axis
    pub z: i32,
}

impl Location {
    /// Origin of the grid.
    pub const ORIGIN: Self = Self { x: 0, y: 0, z: 0 };

    /// Create a new location.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The location one face step away in `direction`.
    #[inline]
    pub fn step(&self, direction: Direction) -> Self {
        *self + direction.offset()
    }

    /// All six face neighbours, in [`Direction::ALL`] order.
    pub fn neighbors(&self) -> [Self; 6] {
        Direction::ALL.map(|d| self.step(d))
    }

    /// The face direction leading from `self` to `other`, if they share a face.
    pub fn direction_to(&self, other: &Self) -> Option<Direction> {
        Direction::from_offset(*other - *self)
    }

    /// Taxicab distance; a lower bound on any face-step path length.
    pub fn manhattan_distance(&self, other: &Self) -> u64 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();
        let dz = (i64::from(self.z) - i64::from(other.z)).unsigned_abs();
        dx + dy + dz
    }
}

impl Add for Location {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Location {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Location {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
