//! Block positions.
//!
//! Positions are plain integer triples. The derived ordering (x, then y,
//! then z) is used wherever a stable iteration order over positions is
//! needed.

use std::ops::{Add, Neg, Sub};

use crate::{Facing, FACES};

/// A block position in the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockPos {
    /// East-west axis
    pub x: i64,
    /// Vertical axis
    pub y: i64,
    /// North-south axis
    pub z: i64,
}

impl BlockPos {
    /// Origin of the grid.
    pub const ORIGIN: Self = Self { x: 0, y: 0, z: 0 };

    /// Create a new position.
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// The adjacent position across `facing`.
    #[inline]
    pub fn offset(self, facing: Facing) -> Self {
        self + facing.unit()
    }

    /// All six adjacent positions, in [`Facing::ALL`] order.
    pub fn neighbors(self) -> [Self; FACES] {
        Facing::ALL.map(|f| self.offset(f))
    }
}

impl Add for BlockPos {
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

impl Sub for BlockPos {
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

impl Neg for BlockPos {
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

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
