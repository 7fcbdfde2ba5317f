//! Six-bit sets of block faces.

use std::ops::{BitAnd, BitOr};

use crate::{Direction, TopologyError};

/// The faces through which a block may bond to a neighbouring block.
///
/// Bit `n` corresponds to `Direction::ALL[n]`; bits 6 and 7 are always clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct ConnectionMask(u8);

impl ConnectionMask {
    const VALID_BITS: u8 = 0b0011_1111;

    /// No faces.
    pub const EMPTY: Self = Self(0);

    /// All six faces.
    pub const ALL: Self = Self(Self::VALID_BITS);

    /// Unpack a raw byte, rejecting stray high bits.
    pub const fn from_bits(bits: u8) -> Result<Self, TopologyError> {
        if bits & !Self::VALID_BITS != 0 {
            return Err(TopologyError::InvalidMask(bits));
        }
        Ok(Self(bits))
    }

    /// Unpack a raw byte, dropping stray high bits.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::VALID_BITS)
    }

    /// Packed representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Mask containing exactly the given faces.
    pub fn from_directions<I>(directions: I) -> Self
    where
        I: IntoIterator<Item = Direction>,
    {
        directions.into_iter().fold(Self::EMPTY, Self::with_direction)
    }

    pub const fn has_direction(self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    /// Copy of this mask with `direction` set.
    #[must_use]
    pub const fn with_direction(self, direction: Direction) -> Self {
        Self(self.0 | direction.bit())
    }

    /// Copy of this mask with `direction` cleared.
    #[must_use]
    pub const fn without_direction(self, direction: Direction) -> Self {
        Self(self.0 & !direction.bit())
    }

    /// Set `direction` in place.
    pub fn add_direction(&mut self, direction: Direction) {
        self.0 |= direction.bit();
    }

    /// True if the two masks share at least one face.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of faces set.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Faces in this mask, in bit order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |d| self.has_direction(*d))
    }
}

impl FromIterator<Direction> for ConnectionMask {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        Self::from_directions(iter)
    }
}

impl From<Direction> for ConnectionMask {
    fn from(direction: Direction) -> Self {
        Self(direction.bit())
    }
}

impl From<ConnectionMask> for u8 {
    fn from(mask: ConnectionMask) -> Self {
        mask.0
    }
}

impl TryFrom<u8> for ConnectionMask {
    type Error = TopologyError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::from_bits(bits)
    }
}

impl BitOr for ConnectionMask {
    type Output = Self;

    #[inline]
    fn bitor(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitAnd for ConnectionMask {
    type Output = Self;

    #[inline]
    fn bitand(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }
}

impl std::fmt::Display for ConnectionMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06b}", self.0)
    }
}
