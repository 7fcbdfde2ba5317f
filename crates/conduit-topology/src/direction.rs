//! The six face directions of a block.
//!
//! Every block has exactly six faces, one per axis direction. The declaration
//! order is also the bit order used by [`ConnectionMask`](crate::ConnectionMask).

use crate::{Location, FACE_COUNT};

/// A face of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// +y
    Up,
    /// -y
    Down,
    /// -x
    Left,
    /// +x
    Right,
    /// -z
    Forward,
    /// +z
    Backward,
}

impl Direction {
    /// All faces in bit order.
    pub const ALL: [Self; FACE_COUNT] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Forward,
        Self::Backward,
    ];

    /// The face on the other side of the block.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    /// Unit offset of a single step through this face.
    pub const fn offset(self) -> Location {
        match self {
            Self::Up => Location::new(0, 1, 0),
            Self::Down => Location::new(0, -1, 0),
            Self::Left => Location::new(-1, 0, 0),
            Self::Right => Location::new(1, 0, 0),
            Self::Forward => Location::new(0, 0, -1),
            Self::Backward => Location::new(0, 0, 1),
        }
    }

    /// Inverse of [`Direction::offset`].
    pub fn from_offset(offset: Location) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.offset() == offset)
    }

    /// Position of this face in [`Direction::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Single-bit mask for this face.
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Forward => "forward",
            Self::Backward => "backward",
        };
        f.write_str(name)
    }
}
