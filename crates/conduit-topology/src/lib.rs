//! Conduit Face Topology
//!
//! Value types describing where conduits sit on the voxel grid and which
//! faces they bond through.
//!
//! # Adjacency
//!
//! Blocks bond only across shared faces. Each block has exactly 6 faces,
//! and a bond between two blocks requires both of them to expose the face
//! pointing at the other:
//!
//! ```text
//! a.location.step(d) == b.location
//! a.connections ∋ d
//! b.connections ∋ d.opposite()
//! ```
//!
//! Everything in this crate is plain data: no allocation beyond iterators,
//! no interior mutability.

mod direction;
mod location;
mod mask;
mod node;

pub use direction::Direction;
pub use location::Location;
pub use mask::ConnectionMask;
pub use node::NetworkNode;

use thiserror::Error;

/// Number of faces per block (invariant: always 6)
pub const FACE_COUNT: usize = 6;

/// Errors raised while decoding topology values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A packed connection mask used bits beyond the six faces.
    #[error("invalid connection mask {0:#010b}: only the low six bits are faces")]
    InvalidMask(u8),
}

// Compile-time assertion that every face fits in a mask byte
const _: () = assert!(FACE_COUNT <= u8::BITS as usize);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn direction() -> impl Strategy<Value = Direction> {
        prop::sample::select(Direction::ALL.to_vec())
    }

    #[test]
    fn face_count_invariant() {
        assert_eq!(Direction::ALL.len(), FACE_COUNT);
        assert_eq!(ConnectionMask::ALL.len(), FACE_COUNT);
    }

    proptest! {
        #[test]
        fn connects_to_is_symmetric(
            x in -8i32..8, y in -8i32..8, z in -8i32..8,
            dir in direction(),
            a_bits in 0u8..64, b_bits in 0u8..64,
        ) {
            let a = NetworkNode::new(Location::new(x, y, z), ConnectionMask::from_bits_truncate(a_bits));
            let b = NetworkNode::new(a.location.step(dir), ConnectionMask::from_bits_truncate(b_bits));
            prop_assert_eq!(a.connects_to(&b), b.connects_to(&a));
        }

        #[test]
        fn mask_bits_round_trip(bits in 0u8..64) {
            let mask = ConnectionMask::from_bits(bits).unwrap();
            prop_assert_eq!(ConnectionMask::from_directions(mask.directions()), mask);
        }
    }
}
