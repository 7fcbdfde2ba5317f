//! Graph vertices: a location plus the faces it bonds through.

use crate::{ConnectionMask, Direction, Location};

/// A conduit placed in the world.
///
/// Two nodes are equal only if both the location and the mask match, so a
/// single block may host several independent nodes (for example two cables
/// crossing at right angles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkNode {
    pub location: Location,
    pub connections: ConnectionMask,
}

impl NetworkNode {
    pub const fn new(location: Location, connections: ConnectionMask) -> Self {
        Self {
            location,
            connections,
        }
    }

    /// Node bonding through the given faces.
    pub fn with_directions<I>(location: Location, directions: I) -> Self
    where
        I: IntoIterator<Item = Direction>,
    {
        Self::new(location, ConnectionMask::from_directions(directions))
    }

    /// True if the nodes sit one face apart and both face each other.
    pub fn connects_to(&self, other: &Self) -> bool {
        match self.location.direction_to(&other.location) {
            Some(dir) => {
                self.connections.has_direction(dir)
                    && other.connections.has_direction(dir.opposite())
            }
            None => false,
        }
    }

    /// Locations this node reaches out to through its mask.
    pub fn facing_locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.connections.directions().map(|d| self.location.step(d))
    }
}

impl std::fmt::Display for NetworkNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.location, self.connections)
    }
}
