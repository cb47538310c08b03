//! Lattice Block Topology
//!
//! Integer block grid on which research pipe segments and the structures they
//! serve are placed.
//!
//! # Geometry
//!
//! Every block has exactly 6 faces, enumerated in a fixed order:
//! down, up, north, south, west, east. That order is the canonical neighbour
//! visitation order for everything built on top of this crate, so results
//! never depend on hash-table iteration.
//!
//! # Connection Cap
//!
//! A research pipe segment may hold at most [`MAX_SEGMENT_CONNECTIONS`] open
//! faces. Networks of segments are therefore lines (with endpoints attached
//! at the ends), never meshes.

mod facing;
mod mask;
mod pos;

pub use facing::Facing;
pub use mask::ConnectionMask;
pub use pos::BlockPos;

/// Number of faces on a block.
pub const FACES: usize = 6;

/// Maximum number of open faces on a research pipe segment.
pub const MAX_SEGMENT_CONNECTIONS: usize = 2;

const _: () = assert!(MAX_SEGMENT_CONNECTIONS <= FACES);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_fits_in_a_block() {
        assert!(MAX_SEGMENT_CONNECTIONS <= FACES);
        assert_eq!(Facing::ALL.len(), FACES);
    }
}
