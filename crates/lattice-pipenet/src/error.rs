//! Error types for lattice-pipenet.

use lattice_topology::BlockPos;
use thiserror::Error;

/// Result type for lattice-pipenet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Host-side mistakes and config I/O.
///
/// Topology inconsistencies and capped connections are not errors: the
/// first is repaired by a rebuild, the second is a `Rejected` outcome.
#[derive(Debug, Error)]
pub enum Error {
    /// The block already holds a segment or an endpoint.
    #[error("block {pos} is occupied")]
    Occupied { pos: BlockPos },

    #[error("no segment at {pos}")]
    NoSegment { pos: BlockPos },

    #[error("no endpoint at {pos}")]
    NoEndpoint { pos: BlockPos },

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
