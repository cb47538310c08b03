//! Error types for lattice-sim.

use thiserror::Error;

/// Result type for scenario runs.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scenario parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The grid refused a placement.
    #[error("grid error: {0}")]
    Grid(#[from] lattice_pipenet::Error),

    #[error("plane error: {0}")]
    Plane(#[from] lattice_plane::Error),
}
