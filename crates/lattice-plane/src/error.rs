//! Error types for lattice-plane.

use thiserror::Error;

/// Result type for lattice-plane operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside the request path.
///
/// Requests themselves never fail: shortfall is a smaller number, not an error.
#[derive(Debug, Error)]
pub enum Error {
    /// A tier symbol did not match any known tier.
    #[error("unknown tier symbol: {0}")]
    UnknownTier(String),

    /// A research identifier must not be empty.
    #[error("research identifier is empty")]
    EmptyResearchId,

    /// Snapshot (de)serialization failed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}
