//! Grid configuration.

use lattice_topology::MAX_SEGMENT_CONNECTIONS;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which copy of the world a grid belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Owns the real networks and enforces admission.
    #[default]
    Authoritative,
    /// Read-only view. Capability queries get inert handlers and no
    /// network is ever resolved.
    Observer,
}

impl Side {
    pub fn is_authoritative(self) -> bool {
        self == Self::Authoritative
    }
}

/// Configuration for a [`ResearchGrid`](crate::ResearchGrid).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Open faces allowed per segment.
    pub max_connections: usize,

    pub side: Side,

    /// Ticks a segment stays active after relaying units, and after its
    /// active flag is restored from a snapshot.
    pub relay_active_ticks: u32,

    /// Undrained events kept before the oldest are dropped. Zero disables
    /// event recording.
    pub event_capacity: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_connections: MAX_SEGMENT_CONNECTIONS,
            side: Side::Authoritative,
            relay_active_ticks: 100,
            event_capacity: 4096,
        }
    }
}

impl GridConfig {
    /// Config for a read-only observer grid.
    #[must_use]
    pub fn observer() -> Self {
        Self {
            side: Side::Observer,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Set how long relaying keeps a segment active.
    #[must_use]
    pub fn with_relay_active_ticks(mut self, ticks: u32) -> Self {
        self.relay_active_ticks = ticks;
        self
    }

    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
