use lattice_topology::ConnectionMask;
use serde::{Deserialize, Serialize};

use crate::decay::DecayTimer;
use crate::network::NetworkKey;

/// One placed research pipe segment.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    pub(crate) connections: ConnectionMask,
    /// Last network this segment was resolved into. Not trusted until
    /// checked against the registry.
    pub(crate) net: Option<NetworkKey>,
    pub(crate) timer: DecayTimer,
    pub(crate) unsaved: bool,
}

impl Segment {
    pub fn connections(&self) -> ConnectionMask {
        self.connections
    }

    pub fn cached_network(&self) -> Option<NetworkKey> {
        self.net
    }

    pub fn timer(&self) -> &DecayTimer {
        &self.timer
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_active()
    }

    pub fn snapshot(&self) -> SegmentSnapshot {
        SegmentSnapshot {
            active: self.is_active(),
        }
    }
}

/// Durable per-segment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SegmentSnapshot {
    pub active: bool,
}
