//! Grid events for observers.

use std::collections::VecDeque;

use lattice_topology::{BlockPos, Facing};
use serde::{Deserialize, Serialize};

/// State changes emitted by a grid, stamped with the tick they happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GridEvent {
    /// A network was built from scratch
    NetworkBuilt {
        network: u64,
        root: BlockPos,
        members: usize,
        tick: u64,
    },

    /// A network was torn down after a topology change
    NetworkInvalidated {
        network: u64,
        members: usize,
        tick: u64,
    },

    /// A segment's handlers were rebuilt against a new network
    HandlersRebuilt {
        pos: BlockPos,
        network: u64,
        tick: u64,
    },

    /// A connection was refused by the admission cap
    ConnectionRejected {
        pos: BlockPos,
        facing: Facing,
        tick: u64,
    },

    /// A segment's active flag flipped
    ActiveChanged {
        pos: BlockPos,
        active: bool,
        tick: u64,
    },

    /// A segment was swapped for a fresh one
    SegmentReplaced {
        pos: BlockPos,
        inherited: bool,
        tick: u64,
    },
}

impl GridEvent {
    /// Tick this event happened in.
    pub fn tick(&self) -> u64 {
        match self {
            Self::NetworkBuilt { tick, .. }
            | Self::NetworkInvalidated { tick, .. }
            | Self::HandlersRebuilt { tick, .. }
            | Self::ConnectionRejected { tick, .. }
            | Self::ActiveChanged { tick, .. }
            | Self::SegmentReplaced { tick, .. } => *tick,
        }
    }
}

/// Buffer of events not yet drained by the host. Holds at most
/// `capacity` events; the oldest are dropped first.
#[derive(Debug)]
pub(crate) struct EventLog {
    tick: u64,
    capacity: usize,
    dropped: u64,
    events: VecDeque<GridEvent>,
}

impl EventLog {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            tick: 0,
            capacity,
            dropped: 0,
            events: VecDeque::new(),
        }
    }

    pub(crate) fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn advance(&mut self) {
        self.tick += 1;
    }

    /// Events discarded because the buffer was full.
    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }

    pub(crate) fn push(&mut self, event: GridEvent) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub(crate) fn drain(&mut self) -> Vec<GridEvent> {
        self.events.drain(..).collect()
    }
}
