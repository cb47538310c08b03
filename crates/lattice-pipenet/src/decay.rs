//! Self-expiring active flags.
//!
//! ```text
//!            activate(d)              advance() x d
//!  Inactive ────────────► Active ─────────────────► Inactive
//!      ▲                    │
//!      └──── deactivate() ──┘
//! ```
//!
//! Timers do not schedule themselves. A [`DecayScheduler`] holds the set of
//! positions whose timers are active, and the host pumps it once per tick.

use std::collections::BTreeSet;

use lattice_topology::BlockPos;
use serde::{Deserialize, Serialize};

/// Result of advancing a timer by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayStep {
    /// The timer was not active.
    Idle,
    Running,
    /// The timer reached its duration and is now inactive.
    Expired,
}

/// `{active, elapsed, duration}` for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecayTimer {
    active: bool,
    elapsed: u32,
    duration: u32,
}

impl DecayTimer {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Start the timer. A zero duration counts as one tick.
    ///
    /// Returns `false`, changing nothing, if already active.
    pub fn activate(&mut self, duration: u32) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.elapsed = 0;
        self.duration = duration.max(1);
        true
    }

    /// Stop the timer. Returns `false` if it was already inactive.
    pub fn deactivate(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.elapsed = 0;
        true
    }

    pub fn advance(&mut self) -> DecayStep {
        if !self.active {
            return DecayStep::Idle;
        }
        self.elapsed += 1;
        if self.elapsed >= self.duration {
            self.elapsed = 0;
            self.active = false;
            DecayStep::Expired
        } else {
            DecayStep::Running
        }
    }
}

/// Positions whose timers are advanced by the next pump.
#[derive(Debug, Clone, Default)]
pub struct DecayScheduler {
    registered: BTreeSet<BlockPos>,
}

impl DecayScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pos: BlockPos) -> bool {
        self.registered.insert(pos)
    }

    pub fn deregister(&mut self, pos: BlockPos) -> bool {
        self.registered.remove(&pos)
    }

    pub fn is_registered(&self, pos: BlockPos) -> bool {
        self.registered.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Positions due this pump, in position order. Taken as a copy so the
    /// set can change while they are advanced.
    pub fn due(&self) -> Vec<BlockPos> {
        self.registered.iter().copied().collect()
    }
}
