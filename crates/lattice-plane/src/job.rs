//! Consumer-side bookkeeping for a research job.

use serde::{Deserialize, Serialize};

/// What one tick of a [`ResearchJob`] achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobTick {
    /// Nothing was offered; no commit was attempted.
    Starved,
    Progressed { requested: u32, delivered: u32 },
    /// The job finished this tick.
    Completed { delivered: u32 },
    /// The job had already finished before this tick.
    Idle,
}

/// A consumer that needs `total` units, drawing at most `per_tick` per tick.
///
/// Each tick simulates first and commits only what was offered, so a
/// partially available supply is still consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchJob {
    per_tick: u32,
    total: u64,
    progress: u64,
}

impl ResearchJob {
    pub fn new(per_tick: u32, total: u64) -> Self {
        Self {
            per_tick,
            total,
            progress: 0,
        }
    }

    pub fn progress(&self) -> u64 {
        self.progress
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.total
    }

    /// Units still wanted this tick.
    pub fn demand(&self) -> u32 {
        let left = self.total.saturating_sub(self.progress);
        u32::try_from(left).map_or(self.per_tick, |left| left.min(self.per_tick))
    }

    /// Run one tick against `request(amount, simulate) -> delivered`.
    pub fn tick(&mut self, mut request: impl FnMut(u32, bool) -> u32) -> JobTick {
        if self.is_complete() {
            return JobTick::Idle;
        }
        let wanted = self.demand();
        let offered = request(wanted, true).min(wanted);
        if offered == 0 {
            return JobTick::Starved;
        }
        let delivered = request(offered, false).min(offered);
        self.progress += u64::from(delivered);
        if self.is_complete() {
            JobTick::Completed { delivered }
        } else {
            JobTick::Progressed {
                requested: wanted,
                delivered,
            }
        }
    }
}
