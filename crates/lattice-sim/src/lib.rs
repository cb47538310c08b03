//! Lattice Scenario Runner
//!
//! Drives one tier of a [`Planes`] set tick by tick: a producer at one end
//! of a pipe chain, a research job drawing from the other end.
//!
//! ```text
//!   producer ─ seg ═ seg ═ ... ═ seg ─ job
//!   (-1,0,0)   (0)   (1)        (n-1)
//! ```

pub mod error;

use std::path::Path;

use lattice_pipenet::{GridConfig, HasGrid, Planes, ResearchGrid};
use lattice_plane::{
    Co, ComponentKind, ComputationArray, Cw, Go, JobTick, Op, ResearchJob, Rw, Sca, Sch, Sdi,
    Sp, Tier, TierKind,
};
use lattice_topology::{BlockPos, Facing};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use error::{Error, Result};

/// What to simulate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub grid: GridConfig,

    /// Tier symbol, e.g. `"GO"`.
    pub tier: String,

    /// Segments between producer and consumer.
    pub chain_length: u32,

    /// Per-tick capacity of a plain producer. Ignored when `components`
    /// is non-empty.
    pub source_capacity: u32,

    /// Build the producer as a computation array from these components.
    pub components: Vec<ComponentKind>,

    /// Units the job asks for per tick.
    pub demand_per_tick: u32,

    pub job_size: u64,

    /// Give up after this many ticks.
    pub max_ticks: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            tier: TierKind::Rw.symbol().to_string(),
            chain_length: 8,
            source_capacity: 256,
            components: Vec::new(),
            demand_per_tick: 64,
            job_size: 1_000,
            max_ticks: 100,
        }
    }
}

impl ScenarioConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub tier: TierKind,
    pub ticks: u64,
    pub progress: u64,
    pub completed: bool,
    pub starved_ticks: u64,
    pub networks: usize,
    pub events: usize,
}

/// A configured run.
#[derive(Debug, Clone)]
pub struct Scenario {
    config: ScenarioConfig,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Build the grid on the configured tier and run until the job
    /// completes or the tick budget runs out.
    pub fn run(&self) -> Result<ScenarioReport> {
        let tier: TierKind = self.config.tier.parse()?;
        let mut planes = Planes::new(self.config.grid.clone());
        match tier {
            TierKind::Cw => self.run_on::<Cw>(&mut planes),
            TierKind::Rw => self.run_on::<Rw>(&mut planes),
            TierKind::Go => self.run_on::<Go>(&mut planes),
            TierKind::Op => self.run_on::<Op>(&mut planes),
            TierKind::Sp => self.run_on::<Sp>(&mut planes),
            TierKind::Co => self.run_on::<Co>(&mut planes),
            TierKind::Sca => self.run_on::<Sca>(&mut planes),
            TierKind::Sch => self.run_on::<Sch>(&mut planes),
            TierKind::Sdi => self.run_on::<Sdi>(&mut planes),
        }
    }

    fn run_on<T: Tier>(&self, planes: &mut Planes) -> Result<ScenarioReport>
    where
        Planes: HasGrid<T>,
    {
        let end = self.build(planes.grid_mut::<T>())?;
        let mut job = ResearchJob::new(self.config.demand_per_tick, self.config.job_size);
        let mut starved_ticks = 0;
        let mut ticks = 0;
        let mut events = 0;

        while ticks < self.config.max_ticks && !job.is_complete() {
            planes.begin_tick();
            let grid = planes.grid_mut::<T>();
            let outcome = job.tick(|amount, simulate| {
                grid.request_at(end, Some(Facing::East), amount, simulate)
            });
            planes.pump();
            ticks += 1;

            match outcome {
                JobTick::Starved => starved_ticks += 1,
                JobTick::Completed { delivered } => {
                    info!(tier = %T::KIND, tick = ticks, delivered, "job completed");
                }
                JobTick::Progressed { requested, delivered } => {
                    debug!(tier = %T::KIND, tick = ticks, requested, delivered, "job progressed");
                }
                JobTick::Idle => {}
            }
            events += planes.drain_events().len();
        }

        let grid: &ResearchGrid<T> = planes.grid::<T>();
        Ok(ScenarioReport {
            tier: T::KIND,
            ticks,
            progress: job.progress(),
            completed: job.is_complete(),
            starved_ticks,
            networks: grid.net().network_count(),
            events,
        })
    }

    /// Place producer, chain and connections. Returns the consumer-side
    /// segment.
    fn build<T: Tier>(&self, grid: &mut ResearchGrid<T>) -> Result<BlockPos> {
        let length = i64::from(self.config.chain_length.max(1));
        for x in 0..length {
            grid.add_segment(BlockPos::new(x, 0, 0))?;
        }
        for x in 0..length - 1 {
            grid.set_connection(BlockPos::new(x, 0, 0), Facing::East, true)?;
        }

        let producer = BlockPos::new(-1, 0, 0);
        if self.config.components.is_empty() {
            grid.attach_source(producer, self.config.source_capacity)?;
        } else {
            let components = self.config.components.clone();
            grid.attach(producer, |id| ComputationArray::<T>::new(id, components))?;
        }
        grid.set_connection(BlockPos::ORIGIN, Facing::West, true)?;

        let end = BlockPos::new(length - 1, 0, 0);
        info!(tier = %T::KIND, length, %end, "scenario built");
        Ok(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_plane::COMPUTATION_UNITS;

    #[test]
    fn default_scenario_completes() {
        let report = Scenario::new(ScenarioConfig::default()).run().unwrap();
        assert_eq!(report.tier, TierKind::Rw);
        assert!(report.completed);
        // 1000 units at 64 per tick
        assert_eq!(report.ticks, 16);
        assert_eq!(report.progress, 1_000);
        assert_eq!(report.starved_ticks, 0);
        assert_eq!(report.networks, 1);
    }

    #[test]
    fn empty_producer_starves() {
        let config = ScenarioConfig {
            source_capacity: 0,
            max_ticks: 5,
            ..Default::default()
        };
        let report = Scenario::new(config).run().unwrap();
        assert!(!report.completed);
        assert_eq!(report.starved_ticks, 5);
        assert_eq!(report.progress, 0);
    }

    #[test]
    fn computation_array_limits_rate() {
        let config = ScenarioConfig {
            tier: "sca".into(),
            components: vec![ComponentKind::Computation, ComponentKind::Empty],
            demand_per_tick: 1_000,
            job_size: 3 * u64::from(COMPUTATION_UNITS),
            ..Default::default()
        };
        let report = Scenario::new(config).run().unwrap();
        assert_eq!(report.tier, TierKind::Sca);
        assert_eq!(report.ticks, 3);
        assert!(report.completed);
    }

    #[test]
    fn unknown_tier_is_an_error() {
        let config = ScenarioConfig {
            tier: "XX".into(),
            ..Default::default()
        };
        assert!(matches!(
            Scenario::new(config).run(),
            Err(Error::Plane(lattice_plane::Error::UnknownTier(_)))
        ));
    }

    #[test]
    fn config_from_partial_json() {
        let config = ScenarioConfig::from_json(r#"{"tier": "GO", "chain_length": 3}"#).unwrap();
        assert_eq!(config.tier, "GO");
        assert_eq!(config.chain_length, 3);
        assert_eq!(config.job_size, 1_000);
    }
}
