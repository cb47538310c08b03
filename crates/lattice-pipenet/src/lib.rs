//! Lattice Research Pipe Networks
//!
//! Physical connectivity for the research planes.
//!
//! # Layers
//!
//! - [`PipeNet`]: segments, endpoints and the networks they form, with
//!   admission control on connections and lazily rebuilt networks held in a
//!   generational arena.
//! - [`ResearchGrid`]: one tier's providers and per-facing handlers on top of
//!   a `PipeNet`. Implements [`lattice_plane::Reach`] so any provider can
//!   bridge through pipes.
//! - [`DecayTimer`] / [`DecayScheduler`]: self-expiring active flags,
//!   advanced by an explicit per-tick pump.
//! - [`Planes`]: all nine tier grids.
//!
//! # Example
//!
//! ```
//! use lattice_pipenet::ResearchGrid;
//! use lattice_plane::Go;
//! use lattice_topology::{BlockPos, Facing};
//!
//! let mut grid = ResearchGrid::<Go>::default();
//! let a = BlockPos::new(0, 0, 0);
//! let b = BlockPos::new(1, 0, 0);
//! grid.add_segment(a).unwrap();
//! grid.add_segment(b).unwrap();
//! grid.set_connection(a, Facing::East, true).unwrap();
//!
//! grid.attach_source(BlockPos::new(-1, 0, 0), 64).unwrap();
//! grid.set_connection(a, Facing::West, true).unwrap();
//!
//! assert_eq!(grid.max_at(b, Some(Facing::East)), 64);
//! ```

pub mod config;
mod decay;
pub mod error;
pub mod events;
mod grid;
mod handler;
mod network;
mod pipenet;
mod planes;
mod segment;

pub use config::{GridConfig, Side};
pub use decay::{DecayScheduler, DecayStep, DecayTimer};
pub use error::{Error, Result};
pub use events::GridEvent;
pub use grid::ResearchGrid;
pub use handler::{Capability, InertHandler, NetHandler};
pub use network::{Attachment, Network, NetworkKey};
pub use pipenet::{ConnectOutcome, PipeNet};
pub use planes::{HasGrid, Planes};
pub use segment::{Segment, SegmentSnapshot};
