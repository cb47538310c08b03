//! Lattice Research Planes
//!
//! Nine independent research tiers, each a graph of providers that can be
//! asked three questions: how much could you deliver, deliver this much,
//! and are you a bridge.
//!
//! # Architecture
//!
//! ```text
//!   ResearchProvider<T>      node contract (source, relay, array, handler)
//!          │ neighbors()
//!   Reach<T>                 who is one hop away (Wiring, or a pipe grid)
//!          │ enter()
//!   Seen<T>                  per-request guard; every node answers once
//! ```
//!
//! The tier parameter `T` is a zero-sized marker, so a guard or provider of
//! one tier cannot be passed where another is expected.
//!
//! # Guarantees
//!
//! - Every traversal terminates, including through cycles of bridges.
//! - A request never returns more than it asked for, nor more than `max`.
//! - Simulated requests mutate nothing.
//! - Neighbour order is fixed, so allocation is reproducible.

pub mod error;
mod job;
mod provider;
mod record;
mod relay;
mod seen;
mod source;
mod tier;
mod wiring;

pub use error::{Error, Result};
pub use job::{JobTick, ResearchJob};
pub use provider::{
    bridged_can_bridge, bridged_max, bridged_request, Isolated, Reach, ResearchProvider,
};
pub use record::{DataItem, ResearchRecord};
pub use relay::ResearchRelay;
pub use seen::{NodeId, NodeIds, Seen};
pub use source::{
    Component, ComponentKind, ComputationArray, ResearchSource, ADVANCED_COMPUTATION_UNITS,
    COMPUTATION_UNITS,
};
pub use tier::{Co, Cw, Go, Op, Rw, Sca, Sch, Sdi, Sp, Tier, TierKind, TIER_COUNT};
pub use wiring::Wiring;
