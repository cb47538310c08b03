//! The research provider contract.
//!
//! # Entry Points
//!
//! Every operation comes in two forms:
//!
//! - `max` / `request` / `can_bridge` start a new traversal. They allocate a
//!   fresh [`Seen`] guard and delegate to the explicit form.
//! - `max_with` / `request_with` / `can_bridge_with` continue an existing
//!   traversal. Recursive calls always use these and pass the caller's guard.
//!
//! # Guard Protocol
//!
//! An implementation enters itself into the guard before doing anything
//! else. If it was already present, it returns the identity result
//! (0 units, `false`) without touching its neighbours.
//!
//! # Bridging
//!
//! A bridging node owns no supply. Its `max` is the sum over its unseen
//! neighbours and its `request` allocates greedily across them in the order
//! [`Reach::neighbors`] returns them. [`bridged_max`], [`bridged_request`] and
//! [`bridged_can_bridge`] implement that once for every bridging node.

use tracing::trace;

use crate::seen::{NodeId, Seen};
use crate::tier::Tier;

/// Resolves a node's neighbours on one tier.
pub trait Reach<T: Tier> {
    /// Providers one hop from `node`, in a fixed order that does not depend
    /// on traversal history.
    fn neighbors(&self, node: NodeId) -> Vec<&dyn ResearchProvider<T>>;
}

/// A reach with no edges, for providers that never forward.
#[derive(Debug, Clone, Copy, Default)]
pub struct Isolated;

impl<T: Tier> Reach<T> for Isolated {
    fn neighbors(&self, _node: NodeId) -> Vec<&dyn ResearchProvider<T>> {
        Vec::new()
    }
}

/// Capability contract of a node on tier `T`.
pub trait ResearchProvider<T: Tier> {
    /// Identity used by the traversal guard.
    fn node_id(&self) -> NodeId;

    /// Most this node (and what it bridges to) can deliver this tick.
    fn max_with(&self, reach: &dyn Reach<T>, seen: &mut Seen<T>) -> u32;

    /// Reserve up to `amount`. With `simulate` nothing is mutated.
    fn request_with(
        &self,
        reach: &dyn Reach<T>,
        amount: u32,
        simulate: bool,
        seen: &mut Seen<T>,
    ) -> u32;

    /// Whether this node forwards to other nodes rather than producing.
    fn can_bridge_with(&self, reach: &dyn Reach<T>, seen: &mut Seen<T>) -> bool;

    /// Restore full per-tick availability.
    fn reset_tick(&self) {}

    fn max(&self, reach: &dyn Reach<T>) -> u32 {
        self.max_with(reach, &mut Seen::new())
    }

    fn request(&self, reach: &dyn Reach<T>, amount: u32, simulate: bool) -> u32 {
        self.request_with(reach, amount, simulate, &mut Seen::new())
    }

    fn can_bridge(&self, reach: &dyn Reach<T>) -> bool {
        self.can_bridge_with(reach, &mut Seen::new())
    }
}

/// Sum of `max_with` over neighbours not yet in `seen`.
pub fn bridged_max<T: Tier>(
    reach: &dyn Reach<T>,
    neighbors: &[&dyn ResearchProvider<T>],
    seen: &mut Seen<T>,
) -> u32 {
    let mut total = 0u32;
    for provider in neighbors {
        if seen.contains(provider.node_id()) {
            continue;
        }
        total = total.saturating_add(provider.max_with(reach, seen));
    }
    total
}

/// Greedy allocation of `amount` across neighbours not yet in `seen`.
///
/// Never returns more than `amount`.
pub fn bridged_request<T: Tier>(
    reach: &dyn Reach<T>,
    neighbors: &[&dyn ResearchProvider<T>],
    amount: u32,
    simulate: bool,
    seen: &mut Seen<T>,
) -> u32 {
    let mut allocated = 0u32;
    for provider in neighbors {
        if allocated >= amount {
            break;
        }
        if seen.contains(provider.node_id()) {
            continue;
        }
        let granted = provider.request_with(reach, amount - allocated, simulate, seen);
        trace!(
            tier = %T::KIND,
            node = %provider.node_id(),
            granted,
            simulate,
            "bridged request"
        );
        allocated = allocated.saturating_add(granted);
    }
    allocated.min(amount)
}

/// A bridge is transparent: it reports bridging if any unseen neighbour
/// does, or if there is nothing behind it to ask.
pub fn bridged_can_bridge<T: Tier>(
    reach: &dyn Reach<T>,
    neighbors: &[&dyn ResearchProvider<T>],
    seen: &mut Seen<T>,
) -> bool {
    let mut asked = false;
    for provider in neighbors {
        if seen.contains(provider.node_id()) {
            continue;
        }
        asked = true;
        if provider.can_bridge_with(reach, seen) {
            return true;
        }
    }
    !asked
}
