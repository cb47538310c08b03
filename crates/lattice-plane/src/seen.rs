//! Traversal guard.
//!
//! One [`Seen`] set lives for exactly one logical request. It only ever
//! grows while that request runs, which bounds recursion depth by the number
//! of distinct reachable nodes and guarantees termination through bridges
//! and cycles.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::tier::{Tier, TierKind};

/// Identity of a plane node within one tier's graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Reserved id for nodes that never take part in a traversal.
    pub const NONE: Self = Self(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic node id allocator. Never hands out [`NodeId::NONE`].
#[derive(Debug, Clone)]
pub struct NodeIds {
    next: u64,
}

impl NodeIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocator whose ids live in a range reserved for `tier`, so an id
    /// handed out on one tier never names a node on another.
    pub fn for_tier(tier: TierKind) -> Self {
        Self {
            next: ((tier.rank() as u64) << Self::TIER_SHIFT) | 1,
        }
    }

    const TIER_SHIFT: u32 = 56;

    /// Allocate the next unused id.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

impl Default for NodeIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Nodes already visited by the current traversal of tier `T`.
#[derive(Clone)]
pub struct Seen<T: Tier> {
    visited: HashSet<NodeId>,
    _tier: PhantomData<T>,
}

impl<T: Tier> Seen<T> {
    /// Fresh guard for a new top-level traversal.
    pub fn new() -> Self {
        Self {
            visited: HashSet::new(),
            _tier: PhantomData,
        }
    }

    /// Record a visit. Returns `false` if the node was already visited, in
    /// which case the caller must return its identity result.
    #[must_use]
    pub fn enter(&mut self, node: NodeId) -> bool {
        self.visited.insert(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.visited.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    /// Visited nodes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.visited.iter().copied()
    }
}

impl<T: Tier> Default for Seen<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tier> fmt::Debug for Seen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.visited.iter().collect();
        ids.sort();
        f.debug_struct("Seen")
            .field("tier", &T::KIND)
            .field("visited", &ids)
            .finish()
    }
}
