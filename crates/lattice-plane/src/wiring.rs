//! Direct adjacency between providers.
//!
//! [`Wiring`] is the simplest [`Reach`]: every provider lists its links in
//! the order they were made. It is enough for machines that touch each other
//! directly and for exercising the traversal in isolation from any network.

use std::collections::BTreeMap;

use tracing::debug;

use crate::provider::{Reach, ResearchProvider};
use crate::seen::{NodeId, NodeIds};
use crate::tier::Tier;

/// An owned set of providers on tier `T` and the links between them.
pub struct Wiring<T: Tier> {
    ids: NodeIds,
    nodes: BTreeMap<NodeId, Box<dyn ResearchProvider<T>>>,
    links: BTreeMap<NodeId, Vec<NodeId>>,
}

impl<T: Tier> Wiring<T> {
    pub fn new() -> Self {
        Self {
            ids: NodeIds::new(),
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    /// Add a provider built around a freshly allocated id.
    pub fn add<P, F>(&mut self, build: F) -> NodeId
    where
        P: ResearchProvider<T> + 'static,
        F: FnOnce(NodeId) -> P,
    {
        let id = self.ids.next_id();
        let provider = build(id);
        debug_assert_eq!(provider.node_id(), id);
        self.nodes.insert(id, Box::new(provider));
        self.links.insert(id, Vec::new());
        id
    }

    /// Remove a provider and every link touching it.
    pub fn remove(&mut self, id: NodeId) -> Option<Box<dyn ResearchProvider<T>>> {
        let removed = self.nodes.remove(&id)?;
        if let Some(peers) = self.links.remove(&id) {
            for peer in peers {
                if let Some(list) = self.links.get_mut(&peer) {
                    list.retain(|n| *n != id);
                }
            }
        }
        Some(removed)
    }

    /// Link two providers in both directions. Returns `false` if either is
    /// unknown, they are the same node, or the link already exists.
    pub fn link(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b || !self.nodes.contains_key(&a) || !self.nodes.contains_key(&b) {
            return false;
        }
        if self.links.get(&a).is_some_and(|l| l.contains(&b)) {
            return false;
        }
        self.links.entry(a).or_default().push(b);
        self.links.entry(b).or_default().push(a);
        debug!(tier = %T::KIND, %a, %b, "linked");
        true
    }

    pub fn unlink(&mut self, a: NodeId, b: NodeId) -> bool {
        let mut removed = false;
        if let Some(list) = self.links.get_mut(&a) {
            let before = list.len();
            list.retain(|n| *n != b);
            removed = list.len() != before;
        }
        if let Some(list) = self.links.get_mut(&b) {
            list.retain(|n| *n != a);
        }
        removed
    }

    pub fn get(&self, id: NodeId) -> Option<&dyn ResearchProvider<T>> {
        self.nodes.get(&id).map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max(&self, id: NodeId) -> u32 {
        self.get(id).map_or(0, |p| p.max(self))
    }

    pub fn request(&self, id: NodeId, amount: u32, simulate: bool) -> u32 {
        self.get(id).map_or(0, |p| p.request(self, amount, simulate))
    }

    pub fn can_bridge(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|p| p.can_bridge(self))
    }

    /// Start a new tick on every provider.
    pub fn reset_tick(&self) {
        for provider in self.nodes.values() {
            provider.reset_tick();
        }
    }
}

impl<T: Tier> Default for Wiring<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tier> Reach<T> for Wiring<T> {
    fn neighbors(&self, node: NodeId) -> Vec<&dyn ResearchProvider<T>> {
        self.links
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|id| self.get(*id))
            .collect()
    }
}
