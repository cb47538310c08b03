//! One tier's research grid.
//!
//! # Structure
//!
//! ```text
//!   endpoint ──face── segment ═══ segment ═══ segment ──face── endpoint
//!   (provider)        handlers                handlers        (provider)
//! ```
//!
//! A [`ResearchGrid`] owns a [`PipeNet`], the endpoint providers attached to
//! it and the handler sets of its segments. It implements [`Reach`]:
//!
//! - an endpoint's neighbours are the handlers of adjacent segments whose
//!   face points at it, in [`Facing::ALL`] order;
//! - a handler's neighbours are the endpoints attached to its network in
//!   attachment order, minus the endpoint across its own face.
//!
//! # Settling
//!
//! Topology notifications only invalidate. Before any capability query or
//! request the grid settles: every position the net marked stale is
//! resolved and its handlers are checked against the resolved network.
//! Handler sets bound to a different network are rebuilt whole.

use std::collections::{BTreeSet, HashMap};

use lattice_plane::{
    NodeId, NodeIds, Reach, ResearchProvider, ResearchRelay, ResearchSource, Seen, Tier,
};
use lattice_topology::{BlockPos, Facing};
use tracing::{debug, trace};

use crate::config::GridConfig;
use crate::error::{Error, Result};
use crate::events::GridEvent;
use crate::handler::{Capability, HandlerSet, InertHandler};
use crate::network::NetworkKey;
use crate::pipenet::{ConnectOutcome, PipeNet};
use crate::segment::{Segment, SegmentSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    Endpoint(BlockPos),
    Handler {
        pos: BlockPos,
        facing: Option<Facing>,
    },
}

/// Segments, endpoints and handlers of tier `T`.
pub struct ResearchGrid<T: Tier> {
    config: GridConfig,
    net: PipeNet,
    ids: NodeIds,
    providers: HashMap<NodeId, Box<dyn ResearchProvider<T>>>,
    handlers: HashMap<BlockPos, HandlerSet<T>>,
    sites: HashMap<NodeId, Site>,
}

impl<T: Tier> ResearchGrid<T> {
    pub fn new(config: GridConfig) -> Self {
        Self {
            net: PipeNet::new(&config),
            config,
            ids: NodeIds::for_tier(T::KIND),
            providers: HashMap::new(),
            handlers: HashMap::new(),
            sites: HashMap::new(),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn net(&self) -> &PipeNet {
        &self.net
    }

    // Topology notifications

    pub fn add_segment(&mut self, pos: BlockPos) -> Result<()> {
        self.net.add_segment(pos)
    }

    pub fn remove_segment(&mut self, pos: BlockPos) -> Result<Segment> {
        let segment = self.net.remove_segment(pos)?;
        self.drop_handlers(pos);
        Ok(segment)
    }

    /// Connect or disconnect a face, initiated at `pos`.
    pub fn set_connection(
        &mut self,
        pos: BlockPos,
        facing: Facing,
        connected: bool,
    ) -> Result<ConnectOutcome> {
        self.net.set_connection(pos, facing, connected, false)
    }

    /// Apply a connection already decided by the neighbour across `facing`.
    pub fn accept_connection(
        &mut self,
        pos: BlockPos,
        facing: Facing,
        connected: bool,
    ) -> Result<ConnectOutcome> {
        self.net.set_connection(pos, facing, connected, true)
    }

    /// Swap the segment at `pos` for a fresh one. Handlers are inherited
    /// and the fresh segment rebound to their network if the old segment
    /// had any, otherwise initialised.
    ///
    /// Returns whether handlers were inherited.
    pub fn replace_segment(&mut self, pos: BlockPos) -> Result<bool> {
        self.net.replace_segment(pos)?;
        let bound = self.handlers.get(&pos).map(HandlerSet::network);
        let inherited = bound.is_some();
        if let Some(key) = bound {
            self.net.rebind(pos, key);
            self.revalidate(pos);
        } else if let Some(key) = self.net.resolve(pos) {
            self.init_handlers(pos, key);
        }
        self.net.emit(GridEvent::SegmentReplaced {
            pos,
            inherited,
            tick: self.net.tick(),
        });
        Ok(inherited)
    }

    // Endpoints

    /// Attach a provider at `pos`, built around its freshly allocated id.
    pub fn attach<P, F>(&mut self, pos: BlockPos, build: F) -> Result<NodeId>
    where
        P: ResearchProvider<T> + 'static,
        F: FnOnce(NodeId) -> P,
    {
        let id = self.ids.next_id();
        self.net.attach_endpoint(pos, id)?;
        let provider = build(id);
        debug_assert_eq!(provider.node_id(), id);
        self.providers.insert(id, Box::new(provider));
        self.sites.insert(id, Site::Endpoint(pos));
        Ok(id)
    }

    pub fn attach_source(&mut self, pos: BlockPos, capacity: u32) -> Result<NodeId> {
        self.attach(pos, |id| ResearchSource::<T>::new(id, capacity))
    }

    pub fn attach_relay(&mut self, pos: BlockPos) -> Result<NodeId> {
        self.attach(pos, ResearchRelay::<T>::new)
    }

    pub fn detach(&mut self, pos: BlockPos) -> Result<Box<dyn ResearchProvider<T>>> {
        let id = self.net.detach_endpoint(pos)?;
        self.sites.remove(&id);
        self.providers.remove(&id).ok_or(Error::NoEndpoint { pos })
    }

    /// The endpoint provider with this id.
    pub fn provider(&self, id: NodeId) -> Option<&dyn ResearchProvider<T>> {
        self.providers.get(&id).map(|p| p.as_ref())
    }

    pub fn endpoint_at(&self, pos: BlockPos) -> Option<NodeId> {
        self.net.endpoint(pos)
    }

    // Capability queries

    /// The handler of the segment at `pos` for `facing` (or the default
    /// handler), bound to the segment's current network.
    ///
    /// Observers get an inert handler without touching the network.
    pub fn capability(&mut self, pos: BlockPos, facing: Option<Facing>) -> Option<Capability<T>> {
        self.net.segment(pos)?;
        if !self.config.side.is_authoritative() {
            return Some(Capability::Inert(InertHandler::new()));
        }
        self.settle();
        self.revalidate(pos);
        if !self.handlers.contains_key(&pos) {
            let key = self.net.resolve(pos)?;
            self.init_handlers(pos, key);
        }
        self.handlers
            .get(&pos)
            .map(|set| Capability::Net(*set.get(facing)))
    }

    pub fn max(&mut self, id: NodeId) -> u32 {
        self.settle();
        let grid: &Self = self;
        grid.node(id).map_or(0, |node| node.max(grid))
    }

    /// Request through the node `id`. A committed request that delivers
    /// anything activates every segment of the networks it passed through.
    pub fn request(&mut self, id: NodeId, amount: u32, simulate: bool) -> u32 {
        self.settle();
        let mut seen = Seen::new();
        let grid: &Self = self;
        let delivered = grid
            .node(id)
            .map_or(0, |node| node.request_with(grid, amount, simulate, &mut seen));
        if !simulate && delivered > 0 {
            self.activate_relayed(&seen);
        }
        delivered
    }

    pub fn can_bridge(&mut self, id: NodeId) -> bool {
        self.settle();
        let grid: &Self = self;
        grid.node(id).is_some_and(|node| node.can_bridge(grid))
    }

    /// `max` through the capability at `pos`/`facing`.
    pub fn max_at(&mut self, pos: BlockPos, facing: Option<Facing>) -> u32 {
        match self.capability(pos, facing) {
            Some(Capability::Net(handler)) => self.max(handler.node_id()),
            _ => 0,
        }
    }

    /// `request` through the capability at `pos`/`facing`.
    pub fn request_at(
        &mut self,
        pos: BlockPos,
        facing: Option<Facing>,
        amount: u32,
        simulate: bool,
    ) -> u32 {
        match self.capability(pos, facing) {
            Some(Capability::Net(handler)) => self.request(handler.node_id(), amount, simulate),
            _ => 0,
        }
    }

    // Ticks, decay, persistence

    /// Restore every provider's per-tick supply and advance the event tick.
    pub fn begin_tick(&mut self) {
        for provider in self.providers.values() {
            provider.reset_tick();
        }
        self.net.advance_tick();
    }

    pub fn tick(&self) -> u64 {
        self.net.tick()
    }

    pub fn pump(&mut self) -> usize {
        self.net.pump()
    }

    /// Set the active flag. Activation runs for `relay_active_ticks`.
    pub fn set_active(&mut self, pos: BlockPos, active: bool) -> Result<bool> {
        self.net
            .set_active(pos, active, self.config.relay_active_ticks)
    }

    pub fn is_active(&self, pos: BlockPos) -> bool {
        self.net.is_active(pos)
    }

    pub fn snapshot(&self, pos: BlockPos) -> Result<SegmentSnapshot> {
        self.net.snapshot(pos)
    }

    pub fn restore(&mut self, pos: BlockPos, snapshot: SegmentSnapshot) -> Result<()> {
        self.net
            .restore(pos, snapshot, self.config.relay_active_ticks)
    }

    pub fn take_unsaved(&mut self) -> Vec<BlockPos> {
        self.net.take_unsaved()
    }

    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        self.net.drain_events()
    }

    /// Bring handlers in line with every topology change since the last
    /// settle.
    pub fn settle(&mut self) {
        if !self.config.side.is_authoritative() {
            self.net.take_stale();
            return;
        }
        let stale = self.net.take_stale();
        if stale.is_empty() {
            return;
        }
        trace!(tier = %T::KIND, positions = stale.len(), "settling");

        let mut networks = BTreeSet::new();
        for pos in stale {
            if self.net.segment(pos).is_none() {
                self.drop_handlers(pos);
                continue;
            }
            self.revalidate(pos);
            if let Some(key) = self.net.resolve(pos) {
                networks.insert(key);
            }
        }

        // Segments facing an endpoint need handlers for the endpoint to
        // reach into the network.
        let attached: Vec<(BlockPos, NetworkKey)> = networks
            .into_iter()
            .filter_map(|key| self.net.network(key).map(|n| (key, n)))
            .flat_map(|(key, n)| n.attachments().iter().map(move |a| (a.segment, key)))
            .collect();
        for (pos, key) in attached {
            if !self.handlers.contains_key(&pos) {
                self.init_handlers(pos, key);
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&dyn ResearchProvider<T>> {
        match self.sites.get(&id)? {
            Site::Endpoint(_) => self.provider(id),
            Site::Handler { pos, facing } => {
                let handler = self.handlers.get(pos)?.get(*facing);
                (handler.node_id() == id).then_some(handler as &dyn ResearchProvider<T>)
            }
        }
    }

    /// Rebuild the handlers at `pos` if their network is no longer the
    /// segment's network, or drop them if it has none. No-op for segments
    /// that never initialised handlers.
    fn revalidate(&mut self, pos: BlockPos) {
        let Some(bound) = self.handlers.get(&pos).map(HandlerSet::network) else {
            return;
        };
        match self.net.resolve(pos) {
            Some(current) if current == bound => {}
            Some(current) => {
                self.drop_handlers(pos);
                self.init_handlers(pos, current);
            }
            None => self.drop_handlers(pos),
        }
    }

    fn init_handlers(&mut self, pos: BlockPos, key: NetworkKey) {
        debug_assert!(
            !self.handlers.contains_key(&pos),
            "handlers at {pos} initialised twice"
        );
        let set = HandlerSet::new(pos, key, &mut self.ids);
        for handler in set.handlers() {
            self.sites.insert(
                handler.node_id(),
                Site::Handler {
                    pos,
                    facing: handler.facing(),
                },
            );
        }
        self.handlers.insert(pos, set);
        debug!(tier = %T::KIND, %pos, network = key.as_u64(), "handlers built");
        self.net.emit(GridEvent::HandlersRebuilt {
            pos,
            network: key.as_u64(),
            tick: self.net.tick(),
        });
    }

    fn drop_handlers(&mut self, pos: BlockPos) {
        if let Some(set) = self.handlers.remove(&pos) {
            for handler in set.handlers() {
                self.sites.remove(&handler.node_id());
            }
            trace!(tier = %T::KIND, %pos, "handlers dropped");
        }
    }

    fn activate_relayed(&mut self, seen: &Seen<T>) {
        let networks: BTreeSet<NetworkKey> = seen
            .iter()
            .filter_map(|id| match self.sites.get(&id) {
                Some(Site::Handler { pos, .. }) => self.handlers.get(pos).map(HandlerSet::network),
                _ => None,
            })
            .collect();
        let members: Vec<BlockPos> = networks
            .into_iter()
            .filter_map(|key| self.net.network(key))
            .flat_map(|n| n.members())
            .collect();
        let ticks = self.config.relay_active_ticks;
        for pos in members {
            // members of a live network are always placed segments
            let _ = self.net.set_active(pos, true, ticks);
        }
    }

    fn endpoint_neighbors(&self, pos: BlockPos) -> Vec<&dyn ResearchProvider<T>> {
        let mut out: Vec<&dyn ResearchProvider<T>> = Vec::new();
        for facing in Facing::ALL {
            let adjacent = pos.offset(facing);
            let toward = facing.opposite();
            let faces_here = self
                .net
                .segment(adjacent)
                .is_some_and(|s| s.connections().contains(toward));
            if !faces_here {
                continue;
            }
            let Some(set) = self.handlers.get(&adjacent) else {
                continue;
            };
            if self.net.network_of(adjacent) == Some(set.network()) {
                out.push(set.get(Some(toward)));
            }
        }
        out
    }

    fn handler_neighbors(
        &self,
        id: NodeId,
        pos: BlockPos,
        facing: Option<Facing>,
    ) -> Vec<&dyn ResearchProvider<T>> {
        let Some(set) = self.handlers.get(&pos) else {
            return Vec::new();
        };
        if set.get(facing).node_id() != id {
            return Vec::new();
        }
        let Some(network) = self.net.network(set.network()) else {
            return Vec::new();
        };
        if !network.contains(pos) {
            return Vec::new();
        }
        network
            .attachments()
            .iter()
            .filter(|a| !(a.segment == pos && Some(a.facing) == facing))
            .filter_map(|a| self.provider(a.endpoint))
            .collect()
    }
}

impl<T: Tier> Default for ResearchGrid<T> {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl<T: Tier> Reach<T> for ResearchGrid<T> {
    fn neighbors(&self, node: NodeId) -> Vec<&dyn ResearchProvider<T>> {
        match self.sites.get(&node) {
            Some(Site::Endpoint(pos)) => self.endpoint_neighbors(*pos),
            Some(Site::Handler { pos, facing }) => self.handler_neighbors(node, *pos, *facing),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::NetHandler;
    use lattice_plane::Go;

    fn p(x: i64) -> BlockPos {
        BlockPos::new(x, 0, 0)
    }

    /// source @ -1, segments 0..n, relay @ n
    fn wired(n: i64, capacity: u32) -> (ResearchGrid<Go>, NodeId, NodeId) {
        let mut grid = ResearchGrid::<Go>::default();
        for x in 0..n {
            grid.add_segment(p(x)).unwrap();
        }
        for x in 0..n - 1 {
            grid.set_connection(p(x), Facing::East, true).unwrap();
        }
        let source = grid.attach_source(p(-1), capacity).unwrap();
        let relay = grid.attach_relay(p(n)).unwrap();
        grid.set_connection(p(0), Facing::West, true).unwrap();
        grid.set_connection(p(n - 1), Facing::East, true).unwrap();
        (grid, source, relay)
    }

    #[test]
    fn relay_reaches_source_through_pipe() {
        let (mut grid, source, relay) = wired(3, 40);
        assert_eq!(grid.max(relay), 40);
        assert!(grid.can_bridge(relay));
        assert!(!grid.can_bridge(source));
        assert_eq!(grid.request(relay, 25, false), 25);
        assert_eq!(grid.max(relay), 15);
    }

    #[test]
    fn handler_excludes_its_own_face() {
        let mut grid = ResearchGrid::<Go>::default();
        grid.add_segment(p(0)).unwrap();
        grid.add_segment(p(1)).unwrap();
        grid.set_connection(p(0), Facing::East, true).unwrap();
        grid.attach_source(p(-1), 40).unwrap();
        grid.attach_source(p(2), 7).unwrap();
        grid.set_connection(p(0), Facing::West, true).unwrap();
        grid.set_connection(p(1), Facing::East, true).unwrap();

        // facing west at segment 0 looks at the 40-unit source itself
        assert_eq!(grid.max_at(p(0), Some(Facing::West)), 7);
        assert_eq!(grid.max_at(p(1), Some(Facing::East)), 40);
        assert_eq!(grid.max_at(p(0), None), 47);
    }

    #[test]
    fn committed_request_activates_relayed_segments() {
        let (mut grid, _, relay) = wired(3, 40);
        assert_eq!(grid.request(relay, 10, true), 10);
        assert!(!grid.is_active(p(1)), "simulate activates nothing");
        grid.request(relay, 10, false);
        for x in 0..3 {
            assert!(grid.is_active(p(x)));
        }
    }

    fn net_handler(
        grid: &mut ResearchGrid<Go>,
        pos: BlockPos,
        facing: Option<Facing>,
    ) -> NetHandler<Go> {
        match grid.capability(pos, facing) {
            Some(Capability::Net(handler)) => handler,
            other => panic!("expected a network handler, got {other:?}"),
        }
    }

    #[test]
    fn handlers_rebuilt_on_network_change() {
        let (mut grid, _, _) = wired(3, 40);
        let faces = [Some(Facing::East), Some(Facing::West), None];
        let before: Vec<_> = faces.map(|f| net_handler(&mut grid, p(2), f)).to_vec();

        grid.set_connection(p(0), Facing::East, false).unwrap();

        // asking for one face rebuilds the whole set
        let east = net_handler(&mut grid, p(2), Some(Facing::East));
        let current = grid.net().network_of(p(2)).unwrap();
        let after: Vec<_> = faces.map(|f| net_handler(&mut grid, p(2), f)).to_vec();
        assert_eq!(after[0], east);
        for (old, new) in before.iter().zip(&after) {
            assert_ne!(old.node_id(), new.node_id());
            assert_ne!(old.network(), new.network());
            assert_eq!(new.network(), current);
            // the old handler id no longer resolves
            assert_eq!(grid.max(old.node_id()), 0);
        }
        assert_eq!(grid.max(after[0].node_id()), 0);
    }

    #[test]
    fn observer_gets_inert_handlers() {
        let mut grid = ResearchGrid::<Go>::new(GridConfig::observer());
        grid.add_segment(p(0)).unwrap();
        let cap = grid.capability(p(0), Some(Facing::Up)).unwrap();
        assert!(cap.is_inert());
        assert_eq!(grid.net().network_count(), 0);
        assert!(grid.capability(p(5), None).is_none());
    }

    #[test]
    fn replace_inherits_initialised_handlers() {
        let (mut grid, _, _) = wired(2, 40);
        let before = [
            net_handler(&mut grid, p(0), None),
            net_handler(&mut grid, p(0), Some(Facing::West)),
        ];
        grid.drain_events();

        assert!(grid.replace_segment(p(0)).unwrap());
        let events = grid.drain_events();
        assert!(events.contains(&GridEvent::SegmentReplaced {
            pos: p(0),
            inherited: true,
            tick: 0,
        }));
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, GridEvent::HandlersRebuilt { .. })),
            "inherited handlers are not rebuilt"
        );
        assert_eq!(grid.net().network_of(p(0)), Some(before[0].network()));

        let after = [
            net_handler(&mut grid, p(0), None),
            net_handler(&mut grid, p(0), Some(Facing::West)),
        ];
        assert_eq!(before, after);
        assert_eq!(grid.max(after[0].node_id()), 40);

        let mut fresh = ResearchGrid::<Go>::default();
        fresh.add_segment(p(0)).unwrap();
        fresh.add_segment(p(1)).unwrap();
        fresh.set_connection(p(0), Facing::East, true).unwrap();
        assert!(!fresh.replace_segment(p(0)).unwrap());
        assert!(fresh.capability(p(0), None).is_some());
        assert!(fresh.drain_events().contains(&GridEvent::SegmentReplaced {
            pos: p(0),
            inherited: false,
            tick: 0,
        }));
    }

    #[test]
    fn begin_tick_restores_supply() {
        let (mut grid, _, relay) = wired(2, 30);
        assert_eq!(grid.request(relay, 100, false), 30);
        assert_eq!(grid.max(relay), 0);
        grid.begin_tick();
        assert_eq!(grid.max(relay), 30);
        assert_eq!(grid.tick(), 1);
    }

    #[test]
    fn detach_removes_supply() {
        let (mut grid, _, relay) = wired(2, 30);
        assert_eq!(grid.max(relay), 30);
        grid.detach(p(-1)).unwrap();
        assert_eq!(grid.max(relay), 0);
        assert!(matches!(grid.detach(p(-1)), Err(Error::NoEndpoint { .. })));
    }
}
