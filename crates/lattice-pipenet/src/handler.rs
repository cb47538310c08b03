//! Per-facing capability handlers.
//!
//! A segment attached to a network gets one [`NetHandler`] per face plus a
//! default one. Every handler of a segment is bound to the same
//! [`NetworkKey`]; when the segment's network changes the whole set is
//! thrown away and rebuilt with new ids, so a handler from an old set never
//! resolves again.

use std::marker::PhantomData;

use lattice_plane::{
    bridged_can_bridge, bridged_max, bridged_request, NodeId, NodeIds, Reach, ResearchProvider,
    Seen, Tier,
};
use lattice_topology::{BlockPos, Facing, FACES};

use crate::network::NetworkKey;

/// A handler bound to one network snapshot. Bridges to every endpoint
/// attached to that network except the one across its own face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetHandler<T: Tier> {
    id: NodeId,
    pos: BlockPos,
    facing: Option<Facing>,
    net: NetworkKey,
    _tier: PhantomData<T>,
}

impl<T: Tier> NetHandler<T> {
    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    /// `None` for the default handler.
    pub fn facing(&self) -> Option<Facing> {
        self.facing
    }

    pub fn network(&self) -> NetworkKey {
        self.net
    }
}

impl<T: Tier> ResearchProvider<T> for NetHandler<T> {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn max_with(&self, reach: &dyn Reach<T>, seen: &mut Seen<T>) -> u32 {
        if !seen.enter(self.id) {
            return 0;
        }
        let neighbors = reach.neighbors(self.id);
        bridged_max(reach, &neighbors, seen)
    }

    fn request_with(
        &self,
        reach: &dyn Reach<T>,
        amount: u32,
        simulate: bool,
        seen: &mut Seen<T>,
    ) -> u32 {
        if !seen.enter(self.id) {
            return 0;
        }
        let neighbors = reach.neighbors(self.id);
        bridged_request(reach, &neighbors, amount, simulate, seen)
    }

    fn can_bridge_with(&self, reach: &dyn Reach<T>, seen: &mut Seen<T>) -> bool {
        if !seen.enter(self.id) {
            return false;
        }
        let neighbors = reach.neighbors(self.id);
        bridged_can_bridge(reach, &neighbors, seen)
    }
}

/// The fixed handler handed out on the observer side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InertHandler<T: Tier> {
    _tier: PhantomData<T>,
}

impl<T: Tier> InertHandler<T> {
    pub fn new() -> Self {
        Self { _tier: PhantomData }
    }
}

impl<T: Tier> ResearchProvider<T> for InertHandler<T> {
    fn node_id(&self) -> NodeId {
        NodeId::NONE
    }

    fn max_with(&self, _reach: &dyn Reach<T>, _seen: &mut Seen<T>) -> u32 {
        0
    }

    fn request_with(&self, _: &dyn Reach<T>, _: u32, _: bool, _: &mut Seen<T>) -> u32 {
        0
    }

    fn can_bridge_with(&self, _reach: &dyn Reach<T>, _seen: &mut Seen<T>) -> bool {
        false
    }
}

/// What a capability query on a segment returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability<T: Tier> {
    Net(NetHandler<T>),
    Inert(InertHandler<T>),
}

impl<T: Tier> Capability<T> {
    fn provider(&self) -> &dyn ResearchProvider<T> {
        match self {
            Self::Net(handler) => handler,
            Self::Inert(handler) => handler,
        }
    }

    pub fn is_inert(&self) -> bool {
        matches!(self, Self::Inert(_))
    }
}

impl<T: Tier> ResearchProvider<T> for Capability<T> {
    fn node_id(&self) -> NodeId {
        self.provider().node_id()
    }

    fn max_with(&self, reach: &dyn Reach<T>, seen: &mut Seen<T>) -> u32 {
        self.provider().max_with(reach, seen)
    }

    fn request_with(
        &self,
        reach: &dyn Reach<T>,
        amount: u32,
        simulate: bool,
        seen: &mut Seen<T>,
    ) -> u32 {
        self.provider().request_with(reach, amount, simulate, seen)
    }

    fn can_bridge_with(&self, reach: &dyn Reach<T>, seen: &mut Seen<T>) -> bool {
        self.provider().can_bridge_with(reach, seen)
    }
}

/// All handlers of one segment, bound to one network.
#[derive(Debug, Clone)]
pub(crate) struct HandlerSet<T: Tier> {
    net: NetworkKey,
    faced: [NetHandler<T>; FACES],
    default: NetHandler<T>,
}

impl<T: Tier> HandlerSet<T> {
    pub(crate) fn new(pos: BlockPos, net: NetworkKey, ids: &mut NodeIds) -> Self {
        let mut handler = |facing| NetHandler {
            id: ids.next_id(),
            pos,
            facing,
            net,
            _tier: PhantomData,
        };
        let faced = Facing::ALL.map(|f| handler(Some(f)));
        let default = handler(None);
        Self {
            net,
            faced,
            default,
        }
    }

    pub(crate) fn network(&self) -> NetworkKey {
        self.net
    }

    pub(crate) fn get(&self, facing: Option<Facing>) -> &NetHandler<T> {
        match facing {
            Some(f) => &self.faced[f.index()],
            None => &self.default,
        }
    }

    pub(crate) fn handlers(&self) -> impl Iterator<Item = &NetHandler<T>> {
        self.faced.iter().chain(std::iter::once(&self.default))
    }
}
