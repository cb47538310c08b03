use std::collections::BTreeSet;

use lattice_plane::NodeId;
use lattice_topology::{BlockPos, Facing};
use slotmap::{new_key_type, Key};

new_key_type! {
    /// Generational handle to a network. A segment's cached key goes stale
    /// as soon as the network it names is removed from the registry.
    pub struct NetworkKey;
}

impl NetworkKey {
    /// Stable integer form for events and logs.
    pub fn as_u64(self) -> u64 {
        self.data().as_ffi()
    }
}

/// An endpoint reached through an open face of a member segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attachment {
    pub segment: BlockPos,
    pub facing: Facing,
    pub endpoint: NodeId,
}

/// A maximal set of mutually connected segments.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) root: BlockPos,
    pub(crate) members: BTreeSet<BlockPos>,
    pub(crate) attachments: Vec<Attachment>,
}

impl Network {
    /// Segment the network was built from.
    pub fn root(&self) -> BlockPos {
        self.root
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.members.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in position order.
    pub fn members(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.members.iter().copied()
    }

    /// Attached endpoints, sorted by segment position then facing.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }
}
