use std::cell::Cell;
use std::marker::PhantomData;

use tracing::trace;

use crate::provider::{bridged_max, bridged_request, Reach, ResearchProvider};
use crate::seen::{NodeId, Seen};
use crate::tier::Tier;

/// A pure bridge. Owns no supply and forwards to whatever its reach returns.
///
/// An offline relay still enters the guard but forwards nothing.
#[derive(Debug)]
pub struct ResearchRelay<T: Tier> {
    id: NodeId,
    online: Cell<bool>,
    _tier: PhantomData<T>,
}

impl<T: Tier> ResearchRelay<T> {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            online: Cell::new(true),
            _tier: PhantomData,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.get()
    }

    pub fn set_online(&self, online: bool) {
        if self.online.replace(online) != online {
            trace!(tier = %T::KIND, node = %self.id, online, "relay state changed");
        }
    }
}

impl<T: Tier> ResearchProvider<T> for ResearchRelay<T> {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn max_with(&self, reach: &dyn Reach<T>, seen: &mut Seen<T>) -> u32 {
        if !seen.enter(self.id) || !self.is_online() {
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
        if !seen.enter(self.id) || !self.is_online() {
            return 0;
        }
        let neighbors = reach.neighbors(self.id);
        bridged_request(reach, &neighbors, amount, simulate, seen)
    }

    fn can_bridge_with(&self, _reach: &dyn Reach<T>, seen: &mut Seen<T>) -> bool {
        seen.enter(self.id) && self.is_online()
    }
}
