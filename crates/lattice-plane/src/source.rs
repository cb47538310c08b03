//! Terminal producers.
//!
//! A source owns a per-tick supply. Committed requests draw it down until
//! [`ResearchProvider::reset_tick`] restores it at the start of the next tick.

use std::cell::Cell;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::provider::{Reach, ResearchProvider};
use crate::seen::{NodeId, Seen};
use crate::tier::Tier;

/// A producer with a fixed per-tick capacity.
#[derive(Debug)]
pub struct ResearchSource<T: Tier> {
    id: NodeId,
    capacity: u32,
    drawn: Cell<u32>,
    _tier: PhantomData<T>,
}

impl<T: Tier> ResearchSource<T> {
    pub fn new(id: NodeId, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            drawn: Cell::new(0),
            _tier: PhantomData,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Units committed so far this tick.
    pub fn drawn(&self) -> u32 {
        self.drawn.get()
    }

    /// Units still available this tick.
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.drawn.get())
    }

    /// Change the per-tick capacity. Units already drawn stay drawn.
    pub fn set_capacity(&mut self, capacity: u32) {
        self.capacity = capacity;
    }
}

impl<T: Tier> ResearchProvider<T> for ResearchSource<T> {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn max_with(&self, _reach: &dyn Reach<T>, seen: &mut Seen<T>) -> u32 {
        if !seen.enter(self.id) {
            return 0;
        }
        self.remaining()
    }

    fn request_with(
        &self,
        _reach: &dyn Reach<T>,
        amount: u32,
        simulate: bool,
        seen: &mut Seen<T>,
    ) -> u32 {
        if !seen.enter(self.id) {
            return 0;
        }
        let granted = amount.min(self.remaining());
        if !simulate {
            self.drawn.set(self.drawn.get() + granted);
        }
        trace!(tier = %T::KIND, node = %self.id, amount, granted, simulate, "source request");
        granted
    }

    fn can_bridge_with(&self, _reach: &dyn Reach<T>, seen: &mut Seen<T>) -> bool {
        let _ = seen.enter(self.id);
        false
    }

    fn reset_tick(&self) {
        self.drawn.set(0);
    }
}

/// Output per tick of a standard computation component.
pub const COMPUTATION_UNITS: u32 = 64;

/// Output per tick of an advanced computation component.
pub const ADVANCED_COMPUTATION_UNITS: u32 = 256;

/// A slot in a [`ComputationArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Empty,
    Computation,
    AdvancedComputation,
}

impl ComponentKind {
    /// Units per tick while healthy.
    pub const fn units_per_tick(self) -> u32 {
        match self {
            Self::Empty => 0,
            Self::Computation => COMPUTATION_UNITS,
            Self::AdvancedComputation => ADVANCED_COMPUTATION_UNITS,
        }
    }

    pub const fn can_be_damaged(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// One installed component and its damage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub kind: ComponentKind,
    pub damaged: bool,
}

impl Component {
    pub const fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            damaged: false,
        }
    }

    /// Units contributed right now.
    pub const fn output(&self) -> u32 {
        if self.damaged {
            0
        } else {
            self.kind.units_per_tick()
        }
    }
}

/// A terminal producer whose capacity is the sum of its healthy components.
#[derive(Debug)]
pub struct ComputationArray<T: Tier> {
    components: Vec<Component>,
    source: ResearchSource<T>,
}

impl<T: Tier> ComputationArray<T> {
    pub fn new(id: NodeId, kinds: impl IntoIterator<Item = ComponentKind>) -> Self {
        let components: Vec<_> = kinds.into_iter().map(Component::new).collect();
        let capacity = Self::sum(&components);
        Self {
            components,
            source: ResearchSource::new(id, capacity),
        }
    }

    fn sum(components: &[Component]) -> u32 {
        components.iter().map(Component::output).sum()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn capacity(&self) -> u32 {
        self.source.capacity()
    }

    /// Mark a component damaged. Returns `false` if out of range or the
    /// component cannot be damaged.
    pub fn damage(&mut self, index: usize) -> bool {
        self.set_damaged(index, true)
    }

    pub fn repair(&mut self, index: usize) -> bool {
        self.set_damaged(index, false)
    }

    fn set_damaged(&mut self, index: usize, damaged: bool) -> bool {
        let Some(component) = self.components.get_mut(index) else {
            return false;
        };
        if !component.kind.can_be_damaged() {
            return false;
        }
        component.damaged = damaged;
        let capacity = Self::sum(&self.components);
        self.source.set_capacity(capacity);
        true
    }
}

impl<T: Tier> ResearchProvider<T> for ComputationArray<T> {
    fn node_id(&self) -> NodeId {
        self.source.node_id()
    }

    fn max_with(&self, reach: &dyn Reach<T>, seen: &mut Seen<T>) -> u32 {
        self.source.max_with(reach, seen)
    }

    fn request_with(
        &self,
        reach: &dyn Reach<T>,
        amount: u32,
        simulate: bool,
        seen: &mut Seen<T>,
    ) -> u32 {
        self.source.request_with(reach, amount, simulate, seen)
    }

    fn can_bridge_with(&self, reach: &dyn Reach<T>, seen: &mut Seen<T>) -> bool {
        self.source.can_bridge_with(reach, seen)
    }

    fn reset_tick(&self) {
        ResearchProvider::<T>::reset_tick(&self.source);
    }
}
