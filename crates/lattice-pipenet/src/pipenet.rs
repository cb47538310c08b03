//! Connectivity network for one pipe kind.
//!
//! # Model
//!
//! Segments occupy blocks and open faces toward their neighbours. Two
//! segments are connected when each has the face toward the other open.
//! A face of a segment that points at an endpoint attaches that endpoint
//! to the segment's network.
//!
//! # Caching
//!
//! Networks live in a generational arena. Each segment caches the key of
//! the last network it was resolved into. [`PipeNet::resolve`] trusts that
//! key only if it is still live in the arena *and* the network still
//! contains the segment; otherwise it rebuilds from the segment.
//!
//! Topology notifications remove exactly the networks they touch and mark
//! the affected positions stale. Nothing is rebuilt until it is resolved.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use lattice_plane::NodeId;
use lattice_topology::{BlockPos, Facing};
use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::config::{GridConfig, Side};
use crate::decay::{DecayScheduler, DecayStep};
use crate::error::{Error, Result};
use crate::events::{EventLog, GridEvent};
use crate::network::{Attachment, Network, NetworkKey};
use crate::segment::{Segment, SegmentSnapshot};

/// Outcome of [`PipeNet::set_connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    Disconnected,
    /// The face was already in the requested state.
    Unchanged,
    /// Refused by the connection cap. Nothing changed.
    Rejected,
}

/// Segments, endpoints and the networks they form.
#[derive(Debug)]
pub struct PipeNet {
    max_connections: usize,
    side: Side,
    segments: HashMap<BlockPos, Segment>,
    networks: SlotMap<NetworkKey, Network>,
    endpoints: BTreeMap<BlockPos, NodeId>,
    stale: BTreeSet<BlockPos>,
    decay: DecayScheduler,
    last_pumped: Option<u64>,
    log: EventLog,
}

impl PipeNet {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            side: config.side,
            segments: HashMap::new(),
            networks: SlotMap::with_key(),
            endpoints: BTreeMap::new(),
            stale: BTreeSet::new(),
            decay: DecayScheduler::new(),
            last_pumped: None,
            log: EventLog::new(config.event_capacity),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn segment(&self, pos: BlockPos) -> Option<&Segment> {
        self.segments.get(&pos)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn endpoint(&self, pos: BlockPos) -> Option<NodeId> {
        self.endpoints.get(&pos).copied()
    }

    pub fn network(&self, key: NetworkKey) -> Option<&Network> {
        self.networks.get(key)
    }

    /// Live networks. Networks not yet rebuilt after a change are not counted.
    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    pub fn scheduler(&self) -> &DecayScheduler {
        &self.decay
    }

    /// Place a segment with no open faces.
    pub fn add_segment(&mut self, pos: BlockPos) -> Result<()> {
        if self.is_occupied(pos) {
            return Err(Error::Occupied { pos });
        }
        self.segments.insert(
            pos,
            Segment {
                unsaved: true,
                ..Segment::default()
            },
        );
        debug!(%pos, "segment added");
        Ok(())
    }

    /// Remove a segment, closing every neighbour face that pointed at it.
    pub fn remove_segment(&mut self, pos: BlockPos) -> Result<Segment> {
        if !self.segments.contains_key(&pos) {
            return Err(Error::NoSegment { pos });
        }
        self.invalidate_at(pos);
        let Some(segment) = self.segments.remove(&pos) else {
            return Err(Error::NoSegment { pos });
        };
        for facing in segment.connections.iter() {
            let neighbor = pos.offset(facing);
            if self.segments.contains_key(&neighbor) {
                self.invalidate_at(neighbor);
                if let Some(n) = self.segments.get_mut(&neighbor) {
                    n.connections.set(facing.opposite(), false);
                    n.unsaved = true;
                }
            }
        }
        self.decay.deregister(pos);
        self.stale.insert(pos);
        debug!(%pos, "segment removed");
        Ok(segment)
    }

    /// Open or close one face of the segment at `pos`.
    ///
    /// A locally initiated connection (`from_neighbor == false`) is checked
    /// against the cap on both sides before anything is committed, then
    /// mirrored onto the neighbour segment. A connection arriving from the
    /// neighbour has already been admitted and is applied as-is.
    pub fn set_connection(
        &mut self,
        pos: BlockPos,
        facing: Facing,
        connected: bool,
        from_neighbor: bool,
    ) -> Result<ConnectOutcome> {
        let segment = self.segments.get(&pos).ok_or(Error::NoSegment { pos })?;
        if segment.connections.contains(facing) == connected {
            return Ok(ConnectOutcome::Unchanged);
        }

        let neighbor = pos.offset(facing);
        if connected && !from_neighbor && self.side.is_authoritative() {
            let own_full = segment.connections.count() >= self.max_connections;
            let their_full = self.segments.get(&neighbor).is_some_and(|n| {
                !n.connections.contains(facing.opposite())
                    && n.connections.count() >= self.max_connections
            });
            if own_full || their_full {
                debug!(%pos, %facing, own_full, their_full, "connection rejected");
                self.log.push(GridEvent::ConnectionRejected {
                    pos,
                    facing,
                    tick: self.log.tick(),
                });
                return Ok(ConnectOutcome::Rejected);
            }
        }

        self.invalidate_at(pos);
        let neighbor_is_segment = self.segments.contains_key(&neighbor);
        if neighbor_is_segment {
            self.invalidate_at(neighbor);
        }
        if let Some(segment) = self.segments.get_mut(&pos) {
            segment.connections.set(facing, connected);
            segment.unsaved = true;
        }
        self.stale.insert(pos);
        trace!(%pos, %facing, connected, from_neighbor, "connection changed");

        if neighbor_is_segment && !from_neighbor {
            self.set_connection(neighbor, facing.opposite(), connected, true)?;
        }

        Ok(if connected {
            ConnectOutcome::Connected
        } else {
            ConnectOutcome::Disconnected
        })
    }

    /// Register an endpoint at `pos`.
    pub fn attach_endpoint(&mut self, pos: BlockPos, id: NodeId) -> Result<()> {
        if self.is_occupied(pos) {
            return Err(Error::Occupied { pos });
        }
        self.endpoints.insert(pos, id);
        self.invalidate_facing(pos);
        debug!(%pos, endpoint = %id, "endpoint attached");
        Ok(())
    }

    pub fn detach_endpoint(&mut self, pos: BlockPos) -> Result<NodeId> {
        let id = self
            .endpoints
            .remove(&pos)
            .ok_or(Error::NoEndpoint { pos })?;
        self.invalidate_facing(pos);
        debug!(%pos, endpoint = %id, "endpoint detached");
        Ok(id)
    }

    /// The network containing `pos`, rebuilding it if the cached one is gone
    /// or no longer contains the segment. Observers never resolve.
    pub fn resolve(&mut self, pos: BlockPos) -> Option<NetworkKey> {
        if !self.side.is_authoritative() {
            return None;
        }
        if let Some(key) = self.network_of(pos) {
            return Some(key);
        }
        self.build(pos)
    }

    /// The cached network of `pos`, if it is still valid. Never rebuilds.
    pub fn network_of(&self, pos: BlockPos) -> Option<NetworkKey> {
        let key = self.segments.get(&pos)?.net?;
        self.networks
            .get(key)
            .is_some_and(|network| network.contains(pos))
            .then_some(key)
    }

    /// Positions touched by topology changes since the last call.
    pub fn take_stale(&mut self) -> BTreeSet<BlockPos> {
        std::mem::take(&mut self.stale)
    }

    /// Swap the segment at `pos` for a fresh one with the same faces and
    /// timer. The fresh segment has no cached network until it is resolved
    /// or [rebound](Self::rebind).
    pub fn replace_segment(&mut self, pos: BlockPos) -> Result<()> {
        let old = self.segments.remove(&pos).ok_or(Error::NoSegment { pos })?;
        let fresh = Segment {
            connections: old.connections,
            net: None,
            timer: old.timer,
            unsaved: true,
        };
        self.segments.insert(pos, fresh);
        Ok(())
    }

    /// Point the segment at `pos` at `key` if that network is live and
    /// contains it. Returns whether the segment was rebound.
    pub fn rebind(&mut self, pos: BlockPos, key: NetworkKey) -> bool {
        let live = self
            .networks
            .get(key)
            .is_some_and(|network| network.contains(pos));
        match self.segments.get_mut(&pos) {
            Some(segment) if live => {
                segment.net = Some(key);
                true
            }
            _ => false,
        }
    }

    pub fn is_active(&self, pos: BlockPos) -> bool {
        self.segments.get(&pos).is_some_and(Segment::is_active)
    }

    /// Flip the active flag. `duration` only applies when activating.
    ///
    /// Returns whether the flag changed. Requesting the current state does
    /// nothing and emits nothing.
    pub fn set_active(&mut self, pos: BlockPos, active: bool, duration: u32) -> Result<bool> {
        let segment = self
            .segments
            .get_mut(&pos)
            .ok_or(Error::NoSegment { pos })?;
        let changed = if active {
            segment.timer.activate(duration)
        } else {
            segment.timer.deactivate()
        };
        if !changed {
            return Ok(false);
        }
        segment.unsaved = true;
        if active {
            self.decay.register(pos);
        } else {
            self.decay.deregister(pos);
        }
        debug!(%pos, active, "active flag changed");
        self.log.push(GridEvent::ActiveChanged {
            pos,
            active,
            tick: self.log.tick(),
        });
        Ok(true)
    }

    /// Advance every registered timer exactly once per tick. Returns how
    /// many expired; a repeated pump within the same tick advances nothing.
    pub fn pump(&mut self) -> usize {
        let tick = self.log.tick();
        if self.last_pumped == Some(tick) {
            trace!(tick, "already pumped this tick");
            return 0;
        }
        self.last_pumped = Some(tick);
        let mut expired = 0;
        for pos in self.decay.due() {
            let step = self
                .segments
                .get_mut(&pos)
                .map_or(DecayStep::Idle, |segment| segment.timer.advance());
            match step {
                DecayStep::Running => {}
                DecayStep::Idle => {
                    self.decay.deregister(pos);
                }
                DecayStep::Expired => {
                    self.decay.deregister(pos);
                    if let Some(segment) = self.segments.get_mut(&pos) {
                        segment.unsaved = true;
                    }
                    debug!(%pos, "active flag expired");
                    self.log.push(GridEvent::ActiveChanged {
                        pos,
                        active: false,
                        tick: self.log.tick(),
                    });
                    expired += 1;
                }
            }
        }
        expired
    }

    pub fn snapshot(&self, pos: BlockPos) -> Result<SegmentSnapshot> {
        self.segments
            .get(&pos)
            .map(Segment::snapshot)
            .ok_or(Error::NoSegment { pos })
    }

    /// Apply a loaded snapshot. A restored active flag runs for `duration`.
    pub fn restore(&mut self, pos: BlockPos, snapshot: SegmentSnapshot, duration: u32) -> Result<()> {
        self.set_active(pos, snapshot.active, duration)?;
        if let Some(segment) = self.segments.get_mut(&pos) {
            segment.unsaved = false;
        }
        Ok(())
    }

    /// Segments whose durable state changed since the last call, in position
    /// order.
    pub fn take_unsaved(&mut self) -> Vec<BlockPos> {
        let mut dirty: Vec<_> = self
            .segments
            .iter_mut()
            .filter(|(_, segment)| segment.unsaved)
            .map(|(pos, segment)| {
                segment.unsaved = false;
                *pos
            })
            .collect();
        dirty.sort();
        dirty
    }

    pub fn tick(&self) -> u64 {
        self.log.tick()
    }

    pub(crate) fn advance_tick(&mut self) {
        self.log.advance();
    }

    pub(crate) fn emit(&mut self, event: GridEvent) {
        self.log.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        self.log.drain()
    }

    /// Events lost to the event capacity since the net was created.
    pub fn dropped_events(&self) -> u64 {
        self.log.dropped()
    }

    fn is_occupied(&self, pos: BlockPos) -> bool {
        self.segments.contains_key(&pos) || self.endpoints.contains_key(&pos)
    }

    /// Invalidate the networks of segments whose faces point at `pos`.
    fn invalidate_facing(&mut self, pos: BlockPos) {
        for (adjacent, facing) in pos.neighbors().into_iter().zip(Facing::ALL) {
            let points_here = self
                .segments
                .get(&adjacent)
                .is_some_and(|s| s.connections.contains(facing.opposite()));
            if points_here {
                self.invalidate_at(adjacent);
            }
        }
    }

    /// Drop the live network containing `pos`, if any, and mark `pos` stale.
    fn invalidate_at(&mut self, pos: BlockPos) {
        self.stale.insert(pos);
        let Some(key) = self.network_of(pos) else {
            return;
        };
        if let Some(network) = self.networks.remove(key) {
            self.stale.extend(network.members.iter().copied());
            debug!(network = key.as_u64(), members = network.len(), "network invalidated");
            self.log.push(GridEvent::NetworkInvalidated {
                network: key.as_u64(),
                members: network.len(),
                tick: self.log.tick(),
            });
        }
    }

    fn build(&mut self, pos: BlockPos) -> Option<NetworkKey> {
        let root = self.segments.get(&pos)?;
        if root.connections.is_empty() {
            return None;
        }

        let mut members = BTreeSet::from([pos]);
        let mut attachments = Vec::new();
        let mut queue = VecDeque::from([pos]);
        while let Some(current) = queue.pop_front() {
            let Some(segment) = self.segments.get(&current) else {
                continue;
            };
            for facing in segment.connections.iter() {
                let next = current.offset(facing);
                if let Some(neighbor) = self.segments.get(&next) {
                    if neighbor.connections.contains(facing.opposite()) && members.insert(next) {
                        queue.push_back(next);
                    }
                } else if let Some(&endpoint) = self.endpoints.get(&next) {
                    attachments.push(Attachment {
                        segment: current,
                        facing,
                        endpoint,
                    });
                }
            }
        }

        // Open faces toward nothing are not live connections.
        if members.len() == 1 && attachments.is_empty() {
            return None;
        }
        attachments.sort();

        let overlapping: BTreeSet<NetworkKey> = members
            .iter()
            .filter_map(|m| self.segments.get(m).and_then(|s| s.net))
            .filter(|key| self.networks.contains_key(*key))
            .collect();
        for key in overlapping {
            self.networks.remove(key);
        }

        let size = members.len();
        let key = self.networks.insert(Network {
            root: pos,
            members,
            attachments,
        });
        if let Some(network) = self.networks.get(key) {
            for member in &network.members {
                if let Some(segment) = self.segments.get_mut(member) {
                    segment.net = Some(key);
                }
            }
        }
        debug!(network = key.as_u64(), root = %pos, members = size, "network built");
        self.log.push(GridEvent::NetworkBuilt {
            network: key.as_u64(),
            root: pos,
            members: size,
            tick: self.log.tick(),
        });
        Some(key)
    }
}

impl Default for PipeNet {
    fn default() -> Self {
        Self::new(&GridConfig::default())
    }
}
