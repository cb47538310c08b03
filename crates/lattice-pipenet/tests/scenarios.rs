//! End-to-end grid scenarios.

use lattice_pipenet::{
    Capability, ConnectOutcome, GridConfig, GridEvent, NetHandler, Planes, ResearchGrid,
    SegmentSnapshot,
};
use lattice_plane::{Go, ResearchProvider, Rw};
use lattice_topology::{BlockPos, Facing};
use proptest::prelude::*;

fn p(x: i64) -> BlockPos {
    BlockPos::new(x, 0, 0)
}

/// Segments at x = 0..n, each connected to the next.
fn chain(grid: &mut ResearchGrid<Go>, n: i64) {
    for x in 0..n {
        grid.add_segment(p(x)).unwrap();
    }
    for x in 0..n - 1 {
        assert_eq!(
            grid.set_connection(p(x), Facing::East, true).unwrap(),
            ConnectOutcome::Connected
        );
    }
}

fn handler(grid: &mut ResearchGrid<Go>, pos: BlockPos, facing: Facing) -> NetHandler<Go> {
    match grid.capability(pos, Some(facing)) {
        Some(Capability::Net(handler)) => handler,
        other => panic!("expected a network handler at {pos}, got {other:?}"),
    }
}

#[test]
fn removing_middle_of_chain_splits_network() {
    let mut grid = ResearchGrid::<Go>::default();
    chain(&mut grid, 5);
    grid.attach_source(p(-1), 100).unwrap();
    grid.set_connection(p(0), Facing::West, true).unwrap();

    let before = handler(&mut grid, p(4), Facing::East);
    assert_eq!(grid.max(before.node_id()), 100);
    let whole = grid.net().network_of(p(4)).unwrap();
    assert_eq!(grid.net().network(whole).unwrap().len(), 5);

    grid.remove_segment(p(2)).unwrap();

    let after = handler(&mut grid, p(4), Facing::East);
    assert_ne!(before.node_id(), after.node_id());
    assert_eq!(grid.max(before.node_id()), 0, "stale handler must not resolve");
    assert_eq!(grid.max(after.node_id()), 0, "source is on the other half");

    let left = grid.net().network_of(p(0)).unwrap();
    let right = grid.net().network_of(p(4)).unwrap();
    assert_ne!(left, right);
    assert_eq!(grid.net().network(left).unwrap().len(), 2);
    assert_eq!(grid.net().network(right).unwrap().len(), 2);
    assert!(grid.net().network(whole).is_none());
    assert!(!grid
        .net()
        .segment(p(1))
        .unwrap()
        .connections()
        .contains(Facing::East));
}

#[test]
fn third_connection_is_rejected() {
    let mut grid = ResearchGrid::<Go>::default();
    chain(&mut grid, 3);
    let middle = p(1);
    grid.add_segment(middle.offset(Facing::Up)).unwrap();

    assert_eq!(
        grid.set_connection(middle, Facing::Up, true).unwrap(),
        ConnectOutcome::Rejected
    );
    let mask = grid.net().segment(middle).unwrap().connections();
    assert_eq!(mask.count(), 2);
    assert!(mask.contains(Facing::West));
    assert!(mask.contains(Facing::East));
    assert!(grid
        .net()
        .segment(middle.offset(Facing::Up))
        .unwrap()
        .connections()
        .is_empty());

    // symmetric: initiating from the new neighbour is refused too
    assert_eq!(
        grid.set_connection(middle.offset(Facing::Up), Facing::Down, true)
            .unwrap(),
        ConnectOutcome::Rejected
    );
    assert!(grid
        .drain_events()
        .iter()
        .any(|e| matches!(e, GridEvent::ConnectionRejected { .. })));
}

#[test]
fn decay_timer_runs_for_its_duration() {
    let mut grid = ResearchGrid::<Go>::new(GridConfig::default().with_relay_active_ticks(5));
    grid.add_segment(p(0)).unwrap();
    assert!(grid.set_active(p(0), true).unwrap());

    for _ in 0..4 {
        grid.begin_tick();
        grid.pump();
        assert!(grid.is_active(p(0)));
    }
    grid.begin_tick();
    assert_eq!(grid.pump(), 1);
    assert!(!grid.is_active(p(0)));
    assert_eq!(grid.net().segment(p(0)).unwrap().timer().elapsed(), 0);
    assert!(grid.net().scheduler().is_empty());

    grid.drain_events();
    assert!(!grid.set_active(p(0), false).unwrap());
    assert!(grid.drain_events().is_empty(), "no-op emits nothing");
}

#[test]
fn tiers_are_isolated() {
    let mut planes = Planes::default();
    let relay_pos = p(-1);

    let rw_relay = planes.grid_mut::<Rw>().attach_relay(relay_pos).unwrap();
    planes
        .grid_mut::<Rw>()
        .attach_source(relay_pos.offset(Facing::Down), 50)
        .unwrap();

    let go = planes.grid_mut::<Go>();
    chain(go, 2);
    go.set_connection(p(0), Facing::West, true).unwrap();

    assert_eq!(go.max(rw_relay), 0);
    assert_eq!(go.request(rw_relay, 10, true), 0);
    assert!(!go.can_bridge(rw_relay));
    assert_eq!(go.max_at(p(1), Some(Facing::East)), 0);
    assert_eq!(planes.grid_mut::<Rw>().max(rw_relay), 0);
}

#[test]
fn relay_ring_through_pipes_terminates() {
    // Four relays on the corners of a square, each side a one-segment pipe.
    let mut grid = ResearchGrid::<Go>::default();
    let corners = [
        BlockPos::new(0, 0, 0),
        BlockPos::new(2, 0, 0),
        BlockPos::new(2, 0, 2),
        BlockPos::new(0, 0, 2),
    ];
    let relays: Vec<_> = corners
        .iter()
        .map(|&c| grid.attach_relay(c).unwrap())
        .collect();
    let sides = [
        (BlockPos::new(1, 0, 0), Facing::West, Facing::East),
        (BlockPos::new(2, 0, 1), Facing::North, Facing::South),
        (BlockPos::new(1, 0, 2), Facing::East, Facing::West),
        (BlockPos::new(0, 0, 1), Facing::South, Facing::North),
    ];
    for (pos, a, b) in sides {
        grid.add_segment(pos).unwrap();
        grid.set_connection(pos, a, true).unwrap();
        grid.set_connection(pos, b, true).unwrap();
    }

    for &relay in &relays {
        assert_eq!(grid.max(relay), 0);
        assert!(grid.can_bridge(relay));
    }

    // feed the ring through a pipe north of the first corner
    let feed = BlockPos::new(0, 0, -1);
    grid.add_segment(feed).unwrap();
    grid.set_connection(feed, Facing::South, true).unwrap();
    grid.attach_source(BlockPos::new(0, 0, -2), 10).unwrap();
    grid.set_connection(feed, Facing::North, true).unwrap();

    for &relay in &relays {
        assert_eq!(grid.max(relay), 10);
    }
    assert_eq!(grid.request(relays[1], 4, false), 4);
    assert_eq!(grid.max(relays[2]), 6);
}

#[test]
fn committed_request_marks_segments_active() {
    let mut grid = ResearchGrid::<Go>::new(GridConfig::default().with_relay_active_ticks(2));
    chain(&mut grid, 3);
    grid.attach_source(p(-1), 10).unwrap();
    grid.set_connection(p(0), Facing::West, true).unwrap();

    assert_eq!(grid.request_at(p(2), Some(Facing::East), 3, false), 3);
    assert!((0..3).all(|x| grid.is_active(p(x))));
    assert_eq!(grid.take_unsaved(), vec![p(0), p(1), p(2)]);

    grid.pump();
    grid.begin_tick();
    assert_eq!(grid.pump(), 3);
    assert!((0..3).all(|x| !grid.is_active(p(x))));
}

#[test]
fn timers_advance_once_per_host_tick() {
    let mut grid = ResearchGrid::<Go>::new(GridConfig::default().with_relay_active_ticks(2));
    grid.add_segment(p(0)).unwrap();
    grid.begin_tick();
    grid.set_active(p(0), true).unwrap();

    assert_eq!(grid.pump(), 0);
    assert_eq!(grid.pump(), 0);
    assert!(grid.is_active(p(0)), "a 2-tick timer outlives one host tick");
    assert_eq!(grid.net().segment(p(0)).unwrap().timer().elapsed(), 1);

    grid.begin_tick();
    assert_eq!(grid.pump(), 1);
    assert!(!grid.is_active(p(0)));
}

#[test]
fn undrained_events_stay_bounded() {
    let capacity = 32;
    let mut grid = ResearchGrid::<Go>::new(GridConfig::default().with_event_capacity(capacity));
    chain(&mut grid, 2);
    grid.attach_source(p(-1), 10).unwrap();
    grid.set_connection(p(0), Facing::West, true).unwrap();

    for _ in 0..500 {
        grid.begin_tick();
        grid.set_connection(p(0), Facing::East, false).unwrap();
        grid.max_at(p(1), Some(Facing::East));
        grid.set_connection(p(0), Facing::East, true).unwrap();
        grid.max_at(p(1), Some(Facing::East));
    }

    assert!(grid.net().dropped_events() > 0);
    let events = grid.drain_events();
    assert_eq!(events.len(), capacity);
    // the newest events survive
    assert_eq!(events.last().map(GridEvent::tick), Some(grid.tick()));
}

#[test]
fn disabled_events_record_nothing() {
    let mut grid = ResearchGrid::<Go>::new(GridConfig::default().with_event_capacity(0));
    chain(&mut grid, 3);
    grid.add_segment(p(1).offset(Facing::Up)).unwrap();
    grid.set_connection(p(1), Facing::Up, true).unwrap();
    grid.set_active(p(0), true).unwrap();
    assert!(grid.drain_events().is_empty());
}

#[test]
fn snapshot_restore_round_trip() {
    let mut grid = ResearchGrid::<Go>::default();
    grid.add_segment(p(0)).unwrap();
    grid.set_active(p(0), true).unwrap();
    let snap = grid.snapshot(p(0)).unwrap();
    assert_eq!(snap, SegmentSnapshot { active: true });

    let mut loaded = ResearchGrid::<Go>::default();
    loaded.add_segment(p(0)).unwrap();
    loaded.take_unsaved();
    loaded.restore(p(0), snap).unwrap();
    assert!(loaded.is_active(p(0)));
    assert!(loaded.take_unsaved().is_empty());
    assert!(loaded.net().scheduler().is_registered(p(0)));
}

proptest! {
    /// Draining a chain over several ticks never hands out more per tick
    /// than the source holds, and a fresh tick always restores it.
    #[test]
    fn per_tick_supply_is_bounded(
        len in 1i64..6,
        capacity in 0u32..200,
        asks in prop::collection::vec(0u32..100, 1..8),
    ) {
        let mut grid = ResearchGrid::<Go>::default();
        chain(&mut grid, len);
        grid.attach_source(p(-1), capacity).unwrap();
        grid.set_connection(p(0), Facing::West, true).unwrap();
        let end = p(len - 1);

        let mut handed_out = 0u32;
        for ask in &asks {
            let max = grid.max_at(end, Some(Facing::East));
            let simulated = grid.request_at(end, Some(Facing::East), *ask, true);
            let got = grid.request_at(end, Some(Facing::East), *ask, false);
            prop_assert_eq!(simulated, got);
            prop_assert!(got <= *ask);
            prop_assert!(got <= max);
            handed_out += got;
        }
        prop_assert!(handed_out <= capacity);

        grid.begin_tick();
        prop_assert_eq!(grid.max_at(end, Some(Facing::East)), capacity);
    }
}
