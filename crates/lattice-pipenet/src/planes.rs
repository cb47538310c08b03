//! All nine tier grids in one place.

use lattice_plane::{Co, Cw, Go, Op, Rw, Sca, Sch, Sdi, Sp, Tier, TierKind};

use crate::config::GridConfig;
use crate::events::GridEvent;
use crate::grid::ResearchGrid;

/// Access to the grid of tier `T`.
pub trait HasGrid<T: Tier> {
    fn grid(&self) -> &ResearchGrid<T>;
    fn grid_mut(&mut self) -> &mut ResearchGrid<T>;
}

macro_rules! planes {
    ($($field:ident: $tier:ident),* $(,)?) => {
        /// One [`ResearchGrid`] per tier. The grids share nothing: a
        /// structure present on two tiers is two unrelated nodes.
        pub struct Planes {
            $($field: ResearchGrid<$tier>,)*
        }

        impl Planes {
            pub fn new(config: GridConfig) -> Self {
                Self {
                    $($field: ResearchGrid::new(config.clone()),)*
                }
            }

            /// Start a new tick on every tier.
            pub fn begin_tick(&mut self) {
                $(self.$field.begin_tick();)*
            }

            /// Pump every tier's decay scheduler once. Returns how many
            /// timers expired in total.
            pub fn pump(&mut self) -> usize {
                0 $(+ self.$field.pump())*
            }

            /// Drain events from every tier, base tier first.
            pub fn drain_events(&mut self) -> Vec<(TierKind, GridEvent)> {
                let mut events = Vec::new();
                $(
                    events.extend(
                        self.$field
                            .drain_events()
                            .into_iter()
                            .map(|e| ($tier::KIND, e)),
                    );
                )*
                events
            }
        }

        $(
            impl HasGrid<$tier> for Planes {
                fn grid(&self) -> &ResearchGrid<$tier> {
                    &self.$field
                }

                fn grid_mut(&mut self) -> &mut ResearchGrid<$tier> {
                    &mut self.$field
                }
            }
        )*
    };
}

planes! {
    cw: Cw,
    rw: Rw,
    go: Go,
    op: Op,
    sp: Sp,
    co: Co,
    sca: Sca,
    sch: Sch,
    sdi: Sdi,
}

impl Planes {
    pub fn grid<T: Tier>(&self) -> &ResearchGrid<T>
    where
        Self: HasGrid<T>,
    {
        HasGrid::<T>::grid(self)
    }

    pub fn grid_mut<T: Tier>(&mut self) -> &mut ResearchGrid<T>
    where
        Self: HasGrid<T>,
    {
        HasGrid::<T>::grid_mut(self)
    }
}

impl Default for Planes {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_topology::BlockPos;

    #[test]
    fn grids_are_independent() {
        let mut planes = Planes::default();
        let pos = BlockPos::ORIGIN;
        planes.grid_mut::<Go>().add_segment(pos).unwrap();
        assert!(planes.grid::<Go>().net().segment(pos).is_some());
        assert!(planes.grid::<Rw>().net().segment(pos).is_none());
        // same block, different tier
        planes.grid_mut::<Rw>().add_segment(pos).unwrap();
    }

    #[test]
    fn pump_fans_out() {
        let mut planes = Planes::new(GridConfig::default().with_relay_active_ticks(1));
        let pos = BlockPos::ORIGIN;
        planes.grid_mut::<Cw>().add_segment(pos).unwrap();
        planes.grid_mut::<Sdi>().add_segment(pos).unwrap();
        planes.grid_mut::<Cw>().set_active(pos, true).unwrap();
        planes.grid_mut::<Sdi>().set_active(pos, true).unwrap();
        assert_eq!(planes.pump(), 2);

        let tiers: Vec<_> = planes.drain_events().into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            tiers,
            vec![TierKind::Cw, TierKind::Cw, TierKind::Sdi, TierKind::Sdi]
        );
    }

    #[test]
    fn begin_tick_advances_every_tier() {
        let mut planes = Planes::default();
        planes.begin_tick();
        assert_eq!(planes.grid::<Cw>().tick(), 1);
        assert_eq!(planes.grid::<Sch>().tick(), 1);
    }
}
