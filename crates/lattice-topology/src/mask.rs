//! Per-segment open-face bitsets.

use crate::{Facing, FACES};

/// Set of open faces on a segment, one bit per [`Facing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionMask(u8);

impl ConnectionMask {
    /// No open faces.
    pub const EMPTY: Self = Self(0);

    const ALL_BITS: u8 = (1 << FACES) - 1;

    /// Build a mask from raw bits. Bits beyond the six faces are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL_BITS)
    }

    /// Raw bits, bit `i` set for `Facing::ALL[i]`.
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, facing: Facing) -> bool {
        self.0 & (1 << facing.index()) != 0
    }

    /// Open or close one face.
    pub fn set(&mut self, facing: Facing, open: bool) {
        if open {
            self.0 |= 1 << facing.index();
        } else {
            self.0 &= !(1 << facing.index());
        }
    }

    /// Copy of this mask with `facing` opened.
    #[must_use]
    pub fn with(mut self, facing: Facing) -> Self {
        self.set(facing, true);
        self
    }

    /// Number of open faces.
    pub const fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Open faces in [`Facing::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Facing> {
        Facing::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl FromIterator<Facing> for ConnectionMask {
    fn from_iter<I: IntoIterator<Item = Facing>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for f in iter {
            mask.set(f, true);
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_mask() {
        let mask = ConnectionMask::EMPTY;
        assert!(mask.is_empty());
        assert_eq!(mask.count(), 0);
        assert_eq!(mask.iter().count(), 0);
    }

    #[test]
    fn set_and_clear() {
        let mut mask = ConnectionMask::default();
        mask.set(Facing::East, true);
        mask.set(Facing::Up, true);
        assert_eq!(mask.count(), 2);
        assert!(mask.contains(Facing::East));
        assert!(!mask.contains(Facing::West));

        mask.set(Facing::East, false);
        assert_eq!(mask.count(), 1);
        assert!(!mask.contains(Facing::East));
    }

    #[test]
    fn iteration_follows_canonical_order() {
        let mask: ConnectionMask = [Facing::East, Facing::Down, Facing::North]
            .into_iter()
            .collect();
        let order: Vec<_> = mask.iter().collect();
        assert_eq!(order, vec![Facing::Down, Facing::North, Facing::East]);
    }

    #[test]
    fn from_bits_drops_overflow() {
        assert_eq!(ConnectionMask::from_bits(0xFF).count(), FACES);
    }

    proptest! {
        #[test]
        fn count_matches_iteration(bits in any::<u8>()) {
            let mask = ConnectionMask::from_bits(bits);
            prop_assert_eq!(mask.count(), mask.iter().count());
            let rebuilt: ConnectionMask = mask.iter().collect();
            prop_assert_eq!(rebuilt, mask);
        }
    }
}
