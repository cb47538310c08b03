//! The tier family.
//!
//! Tiers are closed, independently keyed resource pools. [`TierKind`] is the
//! run-time name of a tier; the zero-sized marker types implementing [`Tier`]
//! carry the same information at the type level so that a guard, provider or
//! grid for one tier cannot be handed to another.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Number of tiers.
pub const TIER_COUNT: usize = 9;

/// Run-time tier name, ordered from base to most advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TierKind {
    Cw,
    Rw,
    Go,
    Op,
    Sp,
    Co,
    Sca,
    Sch,
    Sdi,
}

impl TierKind {
    /// All tiers, base first.
    pub const ALL: [Self; TIER_COUNT] = [
        Self::Cw,
        Self::Rw,
        Self::Go,
        Self::Op,
        Self::Sp,
        Self::Co,
        Self::Sca,
        Self::Sch,
        Self::Sdi,
    ];

    /// Position in the escalation order (0 = base).
    pub const fn rank(self) -> usize {
        self as usize
    }

    /// Short symbol, e.g. `"SCA"`.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Cw => "CW",
            Self::Rw => "RW",
            Self::Go => "GO",
            Self::Op => "OP",
            Self::Sp => "SP",
            Self::Co => "CO",
            Self::Sca => "SCA",
            Self::Sch => "SCH",
            Self::Sdi => "SDI",
        }
    }

    /// Name of the work unit drawn per tick on this tier.
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Cw => "CWU",
            Self::Rw => "RWU",
            Self::Go => "GORWU",
            Self::Op => "OPRWU",
            Self::Sp => "SPRWU",
            Self::Co => "CORWU",
            Self::Sca => "SCARWU",
            Self::Sch => "SCHRWU",
            Self::Sdi => "SDIRWU",
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for TierKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownTier(s.to_string()))
    }
}

/// Type-level tier tag.
pub trait Tier: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// The run-time name of this tier.
    const KIND: TierKind;
}

macro_rules! tiers {
    ($($(#[$meta:meta])* $name:ident => $kind:ident,)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
            pub struct $name;

            impl Tier for $name {
                const KIND: TierKind = TierKind::$kind;
            }
        )*
    };
}

tiers! {
    /// Base computation (CWU).
    Cw => Cw,
    /// Research work units.
    Rw => Rw,
    Go => Go,
    Op => Op,
    Sp => Sp,
    Co => Co,
    Sca => Sca,
    Sch => Sch,
    /// Most advanced tier.
    Sdi => Sdi,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_declaration_order() {
        for (i, t) in TierKind::ALL.iter().enumerate() {
            assert_eq!(t.rank(), i);
        }
        assert!(TierKind::Cw < TierKind::Sdi);
    }

    #[test]
    fn symbols_parse_case_insensitively() {
        for t in TierKind::ALL {
            assert_eq!(t.symbol().parse::<TierKind>().unwrap(), t);
            assert_eq!(t.symbol().to_lowercase().parse::<TierKind>().unwrap(), t);
        }
    }

    #[test]
    fn unknown_symbol_rejected() {
        let err = "XYZ".parse::<TierKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownTier(s) if s == "XYZ"));
    }

    #[test]
    fn units_end_with_wu() {
        for t in TierKind::ALL {
            assert!(t.unit().ends_with("WU"), "{} has unit {}", t, t.unit());
        }
    }

    #[test]
    fn markers_carry_their_kind() {
        assert_eq!(Cw::KIND, TierKind::Cw);
        assert_eq!(Sca::KIND, TierKind::Sca);
        assert_eq!(Sdi::KIND.rank(), TIER_COUNT - 1);
    }
}
