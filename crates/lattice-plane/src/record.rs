//! Research identifiers stored per tier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tier::TierKind;

/// At most one research id per tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRecord {
    entries: BTreeMap<TierKind, String>,
}

impl ResearchRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `id` under `tier`, returning the id it replaced.
    pub fn write(&mut self, tier: TierKind, id: impl Into<String>) -> Result<Option<String>> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::EmptyResearchId);
        }
        Ok(self.entries.insert(tier, id))
    }

    pub fn read(&self, tier: TierKind) -> Option<&str> {
        self.entries.get(&tier).map(String::as_str)
    }

    pub fn clear(&mut self, tier: TierKind) -> Option<String> {
        self.entries.remove(&tier)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in tier order.
    pub fn iter(&self) -> impl Iterator<Item = (TierKind, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A portable carrier of a [`ResearchRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    /// Only readable from a data bank.
    pub requires_data_bank: bool,
    pub record: ResearchRecord,
}

impl DataItem {
    pub fn new(requires_data_bank: bool) -> Self {
        Self {
            requires_data_bank,
            record: ResearchRecord::new(),
        }
    }

    pub fn usable_in(&self, is_data_bank: bool) -> bool {
        !self.requires_data_bank || is_data_bank
    }
}
