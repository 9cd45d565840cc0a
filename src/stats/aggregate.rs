//! First-write-wins aggregation of player records across OCR passes.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::schema::{PlayerRecord, StatField, StatKey, MANUAL_CONFIDENCE};

/// Outcome of merging one batch of records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Records stored under a new family name
    pub inserted: usize,
    /// Records discarded because the name was already present
    pub duplicates: usize,
}

/// All players collected in the current session, one record per family name.
///
/// Serializes as the flat record array used by history and export.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PlayerRecord>", into = "Vec<PlayerRecord>")]
pub struct AggregatedCollection {
    records: BTreeMap<String, PlayerRecord>,
}

impl AggregatedCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk load for restoring saved data.
    ///
    /// Unlike `merge`, a repeated name keeps its last record, so reloading a
    /// saved array reproduces what the later entry says.
    pub fn from_records(records: impl IntoIterator<Item = PlayerRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.family_name.clone(), record))
            .collect();
        Self { records }
    }

    /// Inserts each record whose family name is not yet present, in input order.
    ///
    /// Existing entries are never overwritten, so the first capture of a
    /// player stays authoritative for the whole session.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = PlayerRecord>) -> MergeSummary {
        let mut summary = MergeSummary::default();
        for record in incoming {
            if self.records.contains_key(&record.family_name) {
                summary.duplicates += 1;
                continue;
            }
            self.records.insert(record.family_name.clone(), record);
            summary.inserted += 1;
        }
        summary
    }

    /// Overwrites one stat with a manually verified value.
    pub fn correct_field(&mut self, family_name: &str, key: StatKey, value: i64) -> Result<()> {
        let record = self
            .records
            .get_mut(family_name)
            .ok_or_else(|| anyhow!("No player named '{}' in the current analysis", family_name))?;
        *record.stat_mut(key) = StatField::numeric(value, MANUAL_CONFIDENCE);
        Ok(())
    }

    /// Deletes a spurious detection, returning it.
    pub fn remove(&mut self, family_name: &str) -> Option<PlayerRecord> {
        self.records.remove(family_name)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn get(&self, family_name: &str) -> Option<&PlayerRecord> {
        self.records.get(family_name)
    }

    pub fn contains(&self, family_name: &str) -> bool {
        self.records.contains_key(family_name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in family-name order.
    pub fn records(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.records.values()
    }

    pub fn to_records(&self) -> Vec<PlayerRecord> {
        self.records.values().cloned().collect()
    }
}

impl From<Vec<PlayerRecord>> for AggregatedCollection {
    fn from(records: Vec<PlayerRecord>) -> Self {
        Self::from_records(records)
    }
}

impl From<AggregatedCollection> for Vec<PlayerRecord> {
    fn from(collection: AggregatedCollection) -> Self {
        collection.records.into_values().collect()
    }
}
