//! Saved analyses, newest first.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::paths::write_json_atomic;
use crate::stats::{AggregatedCollection, PlayerRecord};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Milliseconds since the Unix epoch at save time
    pub id: i64,
    pub name: String,
    pub data: Vec<PlayerRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read history: {}", path.display()))?;
        serde_json::from_str(&contents)
            .context(format!("Failed to parse history: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Snapshots the collection as a new entry at the front of the list.
    pub fn record(
        &mut self,
        collection: &AggregatedCollection,
        at: DateTime<Local>,
    ) -> Result<&HistoryEntry> {
        if collection.is_empty() {
            bail!("No data to save");
        }
        let entry = HistoryEntry {
            id: at.timestamp_millis(),
            name: format!("Analysis - {}", at.format("%Y-%m-%d %H:%M:%S")),
            data: collection.to_records(),
        };
        self.entries.insert(0, entry);
        Ok(&self.entries[0])
    }

    pub fn get(&self, id: i64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Rebuilds a collection from a saved entry.
    pub fn restore(&self, id: i64) -> Result<AggregatedCollection> {
        let entry = self
            .get(id)
            .ok_or_else(|| anyhow!("No saved analysis with id {}", id))?;
        Ok(AggregatedCollection::from_records(entry.data.iter().cloned()))
    }

    /// Removes an entry; returns whether anything was deleted.
    pub fn delete(&mut self, id: i64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }
}
