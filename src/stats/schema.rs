//! Record schema shared by every stage of the pipeline.
//!
//! A battle-report line carries a family name followed by seven stat columns.
//! Columns are identified purely by position, so `StatKey::ALL` is load-bearing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};

/// Value stored when a stat column is missing from the OCR line.
pub const MISSING_SENTINEL: &str = "???";

/// Confidence assigned to manually corrected values.
pub const MANUAL_CONFIDENCE: f32 = 100.0;

/// One of the seven positional stat columns of the battle report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatKey {
    CommandPostDestroyed,
    FortsDestroyed,
    GatesDestroyed,
    MountsKilled,
    ObjectsDestroyed,
    Kills,
    Deaths,
}

impl StatKey {
    /// Schema order: numeric tokens are assigned to keys in this order.
    pub const ALL: [StatKey; 7] = [
        StatKey::CommandPostDestroyed,
        StatKey::FortsDestroyed,
        StatKey::GatesDestroyed,
        StatKey::MountsKilled,
        StatKey::ObjectsDestroyed,
        StatKey::Kills,
        StatKey::Deaths,
    ];

    /// Field name used in exports and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            StatKey::CommandPostDestroyed => "commandPostDestroyed",
            StatKey::FortsDestroyed => "fortsDestroyed",
            StatKey::GatesDestroyed => "gatesDestroyed",
            StatKey::MountsKilled => "mountsKilled",
            StatKey::ObjectsDestroyed => "objectsDestroyed",
            StatKey::Kills => "kills",
            StatKey::Deaths => "deaths",
        }
    }

    /// Short column header for the text table.
    pub fn label(self) -> &'static str {
        match self {
            StatKey::CommandPostDestroyed => "CP",
            StatKey::FortsDestroyed => "Forts",
            StatKey::GatesDestroyed => "Gates",
            StatKey::MountsKilled => "Mounts",
            StatKey::ObjectsDestroyed => "Objects",
            StatKey::Kills => "Kills",
            StatKey::Deaths => "Deaths",
        }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatKey::ALL
            .into_iter()
            .find(|key| key.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow!("Unknown stat '{}'", s))
    }
}

/// The value of a stat cell: either a parsed integer or the raw OCR text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Numeric(i64),
    Unreadable(String),
}

impl StatValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            StatValue::Numeric(n) => Some(*n),
            StatValue::Unreadable(_) => None,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Numeric(n) => write!(f, "{}", n),
            StatValue::Unreadable(text) => f.write_str(text),
        }
    }
}

/// One stat cell with the OCR engine's confidence (0-100).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatField {
    pub value: StatValue,
    pub confidence: f32,
}

impl StatField {
    pub fn numeric(value: i64, confidence: f32) -> Self {
        Self {
            value: StatValue::Numeric(value),
            confidence,
        }
    }

    pub fn unreadable(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            value: StatValue::Unreadable(text.into()),
            confidence,
        }
    }

    /// Placeholder for a column the OCR line did not contain at all.
    pub fn missing() -> Self {
        Self::unreadable(MISSING_SENTINEL, 0.0)
    }

    pub fn is_readable(&self) -> bool {
        matches!(self.value, StatValue::Numeric(_))
    }
}

/// One player's stats from a single OCR pass, keyed by family name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub family_name: String,
    pub command_post_destroyed: StatField,
    pub forts_destroyed: StatField,
    pub gates_destroyed: StatField,
    pub mounts_killed: StatField,
    pub objects_destroyed: StatField,
    pub kills: StatField,
    pub deaths: StatField,
}

impl PlayerRecord {
    /// Builds a record from fields given in schema order.
    pub fn from_fields(family_name: impl Into<String>, fields: [StatField; 7]) -> Self {
        let [
            command_post_destroyed,
            forts_destroyed,
            gates_destroyed,
            mounts_killed,
            objects_destroyed,
            kills,
            deaths,
        ] = fields;
        Self {
            family_name: family_name.into(),
            command_post_destroyed,
            forts_destroyed,
            gates_destroyed,
            mounts_killed,
            objects_destroyed,
            kills,
            deaths,
        }
    }

    pub fn stat(&self, key: StatKey) -> &StatField {
        match key {
            StatKey::CommandPostDestroyed => &self.command_post_destroyed,
            StatKey::FortsDestroyed => &self.forts_destroyed,
            StatKey::GatesDestroyed => &self.gates_destroyed,
            StatKey::MountsKilled => &self.mounts_killed,
            StatKey::ObjectsDestroyed => &self.objects_destroyed,
            StatKey::Kills => &self.kills,
            StatKey::Deaths => &self.deaths,
        }
    }

    pub fn stat_mut(&mut self, key: StatKey) -> &mut StatField {
        match key {
            StatKey::CommandPostDestroyed => &mut self.command_post_destroyed,
            StatKey::FortsDestroyed => &mut self.forts_destroyed,
            StatKey::GatesDestroyed => &mut self.gates_destroyed,
            StatKey::MountsKilled => &mut self.mounts_killed,
            StatKey::ObjectsDestroyed => &mut self.objects_destroyed,
            StatKey::Kills => &mut self.kills,
            StatKey::Deaths => &mut self.deaths,
        }
    }

    /// Iterates stats in schema order.
    pub fn stats(&self) -> impl Iterator<Item = (StatKey, &StatField)> {
        StatKey::ALL.into_iter().map(move |key| (key, self.stat(key)))
    }
}
