//! Sorting of the aggregated table.
//!
//! Unreadable values rank as -1, so they sink to the bottom of the default
//! descending view. The derived `kdRatio` column falls back to raw kills when
//! deaths is zero or unreadable.

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::aggregate::AggregatedCollection;
use super::schema::{PlayerRecord, StatKey};

/// Key used in place of a missing or unparseable number.
const UNREADABLE_KEY: f64 = -1.0;

/// Column the table can be sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortColumn {
    FamilyName,
    Stat(StatKey),
    KdRatio,
}

impl SortColumn {
    pub fn name(self) -> &'static str {
        match self {
            SortColumn::FamilyName => "familyName",
            SortColumn::Stat(key) => key.name(),
            SortColumn::KdRatio => "kdRatio",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("kdRatio") || s.eq_ignore_ascii_case("kd") {
            return Ok(SortColumn::KdRatio);
        }
        if s.eq_ignore_ascii_case("familyName") || s.eq_ignore_ascii_case("name") {
            return Ok(SortColumn::FamilyName);
        }
        s.parse::<StatKey>()
            .map(SortColumn::Stat)
            .map_err(|_| anyhow!("Unknown sort column '{}'", s))
    }
}

impl TryFrom<String> for SortColumn {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortColumn> for String {
    fn from(column: SortColumn) -> Self {
        column.name().to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Active column and direction; survives across passes within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: SortColumn::Stat(StatKey::Kills),
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    /// Re-requesting the active column flips direction; a new column starts descending.
    pub fn request(&mut self, column: SortColumn) {
        if self.column == column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column;
            self.direction = SortDirection::Desc;
        }
    }
}

/// Comparable value extracted from a record for the active column.
#[derive(Clone, Debug, PartialEq)]
pub enum SortKey {
    Number(f64),
    Text(String),
}

fn numeric_or_unreadable(record: &PlayerRecord, key: StatKey) -> f64 {
    record
        .stat(key)
        .value
        .as_number()
        .map(|n| n as f64)
        .unwrap_or(UNREADABLE_KEY)
}

fn kd_sort_value(record: &PlayerRecord) -> f64 {
    let kills = numeric_or_unreadable(record, StatKey::Kills);
    let deaths = numeric_or_unreadable(record, StatKey::Deaths);
    if deaths > 0.0 { kills / deaths } else { kills }
}

/// K/D for display; `None` when either side is unreadable.
pub fn kd_ratio(record: &PlayerRecord) -> Option<f64> {
    let kills = record.kills.value.as_number()? as f64;
    let deaths = record.deaths.value.as_number()? as f64;
    Some(if deaths == 0.0 { kills } else { kills / deaths })
}

pub fn sort_key(record: &PlayerRecord, column: SortColumn) -> SortKey {
    match column {
        SortColumn::FamilyName => SortKey::Text(record.family_name.clone()),
        SortColumn::Stat(key) => SortKey::Number(numeric_or_unreadable(record, key)),
        SortColumn::KdRatio => SortKey::Number(kd_sort_value(record)),
    }
}

/// Case-insensitive ordering, falling back to byte order so the result is total.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Ascending comparison. Text sorts after numbers.
pub fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Text(a), SortKey::Text(b)) => compare_text(a, b),
        (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
        (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    }
}

/// Returns the collection's records ordered by `state`, ties broken by family name.
pub fn rank<'a>(collection: &'a AggregatedCollection, state: &SortState) -> Vec<&'a PlayerRecord> {
    let mut keyed: Vec<(SortKey, &PlayerRecord)> = collection
        .records()
        .map(|record| (sort_key(record, state.column), record))
        .collect();

    keyed.sort_by(|(key_a, a), (key_b, b)| {
        state
            .direction
            .apply(compare_keys(key_a, key_b))
            .then_with(|| compare_text(&a.family_name, &b.family_name))
    });

    keyed.into_iter().map(|(_, record)| record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::schema::StatField;

    fn record(name: &str, kills: StatField, deaths: StatField) -> PlayerRecord {
        PlayerRecord::from_fields(
            name,
            [
                StatField::numeric(0, 95.0),
                StatField::numeric(0, 95.0),
                StatField::numeric(0, 95.0),
                StatField::numeric(0, 95.0),
                StatField::numeric(0, 95.0),
                kills,
                deaths,
            ],
        )
    }

    fn num(n: i64) -> StatField {
        StatField::numeric(n, 95.0)
    }

    fn names(ranked: &[&PlayerRecord]) -> Vec<String> {
        ranked.iter().map(|r| r.family_name.clone()).collect()
    }

    fn state(column: SortColumn, direction: SortDirection) -> SortState {
        SortState { column, direction }
    }

    #[test]
    fn test_default_state_is_kills_desc() {
        let state = SortState::default();
        assert_eq!(state.column, SortColumn::Stat(StatKey::Kills));
        assert_eq!(state.direction, SortDirection::Desc);
    }

    #[test]
    fn test_request_toggles_and_resets() {
        let mut state = SortState::default();
        state.request(SortColumn::Stat(StatKey::Kills));
        assert_eq!(state.direction, SortDirection::Asc);
        state.request(SortColumn::Stat(StatKey::Kills));
        assert_eq!(state.direction, SortDirection::Desc);
        state.request(SortColumn::Stat(StatKey::Kills));
        state.request(SortColumn::KdRatio);
        assert_eq!(state.column, SortColumn::KdRatio);
        assert_eq!(state.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_column_parse() {
        assert_eq!("kdRatio".parse::<SortColumn>().unwrap(), SortColumn::KdRatio);
        assert_eq!("familyName".parse::<SortColumn>().unwrap(), SortColumn::FamilyName);
        assert_eq!(
            "deaths".parse::<SortColumn>().unwrap(),
            SortColumn::Stat(StatKey::Deaths)
        );
        assert!("score".parse::<SortColumn>().is_err());
    }

    #[test]
    fn test_kd_zero_deaths_falls_back_to_kills() {
        let collection = AggregatedCollection::from_records(vec![
            record("Even", num(5), num(5)),
            record("Flawless", num(10), num(0)),
        ]);
        let ranked = rank(&collection, &state(SortColumn::KdRatio, SortDirection::Desc));
        assert_eq!(names(&ranked), vec!["Flawless", "Even"]);
    }

    #[test]
    fn test_kd_unreadable_values_rank_as_minus_one() {
        let collection = AggregatedCollection::from_records(vec![
            record("Blurry", StatField::missing(), num(2)),
            record("Zero", num(0), num(3)),
            record("NoDeaths", num(1), StatField::unreadable("x", 30.0)),
        ]);
        let ranked = rank(&collection, &state(SortColumn::KdRatio, SortDirection::Desc));
        // NoDeaths: 1, Zero: 0, Blurry: -1/2
        assert_eq!(names(&ranked), vec!["NoDeaths", "Zero", "Blurry"]);
    }

    #[test]
    fn test_stat_column_desc_and_asc() {
        let collection = AggregatedCollection::from_records(vec![
            record("A", num(3), num(1)),
            record("B", num(12), num(1)),
            record("C", StatField::missing(), num(1)),
            record("D", num(0), num(1)),
        ]);

        let desc = rank(&collection, &state(SortColumn::Stat(StatKey::Kills), SortDirection::Desc));
        assert_eq!(names(&desc), vec!["B", "A", "D", "C"]);

        let asc = rank(&collection, &state(SortColumn::Stat(StatKey::Kills), SortDirection::Asc));
        assert_eq!(names(&asc), vec!["C", "D", "A", "B"]);
    }

    #[test]
    fn test_ties_break_by_name_regardless_of_direction() {
        let collection = AggregatedCollection::from_records(vec![
            record("charlie", num(4), num(1)),
            record("Alpha", num(4), num(1)),
            record("bravo", num(4), num(1)),
        ]);
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let ranked = rank(&collection, &state(SortColumn::Stat(StatKey::Kills), direction));
            assert_eq!(names(&ranked), vec!["Alpha", "bravo", "charlie"]);
        }
    }

    #[test]
    fn test_family_name_column_sorts_case_insensitively() {
        let collection = AggregatedCollection::from_records(vec![
            record("bravo", num(1), num(1)),
            record("Charlie", num(1), num(1)),
            record("alpha", num(1), num(1)),
        ]);
        let desc = rank(&collection, &state(SortColumn::FamilyName, SortDirection::Desc));
        assert_eq!(names(&desc), vec!["Charlie", "bravo", "alpha"]);
    }

    #[test]
    fn test_compare_keys_text_after_numbers() {
        let text = SortKey::Text("abc".to_string());
        let number = SortKey::Number(1000.0);
        assert_eq!(compare_keys(&text, &number), Ordering::Greater);
        assert_eq!(compare_keys(&number, &text), Ordering::Less);
        // Direction applies uniformly, including the mixed case
        assert_eq!(
            SortDirection::Desc.apply(compare_keys(&text, &number)),
            Ordering::Less
        );
    }

    #[test]
    fn test_rank_does_not_mutate_collection() {
        let collection = AggregatedCollection::from_records(vec![
            record("A", num(3), num(1)),
            record("B", num(12), num(1)),
        ]);
        let before = collection.clone();
        let _ = rank(&collection, &SortState::default());
        assert_eq!(collection, before);
    }

    #[test]
    fn test_kd_ratio_display_value() {
        assert_eq!(kd_ratio(&record("A", num(10), num(4))), Some(2.5));
        assert_eq!(kd_ratio(&record("A", num(10), num(0))), Some(10.0));
        assert_eq!(kd_ratio(&record("A", StatField::missing(), num(4))), None);
    }

    #[test]
    fn test_sort_state_serialization() {
        let state = SortState {
            column: SortColumn::KdRatio,
            direction: SortDirection::Asc,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"column":"kdRatio","direction":"asc"}"#);
        let restored: SortState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}
