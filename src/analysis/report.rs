//! Plain-text rendering of the ranked table.
//!
//! Cell markers: `?` low-confidence number, `!` unreadable value,
//! `*` family name not found in any roster.

use std::collections::BTreeSet;

use crate::stats::{kd_ratio, ParsePolicy, PlayerRecord, StatField, StatKey, StatValue};

const NAME_WIDTH: usize = 20;
const CELL_WIDTH: usize = 9;

fn format_cell(field: &StatField, policy: &ParsePolicy) -> String {
    match &field.value {
        StatValue::Numeric(n) if policy.is_low_confidence(field.confidence) => format!("{}?", n),
        StatValue::Numeric(n) => n.to_string(),
        StatValue::Unreadable(text) => format!("!{}", text),
    }
}

/// Two decimals; `N/A` when kills or deaths is unreadable.
pub fn format_kd(record: &PlayerRecord) -> String {
    kd_ratio(record)
        .map(|kd| format!("{:.2}", kd))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Renders ranked records as an aligned table with a summary line.
///
/// Names are checked against `roster` only when it is non-empty.
pub fn render_table(
    records: &[&PlayerRecord],
    policy: &ParsePolicy,
    roster: &BTreeSet<String>,
) -> String {
    let mut out = format!("Players Found: {}\n", records.len());
    if records.is_empty() {
        out.push_str("No data to display.\n");
        return out;
    }

    let mut header = format!("{:<width$}", "Family Name", width = NAME_WIDTH);
    for key in StatKey::ALL {
        header.push_str(&format!("{:>width$}", key.label(), width = CELL_WIDTH));
    }
    header.push_str(&format!("{:>width$}", "K/D", width = CELL_WIDTH));
    out.push_str(header.trim_end());
    out.push('\n');

    for record in records {
        let mut name = record.family_name.clone();
        if !roster.is_empty() && !roster.contains(&record.family_name) {
            name.push('*');
        }
        let mut row = format!("{:<width$}", name, width = NAME_WIDTH);
        for (_, field) in record.stats() {
            row.push_str(&format!(
                "{:>width$}",
                format_cell(field, policy),
                width = CELL_WIDTH
            ));
        }
        row.push_str(&format!("{:>width$}", format_kd(record), width = CELL_WIDTH));
        out.push_str(row.trim_end());
        out.push('\n');
    }

    let flagged = records
        .iter()
        .flat_map(|record| record.stats())
        .filter(|(_, field)| !field.is_readable() || policy.is_low_confidence(field.confidence))
        .count();
    if flagged > 0 {
        out.push_str(&format!("{} cells need review (? low confidence, ! unreadable)\n", flagged));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, kills: StatField, deaths: StatField) -> PlayerRecord {
        PlayerRecord::from_fields(
            name,
            [
                StatField::numeric(1, 95.0),
                StatField::numeric(0, 95.0),
                StatField::numeric(0, 95.0),
                StatField::numeric(0, 95.0),
                StatField::numeric(2, 95.0),
                kills,
                deaths,
            ],
        )
    }

    #[test]
    fn test_format_kd() {
        let r = record("A", StatField::numeric(7, 95.0), StatField::numeric(2, 95.0));
        assert_eq!(format_kd(&r), "3.50");
        let r = record("A", StatField::numeric(7, 95.0), StatField::numeric(0, 95.0));
        assert_eq!(format_kd(&r), "7.00");
        let r = record("A", StatField::numeric(7, 95.0), StatField::missing());
        assert_eq!(format_kd(&r), "N/A");
    }

    #[test]
    fn test_render_marks_cells_and_names() {
        let policy = ParsePolicy::default();
        let roster: BTreeSet<String> = ["Anghar".to_string()].into_iter().collect();
        let a = record("Anghar", StatField::numeric(7, 60.0), StatField::numeric(2, 95.0));
        let b = record("Stranger", StatField::numeric(3, 95.0), StatField::unreadable("l", 20.0));

        let table = render_table(&[&a, &b], &policy, &roster);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "Players Found: 2");
        assert!(lines[1].starts_with("Family Name"));
        assert!(lines[2].starts_with("Anghar "));
        assert!(lines[2].contains("7?"));
        assert!(lines[2].ends_with("3.50"));
        assert!(lines[3].starts_with("Stranger*"));
        assert!(lines[3].contains("!l"));
        assert!(lines[3].ends_with("N/A"));
        assert_eq!(lines[4], "2 cells need review (? low confidence, ! unreadable)");
    }

    #[test]
    fn test_render_without_roster_flags_nobody() {
        let policy = ParsePolicy::default();
        let a = record("Anghar", StatField::numeric(7, 95.0), StatField::numeric(2, 95.0));
        let table = render_table(&[&a], &policy, &BTreeSet::new());
        assert!(!table.contains('*'));
        assert!(!table.contains("need review"));
    }

    #[test]
    fn test_render_empty() {
        let table = render_table(&[], &ParsePolicy::default(), &BTreeSet::new());
        assert_eq!(table, "Players Found: 0\nNo data to display.\n");
    }
}
