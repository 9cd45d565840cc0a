//! XML, CSV and JSON export of the aggregated table.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::stats::{PlayerRecord, StatKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Xml,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xml => "xml",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// `GuildStats_<date>.<ext>`
pub fn default_filename(format: ExportFormat, date: NaiveDate) -> String {
    format!("GuildStats_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// One `<Player>` element per record; stats carry their confidence as an attribute.
pub fn to_xml(records: &[&PlayerRecord]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<GuildStats>\n");
    for record in records {
        xml.push_str("  <Player>\n");
        let _ = writeln!(
            xml,
            "    <familyName>{}</familyName>",
            escape_xml(&record.family_name)
        );
        for (key, field) in record.stats() {
            let _ = writeln!(
                xml,
                "    <{name} confidence=\"{confidence}\">{value}</{name}>",
                name = key.name(),
                confidence = field.confidence,
                value = escape_xml(&field.value.to_string())
            );
        }
        xml.push_str("  </Player>\n");
    }
    xml.push_str("</GuildStats>\n");
    xml
}

fn escape_csv(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn csv_header() -> String {
    let mut columns = vec!["familyName".to_string()];
    for key in StatKey::ALL {
        columns.push(key.name().to_string());
        columns.push(format!("{}Confidence", key.name()));
    }
    columns.join(",")
}

/// Header plus one row per record: name, then value and confidence per stat.
pub fn to_csv(records: &[&PlayerRecord]) -> String {
    let mut csv = csv_header();
    csv.push('\n');
    for record in records {
        let mut row = vec![escape_csv(&record.family_name)];
        for (_, field) in record.stats() {
            row.push(escape_csv(&field.value.to_string()));
            row.push(field.confidence.to_string());
        }
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

/// The flat record array, same shape as saved history data.
pub fn to_json(records: &[&PlayerRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize records to JSON")
}

/// Writes `records` to `output_path` in `format`.
pub fn export_records(records: &[&PlayerRecord], format: ExportFormat, output_path: &Path) -> Result<()> {
    if records.is_empty() {
        bail!("No data to export");
    }

    let contents = match format {
        ExportFormat::Xml => to_xml(records),
        ExportFormat::Csv => to_csv(records),
        ExportFormat::Json => to_json(records)?,
    };

    let mut file = File::create(output_path)
        .context(format!("Failed to create export file: {}", output_path.display()))?;
    file.write_all(contents.as_bytes())
        .context("Failed to write export data")?;

    crate::log(&format!(
        "Exported {} players to {}",
        records.len(),
        output_path.display()
    ));
    Ok(())
}
