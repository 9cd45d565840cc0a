//! The analysis session: the aggregated table plus its sort state.
//!
//! Persisted as JSON between invocations so that passes, edits and re-sorts
//! made by separate commands accumulate into one table.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ocr::{OcrLine, Recognizer};
use crate::paths::write_json_atomic;
use crate::stats::{
    rank, AggregatedCollection, MergeSummary, PlayerRecord, RecordBuilder, SortColumn, SortState,
    StatKey,
};

/// Totals for one `analyze_files` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    pub files_processed: usize,
    pub files_failed: usize,
    pub records_accepted: usize,
    pub players_added: usize,
    pub duplicates_ignored: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSession {
    pub collection: AggregatedCollection,
    #[serde(default)]
    pub sort: SortState,
}

impl AnalysisSession {
    /// Loads the session at `path`; a missing file is an empty session.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read session: {}", path.display()))?;
        serde_json::from_str(&contents)
            .context(format!("Failed to parse session: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
    }

    /// Builds and merges the records of one OCR pass.
    pub fn run_pass(&mut self, builder: &RecordBuilder, lines: &[OcrLine]) -> (usize, MergeSummary) {
        let records = builder.build_all(lines);
        let accepted = records.len();
        (accepted, self.collection.merge(records))
    }

    /// Runs OCR over `files` one at a time, merging each pass in file order.
    ///
    /// Merge order decides which capture of a player wins, so files are never
    /// processed out of order. A file that fails OCR is logged and skipped.
    pub fn analyze_files(
        &mut self,
        recognizer: &dyn Recognizer,
        builder: &RecordBuilder,
        files: &[PathBuf],
    ) -> AnalysisReport {
        let mut report = AnalysisReport::default();

        for (idx, file) in files.iter().enumerate() {
            crate::log(&format!(
                "Processing file {} of {}: {}",
                idx + 1,
                files.len(),
                file.display()
            ));

            let lines = match recognizer.recognize_file(file) {
                Ok(lines) => lines,
                Err(e) => {
                    crate::log(&format!("Error processing {}: {:#}", file.display(), e));
                    report.files_failed += 1;
                    continue;
                }
            };

            let (accepted, merged) = self.run_pass(builder, &lines);
            crate::log(&format!(
                "{}: {} lines, {} records, {} new players, {} duplicates",
                file.display(),
                lines.len(),
                accepted,
                merged.inserted,
                merged.duplicates
            ));

            report.files_processed += 1;
            report.records_accepted += accepted;
            report.players_added += merged.inserted;
            report.duplicates_ignored += merged.duplicates;
        }

        report
    }

    pub fn ranked(&self) -> Vec<&PlayerRecord> {
        rank(&self.collection, &self.sort)
    }

    pub fn sort_by(&mut self, column: SortColumn) {
        self.sort.request(column);
    }

    pub fn correct(&mut self, family_name: &str, key: StatKey, value: i64) -> Result<()> {
        self.collection.correct_field(family_name, key, value)
    }

    pub fn remove(&mut self, family_name: &str) -> Result<PlayerRecord> {
        self.collection
            .remove(family_name)
            .ok_or_else(|| anyhow!("No player named '{}' in the current analysis", family_name))
    }

    /// Clears the table; the sort state is kept.
    pub fn reset(&mut self) {
        self.collection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrWord;
    use crate::stats::{SortDirection, StatValue};
    use std::collections::HashMap;
    use tempfile::tempdir;

    /// Returns canned lines per file name; unknown files fail.
    struct FakeRecognizer {
        pages: HashMap<PathBuf, Vec<OcrLine>>,
    }

    impl Recognizer for FakeRecognizer {
        fn recognize_file(&self, path: &Path) -> Result<Vec<OcrLine>> {
            self.pages
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("unreadable image"))
        }
    }

    fn line(texts: &[&str]) -> OcrLine {
        OcrLine::from_words(
            texts
                .iter()
                .map(|t| OcrWord {
                    text: t.to_string(),
                    confidence: 91.0,
                })
                .collect(),
        )
    }

    fn fake() -> FakeRecognizer {
        let mut pages = HashMap::new();
        pages.insert(
            PathBuf::from("first.png"),
            vec![
                line(&["Family", "Name", "CP", "Forts", "Gates"]),
                line(&["Anchar", "1", "0", "2", "0", "4", "10", "2"]),
                line(&["Bob", "0", "0", "0", "0", "1", "5", "5"]),
            ],
        );
        pages.insert(
            PathBuf::from("second.png"),
            vec![
                line(&["Anghar", "9", "9", "9", "9", "9", "99", "1"]),
                line(&["Cid", "0", "0", "0", "0", "0", "10", "0"]),
                line(&["Noise", "x"]),
            ],
        );
        FakeRecognizer { pages }
    }

    #[test]
    fn test_analyze_files_merges_in_file_order() {
        let mut session = AnalysisSession::default();
        let files = vec![PathBuf::from("first.png"), PathBuf::from("second.png")];

        let report = session.analyze_files(&fake(), &RecordBuilder::default(), &files);

        assert_eq!(
            report,
            AnalysisReport {
                files_processed: 2,
                files_failed: 0,
                records_accepted: 4,
                players_added: 3,
                duplicates_ignored: 1,
            }
        );
        // "Anchar" was corrected to "Anghar" in the first file and wins
        let anghar = session.collection.get("Anghar").unwrap();
        assert_eq!(anghar.kills.value, StatValue::Numeric(10));
    }

    #[test]
    fn test_failed_file_is_skipped() {
        let mut session = AnalysisSession::default();
        let files = vec![PathBuf::from("missing.png"), PathBuf::from("second.png")];

        let report = session.analyze_files(&fake(), &RecordBuilder::default(), &files);

        assert_eq!(report.files_failed, 1);
        assert_eq!(report.files_processed, 1);
        assert_eq!(session.collection.len(), 2);
    }

    #[test]
    fn test_ranked_uses_session_sort() {
        let mut session = AnalysisSession::default();
        session.analyze_files(
            &fake(),
            &RecordBuilder::default(),
            &[PathBuf::from("first.png"), PathBuf::from("second.png")],
        );

        let names: Vec<&str> = session.ranked().iter().map(|r| r.family_name.as_str()).collect();
        assert_eq!(names, vec!["Anghar", "Cid", "Bob"]);

        session.sort_by(SortColumn::KdRatio);
        assert_eq!(session.sort.direction, SortDirection::Desc);
        let names: Vec<&str> = session.ranked().iter().map(|r| r.family_name.as_str()).collect();
        // Cid: 10 (no deaths), Anghar: 5, Bob: 1
        assert_eq!(names, vec!["Cid", "Anghar", "Bob"]);
    }

    #[test]
    fn test_correct_and_remove() {
        let mut session = AnalysisSession::default();
        session.analyze_files(&fake(), &RecordBuilder::default(), &[PathBuf::from("first.png")]);

        session.correct("Bob", StatKey::Deaths, 1).unwrap();
        assert_eq!(session.collection.get("Bob").unwrap().deaths.confidence, 100.0);
        assert!(session.correct("Nobody", StatKey::Deaths, 1).is_err());

        assert!(session.remove("Bob").is_ok());
        assert!(session.remove("Bob").is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = AnalysisSession::default();
        session.analyze_files(&fake(), &RecordBuilder::default(), &[PathBuf::from("first.png")]);
        session.sort_by(SortColumn::Stat(StatKey::Deaths));
        session.save(&path).unwrap();

        let restored = AnalysisSession::load(&path).unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let session = AnalysisSession::load(&dir.path().join("none.json")).unwrap();
        assert!(session.collection.is_empty());
        assert_eq!(session.sort, SortState::default());
    }

    #[test]
    fn test_reset_keeps_sort() {
        let mut session = AnalysisSession::default();
        session.analyze_files(&fake(), &RecordBuilder::default(), &[PathBuf::from("first.png")]);
        session.sort_by(SortColumn::KdRatio);
        session.reset();

        assert!(session.collection.is_empty());
        assert_eq!(session.sort.column, SortColumn::KdRatio);
    }
}
