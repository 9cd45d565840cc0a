//! Maps classified lines onto the stat schema and applies the acceptance policy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::classify::{classify_line, clean_token, parse_leading_int, ClassifiedLine};
use super::schema::{PlayerRecord, StatField, StatKey, MANUAL_CONFIDENCE};
use crate::ocr::{OcrLine, OcrWord};

/// Tunable constants used while turning OCR words into stat fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsePolicy {
    /// A record is kept only while its unreadable/missing field count stays below this
    #[serde(default = "default_max_field_errors")]
    pub max_field_errors: usize,
    /// Numeric cells below this confidence are flagged for manual review
    #[serde(default = "default_low_confidence_threshold")]
    pub low_confidence_threshold: f32,
    /// Raise OCR confidence of a parsed `0` to 100 when it falls in
    /// (`zero_boost_floor`, `low_confidence_threshold`)
    #[serde(default = "default_zero_confidence_boost")]
    pub zero_confidence_boost: bool,
    #[serde(default = "default_zero_boost_floor")]
    pub zero_boost_floor: f32,
}

fn default_max_field_errors() -> usize {
    3
}

fn default_low_confidence_threshold() -> f32 {
    85.0
}

fn default_zero_confidence_boost() -> bool {
    true
}

fn default_zero_boost_floor() -> f32 {
    60.0
}

impl Default for ParsePolicy {
    fn default() -> Self {
        Self {
            max_field_errors: default_max_field_errors(),
            low_confidence_threshold: default_low_confidence_threshold(),
            zero_confidence_boost: default_zero_confidence_boost(),
            zero_boost_floor: default_zero_boost_floor(),
        }
    }
}

impl ParsePolicy {
    pub fn is_low_confidence(&self, confidence: f32) -> bool {
        confidence < self.low_confidence_threshold
    }

    /// Tesseract under-reports confidence on this font's zero glyph.
    fn adjust_zero_confidence(&self, value: i64, confidence: f32) -> f32 {
        if self.zero_confidence_boost
            && value == 0
            && confidence > self.zero_boost_floor
            && confidence < self.low_confidence_threshold
        {
            MANUAL_CONFIDENCE
        } else {
            confidence
        }
    }
}

/// Known OCR misreadings of family names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrectionTable(HashMap<String, String>);

impl Default for CorrectionTable {
    fn default() -> Self {
        let mut table = HashMap::new();
        table.insert("IVP".to_string(), "JVP".to_string());
        table.insert("Anchar".to_string(), "Anghar".to_string());
        Self(table)
    }
}

impl CorrectionTable {
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, misread: impl Into<String>, corrected: impl Into<String>) {
        self.0.insert(misread.into(), corrected.into());
    }

    pub fn extend(&mut self, other: &CorrectionTable) {
        for (misread, corrected) in &other.0 {
            self.insert(misread.clone(), corrected.clone());
        }
    }

    /// Exact-match lookup; unknown names pass through unchanged.
    pub fn apply(&self, name: String) -> String {
        match self.0.get(&name) {
            Some(corrected) => corrected.clone(),
            None => name,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Turns OCR lines into player records.
#[derive(Clone, Debug, Default)]
pub struct RecordBuilder {
    pub policy: ParsePolicy,
    pub corrections: CorrectionTable,
}

impl RecordBuilder {
    pub fn new(policy: ParsePolicy, corrections: CorrectionTable) -> Self {
        Self {
            policy,
            corrections,
        }
    }

    /// Classifies and builds one line. `None` means the line was noise.
    pub fn build(&self, line: &OcrLine) -> Option<PlayerRecord> {
        classify_line(&line.words).and_then(|classified| self.build_classified(classified))
    }

    /// Builds every accepted record of one OCR pass, in line order.
    pub fn build_all(&self, lines: &[OcrLine]) -> Vec<PlayerRecord> {
        lines.iter().filter_map(|line| self.build(line)).collect()
    }

    pub fn build_classified(&self, classified: ClassifiedLine<'_>) -> Option<PlayerRecord> {
        let name = self.corrections.apply(classified.name);

        let mut errors = 0;
        let fields = StatKey::ALL.map(|key| {
            let word = classified.numbers.get(key as usize).copied();
            let (field, readable) = self.field_from_word(word);
            if !readable {
                errors += 1;
            }
            field
        });

        if errors >= self.policy.max_field_errors {
            crate::log(&format!(
                "Dropping line for '{}': {} unreadable fields",
                name, errors
            ));
            return None;
        }

        Some(PlayerRecord::from_fields(name, fields))
    }

    fn field_from_word(&self, word: Option<&OcrWord>) -> (StatField, bool) {
        let Some(word) = word else {
            return (StatField::missing(), false);
        };

        match parse_leading_int(&clean_token(&word.text)) {
            Some(value) => {
                let confidence = self.policy.adjust_zero_confidence(value, word.confidence);
                (StatField::numeric(value, confidence), true)
            }
            None => (StatField::unreadable(word.text.clone(), word.confidence), false),
        }
    }
}
