//! Splits one OCR line into a family name and its stat tokens.

use crate::ocr::OcrWord;

/// Substring of the table header row that must never become a player.
const HEADER_MARKER: &str = "family name";

/// A line that survived classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine<'a> {
    /// Cleaned name tokens joined by single spaces.
    pub name: String,
    /// Every word from the first digit-led token onwards, untouched.
    pub numbers: Vec<&'a OcrWord>,
}

/// Strips everything outside `[A-Za-z0-9]`.
pub fn clean_token(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Parses the leading run of digits, ignoring whatever follows ("12b" -> 12).
///
/// Returns `None` when the text does not start with a digit or the digit run
/// overflows `i64`.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    text[..end].parse().ok()
}

/// True when the cleaned text opens with a digit run, however long.
fn starts_with_digit(cleaned: &str) -> bool {
    cleaned.starts_with(|c: char| c.is_ascii_digit())
}

/// Classifies a line as `name + numbers`, or rejects it.
///
/// Lines with fewer than two tokens left after cleaning are rejected. The
/// transition into the number region is one-way: after the first word whose
/// cleaned text starts with a digit, every remaining word is a stat token even
/// if it reads like part of a name.
pub fn classify_line(words: &[OcrWord]) -> Option<ClassifiedLine<'_>> {
    let tokens: Vec<(&OcrWord, String)> = words
        .iter()
        .map(|word| (word, clean_token(&word.text)))
        .filter(|(_, cleaned)| !cleaned.is_empty())
        .collect();
    if tokens.len() < 2 {
        return None;
    }

    let mut name_parts: Vec<String> = Vec::new();
    let mut numbers: Vec<&OcrWord> = Vec::new();
    let mut in_numbers = false;

    for (word, cleaned) in tokens {
        if !in_numbers && !starts_with_digit(&cleaned) {
            name_parts.push(cleaned);
        } else {
            in_numbers = true;
            numbers.push(word);
        }
    }

    let name = name_parts.join(" ").trim().to_string();
    if name.is_empty() || name.to_lowercase().contains(HEADER_MARKER) {
        return None;
    }

    Some(ClassifiedLine { name, numbers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(texts: &[&str]) -> Vec<OcrWord> {
        texts
            .iter()
            .map(|t| OcrWord {
                text: t.to_string(),
                confidence: 90.0,
            })
            .collect()
    }

    fn number_texts(line: &ClassifiedLine<'_>) -> Vec<String> {
        line.numbers.iter().map(|w| w.text.clone()).collect()
    }

    #[test]
    fn test_clean_token() {
        assert_eq!(clean_token("[Jon]"), "Jon");
        assert_eq!(clean_token("1,234"), "1234");
        assert_eq!(clean_token("—|"), "");
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("12b"), Some(12));
        assert_eq!(parse_leading_int("0"), Some(0));
        assert_eq!(parse_leading_int("b12"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("99999999999999999999999"), None);
    }

    #[test]
    fn test_rejects_single_word_lines() {
        assert!(classify_line(&words(&["Anghar"])).is_none());
        assert!(classify_line(&[]).is_none());
    }

    #[test]
    fn test_splits_name_and_numbers() {
        let line = words(&["Big", "Bob", "1", "0", "2", "0", "14", "7", "3"]);
        let classified = classify_line(&line).unwrap();
        assert_eq!(classified.name, "Big Bob");
        assert_eq!(
            number_texts(&classified),
            vec!["1", "0", "2", "0", "14", "7", "3"]
        );
    }

    #[test]
    fn test_number_region_is_one_way() {
        let line = words(&["Jon", "99", "Doe"]);
        let classified = classify_line(&line).unwrap();
        assert_eq!(classified.name, "Jon");
        assert_eq!(number_texts(&classified), vec!["99", "Doe"]);
    }

    #[test]
    fn test_oversized_digit_run_still_starts_numbers() {
        let line = words(&["Jon", "99999999999999999999", "1"]);
        let classified = classify_line(&line).unwrap();
        assert_eq!(classified.name, "Jon");
        assert_eq!(number_texts(&classified), vec!["99999999999999999999", "1"]);
    }

    #[test]
    fn test_rejects_lines_with_one_cleaned_token() {
        assert!(classify_line(&words(&["Anghar", "|"])).is_none());
        assert!(classify_line(&words(&["--", "5", "%%"])).is_none());
    }

    #[test]
    fn test_number_tokens_keep_raw_word() {
        let line = words(&["Jon", "(12)", "4"]);
        let classified = classify_line(&line).unwrap();
        assert_eq!(number_texts(&classified), vec!["(12)", "4"]);
    }

    #[test]
    fn test_skips_punctuation_only_words() {
        let line = words(&["|", "Anchar", "—", "5"]);
        let classified = classify_line(&line).unwrap();
        assert_eq!(classified.name, "Anchar");
        assert_eq!(number_texts(&classified), vec!["5"]);
    }

    #[test]
    fn test_rejects_empty_name() {
        assert!(classify_line(&words(&["12", "4", "7"])).is_none());
        assert!(classify_line(&words(&["--", "%%"])).is_none());
    }

    #[test]
    fn test_rejects_header_row() {
        let header = words(&["Family", "Name", "Command", "Post", "Kills", "Deaths"]);
        assert!(classify_line(&header).is_none());

        let shouting = words(&["FAMILY", "NAME:", "0"]);
        assert!(classify_line(&shouting).is_none());
    }
}
