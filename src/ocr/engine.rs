use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

use super::preprocess::{binarize, crop_pixels};
use crate::config::PixelRect;

/// Represents a line of OCR text with confidence score
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub words: Vec<OcrWord>,
    pub confidence: f32,
}

/// Represents a single word from OCR with confidence score (0-100)
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f32,
}

impl OcrLine {
    /// Builds a line from its words, averaging their confidence.
    pub fn from_words(words: Vec<OcrWord>) -> Self {
        let confidence = if words.is_empty() {
            0.0
        } else {
            words.iter().map(|w| w.confidence).sum::<f32>() / words.len() as f32
        };
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            words,
            confidence,
        }
    }
}

/// Anything that can turn a screenshot file into recognized lines.
pub trait Recognizer {
    fn recognize_file(&self, path: &Path) -> Result<Vec<OcrLine>>;
}

/// Runs the tesseract CLI on preprocessed screenshots.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    pub executable: PathBuf,
    pub tessdata: Option<PathBuf>,
    pub threshold: u8,
    pub crop: Option<PixelRect>,
}

impl TesseractRecognizer {
    /// Loads, crops and binarizes a screenshot the way the recognizer sees it.
    pub fn preprocess(&self, path: &Path) -> Result<GrayImage> {
        let img = image::open(path)
            .context(format!("Failed to open image: {}", path.display()))?
            .to_rgba8();
        let img = match &self.crop {
            Some(rect) => crop_pixels(&img, rect),
            None => img,
        };
        Ok(binarize(&img, self.threshold))
    }

    /// Runs tesseract on a preprocessed grayscale image.
    pub fn recognize_image(&self, img: &GrayImage) -> Result<Vec<OcrLine>> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        // Tesseract appends .tsv to the output base
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let mut command = Command::new(&self.executable);
        command.arg(temp_input.path()).arg(&output_base);
        if let Some(tessdata) = &self.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        let output = command
            .arg("-l")
            .arg("eng")
            .arg("--psm")
            .arg("6") // Assume single uniform block of text
            .arg("tsv")
            .output()
            .context(format!(
                "Failed to run tesseract at {}",
                self.executable.display()
            ))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = std::fs::remove_file(&tsv_path);

        Ok(parse_tsv_output(&tsv_content))
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize_file(&self, path: &Path) -> Result<Vec<OcrLine>> {
        let preprocessed = self.preprocess(path)?;
        let lines = self.recognize_image(&preprocessed)?;
        crate::log(&format!(
            "Recognized {} lines in {}",
            lines.len(),
            path.display()
        ));
        Ok(lines)
    }
}

/// Parses Tesseract TSV output into lines of words.
///
/// Only word rows (level 5) are used. A physical line is identified by its
/// (block, paragraph, line) numbers; rows with negative confidence are dropped.
pub fn parse_tsv_output(tsv: &str) -> Vec<OcrLine> {
    let mut lines: Vec<OcrLine> = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut current_words: Vec<OcrWord> = Vec::new();

    // Skip header
    for row in tsv.lines().skip(1) {
        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let key: (i32, i32, i32) = (
            fields[2].parse().unwrap_or(-1),
            fields[3].parse().unwrap_or(-1),
            fields[4].parse().unwrap_or(-1),
        );
        if current_key.is_some_and(|k| k != key) && !current_words.is_empty() {
            lines.push(OcrLine::from_words(std::mem::take(&mut current_words)));
        }
        current_key = Some(key);

        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        if conf >= 0.0 {
            current_words.push(OcrWord {
                text: text.to_string(),
                confidence: conf,
            });
        }
    }

    if !current_words.is_empty() {
        lines.push(OcrLine::from_words(current_words));
    }

    lines
}
