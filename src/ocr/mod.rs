//! OCR collaborator: screenshot preprocessing and tesseract invocation.
//!
//! The pipeline only sees `OcrLine`s; how pixels become words stays behind
//! the `Recognizer` trait.

pub mod engine;
pub mod preprocess;
pub mod setup;

pub use engine::{OcrLine, OcrWord, Recognizer};
pub use setup::{build_recognizer, ensure_tesseract};
