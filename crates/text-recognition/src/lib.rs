//! Scene text recognition
//!
//! Reads printed text out of frames for sign and label reading:
//! - `TextRecognizer` trait over a language-bound OCR engine
//! - `LanguageSet` normalization of requested language codes
//! - LRU cache of constructed readers, warmed for common combinations

pub mod cache;
pub mod languages;
pub mod recognizer;

pub use cache::{ReaderCache, DEFAULT_READER_CAPACITY, WARMUP_LANGUAGE_SETS};
pub use languages::LanguageSet;
pub use recognizer::{
    summarize, MockProvider, MockRecognizer, OcrOutcome, ReaderProvider, RecognizedLine,
    TextRecognizer,
};

use thiserror::Error;

/// Text recognition failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("Text recognition unavailable for languages {0}")]
    Unavailable(String),
    #[error("Text recognition failed: {0}")]
    Recognition(String),
    #[error("{0}")]
    Lock(String),
}
