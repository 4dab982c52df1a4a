//! Recognizer traits and OCR output aggregation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use frame_ingest::Frame;
use serde::Serialize;

use crate::{LanguageSet, RecognitionError};

/// One recognized text region, in reading order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedLine {
    /// Region bounds as `[x1, y1, x2, y2]`
    pub region: [i32; 4],
    pub text: String,
    pub confidence: f32,
}

/// A language-bound OCR engine. Recognition blocks for the duration of
/// inference.
pub trait TextRecognizer: Send + Sync + std::fmt::Debug {
    fn recognize(&self, frame: &Frame) -> Result<Vec<RecognizedLine>, RecognitionError>;
}

/// Constructs readers for requested language sets
pub trait ReaderProvider: Send + Sync {
    fn create(&self, languages: &LanguageSet)
        -> Result<Arc<dyn TextRecognizer>, RecognitionError>;
}

/// Aggregated OCR result for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrOutcome {
    pub text: String,
    pub confidence: f64,
    pub line_count: usize,
    pub lines: Vec<String>,
}

/// Collapse recognized regions into the reported shape: blank lines are
/// dropped from the text but still count toward mean confidence.
pub fn summarize(results: &[RecognizedLine]) -> OcrOutcome {
    let lines: Vec<String> = results
        .iter()
        .map(|line| line.text.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    let confidence = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|line| line.confidence as f64).sum::<f64>() / results.len() as f64
    };
    OcrOutcome {
        text: lines.join(" "),
        confidence,
        line_count: lines.len(),
        lines,
    }
}

/// Scripted recognizer for tests and wiring without OCR weights
#[derive(Debug)]
pub struct MockRecognizer {
    lines: Vec<RecognizedLine>,
}

impl MockRecognizer {
    pub fn new(lines: Vec<RecognizedLine>) -> Self {
        Self { lines }
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&self, _frame: &Frame) -> Result<Vec<RecognizedLine>, RecognitionError> {
        Ok(self.lines.clone())
    }
}

/// Provider returning scripted readers, refusing configured language sets
pub struct MockProvider {
    lines: Vec<RecognizedLine>,
    failing: Vec<LanguageSet>,
    constructed: AtomicUsize,
}

impl MockProvider {
    pub fn new(lines: Vec<RecognizedLine>) -> Self {
        Self {
            lines,
            failing: Vec::new(),
            constructed: AtomicUsize::new(0),
        }
    }

    /// Mark a language set whose construction always fails
    pub fn failing_for(mut self, languages: LanguageSet) -> Self {
        self.failing.push(languages);
        self
    }

    /// Number of successful reader constructions so far
    pub fn constructions(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }
}

impl ReaderProvider for MockProvider {
    fn create(
        &self,
        languages: &LanguageSet,
    ) -> Result<Arc<dyn TextRecognizer>, RecognitionError> {
        if self.failing.contains(languages) {
            return Err(RecognitionError::Recognition(format!(
                "model files missing for {}",
                languages
            )));
        }
        self.constructed.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockRecognizer::new(self.lines.clone())))
    }
}
