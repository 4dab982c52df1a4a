//! Frame Ingest for the Vision Assistance Pipeline
//!
//! Decodes uploaded camera images into owned RGB frames and provides
//! the pixel-level views downstream analysis needs:
//! - Grayscale conversion for edge analysis
//! - Region cropping for the central obstacle probe
//! - Bounds-checked pixel access

pub mod frame;

pub use frame::Frame;

use thiserror::Error;

/// Frame ingest error types
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Empty image payload")]
    EmptyPayload,

    #[error("Degenerate image dimensions: {width}x{height}")]
    Dimensions { width: u32, height: u32 },
}
