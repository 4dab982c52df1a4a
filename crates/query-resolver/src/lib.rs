//! Free-text question answering
//!
//! Answers questions about the current frame:
//! - The generative delegate is asked first
//! - When it is unavailable or fails, an ordered rule table over detection
//!   facts produces a deterministic answer instead

pub mod resolver;
pub mod rules;

pub use resolver::QueryResolver;
pub use rules::{fallback_answer, EMPTY_SCENE_ANSWER};
