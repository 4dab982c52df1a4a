//! Deterministic navigation sentence
//!
//! Composed from current detections on every analysis call, with or
//! without a fresh generative caption. The largest detections are assumed
//! closest and listed first.

use perception::Detection;

/// Navigation sentence when the frame holds no detections
pub const NO_OBSTACLES_SENTENCE: &str = "Navigation: no obstacles detected.";

/// Detections mentioned per sentence
const MAX_MENTIONS: usize = 4;

/// Compose the navigation sentence: top detections by bbox height, each
/// rendered as class, distance and side, joined with `"; "`.
pub fn navigation_sentence(detections: &[Detection]) -> String {
    if detections.is_empty() {
        return NO_OBSTACLES_SENTENCE.to_string();
    }
    let mut ranked: Vec<&Detection> = detections.iter().collect();
    ranked.sort_by(|a, b| b.height().cmp(&a.height()));
    let mentions: Vec<String> = ranked
        .iter()
        .take(MAX_MENTIONS)
        .map(|d| {
            if d.distance_str == "?" {
                format!("{} on your {}", d.class, d.side.as_str())
            } else {
                format!("{} {} on your {}", d.class, d.distance_str, d.side.as_str())
            }
        })
        .collect();
    format!("Navigation: {}", mentions.join("; "))
}

/// Join fresh generative text with the navigation sentence. When
/// generation was throttled or failed this call, the navigation sentence
/// stands alone.
pub fn compose_caption(generative: Option<&str>, navigation: &str) -> String {
    match generative {
        Some(text) if !text.trim().is_empty() => {
            format!("{}. {}", text.trim().trim_end_matches('.'), navigation)
        }
        _ => navigation.to_string(),
    }
}
