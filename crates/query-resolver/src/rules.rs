//! Deterministic fallback rules
//!
//! An ordered table of (predicate, handler) pairs evaluated first-match-
//! wins against the lowercased question. Every handler answers from
//! detection facts alone.

use captioning::navigation_sentence;
use perception::{Detection, Side};
use tracing::debug;

/// Answer for a frame with no detections, whatever the question
pub const EMPTY_SCENE_ANSWER: &str = "I don't detect any objects in the current scene.";

/// Tokens skipped when extracting the target noun of a counting question
const COUNT_STOPLIST: [&str; 4] = ["how", "many", "count", "of"];

struct Rule {
    name: &'static str,
    applies: fn(&str) -> bool,
    respond: fn(&str, &[Detection]) -> String,
}

static RULES: &[Rule] = &[
    Rule {
        name: "descriptive",
        applies: |q| q.contains("what do you see") || q.contains("describe"),
        respond: describe_scene,
    },
    Rule {
        name: "counting",
        applies: |q| q.contains("how many") || q.contains("count") || q.contains("number of"),
        respond: count_matches,
    },
    Rule {
        name: "spatial",
        applies: |q| q.contains("left") || q.contains("right") || q.contains("front"),
        respond: locate_by_side,
    },
    Rule {
        name: "action",
        applies: |q| q.contains("doing") || q.contains("action") || q.contains("activity"),
        respond: describe_action,
    },
    Rule {
        name: "navigation",
        applies: |_| true,
        respond: |_, detections| navigation_sentence(detections),
    },
];

/// Answer a question from detection facts alone.
pub fn fallback_answer(question: &str, detections: &[Detection]) -> String {
    if detections.is_empty() {
        return EMPTY_SCENE_ANSWER.to_string();
    }
    let q = question.to_lowercase();
    for rule in RULES {
        if (rule.applies)(&q) {
            debug!(rule = rule.name, "fallback rule matched");
            return (rule.respond)(&q, detections);
        }
    }
    navigation_sentence(detections)
}

/// Distinct detected classes in first-seen order
fn distinct_classes(detections: &[Detection]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for d in detections {
        if !seen.contains(&d.class.as_str()) {
            seen.push(d.class.as_str());
        }
    }
    seen
}

fn describe_scene(_q: &str, detections: &[Detection]) -> String {
    format!("I can see: {}.", distinct_classes(detections).join(", "))
}

/// Count detections whose class contains the question's target noun. The
/// noun is the first alphabetic token outside the stoplist, with one
/// trailing "s" trimmed so plural questions match singular class names.
fn count_matches(q: &str, detections: &[Detection]) -> String {
    let noun = q
        .split(|c: char| !c.is_alphabetic())
        .filter(|token| !token.is_empty())
        .find(|token| !COUNT_STOPLIST.contains(token));
    match noun {
        Some(token) => {
            let noun = token.strip_suffix('s').unwrap_or(token);
            let count = detections
                .iter()
                .filter(|d| d.class.to_lowercase().contains(noun))
                .count();
            format!("I can see {} {}(s).", count, noun)
        }
        None => format!("I can see {} object(s).", detections.len()),
    }
}

fn locate_by_side(_q: &str, detections: &[Detection]) -> String {
    let mut left: Vec<&str> = Vec::new();
    let mut center: Vec<&str> = Vec::new();
    let mut right: Vec<&str> = Vec::new();
    for d in detections {
        let bucket = match d.side {
            Side::Left => &mut left,
            Side::Center => &mut center,
            Side::Right => &mut right,
        };
        if !bucket.contains(&d.class.as_str()) {
            bucket.push(d.class.as_str());
        }
    }
    let mut parts: Vec<String> = Vec::new();
    if !left.is_empty() {
        parts.push(format!("on your left: {}", left.join(", ")));
    }
    if !center.is_empty() {
        parts.push(format!("in front: {}", center.join(", ")));
    }
    if !right.is_empty() {
        parts.push(format!("on your right: {}", right.join(", ")));
    }
    parts.join("; ")
}

fn describe_action(_q: &str, detections: &[Detection]) -> String {
    if detections.iter().any(|d| d.class == "person") {
        "I can see a person, but I cannot determine their activity from bounding boxes alone."
            .to_string()
    } else {
        "I don't detect a person in the scene, so I cannot describe what they are doing."
            .to_string()
    }
}
