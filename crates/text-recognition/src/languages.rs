//! Language set normalization

use std::fmt;

use serde::Serialize;

/// Largest language combination a single reader is built for
const MAX_LANGUAGES: usize = 3;

/// Ordered language codes identifying one reader. Construction normalizes
/// the request: codes are lowercased, duplicates dropped keeping first
/// occurrence, the list truncated, and an empty request defaults to
/// English.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LanguageSet(Vec<String>);

impl LanguageSet {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for code in codes {
            let code = code.as_ref().trim().to_lowercase();
            if !code.is_empty() && !normalized.contains(&code) {
                normalized.push(code);
            }
        }
        normalized.truncate(MAX_LANGUAGES);
        if normalized.is_empty() {
            normalized.push("en".to_string());
        }
        Self(normalized)
    }

    /// Parse a comma-separated request value such as `"en,hi"`
    pub fn from_csv(value: &str) -> Self {
        Self::new(value.split(','))
    }

    pub fn english() -> Self {
        Self::new(["en"])
    }

    pub fn codes(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for LanguageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_dropped_keeping_first_order() {
        let set = LanguageSet::new(["en", "hi", "en", "mr"]);
        assert_eq!(set.codes(), ["en", "hi", "mr"]);
    }

    #[test]
    fn test_truncated_after_dedup() {
        let set = LanguageSet::new(["en", "en", "hi", "mr", "ta"]);
        assert_eq!(set.codes(), ["en", "hi", "mr"]);
    }

    #[test]
    fn test_empty_request_defaults_to_english() {
        assert_eq!(LanguageSet::new(Vec::<&str>::new()), LanguageSet::english());
        assert_eq!(LanguageSet::from_csv(""), LanguageSet::english());
        assert_eq!(LanguageSet::from_csv(" , ,"), LanguageSet::english());
    }

    #[test]
    fn test_codes_normalized_to_lowercase() {
        let set = LanguageSet::from_csv("EN, Hi");
        assert_eq!(set.codes(), ["en", "hi"]);
    }

    #[test]
    fn test_display_label() {
        assert_eq!(LanguageSet::from_csv("en,hi").to_string(), "en+hi");
    }

    #[test]
    fn test_equal_sets_hash_alike() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = LanguageSet::from_csv("en,hi");
        let b = LanguageSet::new(["EN", "hi", "en"]);
        assert_eq!(a, b);

        let mut ha = DefaultHasher::new();
        let mut hb = DefaultHasher::new();
        a.hash(&mut ha);
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }
}
