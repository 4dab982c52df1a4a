//! Reader cache
//!
//! Readers are expensive to construct (model weights load per language
//! combination), so constructed instances are kept in an LRU cache keyed
//! by language set. The cache lock is held across construction: two
//! concurrent first requests for the same set build one reader.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tracing::{debug, info, warn};

use crate::recognizer::{ReaderProvider, TextRecognizer};
use crate::{LanguageSet, RecognitionError};

/// Constructed readers kept before least-recently-used eviction
pub const DEFAULT_READER_CAPACITY: usize = 8;

/// Language combinations constructed eagerly at startup
pub const WARMUP_LANGUAGE_SETS: [&[&str]; 3] = [&["en"], &["en", "hi"], &["en", "mr"]];

pub struct ReaderCache {
    provider: Arc<dyn ReaderProvider>,
    readers: Mutex<LruCache<LanguageSet, Arc<dyn TextRecognizer>>>,
}

impl ReaderCache {
    pub fn new(provider: Arc<dyn ReaderProvider>, capacity: NonZeroUsize) -> Self {
        Self {
            provider,
            readers: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn with_default_capacity(provider: Arc<dyn ReaderProvider>) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_READER_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::new(provider, capacity)
    }

    /// Return the reader for a language set, constructing and caching it
    /// on first use. Construction failure surfaces as `Unavailable`, never
    /// as a fault.
    pub fn reader(
        &self,
        languages: &LanguageSet,
    ) -> Result<Arc<dyn TextRecognizer>, RecognitionError> {
        let mut readers = self
            .readers
            .lock()
            .map_err(|e| RecognitionError::Lock(format!("Lock error: {}", e)))?;
        if let Some(reader) = readers.get(languages) {
            debug!(languages = %languages, "reader cache hit");
            return Ok(reader.clone());
        }
        match self.provider.create(languages) {
            Ok(reader) => {
                info!(languages = %languages, "constructed reader");
                readers.put(languages.clone(), reader.clone());
                Ok(reader)
            }
            Err(e) => {
                warn!(languages = %languages, error = %e, "reader construction failed");
                Err(RecognitionError::Unavailable(languages.to_string()))
            }
        }
    }

    /// Construct common language combinations up front. Failures are
    /// logged and skipped.
    pub fn warmup(&self) {
        for codes in WARMUP_LANGUAGE_SETS {
            let languages = LanguageSet::new(codes.iter().copied());
            if let Err(e) = self.reader(&languages) {
                warn!(languages = %languages, error = %e, "reader warmup failed");
            }
        }
    }
}
