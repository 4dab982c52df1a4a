//! Caption generation throttle
//!
//! Generative captioning is the most expensive call in the analysis path,
//! so it runs at most once per interval, process-wide. The timestamp lock
//! is held across generation: two concurrent analyses cannot both observe
//! an elapsed interval and regenerate.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::DelegateError;

/// Minimum spacing between generative caption invocations
pub const DEFAULT_CAPTION_INTERVAL: Duration = Duration::from_secs(5);

pub struct CaptionThrottle {
    last_generated: Mutex<Option<Instant>>,
    interval: Duration,
}

impl CaptionThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_generated: Mutex::new(None),
            interval,
        }
    }

    /// Run `generate` if the interval has elapsed since the last successful
    /// generation, returning `None` when throttled. The timestamp advances
    /// only on success, so a failed generation can be retried immediately.
    pub async fn generate_if_due<F, Fut>(&self, generate: F) -> Option<Result<String, DelegateError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, DelegateError>>,
    {
        let mut last = self.last_generated.lock().await;
        if let Some(at) = *last {
            if at.elapsed() <= self.interval {
                debug!("caption generation throttled");
                return None;
            }
        }
        let result = generate().await;
        if result.is_ok() {
            *last = Some(Instant::now());
        }
        Some(result)
    }
}

impl Default for CaptionThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTION_INTERVAL)
    }
}
