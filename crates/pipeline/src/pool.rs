//! Bounded inference dispatch
//!
//! Detector, captioner and recognizer calls block for the duration of
//! inference and usually share one accelerator. The pool runs them on
//! blocking threads under a permit cap, rejects work once too many calls
//! are in flight, and bounds how long a caller waits for a result.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::warn;

use crate::PipelineError;

/// Ceiling on one pooled call, queue wait included
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct InferencePool {
    permits: Arc<Semaphore>,
    pending: Arc<AtomicUsize>,
    queue_limit: usize,
    timeout: Duration,
}

struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl InferencePool {
    pub fn new(concurrency: usize, queue_limit: usize, timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            pending: Arc::new(AtomicUsize::new(0)),
            queue_limit: queue_limit.max(1),
            timeout,
        }
    }

    /// Run a blocking inference call under the concurrency cap.
    ///
    /// Saturation is reported immediately rather than queued without
    /// bound. A call that outlives the timeout is abandoned by the
    /// caller but keeps its permit until the underlying task finishes,
    /// so the accelerator is never oversubscribed.
    pub async fn run<T, F>(&self, task: F) -> Result<T, PipelineError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let in_flight = self.pending.fetch_add(1, Ordering::SeqCst);
        let _pending = PendingGuard(self.pending.clone());
        if in_flight >= self.queue_limit {
            warn!(in_flight, "inference pool saturated");
            return Err(PipelineError::Busy);
        }

        let acquire_and_run = async {
            let permit = self
                .permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::Internal(format!("inference pool closed: {}", e)))?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                task()
            })
            .await
            .map_err(|e| PipelineError::Internal(format!("inference task failed: {}", e)))
        };

        match tokio::time::timeout(self.timeout, acquire_and_run).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout),
        }
    }

    /// Calls currently admitted, running or queued
    pub fn in_flight(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}
