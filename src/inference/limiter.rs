// src/inference/limiter.rs
//! Bounded worker pool in front of a shared inference backend.
//!
//! `BoundedBackend` caps in-flight calls; excess callers wait for a permit
//! before their request is sent. Time spent queued does not count against
//! the request timeout.

use super::{CompletionRequest, InferenceBackend};
use crate::error::InferenceError;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Limits the number of concurrent `complete` calls reaching the inner backend.
#[derive(Clone)]
pub struct BoundedBackend {
    inner: Arc<dyn InferenceBackend>,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl BoundedBackend {
    /// Wraps `inner`, allowing at most `capacity` (minimum 1) calls at a time.
    pub fn new(inner: Arc<dyn InferenceBackend>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Calls currently waiting for or holding a permit are not counted here.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

impl BoundedBackend {
    async fn acquire(&self) -> Result<SemaphorePermit<'_>, InferenceError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| InferenceError::Unreachable {
                reason: "inference worker pool is shut down".to_string(),
            })?;
        log::debug!(
            "Acquired inference slot ({} of {} free)",
            self.permits.available_permits(),
            self.capacity
        );
        Ok(permit)
    }
}

#[async_trait::async_trait]
impl InferenceBackend for BoundedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, InferenceError> {
        let _permit = self.acquire().await?;
        self.inner.complete(request).await
    }

    async fn complete_timed(&self, request: &CompletionRequest) -> Result<String, InferenceError> {
        let _permit = self.acquire().await?;
        self.inner.complete_timed(request).await
    }

    fn describe(&self) -> String {
        format!("{} [max {} in flight]", self.inner.describe(), self.capacity)
    }
}
