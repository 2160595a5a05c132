//! Request pacing for search backends.
//!
//! Search APIs on free plans reject bursts. [`RateLimiter`] spaces request
//! starts by a minimum interval and caps concurrent requests; it lives on the
//! transport side so the verification pipeline itself never sleeps.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use crate::error::SearchError;
use crate::retrieval::traits::EvidenceSource;
use crate::types::SearchHit;

/// Permission to issue one request. Dropping it releases the slot.
#[derive(Debug)]
pub struct RateLimitPermit {
    _slot: OwnedSemaphorePermit,
}

/// Minimum-interval plus max-concurrency limiter.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    slots: Arc<Semaphore>,
    next_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter spacing request starts by `min_interval`, allowing at
    /// most `max_concurrent` requests in flight (at least one).
    #[must_use]
    pub fn new(min_interval: Duration, max_concurrent: usize) -> Self {
        Self {
            min_interval,
            slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
            next_start: Mutex::new(None),
        }
    }

    /// A limiter allowing one request at a time, `min_interval` apart.
    #[must_use]
    pub fn with_interval(min_interval: Duration) -> Self {
        Self::new(min_interval, 1)
    }

    /// The configured minimum interval.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for a free slot and for the minimum interval to elapse.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::RateLimiterClosed`] if the limiter was closed.
    pub async fn acquire(&self) -> Result<RateLimitPermit, SearchError> {
        let slot = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| SearchError::RateLimiterClosed)?;

        let start_at = {
            let mut next = self.next_start.lock().await;
            let now = Instant::now();
            let start_at = next.map_or(now, |scheduled| scheduled.max(now));
            *next = Some(start_at + self.min_interval);
            start_at
        };

        if start_at > Instant::now() {
            tracing::debug!(
                wait_ms = u64::try_from((start_at - Instant::now()).as_millis()).unwrap_or(u64::MAX),
                "Rate limiting search request"
            );
            tokio::time::sleep_until(start_at).await;
        }

        Ok(RateLimitPermit { _slot: slot })
    }

    /// Return a permit to the limiter.
    pub fn release(&self, permit: RateLimitPermit) {
        drop(permit);
    }

    /// Number of free concurrency slots.
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Reject all current and future waiters.
    pub fn close(&self) {
        self.slots.close();
    }
}

/// An [`EvidenceSource`] whose searches go through a [`RateLimiter`].
pub struct RateLimitedSource<S: EvidenceSource> {
    inner: S,
    limiter: Arc<RateLimiter>,
}

impl<S: EvidenceSource> RateLimitedSource<S> {
    /// Wrap `inner` with `limiter`.
    #[must_use]
    pub fn new(inner: S, limiter: Arc<RateLimiter>) -> Self {
        Self { inner, limiter }
    }

    /// The wrapped source.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// The shared limiter.
    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

#[async_trait]
impl<S: EvidenceSource> EvidenceSource for RateLimitedSource<S> {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let permit = self.limiter.acquire().await?;
        let result = self.inner.search(query, max_results).await;
        self.limiter.release(permit);
        result
    }

    async fn ready(&self) -> Result<Option<RateLimitPermit>, SearchError> {
        self.limiter.acquire().await.map(Some)
    }

    async fn search_ready(
        &self,
        query: &str,
        max_results: usize,
        permit: Option<RateLimitPermit>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let permit = match permit {
            Some(permit) => permit,
            None => self.limiter.acquire().await?,
        };
        let result = self.inner.search(query, max_results).await;
        self.limiter.release(permit);
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
