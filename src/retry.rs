//! Retry logic with exponential backoff for external collaborators.
//!
//! [`RetryPolicy`] retries transient failures with exponential backoff and
//! optional jitter. [`Retrying`] applies a policy to any evidence source,
//! translator, scorer or content fetcher. It belongs on the transport side:
//! the orchestrator itself never retries.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::RetryConfig;
use crate::entailment::EntailmentScorer;
use crate::error::{EntailmentError, FactCheckError, FetchError, SearchError, TranslationError};
use crate::evidence::{ContentFetcher, FetchedContent};
use crate::retrieval::{EvidenceSource, RateLimitPermit};
use crate::translation::{ItemResult, Translator};
use crate::types::{EntailmentResponse, SearchHit};

/// A retry policy that implements exponential backoff with optional jitter.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create a retry policy with no retries (fail immediately).
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            config: RetryConfig {
                max_retries: 0,
                ..Default::default()
            },
        }
    }

    /// Get the underlying configuration.
    #[must_use]
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap
    )]
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base_delay =
            self.config.initial_delay_ms as f64 * self.config.backoff_multiplier.powi(exponent);
        let capped_delay = base_delay.min(self.config.max_delay_ms as f64);

        let final_delay = if self.config.add_jitter {
            // Jitter factor in [0.5, 1.5).
            let jitter_factor = 0.5 + simple_random();
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay.max(0.0) as u64)
    }

    /// Execute an async operation with retry logic.
    ///
    /// The operation is retried up to `max_retries` times while it returns
    /// a retryable error, sleeping between attempts.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last error once all
    /// attempts are used.
    pub async fn retry<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable,
    {
        self.retry_with_check(operation, E::is_retryable).await
    }

    /// Execute an async operation with retry logic and a custom retryable check.
    ///
    /// # Errors
    ///
    /// Returns the first error rejected by `is_retryable`, or the last error
    /// once all attempts are used.
    pub async fn retry_with_check<T, E, F, Fut, C>(
        &self,
        mut operation: F,
        is_retryable: C,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) || attempt >= self.config.max_retries => {
                    return Err(e);
                }
                Err(_) => {
                    let delay = self.calculate_delay(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Trait for errors that can indicate whether they are retryable.
pub trait Retryable {
    /// Returns true if the error is transient and the operation should be retried.
    fn is_retryable(&self) -> bool;

    /// Returns a human-readable error message for logging.
    fn error_message(&self) -> String;
}

fn status_is_transient(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

impl Retryable for FactCheckError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Search(e) => e.is_retryable(),
            Self::Fetch(e) => e.is_retryable(),
            Self::Translation(e) => e.is_retryable(),
            Self::Entailment(e) => e.is_retryable(),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            Self::InvalidClaim(_) | Self::Config(_) | Self::Build(_) | Self::Serialization(_) => {
                false
            }
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }
}

impl Retryable for SearchError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => status_is_transient(*status),
            Self::Malformed(_) | Self::RateLimiterClosed => false,
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => status_is_transient(*status),
            Self::InvalidUrl(_) => false,
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }
}

impl Retryable for TranslationError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Status(status) => status_is_transient(*status),
            Self::MissingItem(_) | Self::Malformed(_) => false,
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }
}

impl Retryable for EntailmentError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => status_is_transient(*status),
            Self::EmptyEvidence
            | Self::CountMismatch { .. }
            | Self::NonFiniteScore(_)
            | Self::Malformed(_) => false,
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }
}

/// A collaborator whose calls are retried according to a [`RetryPolicy`].
///
/// Translator calls are retried only when the whole batch fails; per-item
/// failures are passed through unchanged.
pub struct Retrying<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C> Retrying<C> {
    /// Wrap `inner` with `policy`.
    #[must_use]
    pub const fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Wrap `inner` with a policy built from `config`.
    #[must_use]
    pub const fn with_config(inner: C, config: RetryConfig) -> Self {
        Self::new(inner, RetryPolicy::new(config))
    }

    /// The wrapped collaborator.
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.inner
    }

    /// The retry policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<C: EvidenceSource> EvidenceSource for Retrying<C> {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.policy
            .retry(|| self.inner.search(query, max_results))
            .await
    }

    async fn ready(&self) -> Result<Option<RateLimitPermit>, SearchError> {
        self.inner.ready().await
    }

    async fn search_ready(
        &self,
        query: &str,
        max_results: usize,
        permit: Option<RateLimitPermit>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        // The first attempt uses the caller's permit; retries wait for their own.
        let permit = Mutex::new(permit);
        self.policy
            .retry(|| {
                let permit = permit
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                self.inner.search_ready(query, max_results, permit)
            })
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[async_trait]
impl<C: Translator> Translator for Retrying<C> {
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<ItemResult>, TranslationError> {
        self.policy.retry(|| self.inner.translate_batch(texts)).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[async_trait]
impl<C: EntailmentScorer> EntailmentScorer for Retrying<C> {
    async fn score(
        &self,
        claim: &str,
        evidence: &[String],
    ) -> Result<EntailmentResponse, EntailmentError> {
        self.policy.retry(|| self.inner.score(claim, evidence)).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[async_trait]
impl<C: ContentFetcher> ContentFetcher for Retrying<C> {
    async fn fetch(&self, url: &str) -> Result<Option<FetchedContent>, FetchError> {
        self.policy.retry(|| self.inner.fetch(url)).await
    }
}

/// Simple pseudo-random number generator for jitter.
/// Uses a basic LCG (Linear Congruential Generator) seeded from system time.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn simple_random() -> f64 {
    use std::cell::Cell;
    use std::time::SystemTime;

    thread_local! {
        static SEED: Cell<u64> = Cell::new(
            SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(12345)
        );
    }

    SEED.with(|seed| {
        let mut s = seed.get();
        // LCG parameters from Numerical Recipes
        s = s.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        seed.set(s);
        (s >> 11) as f64 / (1u64 << 53) as f64
    })
}
