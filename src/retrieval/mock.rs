//! Mock evidence source for tests and offline runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::SearchError;
use crate::retrieval::traits::EvidenceSource;
use crate::types::SearchHit;

/// An evidence source returning a fixed list of hits.
#[derive(Debug, Default)]
pub struct MockEvidenceSource {
    hits: Vec<SearchHit>,
    fail: bool,
    calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

impl MockEvidenceSource {
    /// A source that always returns `hits` (truncated to `max_results`).
    #[must_use]
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    /// A source that never finds anything.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A source whose searches always fail with a network error.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of `search` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// The query of the most recent `search` call.
    #[must_use]
    pub fn last_query(&self) -> Option<String> {
        self.last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EvidenceSource for MockEvidenceSource {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        *self
            .last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(query.to_string());

        if self.fail {
            return Err(SearchError::Network("mock search failure".to_string()));
        }
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
