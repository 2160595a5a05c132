//! Traits for evidence retrieval.

use async_trait::async_trait;

use crate::error::SearchError;
use crate::retrieval::rate_limit::RateLimitPermit;
use crate::types::SearchHit;

/// A web search backend returning ranked snippets for a query.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Search for at most `max_results` hits, best first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;

    /// Wait until a search may be issued.
    ///
    /// Paced sources return a permit to hand to [`search_ready`]; the default
    /// is always ready.
    ///
    /// [`search_ready`]: EvidenceSource::search_ready
    async fn ready(&self) -> Result<Option<RateLimitPermit>, SearchError> {
        Ok(None)
    }

    /// Search under a permit obtained from [`ready`], without waiting again.
    ///
    /// [`ready`]: EvidenceSource::ready
    async fn search_ready(
        &self,
        query: &str,
        max_results: usize,
        permit: Option<RateLimitPermit>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let result = self.search(query, max_results).await;
        drop(permit);
        result
    }

    /// Short name used in logs.
    fn name(&self) -> &str {
        "evidence-source"
    }
}
