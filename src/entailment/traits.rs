//! Trait definitions for entailment scoring.

use async_trait::async_trait;

use crate::error::EntailmentError;
use crate::types::EntailmentResponse;

/// Scores how strongly each evidence text supports a claim.
#[async_trait]
pub trait EntailmentScorer: Send + Sync {
    /// Score `claim` against every evidence text in a single call.
    ///
    /// `evidence` must be non-empty. The response should carry one per-item
    /// score for each evidence text.
    async fn score(
        &self,
        claim: &str,
        evidence: &[String],
    ) -> Result<EntailmentResponse, EntailmentError>;

    /// Human-readable scorer name used in logs.
    fn name(&self) -> &str {
        "entailment-scorer"
    }
}
