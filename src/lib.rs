//! `vifact` - fact-checking of Vietnamese claims against web evidence.
//!
//! A claim goes through four stages:
//!
//! - **Retrieval**: search for evidence, rewritten toward trusted domains
//! - **Translation**: the claim and evidence are translated to English in one batch
//! - **Entailment**: a model scores how far each evidence item supports the claim
//! - **Aggregation**: per-item scores are reduced to a single verdict
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vifact::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), FactCheckError> {
//!     let checker = FactCheckOrchestratorBuilder::new()
//!         .with_source(MockEvidenceSource::new(vec![SearchHit::new(
//!             "Hà Nội",
//!             "https://vi.wikipedia.org/wiki/H%C3%A0_N%E1%BB%99i",
//!             "Hà Nội là thủ đô của Việt Nam.",
//!         )]))
//!         .with_translator(MockTranslator::new())
//!         .with_scorer(MockEntailmentScorer::new(vec![0.9]))
//!         .build()?;
//!
//!     let result = checker.check_text("Hà Nội là thủ đô của Việt Nam").await?;
//!     println!("{}: {:.2}", result.verdict, result.confidence);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `http` (default): `reqwest` clients for the search, translation and
//!   entailment services
//!
//! # Architecture
//!
//! ```text
//! Claim
//!   │
//!   ▼
//! ┌──────────────────┐
//! │ EvidenceSource   │  ← search, trust policy, rate limit
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ EvidenceChunker  │  ← optional page fetch, truncation
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ Translator       │  ← one batch, per-item fallback
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ EntailmentScorer │  ← one call for all evidence
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ VerdictAggregator│
//! └────────┬─────────┘
//!          ▼
//!     ClaimResult
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod config;
pub mod entailment;
pub mod error;
pub mod evidence;
#[cfg(feature = "http")]
pub mod http;
pub mod metrics;
pub mod orchestrator;
pub mod retrieval;
pub mod retry;
pub mod translation;
pub mod types;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::aggregator::{
        AggregateOutcome, AggregationConfig, AggregationStrategy, VerdictAggregator,
    };
    pub use crate::config::{
        EntailmentConfig, EvidenceConfig, FactCheckConfig, PipelineConfig, RetryConfig,
        SearchConfig, TranslationConfig,
    };
    pub use crate::entailment::{EntailmentScorer, MockEntailmentScorer};
    pub use crate::error::{
        ConfigError, EntailmentError, FactCheckError, FetchError, SearchError, TranslationError,
    };
    pub use crate::evidence::{
        ContentFetcher, EvidenceChunker, FetchedContent, MockContentFetcher,
    };
    pub use crate::metrics::{MetricsCollector, PipelineMetrics, StageTiming};
    pub use crate::orchestrator::{FactCheckOrchestrator, FactCheckOrchestratorBuilder, FactChecker};
    pub use crate::retrieval::{
        EvidenceSource, MockEvidenceSource, RateLimitedSource, RateLimiter, SourceFilterMode,
        SourceTrustPolicy,
    };
    pub use crate::retry::{RetryPolicy, Retrying};
    pub use crate::translation::{
        CachedTranslator, MockTranslator, TranslationCacheConfig, Translator,
    };
    pub use crate::types::{
        Claim, ClaimId, ClaimResult, EntailmentLabel, EntailmentResponse, EntailmentScore,
        ErrorKind, EvidenceItem, ScoredEvidence, SearchHit, SourceTrust, StageTimings, Verdict,
    };

    #[cfg(feature = "http")]
    pub use crate::http::{
        HttpContentFetcher, HttpEntailmentScorer, HttpEvidenceSource, HttpOrchestrator,
        HttpTranslator,
    };
}

pub use error::{FactCheckError, Result};
pub use orchestrator::{FactCheckOrchestrator, FactChecker};
pub use types::{Claim, ClaimResult, Verdict};
