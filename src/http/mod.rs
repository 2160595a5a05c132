//! HTTP clients for the search, translation and entailment services.
//!
//! Each client owns a [`reqwest::Client`] with its own request timeout and
//! treats any non-success status as an error. Response decoding lives in
//! plain functions so it can be tested without a server.

pub mod entailment;
pub mod fetch;
pub mod search;
pub mod translate;

pub use entailment::{HttpEntailmentScorer, parse_verify_response};
pub use fetch::HttpContentFetcher;
pub use search::{HttpEvidenceSource, SearchRequest, parse_search_response};
pub use translate::{HttpTranslator, parse_translate_response};

use std::sync::Arc;
use std::time::Duration;

use crate::config::FactCheckConfig;
use crate::error::FactCheckError;
use crate::orchestrator::FactCheckOrchestrator;
use crate::retrieval::{RateLimitedSource, RateLimiter};
use crate::translation::{CachedTranslator, TranslationCacheConfig};

/// Longest response body kept in error messages.
const MAX_ERROR_BODY: usize = 200;

/// An orchestrator wired to the HTTP services.
pub type HttpOrchestrator = FactCheckOrchestrator<
    RateLimitedSource<HttpEvidenceSource>,
    CachedTranslator<HttpTranslator>,
    HttpEntailmentScorer,
>;

/// Build an orchestrator talking to the services named in `config`.
///
/// Searches are paced by `search.min_request_interval_ms`. Translations go
/// through a cache that stores nothing unless `translation.cache_enabled` is
/// set. A content fetcher is installed when `evidence.fetch_full_content` is
/// set.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or an HTTP client cannot
/// be built.
pub fn from_config(config: FactCheckConfig) -> Result<HttpOrchestrator, FactCheckError> {
    let limiter = Arc::new(RateLimiter::with_interval(
        config.search.min_request_interval(),
    ));
    let source = RateLimitedSource::new(HttpEvidenceSource::new(&config.search)?, limiter);

    let cache_entries = if config.translation.cache_enabled {
        config.translation.cache_max_entries
    } else {
        0
    };
    let translator = CachedTranslator::new(
        HttpTranslator::new(&config.translation)?,
        TranslationCacheConfig::new(cache_entries, config.translation.cache_ttl()),
    );

    let scorer = HttpEntailmentScorer::new(&config.entailment)?;
    let fetch_content = config.evidence.fetch_full_content;
    let fetch_timeout = config.evidence.content_fetch_timeout();

    let orchestrator = FactCheckOrchestrator::new(source, translator, scorer, config)?;
    if fetch_content {
        Ok(orchestrator.with_fetcher(Box::new(HttpContentFetcher::new(fetch_timeout)?)))
    } else {
        Ok(orchestrator)
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, FactCheckError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("vifact/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FactCheckError::Build(format!("HTTP client: {e}")))
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn truncate_body(body: &str) -> String {
    crate::evidence::truncate_chars(body.trim(), MAX_ERROR_BODY)
}
