//! Search proxy client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{build_client, endpoint, millis, truncate_body};
use crate::config::SearchConfig;
use crate::error::{FactCheckError, SearchError};
use crate::retrieval::EvidenceSource;
use crate::types::SearchHit;

/// Body of a `POST /search` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    /// Query text, already rewritten by the trust policy.
    pub query: String,
    /// Number of results wanted.
    pub count: usize,
    /// Search language.
    pub language: String,
    /// Country code.
    pub country: String,
    /// Freshness filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freshness: Option<String>,
    /// Ask for additional snippets.
    pub extra_snippets: bool,
}

#[derive(Debug, Deserialize)]
struct WireHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default, alias = "description")]
    snippet: String,
    #[serde(default)]
    extra_snippets: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireSearchResponse {
    #[serde(default)]
    results: Vec<WireHit>,
}

/// Decode a search proxy response.
///
/// A hit without a snippet uses its extra snippets instead.
///
/// # Errors
///
/// Returns [`SearchError::Malformed`] if the body is not a valid response.
pub fn parse_search_response(body: &str) -> Result<Vec<SearchHit>, SearchError> {
    let response: WireSearchResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Malformed(e.to_string()))?;

    Ok(response
        .results
        .into_iter()
        .map(|hit| {
            let snippet = if hit.snippet.trim().is_empty() {
                hit.extra_snippets.join(" ")
            } else {
                hit.snippet
            };
            SearchHit::new(hit.title, hit.url, snippet)
        })
        .collect())
}

/// Evidence source backed by the search proxy.
#[derive(Debug, Clone)]
pub struct HttpEvidenceSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    language: String,
    country: String,
    freshness: Option<String>,
    extra_snippets: bool,
}

impl HttpEvidenceSource {
    /// Create a client for the proxy at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, FactCheckError> {
        Ok(Self {
            client: build_client(config.timeout())?,
            url: endpoint(&config.base_url, "search"),
            timeout: config.timeout(),
            language: config.language.clone(),
            country: config.country.clone(),
            freshness: config.freshness.clone(),
            extra_snippets: config.extra_snippets,
        })
    }

    /// Build the request body for `query`.
    #[must_use]
    pub fn request(&self, query: &str, count: usize) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            count,
            language: self.language.clone(),
            country: self.country.clone(),
            freshness: self.freshness.clone(),
            extra_snippets: self.extra_snippets,
        }
    }

    fn map_error(&self, e: &reqwest::Error) -> SearchError {
        if e.is_timeout() {
            SearchError::Timeout(millis(self.timeout))
        } else {
            SearchError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl EvidenceSource for HttpEvidenceSource {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.request(query, max_results))
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_error(&e))?;
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let mut hits = parse_search_response(&body)?;
        hits.truncate(max_results);
        tracing::debug!(hits = hits.len(), "Search proxy answered");
        Ok(hits)
    }

    fn name(&self) -> &str {
        "search-proxy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let body = r#"{"results": [
            {"title": "Hà Nội", "url": "https://vi.wikipedia.org/wiki/H", "snippet": "Thủ đô"},
            {"title": "B", "url": "https://b.vn", "description": "desc"},
            {"title": "C", "url": "https://c.vn", "extra_snippets": ["one", "two"]}
        ]}"#;
        let hits = parse_search_response(body).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].snippet, "Thủ đô");
        assert_eq!(hits[1].snippet, "desc");
        assert_eq!(hits[2].snippet, "one two");
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        assert!(parse_search_response("{}").unwrap().is_empty());
        assert!(matches!(
            parse_search_response("not json"),
            Err(SearchError::Malformed(_))
        ));
    }

    #[test]
    fn test_request_body() {
        let source = HttpEvidenceSource::new(&SearchConfig::default()).unwrap();
        let json = serde_json::to_value(source.request("q", 5)).unwrap();
        assert_eq!(json["query"], "q");
        assert_eq!(json["count"], 5);
        assert_eq!(json["country"], "VN");
        assert_eq!(json["language"], "vi");
        assert_eq!(json["extra_snippets"], true);
        assert!(json.get("freshness").is_none());
    }
}
