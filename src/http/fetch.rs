//! Page fetcher with readable-text extraction.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use super::{build_client, millis};
use crate::error::{FactCheckError, FetchError};
use crate::evidence::{ContentFetcher, FetchedContent, MAX_PAGE_BYTES, extract_readable};

/// Fetches pages over HTTP and extracts their main text.
#[derive(Debug, Clone)]
pub struct HttpContentFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpContentFetcher {
    /// Create a fetcher with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, FactCheckError> {
        Ok(Self {
            client: build_client(timeout)?,
            timeout,
        })
    }

    fn map_error(&self, e: &reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(millis(self.timeout))
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Append `chunk` to `body` up to `max_bytes` in total. Returns false once
/// the limit is reached.
fn append_bounded(body: &mut Vec<u8>, chunk: &[u8], max_bytes: usize) -> bool {
    let room = max_bytes.saturating_sub(body.len());
    if chunk.len() >= room {
        body.extend_from_slice(&chunk[..room]);
        return false;
    }
    body.extend_from_slice(chunk);
    true
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<FetchedContent>, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_none_or(|ct| ct.contains("html"));
        if !is_html {
            return Ok(None);
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_error(&e))? {
            if !append_bounded(&mut body, &chunk, MAX_PAGE_BYTES) {
                tracing::debug!(url = %url, max_bytes = MAX_PAGE_BYTES, "Page body truncated");
                break;
            }
        }

        let content = extract_readable(&String::from_utf8_lossy(&body));
        Ok((!content.content.is_empty()).then_some(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_bounded() {
        let mut body = Vec::new();
        assert!(append_bounded(&mut body, b"abc", 8));
        assert!(append_bounded(&mut body, b"de", 8));
        assert!(!append_bounded(&mut body, b"fghij", 8));
        assert_eq!(body, b"abcdefgh");
        assert!(!append_bounded(&mut body, b"k", 8));
        assert_eq!(body.len(), 8);
    }

    #[tokio::test]
    async fn test_rejects_invalid_urls() {
        let fetcher = HttpContentFetcher::new(Duration::from_secs(1)).unwrap();
        assert!(matches!(
            fetcher.fetch("not a url").await,
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            fetcher.fetch("ftp://example.com/file").await,
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
