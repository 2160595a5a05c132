//! Evidence preparation: whitespace normalization, truncation and title fallback.

use crate::evidence::fetcher::{FetchedContent, compact_ws, title_from_url};
use crate::retrieval::SourceTrustPolicy;
use crate::types::{EvidenceItem, SearchHit};

/// Default maximum number of evidence items per claim.
pub const DEFAULT_MAX_CHUNKS: usize = 5;

/// Default maximum evidence text length in characters.
pub const DEFAULT_MAX_LENGTH: usize = 400;

const ELLIPSIS: &str = "...";

/// Turns search hits into bounded evidence items.
#[derive(Debug, Clone)]
pub struct EvidenceChunker {
    max_chunks: usize,
    max_length: usize,
    policy: SourceTrustPolicy,
}

impl Default for EvidenceChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNKS, DEFAULT_MAX_LENGTH)
    }
}

impl EvidenceChunker {
    /// Create a chunker emitting at most `max_chunks` items of at most
    /// `max_length` characters (plus the truncation marker).
    #[must_use]
    pub fn new(max_chunks: usize, max_length: usize) -> Self {
        Self {
            max_chunks,
            max_length,
            policy: SourceTrustPolicy::disabled(),
        }
    }

    /// Classify items with `policy`.
    #[must_use]
    pub fn with_policy(mut self, policy: SourceTrustPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Maximum number of items emitted.
    #[must_use]
    pub const fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    /// Maximum text length before truncation.
    #[must_use]
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    /// Prepare evidence from search hits alone.
    #[must_use]
    pub fn prepare(&self, hits: &[SearchHit]) -> Vec<EvidenceItem> {
        self.prepare_with_content(hits, &[])
    }

    /// Prepare evidence, preferring fetched page content over snippets.
    ///
    /// `fetched` is index-aligned with `hits` and may be shorter. Text falls
    /// back from fetched content to snippet to title; hits with none of these
    /// are skipped.
    #[must_use]
    pub fn prepare_with_content(
        &self,
        hits: &[SearchHit],
        fetched: &[Option<FetchedContent>],
    ) -> Vec<EvidenceItem> {
        let mut items = Vec::with_capacity(hits.len().min(self.max_chunks));

        for (index, hit) in hits.iter().enumerate() {
            if items.len() >= self.max_chunks {
                break;
            }
            let page = fetched.get(index).and_then(Option::as_ref);

            let mut title = compact_ws(&hit.title);
            if title.is_empty() {
                title = page
                    .and_then(|p| p.title.as_deref())
                    .map(compact_ws)
                    .unwrap_or_default();
            }

            let text = [
                page.map(|p| compact_ws(&p.content)).unwrap_or_default(),
                compact_ws(&hit.snippet),
                title.clone(),
            ]
            .into_iter()
            .find(|t| !t.is_empty());

            let Some(text) = text else {
                tracing::debug!(url = %hit.url, "Skipping search hit without text or title");
                continue;
            };

            if title.is_empty() && !hit.url.is_empty() {
                title = title_from_url(&hit.url);
            }

            let item = EvidenceItem::new(truncate_chars(&text, self.max_length), &hit.url, title);
            let trust = self.policy.classify(item.source_domain.as_deref());
            items.push(item.with_trust(trust));
        }

        items
    }
}

/// Truncate `text` to `max_chars` characters, appending `...` when cut.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{ELLIPSIS}", &text[..byte_index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceTrust;

    fn hit(title: &str, url: &str, snippet: &str) -> SearchHit {
        SearchHit::new(title, url, snippet)
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate_chars("Hà Nội", 2), "Hà...");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }

    #[test]
    fn test_prepare_normalizes_and_truncates() {
        let chunker = EvidenceChunker::new(5, 10);
        let items = chunker.prepare(&[hit("T", "https://a.vn", "  một   hai\nba bốn năm sáu ")]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "một hai ba...");
        assert_eq!(items[0].source_domain.as_deref(), Some("a.vn"));
    }

    #[test]
    fn test_title_fallback_and_skip() {
        let chunker = EvidenceChunker::default();
        let items = chunker.prepare(&[
            hit("Only title", "https://a.vn", "   "),
            hit("", "https://b.vn", ""),
            hit("", "https://c.vn", "snippet"),
        ]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "Only title");
        assert_eq!(items[1].text, "snippet");
        assert_eq!(items[1].title, "c.vn");
    }

    #[test]
    fn test_max_chunks_bound() {
        let chunker = EvidenceChunker::new(2, 400);
        let hits: Vec<SearchHit> = (0..5)
            .map(|i| hit("t", &format!("https://{i}.vn"), "s"))
            .collect();
        assert_eq!(chunker.prepare(&hits).len(), 2);
    }

    #[test]
    fn test_fetched_content_preferred() {
        let chunker = EvidenceChunker::default();
        let fetched = vec![
            Some(FetchedContent::new(Some("Page".into()), "full   page text")),
            None,
        ];
        let items = chunker.prepare_with_content(
            &[hit("", "https://a.vn", "snippet a"), hit("B", "https://b.vn", "snippet b")],
            &fetched,
        );
        assert_eq!(items[0].text, "full page text");
        assert_eq!(items[0].title, "Page");
        assert_eq!(items[1].text, "snippet b");
    }

    #[test]
    fn test_trust_classification() {
        let chunker = EvidenceChunker::default().with_policy(SourceTrustPolicy::default());
        let items = chunker.prepare(&[
            hit("a", "https://vnexpress.net/x", "s"),
            hit("b", "https://www.facebook.com/x", "s"),
            hit("c", "https://blog.example.com", "s"),
        ]);
        assert_eq!(items[0].trust, SourceTrust::Trusted);
        assert_eq!(items[1].trust, SourceTrust::Untrusted);
        assert_eq!(items[2].trust, SourceTrust::Unknown);
    }
}
