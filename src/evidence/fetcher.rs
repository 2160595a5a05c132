//! Optional full-content fetching for search hits.

use async_trait::async_trait;
use futures::future::join_all;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::FetchError;
use crate::retrieval::domain_for_url;

/// Readable content extracted from a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedContent {
    /// Page title, if one was found.
    pub title: Option<String>,
    /// Main text, whitespace-compacted.
    pub content: String,
}

impl FetchedContent {
    /// Create fetched content.
    #[must_use]
    pub fn new(title: Option<String>, content: impl Into<String>) -> Self {
        Self {
            title,
            content: content.into(),
        }
    }
}

/// Retrieves the readable content behind a URL.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url`. `Ok(None)` means the page had no usable content.
    async fn fetch(&self, url: &str) -> Result<Option<FetchedContent>, FetchError>;
}

/// Fetch every URL concurrently, each bounded by `per_url_timeout`.
///
/// The output is index-aligned with `urls`; failed, timed-out and non-HTTP
/// URLs yield `None`.
pub async fn fetch_contents<F: ContentFetcher + ?Sized>(
    fetcher: &F,
    urls: &[&str],
    per_url_timeout: Duration,
) -> Vec<Option<FetchedContent>> {
    let futures = urls.iter().map(|url| async move {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return None;
        }
        match tokio::time::timeout(per_url_timeout, fetcher.fetch(url)).await {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                tracing::debug!(url = %url, error = %e, "Content fetch failed");
                None
            }
            Err(_) => {
                tracing::debug!(url = %url, "Content fetch timed out");
                None
            }
        }
    });
    join_all(futures).await
}

/// Largest HTML document parsed for readable text, in bytes.
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Extract the title and main text from an HTML document.
///
/// The text comes from paragraphs and list items of the first `article`,
/// `main` or `body` element, falling back to all text of that element.
/// Script and style text is skipped. Only the first [`MAX_PAGE_BYTES`] of
/// `html` are parsed.
#[must_use]
pub fn extract_readable(html: &str) -> FetchedContent {
    let document = Html::parse_document(bounded_html(html, MAX_PAGE_BYTES));

    let title = first_text(&document, "title")
        .or_else(|| first_text(&document, "h1"))
        .or_else(|| {
            Selector::parse(r#"meta[property="og:title"]"#)
                .ok()
                .and_then(|sel| {
                    document
                        .select(&sel)
                        .next()
                        .and_then(|m| m.value().attr("content"))
                        .map(compact_ws)
                })
                .filter(|t| !t.is_empty())
        });

    let root = ["article", "main", "body"].iter().find_map(|name| {
        Selector::parse(name)
            .ok()
            .and_then(|sel| document.select(&sel).next())
    });

    let Some(root) = root else {
        return FetchedContent::new(title, String::new());
    };

    let mut blocks = Vec::new();
    if let Ok(block_sel) = Selector::parse("p, li") {
        for elem in root.select(&block_sel) {
            let text = compact_ws(&text_content(elem));
            if !text.is_empty() {
                blocks.push(text);
            }
        }
    }

    let content = if blocks.is_empty() {
        compact_ws(&text_content(root))
    } else {
        blocks.join(" ")
    };

    FetchedContent::new(title, content)
}

/// A display title derived from a URL's domain.
#[must_use]
pub fn title_from_url(url: &str) -> String {
    domain_for_url(url).unwrap_or_else(|| "Web Source".to_string())
}

/// Collapse runs of whitespace into single spaces and trim.
#[must_use]
pub fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn bounded_html(html: &str, max_bytes: usize) -> &str {
    if html.len() <= max_bytes {
        return html;
    }
    let mut end = max_bytes;
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    &html[..end]
}

fn text_content(elem: ElementRef<'_>) -> String {
    elem.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
            });
            (!hidden).then_some(&**text)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .map(|e| compact_ws(&text_content(e)))
        .filter(|t| !t.is_empty())
}

/// A content fetcher serving pages from memory.
#[derive(Debug, Default)]
pub struct MockContentFetcher {
    pages: HashMap<String, FetchedContent>,
    calls: AtomicUsize,
}

impl MockContentFetcher {
    /// Create an empty mock fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `url`.
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, content: FetchedContent) -> Self {
        self.pages.insert(url.into(), content);
        self
    }

    /// Number of `fetch` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ContentFetcher for MockContentFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<FetchedContent>, FetchError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.pages.get(url) {
            Some(content) => Ok(Some(content.clone())),
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}
