//! Evidence preparation.
//!
//! Search hits are optionally enriched with fetched page content, then
//! normalized, truncated and capped by the [`EvidenceChunker`].

pub mod chunker;
pub mod fetcher;

pub use chunker::{DEFAULT_MAX_CHUNKS, DEFAULT_MAX_LENGTH, EvidenceChunker, truncate_chars};
pub use fetcher::{
    ContentFetcher, FetchedContent, MAX_PAGE_BYTES, MockContentFetcher, compact_ws,
    extract_readable, fetch_contents, title_from_url,
};
