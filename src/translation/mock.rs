//! Mock translator for tests and offline runs.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::TranslationError;
use crate::translation::traits::{ItemResult, Translator};

/// A translator that appends `_en` to every text.
#[derive(Debug, Default)]
pub struct MockTranslator {
    failing_items: HashSet<String>,
    fail_all: bool,
    drop_last: bool,
    calls: AtomicUsize,
    texts_seen: AtomicUsize,
}

impl MockTranslator {
    /// Create a mock translator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the item whose source text is `text`.
    #[must_use]
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing_items.insert(text.into());
        self
    }

    /// Fail every call as a whole.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Return one outcome fewer than requested.
    #[must_use]
    pub fn dropping_last(mut self) -> Self {
        self.drop_last = true;
        self
    }

    /// Number of `translate_batch` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Total number of texts received across all calls.
    #[must_use]
    pub fn texts_seen(&self) -> usize {
        self.texts_seen.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<ItemResult>, TranslationError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.texts_seen.fetch_add(texts.len(), Ordering::Relaxed);

        if self.fail_all {
            return Err(TranslationError::Network("mock translation failure".to_string()));
        }

        let mut outcomes: Vec<ItemResult> = texts
            .iter()
            .enumerate()
            .map(|(index, text)| {
                if self.failing_items.contains(text) {
                    Err(TranslationError::MissingItem(index))
                } else {
                    Ok(format!("{text}_en"))
                }
            })
            .collect();

        if self.drop_last {
            outcomes.pop();
        }
        Ok(outcomes)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
