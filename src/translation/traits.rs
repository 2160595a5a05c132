//! Trait definitions for translation.

use async_trait::async_trait;

use crate::error::TranslationError;

/// Per-item outcome of a batch translation.
pub type ItemResult = Result<String, TranslationError>;

/// Translates texts into the scoring language.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `texts` in one call.
    ///
    /// The outer error means the whole call failed. On success the output has
    /// one outcome per input, in input order; empty input yields empty output.
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<ItemResult>, TranslationError>;

    /// Human-readable translator name used in logs.
    fn name(&self) -> &str {
        "translator"
    }
}
