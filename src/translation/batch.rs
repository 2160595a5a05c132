//! Degrading batch translation.

use crate::translation::traits::Translator;
use crate::types::{TranslationBatch, TranslationEntry};

/// Translate `texts` in a single call, falling back to the source text for
/// every item that could not be translated.
///
/// A whole-call failure or a response of the wrong length degrades every item.
/// The returned batch always has the same length and order as `texts`.
pub async fn translate_with_fallback<T: Translator + ?Sized>(
    translator: &T,
    texts: &[String],
) -> TranslationBatch {
    if texts.is_empty() {
        return TranslationBatch::default();
    }

    let outcomes = match translator.translate_batch(texts).await {
        Ok(outcomes) if outcomes.len() == texts.len() => outcomes,
        Ok(outcomes) => {
            tracing::warn!(
                translator = translator.name(),
                expected = texts.len(),
                actual = outcomes.len(),
                "Translation batch length mismatch, using source texts"
            );
            return untranslated(texts);
        }
        Err(e) => {
            tracing::warn!(
                translator = translator.name(),
                error = %e,
                "Translation batch failed, using source texts"
            );
            return untranslated(texts);
        }
    };

    let entries = texts
        .iter()
        .zip(outcomes)
        .enumerate()
        .map(|(index, (source, outcome))| match outcome {
            Ok(translated) if !translated.trim().is_empty() => TranslationEntry {
                source: source.clone(),
                translated,
                degraded: false,
            },
            Ok(_) => {
                tracing::debug!(index, "Empty translation, using source text");
                degrade(source)
            }
            Err(e) => {
                tracing::debug!(index, error = %e, "Item translation failed, using source text");
                degrade(source)
            }
        })
        .collect();

    TranslationBatch::from_entries(entries)
}

fn degrade(source: &str) -> TranslationEntry {
    TranslationEntry {
        source: source.to_string(),
        translated: source.to_string(),
        degraded: true,
    }
}

/// A batch in which every text falls back to its source form.
#[must_use]
pub fn untranslated(texts: &[String]) -> TranslationBatch {
    TranslationBatch::from_entries(texts.iter().map(|t| degrade(t)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::MockTranslator;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_per_item_failure_degrades_only_that_item() {
        let translator = MockTranslator::new().failing_on("ev2");
        let batch = translate_with_fallback(&translator, &texts(&["claim", "ev1", "ev2"])).await;
        assert_eq!(batch.translated_texts(), vec!["claim_en", "ev1_en", "ev2"]);
        assert_eq!(batch.degraded_count(), 1);
        assert!(batch.entries()[2].degraded);
        assert_eq!(translator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_whole_call_failure_degrades_all() {
        let translator = MockTranslator::new().failing();
        let batch = translate_with_fallback(&translator, &texts(&["claim", "ev1"])).await;
        assert_eq!(batch.translated_texts(), vec!["claim", "ev1"]);
        assert_eq!(batch.degraded_count(), 2);
    }

    #[tokio::test]
    async fn test_length_mismatch_degrades_all() {
        let translator = MockTranslator::new().dropping_last();
        let batch = translate_with_fallback(&translator, &texts(&["a", "b"])).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.degraded_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_input_skips_translator() {
        let translator = MockTranslator::new();
        let batch = translate_with_fallback(&translator, &[]).await;
        assert!(batch.is_empty());
        assert_eq!(translator.call_count(), 0);
    }
}
