//! Translation of the claim and evidence into the scoring language.

pub mod batch;
pub mod cache;
pub mod mock;
pub mod traits;

pub use batch::{translate_with_fallback, untranslated};
pub use cache::{CacheStats, CachedTranslator, TranslationCacheConfig};
pub use mock::MockTranslator;
pub use traits::{ItemResult, Translator};
