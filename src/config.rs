//! Configuration management for `vifact`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::aggregator::{AggregationConfig, AggregationStrategy};
use crate::error::ConfigError;
use crate::retrieval::{SourceFilterMode, SourceTrustPolicy};

/// Prefix of the environment variables read by
/// [`FactCheckConfig::apply_env_overrides`].
pub const ENV_PREFIX: &str = "VIFACT_";

/// Global configuration for `vifact`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactCheckConfig {
    /// Evidence search configuration.
    pub search: SearchConfig,
    /// Translation configuration.
    pub translation: TranslationConfig,
    /// Entailment scoring configuration.
    pub entailment: EntailmentConfig,
    /// Verdict aggregation configuration.
    pub aggregation: AggregationConfig,
    /// Evidence preparation configuration.
    pub evidence: EvidenceConfig,
    /// Orchestration configuration.
    pub pipeline: PipelineConfig,
}

/// Configuration for the evidence search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the search proxy.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of hits requested.
    pub max_results: usize,
    /// Country code sent with each query.
    pub country: String,
    /// Search language.
    pub language: String,
    /// Optional freshness filter (e.g. `pw`, `pm`, `py`).
    pub freshness: Option<String>,
    /// Ask the backend for additional snippets per hit.
    pub extra_snippets: bool,
    /// Source-trust policy used to rewrite queries and classify hits.
    pub trust: SourceTrustPolicy,
    /// Minimum interval between search requests in milliseconds.
    pub min_request_interval_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8004".to_string(),
            timeout_ms: 10_000,
            max_results: 5,
            country: "VN".to_string(),
            language: "vi".to_string(),
            freshness: None,
            extra_snippets: true,
            trust: SourceTrustPolicy::default(),
            min_request_interval_ms: 2000,
        }
    }
}

impl SearchConfig {
    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Minimum interval between requests.
    #[must_use]
    pub const fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

/// Configuration for the translation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Base URL of the translation service.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Wrap the translator in a cache.
    pub cache_enabled: bool,
    /// Cache entry lifetime in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached translations.
    pub cache_max_entries: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8003".to_string(),
            timeout_ms: 30_000,
            cache_enabled: false,
            cache_ttl_secs: 3600,
            cache_max_entries: 10_000,
        }
    }
}

impl TranslationConfig {
    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache entry lifetime.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Configuration for the entailment scoring service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntailmentConfig {
    /// Base URL of the scoring service.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for EntailmentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl EntailmentConfig {
    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Configuration for evidence preparation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Maximum number of evidence items per claim.
    pub max_chunks: usize,
    /// Maximum evidence text length in characters.
    pub max_length: usize,
    /// Fetch full page content for each hit.
    pub fetch_full_content: bool,
    /// Per-page fetch timeout in milliseconds.
    pub content_fetch_timeout_ms: u64,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            max_chunks: 5,
            max_length: 400,
            fetch_full_content: false,
            content_fetch_timeout_ms: 10_000,
        }
    }
}

impl EvidenceConfig {
    /// Per-page fetch timeout.
    #[must_use]
    pub const fn content_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.content_fetch_timeout_ms)
    }
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum claim length in characters, after trimming.
    pub min_claim_length: usize,
    /// Overall deadline for one claim check in milliseconds.
    pub deadline_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_claim_length: crate::types::DEFAULT_MIN_CLAIM_LENGTH,
            deadline_ms: 60_000,
        }
    }
}

impl PipelineConfig {
    /// Overall deadline.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// Configuration for retry logic with exponential backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add random jitter to delay.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new `RetryConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial delay in milliseconds.
    #[must_use]
    pub const fn with_initial_delay_ms(mut self, initial_delay_ms: u64) -> Self {
        self.initial_delay_ms = initial_delay_ms;
        self
    }

    /// Set the maximum delay in milliseconds.
    #[must_use]
    pub const fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    /// Set whether to add jitter.
    #[must_use]
    pub const fn with_jitter(mut self, add_jitter: bool) -> Self {
        self.add_jitter = add_jitter;
        self
    }
}

impl FactCheckConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: impl AsRef<std::path::Path>) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Serialize configuration to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::error::Result<String> {
        let content = serde_json::to_string_pretty(self)?;
        Ok(content)
    }

    /// Set search configuration.
    #[must_use]
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Set translation configuration.
    #[must_use]
    pub fn with_translation(mut self, translation: TranslationConfig) -> Self {
        self.translation = translation;
        self
    }

    /// Set entailment configuration.
    #[must_use]
    pub fn with_entailment(mut self, entailment: EntailmentConfig) -> Self {
        self.entailment = entailment;
        self
    }

    /// Set aggregation configuration.
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: AggregationConfig) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Set evidence configuration.
    #[must_use]
    pub fn with_evidence(mut self, evidence: EvidenceConfig) -> Self {
        self.evidence = evidence;
        self
    }

    /// Set pipeline configuration.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Override settings from `VIFACT_*` environment variables.
    ///
    /// Recognized variables: `VIFACT_SEARCH_URL`, `VIFACT_TRANSLATION_URL`,
    /// `VIFACT_ENTAILMENT_URL`, `VIFACT_AGGREGATION_STRATEGY`,
    /// `VIFACT_THRESHOLD_SUPPORTED`, `VIFACT_THRESHOLD_REFUTED`,
    /// `VIFACT_MIN_EVIDENCE_CONFIDENCE`, `VIFACT_SOURCE_FILTER_MODE`,
    /// `VIFACT_MAX_CHUNKS`, `VIFACT_TRANSLATION_CACHE` and
    /// `VIFACT_FETCH_FULL_CONTENT`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable value.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(format!("{ENV_PREFIX}{name}")).ok())
    }

    /// Override settings from `lookup`, keyed by variable name without prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("SEARCH_URL") {
            self.search.base_url = url;
        }
        if let Some(url) = get("TRANSLATION_URL") {
            self.translation.base_url = url;
        }
        if let Some(url) = get("ENTAILMENT_URL") {
            self.entailment.base_url = url;
        }
        if let Some(strategy) = get("AGGREGATION_STRATEGY") {
            self.aggregation.strategy = strategy.parse::<AggregationStrategy>()?;
        }
        if let Some(value) = get("THRESHOLD_SUPPORTED") {
            self.aggregation.threshold_supported = parse_value("THRESHOLD_SUPPORTED", &value)?;
        }
        if let Some(value) = get("THRESHOLD_REFUTED") {
            self.aggregation.threshold_refuted = parse_value("THRESHOLD_REFUTED", &value)?;
        }
        if let Some(value) = get("MIN_EVIDENCE_CONFIDENCE") {
            self.aggregation.min_evidence_confidence =
                parse_value("MIN_EVIDENCE_CONFIDENCE", &value)?;
        }
        if let Some(mode) = get("SOURCE_FILTER_MODE") {
            self.search.trust.mode = mode.parse::<SourceFilterMode>()?;
        }
        if let Some(value) = get("MAX_CHUNKS") {
            self.evidence.max_chunks = parse_value("MAX_CHUNKS", &value)?;
        }
        if let Some(value) = get("TRANSLATION_CACHE") {
            self.translation.cache_enabled = parse_bool("TRANSLATION_CACHE", &value)?;
        }
        if let Some(value) = get("FETCH_FULL_CONTENT") {
            self.evidence.fetch_full_content = parse_bool("FETCH_FULL_CONTENT", &value)?;
        }

        Ok(())
    }

    /// Check the configuration for inconsistent values.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aggregation.validate()?;

        if self.evidence.max_chunks == 0 {
            return Err(ConfigError::Invalid("evidence.max_chunks must be at least 1".into()));
        }
        if self.evidence.max_length == 0 {
            return Err(ConfigError::Invalid("evidence.max_length must be at least 1".into()));
        }
        if self.search.max_results == 0 {
            return Err(ConfigError::Invalid("search.max_results must be at least 1".into()));
        }
        if self.pipeline.deadline_ms == 0 {
            return Err(ConfigError::Invalid("pipeline.deadline_ms must be positive".into()));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{ENV_PREFIX}{name}: cannot parse {value:?}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!(
            "{ENV_PREFIX}{name}: expected a boolean, got {value:?}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = FactCheckConfig::default();
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.search.country, "VN");
        assert_eq!(config.search.min_request_interval_ms, 2000);
        assert_eq!(config.translation.cache_ttl_secs, 3600);
        assert!(!config.translation.cache_enabled);
        assert_eq!(config.evidence.max_chunks, 5);
        assert_eq!(config.evidence.max_length, 400);
        assert_eq!(config.pipeline.min_claim_length, 10);
        assert_eq!(config.aggregation.threshold_supported, 0.5);
        assert_eq!(config.aggregation.threshold_refuted, 0.3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = FactCheckConfig::new()
            .with_evidence(EvidenceConfig {
                max_chunks: 3,
                ..Default::default()
            })
            .with_pipeline(PipelineConfig {
                deadline_ms: 5000,
                ..Default::default()
            });

        assert_eq!(config.evidence.max_chunks, 3);
        assert_eq!(config.pipeline.deadline(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FactCheckConfig::from_json(
            r#"{"aggregation": {"strategy": "average"}, "search": {"max_results": 8}}"#,
        )
        .unwrap();
        assert_eq!(config.aggregation.strategy, AggregationStrategy::Average);
        assert_eq!(config.aggregation.threshold_supported, 0.5);
        assert_eq!(config.search.max_results, 8);
        assert_eq!(config.search.language, "vi");
    }

    #[test]
    fn test_config_serialization() {
        let config = FactCheckConfig::default();
        let json = config.to_json().unwrap();
        let parsed = FactCheckConfig::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("vifact-config-{}.json", uuid::Uuid::new_v4()));
        let config = FactCheckConfig::default().with_evidence(EvidenceConfig {
            fetch_full_content: true,
            ..Default::default()
        });
        config.to_file(&path).unwrap();
        let loaded = FactCheckConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(loaded.evidence.fetch_full_content);
    }

    #[test]
    fn test_overrides() {
        let mut config = FactCheckConfig::default();
        config
            .apply_overrides(lookup(&[
                ("AGGREGATION_STRATEGY", "majority"),
                ("THRESHOLD_SUPPORTED", "0.7"),
                ("SOURCE_FILTER_MODE", "boost"),
                ("MAX_CHUNKS", "3"),
                ("TRANSLATION_CACHE", "true"),
                ("SEARCH_URL", "http://search.local"),
            ]))
            .unwrap();

        assert_eq!(config.aggregation.strategy, AggregationStrategy::Majority);
        assert_eq!(config.aggregation.threshold_supported, 0.7);
        assert_eq!(config.search.trust.mode, SourceFilterMode::Boost);
        assert_eq!(config.evidence.max_chunks, 3);
        assert!(config.translation.cache_enabled);
        assert_eq!(config.search.base_url, "http://search.local");
    }

    #[test]
    fn test_override_errors() {
        let mut config = FactCheckConfig::default();
        assert!(config.apply_overrides(lookup(&[("MAX_CHUNKS", "many")])).is_err());
        assert!(
            config
                .apply_overrides(lookup(&[("AGGREGATION_STRATEGY", "median")]))
                .is_err()
        );
        assert!(config.apply_overrides(lookup(&[("TRANSLATION_CACHE", "maybe")])).is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = FactCheckConfig::default();
        config.aggregation.threshold_supported = 0.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThresholds { .. })
        ));

        let mut config = FactCheckConfig::default();
        config.evidence.max_chunks = 0;
        assert!(config.validate().is_err());
    }
}
