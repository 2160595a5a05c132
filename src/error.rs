//! Unified error types for `vifact`.

use thiserror::Error;

/// The main error type for `vifact` operations.
#[derive(Debug, Error)]
pub enum FactCheckError {
    /// The claim failed caller-level validation.
    #[error("Invalid claim: {0}")]
    InvalidClaim(String),

    /// Evidence search errors
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Content fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Translation errors
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Entailment scoring errors
    #[error("Entailment error: {0}")]
    Entailment(#[from] EntailmentError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Orchestrator construction errors
    #[error("Build error: {0}")]
    Build(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by an evidence source.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport-level failure (connection refused, DNS, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("Search service returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// The request did not complete in time.
    #[error("Search timed out after {0}ms")]
    Timeout(u64),

    /// The response could not be decoded.
    #[error("Malformed search response: {0}")]
    Malformed(String),

    /// The rate limiter was shut down while waiting.
    #[error("Rate limiter closed")]
    RateLimiterClosed,
}

/// Errors raised while fetching full page content.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL is not fetchable (bad scheme, unparsable).
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// The request did not complete in time.
    #[error("Fetch timed out after {0}ms")]
    Timeout(u64),
}

/// Errors raised by a translator, either for a whole batch or a single item.
#[derive(Debug, Clone, Error)]
pub enum TranslationError {
    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("Translation service returned status {0}")]
    Status(u16),

    /// The request did not complete in time.
    #[error("Translation timed out after {0}ms")]
    Timeout(u64),

    /// The service returned no usable translation for an item.
    #[error("No translation returned for item {0}")]
    MissingItem(usize),

    /// The response could not be decoded.
    #[error("Malformed translation response: {0}")]
    Malformed(String),
}

/// Errors raised by an entailment scorer.
#[derive(Debug, Error)]
pub enum EntailmentError {
    /// The scorer was called without evidence.
    #[error("No evidence to score")]
    EmptyEvidence,

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("Entailment service returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// The request did not complete in time.
    #[error("Entailment scoring timed out after {0}ms")]
    Timeout(u64),

    /// Per-item scores do not line up with the evidence sent.
    #[error("Score count mismatch: expected {expected}, got {actual}")]
    CountMismatch {
        /// Number of evidence items sent
        expected: usize,
        /// Number of per-item scores received
        actual: usize,
    },

    /// A score was NaN or infinite.
    #[error("Non-finite score for evidence {0}")]
    NonFiniteScore(usize),

    /// The response could not be decoded.
    #[error("Malformed entailment response: {0}")]
    Malformed(String),
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The supported threshold must be strictly above the refuted threshold.
    #[error("threshold_supported ({supported}) must be greater than threshold_refuted ({refuted})")]
    InvalidThresholds {
        /// Configured supported threshold
        supported: f32,
        /// Configured refuted threshold
        refuted: f32,
    },

    /// A value fell outside its allowed range.
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
        /// Inclusive lower bound
        min: f64,
        /// Inclusive upper bound
        max: f64,
    },

    /// An enumerated setting had an unknown value.
    #[error("unknown {field} value: {value}")]
    UnknownVariant {
        /// Field name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Anything else.
    #[error("{0}")]
    Invalid(String),
}

/// A type alias for Results with [`FactCheckError`].
pub type Result<T> = std::result::Result<T, FactCheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FactCheckError::InvalidClaim("too short".into());
        assert_eq!(err.to_string(), "Invalid claim: too short");
    }

    #[test]
    fn test_search_error_conversion() {
        let err: FactCheckError = SearchError::Timeout(10).into();
        assert!(matches!(err, FactCheckError::Search(_)));
    }

    #[test]
    fn test_threshold_error_message() {
        let err = ConfigError::InvalidThresholds {
            supported: 0.3,
            refuted: 0.5,
        };
        assert!(err.to_string().contains("must be greater than"));
        let err: FactCheckError = err.into();
        assert!(matches!(err, FactCheckError::Config(_)));
    }

    #[test]
    fn test_count_mismatch_display() {
        let err = EntailmentError::CountMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Score count mismatch: expected 3, got 2");
    }
}
