//! Core data structures for `vifact`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::aggregator::AggregationStrategy;
use crate::error::{EntailmentError, FactCheckError};
use crate::retrieval::domain_for_url;

/// Minimum claim length (in characters, after trimming) accepted by default.
pub const DEFAULT_MIN_CLAIM_LENGTH: usize = 10;

/// A unique identifier for a single claim check, used to correlate log events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimId(pub String);

impl ClaimId {
    /// Create a new random claim ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated claim in the source language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    id: ClaimId,
    text: String,
}

impl Claim {
    /// Create a claim, rejecting text shorter than `min_len` characters.
    ///
    /// Leading and trailing whitespace is removed before the length check.
    ///
    /// # Errors
    ///
    /// Returns [`FactCheckError::InvalidClaim`] if the trimmed text is too short.
    pub fn new(text: impl AsRef<str>, min_len: usize) -> Result<Self, FactCheckError> {
        let trimmed = text.as_ref().trim();
        let len = trimmed.chars().count();
        if len < min_len {
            return Err(FactCheckError::InvalidClaim(format!(
                "claim too short ({len} characters, minimum {min_len})"
            )));
        }
        Ok(Self {
            id: ClaimId::new(),
            text: trimmed.to_string(),
        })
    }

    /// The claim identifier.
    #[must_use]
    pub fn id(&self) -> &ClaimId {
        &self.id
    }

    /// The claim text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A raw search result as returned by an evidence source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Page URL.
    #[serde(default)]
    pub url: String,
    /// Snippet text.
    #[serde(default)]
    pub snippet: String,
}

impl SearchHit {
    /// Create a new search hit.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// How far a source domain is trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTrust {
    /// Listed as a trusted source.
    Trusted,
    /// Listed as an untrusted source.
    Untrusted,
    /// Not listed.
    #[default]
    Unknown,
}

/// A piece of evidence prepared for verification.
///
/// `text` always holds the original (untranslated) text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Evidence text in the source language.
    pub text: String,
    /// Source URL.
    pub url: String,
    /// Source title.
    pub title: String,
    /// Host derived from `url`, without a leading `www.`.
    pub source_domain: Option<String>,
    /// Trust classification of `source_domain`.
    pub trust: SourceTrust,
}

impl EvidenceItem {
    /// Create an evidence item, deriving its source domain from the URL.
    #[must_use]
    pub fn new(text: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        let url = url.into();
        let source_domain = domain_for_url(&url);
        Self {
            text: text.into(),
            url,
            title: title.into(),
            source_domain,
            trust: SourceTrust::Unknown,
        }
    }

    /// Set the trust classification.
    #[must_use]
    pub fn with_trust(mut self, trust: SourceTrust) -> Self {
        self.trust = trust;
        self
    }
}

/// A single translated entry of a [`TranslationBatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationEntry {
    /// Source-language text.
    pub source: String,
    /// Translated text, or the source text when translation failed.
    pub translated: String,
    /// Whether the entry fell back to the source text.
    pub degraded: bool,
}

/// An ordered batch of translations; always the same length and order as its input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationBatch {
    entries: Vec<TranslationEntry>,
}

impl TranslationBatch {
    /// Build a batch from its entries.
    #[must_use]
    pub fn from_entries(entries: Vec<TranslationEntry>) -> Self {
        Self { entries }
    }

    /// All entries, in input order.
    #[must_use]
    pub fn entries(&self) -> &[TranslationEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Translated texts, in input order.
    #[must_use]
    pub fn translated_texts(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.translated.clone()).collect()
    }

    /// Number of entries that fell back to their source text.
    #[must_use]
    pub fn degraded_count(&self) -> usize {
        self.entries.iter().filter(|e| e.degraded).count()
    }

    /// Consume the batch and return its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<TranslationEntry> {
        self.entries
    }
}

/// Label attached to a single entailment score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntailmentLabel {
    /// Evidence supports the claim.
    Supported,
    /// Evidence contradicts the claim.
    Refuted,
    /// Evidence is inconclusive.
    #[default]
    Neither,
    /// Scoring failed.
    Error,
}

impl fmt::Display for EntailmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Supported => "SUPPORTED",
            Self::Refuted => "REFUTED",
            Self::Neither => "NEITHER",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

impl FromStr for EntailmentLabel {
    type Err = EntailmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUPPORTED" | "ENTAILMENT" => Ok(Self::Supported),
            // Binary entailment models report "unsupported" for anything not entailed.
            "REFUTED" | "CONTRADICTION" | "UNSUPPORTED" => Ok(Self::Refuted),
            "NEITHER" | "NEUTRAL" | "NOT_ENOUGH_INFO" | "UNCERTAIN" => Ok(Self::Neither),
            "ERROR" => Ok(Self::Error),
            other => Err(EntailmentError::Malformed(format!("unknown label {other}"))),
        }
    }
}

impl From<Verdict> for EntailmentLabel {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Supported => Self::Supported,
            Verdict::Refuted => Self::Refuted,
            Verdict::Neither => Self::Neither,
            Verdict::NoEvidence | Verdict::Error => Self::Error,
        }
    }
}

/// Entailment score of one evidence item against the claim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntailmentScore {
    /// Position of the evidence item in the scored list.
    pub evidence_index: usize,
    /// Label reported for this item.
    pub label: EntailmentLabel,
    /// Support strength in `[0, 1]`.
    pub score: f32,
}

impl EntailmentScore {
    /// Create a new score.
    #[must_use]
    pub fn new(evidence_index: usize, label: EntailmentLabel, score: f32) -> Self {
        Self {
            evidence_index,
            label,
            score,
        }
    }
}

/// A scorer response carrying the model's own label and score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScore {
    /// Model label for the evidence set.
    pub label: EntailmentLabel,
    /// Model score for the evidence set.
    pub score: f32,
    /// Per-item scores, possibly empty for single-evidence calls.
    #[serde(default)]
    pub items: Vec<EntailmentScore>,
}

/// A scorer response already reduced to a verdict by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedScore {
    /// Service-side verdict.
    pub verdict: Verdict,
    /// Service-side confidence.
    pub confidence: f32,
    /// Per-item scores the verdict was derived from.
    #[serde(default)]
    pub items: Vec<EntailmentScore>,
}

/// Response of an entailment scorer.
///
/// The orchestrator re-aggregates the per-item scores with its own strategy, so
/// both variants are reduced to the same per-item list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntailmentResponse {
    /// Unprocessed model output.
    Raw(RawScore),
    /// Output already aggregated by the service.
    Aggregated(AggregatedScore),
}

impl EntailmentResponse {
    /// Per-item scores as reported.
    #[must_use]
    pub fn items(&self) -> &[EntailmentScore] {
        match self {
            Self::Raw(raw) => &raw.items,
            Self::Aggregated(agg) => &agg.items,
        }
    }

    /// The top-level label reported by the scorer.
    #[must_use]
    pub fn label(&self) -> EntailmentLabel {
        match self {
            Self::Raw(raw) => raw.label,
            Self::Aggregated(agg) => agg.verdict.into(),
        }
    }

    /// The top-level score reported by the scorer.
    #[must_use]
    pub fn score(&self) -> f32 {
        match self {
            Self::Raw(raw) => raw.score,
            Self::Aggregated(agg) => agg.confidence,
        }
    }

    /// Reduce the response to exactly one score per evidence item.
    ///
    /// A response without per-item scores is accepted for a single evidence
    /// item, using the top-level label and score. Scores are clamped to `[0, 1]`
    /// and returned ordered by evidence index.
    ///
    /// # Errors
    ///
    /// Returns an error if the item count differs from `expected`, indices are
    /// not exactly `0..expected`, or any score is not finite.
    pub fn into_item_scores(self, expected: usize) -> Result<Vec<EntailmentScore>, EntailmentError> {
        let top_label = self.label();
        let top_score = self.score();
        let mut items = match self {
            Self::Raw(raw) => raw.items,
            Self::Aggregated(agg) => agg.items,
        };

        if items.is_empty() && expected == 1 {
            items.push(EntailmentScore::new(0, top_label, top_score));
        }

        if items.len() != expected {
            return Err(EntailmentError::CountMismatch {
                expected,
                actual: items.len(),
            });
        }

        items.sort_by_key(|s| s.evidence_index);
        for (position, item) in items.iter_mut().enumerate() {
            if item.evidence_index != position {
                return Err(EntailmentError::Malformed(format!(
                    "evidence indices are not 0..{expected}"
                )));
            }
            if !item.score.is_finite() {
                return Err(EntailmentError::NonFiniteScore(position));
            }
            item.score = item.score.clamp(0.0, 1.0);
        }

        Ok(items)
    }
}

/// Final decision for a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// The evidence supports the claim.
    Supported,
    /// The evidence refutes the claim.
    Refuted,
    /// The evidence is inconclusive.
    Neither,
    /// No evidence was retrieved.
    NoEvidence,
    /// The check could not be completed.
    Error,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Supported => "SUPPORTED",
            Self::Refuted => "REFUTED",
            Self::Neither => "NEITHER",
            Self::NoEvidence => "NO_EVIDENCE",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Kind of failure or degradation recorded on a [`ClaimResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Retrieval returned nothing. Terminal.
    NoEvidence,
    /// Some texts were not translated and were used as-is.
    TranslationDegraded,
    /// Entailment scoring failed or had nothing to score.
    ScoringUnavailable,
    /// Deadline exceeded or another unexpected failure.
    SystemError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoEvidence => "NO_EVIDENCE",
            Self::TranslationDegraded => "TRANSLATION_DEGRADED",
            Self::ScoringUnavailable => "SCORING_UNAVAILABLE",
            Self::SystemError => "SYSTEM_ERROR",
        };
        f.write_str(s)
    }
}

/// Evidence as it was used for a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvidence {
    /// The evidence item with its original text.
    pub item: EvidenceItem,
    /// Text actually sent to the scorer.
    pub translated_text: String,
    /// Whether translation fell back to the original text.
    pub translation_degraded: bool,
    /// The item's entailment score, if scoring succeeded.
    pub score: Option<EntailmentScore>,
}

/// Wall-clock time spent in each stage, in milliseconds.
///
/// A stage that did not run is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    /// Evidence search.
    pub search_ms: Option<u64>,
    /// Full-content fetch.
    pub fetch_ms: Option<u64>,
    /// Batch translation.
    pub translation_ms: Option<u64>,
    /// Entailment scoring.
    pub scoring_ms: Option<u64>,
}

/// The outcome of checking one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimResult {
    /// Identifier of the checked claim.
    pub claim_id: ClaimId,
    /// Claim text in the source language.
    pub claim: String,
    /// Claim text as sent to the scorer, if translation ran.
    pub translated_claim: Option<String>,
    /// Final verdict.
    pub verdict: Verdict,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Human-readable explanation of the decision.
    pub rationale: String,
    /// Aggregation strategy that produced the verdict.
    pub strategy: AggregationStrategy,
    /// Evidence used, in scoring order.
    pub evidence_used: Vec<ScoredEvidence>,
    /// Source URLs of the evidence used.
    pub sources: Vec<String>,
    /// Total processing time in milliseconds.
    pub processing_time_ms: u64,
    /// Per-stage timings.
    pub stage_timings: StageTimings,
    /// Failure or degradation, if any.
    pub error_kind: Option<ErrorKind>,
    /// When the check finished.
    pub checked_at: DateTime<Utc>,
}

impl ClaimResult {
    /// Number of evidence items used.
    #[must_use]
    pub fn evidence_count(&self) -> usize {
        self.evidence_used.len()
    }

    /// Whether the verdict is one of the regular decision outcomes.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        matches!(
            self.verdict,
            Verdict::Supported | Verdict::Refuted | Verdict::Neither
        )
    }

    /// Serialize the result to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_too_short() {
        let err = Claim::new("  ngắn  ", DEFAULT_MIN_CLAIM_LENGTH).unwrap_err();
        assert!(matches!(err, FactCheckError::InvalidClaim(_)));
    }

    #[test]
    fn test_claim_counts_characters_not_bytes() {
        // 10 characters, more than 10 bytes.
        let claim = Claim::new("Hà Nội đẹp", 10).unwrap();
        assert_eq!(claim.text(), "Hà Nội đẹp");
        assert!(Claim::new("Hà Nội đẹp", 11).is_err());
    }

    #[test]
    fn test_claim_is_trimmed() {
        let claim = Claim::new("  Hà Nội là thủ đô của Việt Nam \n", 10).unwrap();
        assert_eq!(claim.text(), "Hà Nội là thủ đô của Việt Nam");
    }

    #[test]
    fn test_evidence_item_domain() {
        let item = EvidenceItem::new("text", "https://www.VnExpress.net/a/b", "title");
        assert_eq!(item.source_domain.as_deref(), Some("vnexpress.net"));
        assert_eq!(item.trust, SourceTrust::Unknown);

        let item = EvidenceItem::new("text", "not a url", "title");
        assert!(item.source_domain.is_none());
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(
            "supported".parse::<EntailmentLabel>().unwrap(),
            EntailmentLabel::Supported
        );
        assert_eq!(
            "UNSUPPORTED".parse::<EntailmentLabel>().unwrap(),
            EntailmentLabel::Refuted
        );
        assert_eq!(
            "NOT_ENOUGH_INFO".parse::<EntailmentLabel>().unwrap(),
            EntailmentLabel::Neither
        );
        assert!("maybe".parse::<EntailmentLabel>().is_err());
    }

    #[test]
    fn test_item_scores_single_evidence_fallback() {
        let response = EntailmentResponse::Raw(RawScore {
            label: EntailmentLabel::Supported,
            score: 0.8,
            items: Vec::new(),
        });
        let items = response.into_item_scores(1).unwrap();
        assert_eq!(items, vec![EntailmentScore::new(0, EntailmentLabel::Supported, 0.8)]);
    }

    #[test]
    fn test_item_scores_count_mismatch() {
        let response = EntailmentResponse::Raw(RawScore {
            label: EntailmentLabel::Supported,
            score: 0.8,
            items: vec![EntailmentScore::new(0, EntailmentLabel::Supported, 0.8)],
        });
        let err = response.into_item_scores(2).unwrap_err();
        assert!(matches!(
            err,
            EntailmentError::CountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_item_scores_reordered_and_clamped() {
        let response = EntailmentResponse::Aggregated(AggregatedScore {
            verdict: Verdict::Supported,
            confidence: 0.9,
            items: vec![
                EntailmentScore::new(1, EntailmentLabel::Refuted, -0.2),
                EntailmentScore::new(0, EntailmentLabel::Supported, 1.3),
            ],
        });
        let items = response.into_item_scores(2).unwrap();
        assert_eq!(items[0].evidence_index, 0);
        assert!((items[0].score - 1.0).abs() < f32::EPSILON);
        assert!(items[1].score.abs() < f32::EPSILON);
    }

    #[test]
    fn test_item_scores_rejects_nan() {
        let response = EntailmentResponse::Raw(RawScore {
            label: EntailmentLabel::Supported,
            score: 0.5,
            items: vec![EntailmentScore::new(0, EntailmentLabel::Supported, f32::NAN)],
        });
        assert!(matches!(
            response.into_item_scores(1),
            Err(EntailmentError::NonFiniteScore(0))
        ));
    }

    #[test]
    fn test_item_scores_rejects_duplicate_indices() {
        let response = EntailmentResponse::Raw(RawScore {
            label: EntailmentLabel::Supported,
            score: 0.5,
            items: vec![
                EntailmentScore::new(0, EntailmentLabel::Supported, 0.5),
                EntailmentScore::new(0, EntailmentLabel::Supported, 0.6),
            ],
        });
        assert!(matches!(
            response.into_item_scores(2),
            Err(EntailmentError::Malformed(_))
        ));
    }

    #[test]
    fn test_response_tagged_serialization() {
        let response = EntailmentResponse::Aggregated(AggregatedScore {
            verdict: Verdict::Refuted,
            confidence: 0.1,
            items: Vec::new(),
        });
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"kind\":\"aggregated\""));
        assert!(json.contains("\"verdict\":\"REFUTED\""));
        let parsed: EntailmentResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.label(), EntailmentLabel::Refuted);
    }

    #[test]
    fn test_translation_batch_helpers() {
        let batch = TranslationBatch::from_entries(vec![
            TranslationEntry {
                source: "a".into(),
                translated: "a_en".into(),
                degraded: false,
            },
            TranslationEntry {
                source: "b".into(),
                translated: "b".into(),
                degraded: true,
            },
        ]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.degraded_count(), 1);
        assert_eq!(batch.translated_texts(), vec!["a_en", "b"]);
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::NoEvidence.to_string(), "NO_EVIDENCE");
        assert_eq!(ErrorKind::ScoringUnavailable.to_string(), "SCORING_UNAVAILABLE");
    }
}
