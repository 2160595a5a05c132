//! Verdict aggregation over per-evidence entailment scores.
//!
//! Every strategy reduces the scores to one confidence value and labels it
//! with the same threshold rule ([`AggregationConfig::decide`]), so a single
//! score and an aggregate of several scores are judged identically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::types::{EntailmentScore, Verdict};

/// Rule for combining several per-evidence scores into one decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationStrategy {
    /// Highest single score.
    #[default]
    Best,
    /// Arithmetic mean.
    Average,
    /// Vote by threshold-derived label.
    Majority,
    /// Self-weighted mean, `Σ(s²) / Σ(s)`.
    Weighted,
}

impl fmt::Display for AggregationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Best => "best",
            Self::Average => "average",
            Self::Majority => "majority",
            Self::Weighted => "weighted",
        };
        f.write_str(s)
    }
}

impl FromStr for AggregationStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best" => Ok(Self::Best),
            "average" => Ok(Self::Average),
            "majority" => Ok(Self::Majority),
            "weighted" => Ok(Self::Weighted),
            other => Err(ConfigError::UnknownVariant {
                field: "aggregation strategy",
                value: other.to_string(),
            }),
        }
    }
}

/// Aggregation strategy and decision thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Strategy used to combine scores.
    pub strategy: AggregationStrategy,
    /// Scores at or above this are `SUPPORTED`.
    pub threshold_supported: f32,
    /// Scores below this are `REFUTED`.
    pub threshold_refuted: f32,
    /// Scores below this are ignored unless nothing else remains.
    pub min_evidence_confidence: f32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            strategy: AggregationStrategy::Best,
            threshold_supported: 0.5,
            threshold_refuted: 0.3,
            min_evidence_confidence: 0.1,
        }
    }
}

impl AggregationConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the aggregation strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: AggregationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set both decision thresholds.
    #[must_use]
    pub const fn with_thresholds(mut self, supported: f32, refuted: f32) -> Self {
        self.threshold_supported = supported;
        self.threshold_refuted = refuted;
        self
    }

    /// Set the minimum per-evidence score considered.
    #[must_use]
    pub const fn with_min_evidence_confidence(mut self, min: f32) -> Self {
        self.min_evidence_confidence = min;
        self
    }

    /// Check that thresholds lie in `[0, 1]` and are strictly ordered.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("threshold_supported", self.threshold_supported),
            ("threshold_refuted", self.threshold_refuted),
            ("min_evidence_confidence", self.min_evidence_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value: f64::from(value),
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        if self.threshold_supported <= self.threshold_refuted {
            return Err(ConfigError::InvalidThresholds {
                supported: self.threshold_supported,
                refuted: self.threshold_refuted,
            });
        }
        Ok(())
    }

    /// Map a score to a verdict.
    ///
    /// `score >= threshold_supported` is `SUPPORTED`, `score < threshold_refuted`
    /// is `REFUTED`, anything in between is `NEITHER`.
    #[must_use]
    pub fn decide(&self, score: f32) -> Verdict {
        if score >= self.threshold_supported {
            Verdict::Supported
        } else if score < self.threshold_refuted {
            Verdict::Refuted
        } else {
            Verdict::Neither
        }
    }
}

/// Result of aggregating a set of scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOutcome {
    /// Final verdict.
    pub verdict: Verdict,
    /// Aggregate confidence.
    pub confidence: f32,
    /// Strategy that produced the outcome.
    pub strategy: AggregationStrategy,
    /// Number of scores that took part after filtering.
    pub considered: usize,
    /// Short explanation.
    pub rationale: String,
}

/// Turns per-evidence entailment scores into a verdict and confidence.
#[derive(Debug, Clone, Default)]
pub struct VerdictAggregator {
    config: AggregationConfig,
}

impl VerdictAggregator {
    /// Create an aggregator, validating its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: AggregationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The aggregator configuration.
    #[must_use]
    pub const fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate scores with the configured strategy.
    #[must_use]
    pub fn aggregate(&self, scores: &[EntailmentScore]) -> AggregateOutcome {
        let strategy = self.config.strategy;
        if scores.is_empty() {
            return AggregateOutcome {
                verdict: Verdict::Error,
                confidence: 0.0,
                strategy,
                considered: 0,
                rationale: "No evidence to aggregate".to_string(),
            };
        }

        let filtered = self.filter(scores);
        let considered = filtered.len();

        match strategy {
            AggregationStrategy::Best => {
                let best = best_score(&filtered);
                let verdict = self.config.decide(best.score);
                AggregateOutcome {
                    verdict,
                    confidence: best.score,
                    strategy,
                    considered,
                    rationale: format!(
                        "Best of {considered} evidence: #{} scored {:.3}",
                        best.evidence_index + 1,
                        best.score
                    ),
                }
            }
            AggregationStrategy::Average => {
                let mean = mean_score(&filtered);
                AggregateOutcome {
                    verdict: self.config.decide(mean),
                    confidence: mean,
                    strategy,
                    considered,
                    rationale: format!("Average of {considered} evidence: {mean:.3}"),
                }
            }
            AggregationStrategy::Majority => self.majority(&filtered),
            AggregationStrategy::Weighted => {
                let total: f32 = filtered.iter().map(|s| s.score).sum();
                if total <= 0.0 {
                    let mean = mean_score(&filtered);
                    return AggregateOutcome {
                        verdict: self.config.decide(mean),
                        confidence: mean,
                        strategy,
                        considered,
                        rationale: format!(
                            "Zero total weight, average of {considered} evidence: {mean:.3}"
                        ),
                    };
                }
                let weighted = filtered.iter().map(|s| s.score * s.score).sum::<f32>() / total;
                AggregateOutcome {
                    verdict: self.config.decide(weighted),
                    confidence: weighted,
                    strategy,
                    considered,
                    rationale: format!("Weighted average of {considered} evidence: {weighted:.3}"),
                }
            }
        }
    }

    /// Drop scores below `min_evidence_confidence`, keeping all of them if none pass.
    fn filter<'a>(&self, scores: &'a [EntailmentScore]) -> Vec<&'a EntailmentScore> {
        let passing: Vec<_> = scores
            .iter()
            .filter(|s| s.score >= self.config.min_evidence_confidence)
            .collect();
        if passing.is_empty() {
            scores.iter().collect()
        } else {
            passing
        }
    }

    /// Ties go to the label that occurs first in evidence order.
    fn majority(&self, filtered: &[&EntailmentScore]) -> AggregateOutcome {
        // (verdict, votes, score sum), in order of first occurrence.
        let mut tally: Vec<(Verdict, usize, f32)> = Vec::with_capacity(3);
        for score in filtered {
            let label = self.config.decide(score.score);
            match tally.iter_mut().find(|(v, _, _)| *v == label) {
                Some(entry) => {
                    entry.1 += 1;
                    entry.2 += score.score;
                }
                None => tally.push((label, 1, score.score)),
            }
        }

        let mut winner = tally[0];
        for entry in &tally[1..] {
            if entry.1 > winner.1 {
                winner = *entry;
            }
        }
        let (verdict, votes, sum) = winner;
        #[allow(clippy::cast_precision_loss)]
        let confidence = sum / votes as f32;

        AggregateOutcome {
            verdict,
            confidence,
            strategy: AggregationStrategy::Majority,
            considered: filtered.len(),
            rationale: format!("Majority vote: {verdict} ({votes}/{})", filtered.len()),
        }
    }
}

/// Highest score; the earliest item wins ties.
fn best_score<'a>(scores: &[&'a EntailmentScore]) -> &'a EntailmentScore {
    let mut best = scores[0];
    for score in &scores[1..] {
        if score.score > best.score {
            best = score;
        }
    }
    best
}

#[allow(clippy::cast_precision_loss)]
fn mean_score(scores: &[&EntailmentScore]) -> f32 {
    scores.iter().map(|s| s.score).sum::<f32>() / scores.len() as f32
}
