//! Mock entailment scorer for tests and offline runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::entailment::traits::EntailmentScorer;
use crate::error::EntailmentError;
use crate::types::{EntailmentLabel, EntailmentResponse, EntailmentScore, RawScore};

/// A scorer returning preset scores, one per evidence item.
///
/// Scores beyond the preset list default to `0.0`. Labels follow the
/// default 0.5/0.3 threshold rule.
#[derive(Debug, Default)]
pub struct MockEntailmentScorer {
    scores: Vec<f32>,
    fail: bool,
    omit_items: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    evidence_seen: AtomicUsize,
}

impl MockEntailmentScorer {
    /// A scorer returning `scores` in evidence order.
    #[must_use]
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            ..Self::default()
        }
    }

    /// A scorer whose calls always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Return only a top-level score, without per-item scores.
    #[must_use]
    pub fn without_items(mut self) -> Self {
        self.omit_items = true;
        self
    }

    /// Sleep for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `score` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Number of evidence texts received in the most recent call.
    #[must_use]
    pub fn last_evidence_count(&self) -> usize {
        self.evidence_seen.load(Ordering::Relaxed)
    }

    fn label_for(score: f32) -> EntailmentLabel {
        if score >= 0.5 {
            EntailmentLabel::Supported
        } else if score < 0.3 {
            EntailmentLabel::Refuted
        } else {
            EntailmentLabel::Neither
        }
    }
}

#[async_trait]
impl EntailmentScorer for MockEntailmentScorer {
    async fn score(
        &self,
        _claim: &str,
        evidence: &[String],
    ) -> Result<EntailmentResponse, EntailmentError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.evidence_seen.store(evidence.len(), Ordering::Relaxed);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(EntailmentError::Network("mock scoring failure".to_string()));
        }
        if evidence.is_empty() {
            return Err(EntailmentError::EmptyEvidence);
        }

        let items: Vec<EntailmentScore> = (0..evidence.len())
            .map(|i| {
                let score = self.scores.get(i).copied().unwrap_or(0.0);
                EntailmentScore::new(i, Self::label_for(score), score)
            })
            .collect();

        let top = items
            .iter()
            .copied()
            .fold(None::<EntailmentScore>, |best, s| match best {
                Some(b) if b.score >= s.score => Some(b),
                _ => Some(s),
            })
            .unwrap_or(EntailmentScore::new(0, EntailmentLabel::Neither, 0.0));

        Ok(EntailmentResponse::Raw(RawScore {
            label: top.label,
            score: top.score,
            items: if self.omit_items { Vec::new() } else { items },
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_scores_per_item() {
        let scorer = MockEntailmentScorer::new(vec![0.9, 0.1]);
        let response = scorer
            .score("claim", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(response.items().len(), 2);
        assert_eq!(response.label(), EntailmentLabel::Supported);
        assert_eq!(response.items()[1].label, EntailmentLabel::Refuted);
        assert_eq!(scorer.call_count(), 1);
        assert_eq!(scorer.last_evidence_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_rejects_empty_evidence() {
        let scorer = MockEntailmentScorer::new(vec![]);
        assert!(matches!(
            scorer.score("claim", &[]).await,
            Err(EntailmentError::EmptyEvidence)
        ));
    }
}
