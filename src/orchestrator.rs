//! Claim verification pipeline.
//!
//! [`FactCheckOrchestrator`] runs one claim through search, optional content
//! fetching, evidence preparation, batch translation, entailment scoring and
//! verdict aggregation. Every stage is fail-soft: a claim check always ends in
//! a [`ClaimResult`], with failures recorded as an [`ErrorKind`].

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout};

use crate::aggregator::VerdictAggregator;
use crate::config::FactCheckConfig;
use crate::entailment::EntailmentScorer;
use crate::error::{EntailmentError, FactCheckError};
use crate::evidence::{ContentFetcher, EvidenceChunker, fetch_contents};
use crate::metrics::{MetricsCollector, stage};
use crate::retrieval::EvidenceSource;
use crate::translation::{Translator, translate_with_fallback, untranslated};
use crate::types::{
    Claim, ClaimResult, EntailmentScore, ErrorKind, EvidenceItem, ScoredEvidence, SearchHit,
    StageTimings, Verdict,
};

/// A claim verifier.
#[async_trait]
pub trait FactChecker: Send + Sync {
    /// Check a validated claim. Never fails; failures are reported in the result.
    async fn check_claim(&self, claim: &Claim) -> ClaimResult;

    /// Validate `text` as a claim and check it.
    ///
    /// # Errors
    ///
    /// Returns [`FactCheckError::InvalidClaim`] if the text is too short.
    async fn check_text(&self, text: &str) -> Result<ClaimResult, FactCheckError>;

    /// Check several claims concurrently, returning results in input order.
    async fn check_claims(&self, claims: Vec<Claim>) -> Vec<ClaimResult>;

    /// The active configuration.
    fn config(&self) -> &FactCheckConfig;
}

/// What a run produced before timing information is attached.
struct Verification {
    verdict: Verdict,
    confidence: f32,
    rationale: String,
    evidence_used: Vec<ScoredEvidence>,
    error_kind: Option<ErrorKind>,
}

impl Verification {
    fn failed(verdict: Verdict, kind: ErrorKind, rationale: impl Into<String>) -> Self {
        Self {
            verdict,
            confidence: 0.0,
            rationale: rationale.into(),
            evidence_used: Vec::new(),
            error_kind: Some(kind),
        }
    }
}

/// State that survives a run cancelled by the deadline.
#[derive(Default)]
struct RunTrace {
    timings: StageTimings,
    translated_claim: Option<String>,
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// The fact-check pipeline over an evidence source, a translator and a scorer.
pub struct FactCheckOrchestrator<S, T, E>
where
    S: EvidenceSource,
    T: Translator,
    E: EntailmentScorer,
{
    source: S,
    translator: T,
    scorer: E,
    fetcher: Option<Box<dyn ContentFetcher>>,
    chunker: EvidenceChunker,
    aggregator: VerdictAggregator,
    config: FactCheckConfig,
    metrics: Arc<MetricsCollector>,
}

impl<S, T, E> FactCheckOrchestrator<S, T, E>
where
    S: EvidenceSource,
    T: Translator,
    E: EntailmentScorer,
{
    /// Create an orchestrator from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(
        source: S,
        translator: T,
        scorer: E,
        config: FactCheckConfig,
    ) -> Result<Self, FactCheckError> {
        config.validate()?;
        let aggregator = VerdictAggregator::new(config.aggregation.clone())?;
        let chunker = EvidenceChunker::new(config.evidence.max_chunks, config.evidence.max_length)
            .with_policy(config.search.trust.clone());

        Ok(Self {
            source,
            translator,
            scorer,
            fetcher: None,
            chunker,
            aggregator,
            config,
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    /// Install a content fetcher, used when `evidence.fetch_full_content` is set.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Box<dyn ContentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Share `metrics` instead of the orchestrator's own collector.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    /// The evidence source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The translator.
    #[must_use]
    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// The entailment scorer.
    #[must_use]
    pub fn scorer(&self) -> &E {
        &self.scorer
    }

    /// The aggregator.
    #[must_use]
    pub const fn aggregator(&self) -> &VerdictAggregator {
        &self.aggregator
    }

    /// The metrics collector.
    #[must_use]
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    async fn search(&self, claim: &Claim, trace: &mut RunTrace) -> Vec<SearchHit> {
        let query = self.config.search.trust.rewrite_query(claim.text());
        let search_timeout = self.config.search.timeout();
        let started = Instant::now();

        // Pacing waits are bounded by the run deadline, not the search timeout.
        let permit = match self.source.ready().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!(claim_id = %claim.id(), source = self.source.name(), error = %e, "Evidence source unavailable");
                trace.timings.search_ms = Some(elapsed_ms(started));
                return Vec::new();
            }
        };
        let queued = started.elapsed();
        if !queued.is_zero() {
            tracing::debug!(claim_id = %claim.id(), wait_ms = duration_ms(queued), "Search request paced");
        }

        let hits = match timeout(
            search_timeout,
            self.source
                .search_ready(&query, self.config.search.max_results, permit),
        )
        .await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                tracing::warn!(claim_id = %claim.id(), source = self.source.name(), error = %e, "Evidence search failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    claim_id = %claim.id(),
                    timeout_ms = duration_ms(search_timeout),
                    "Evidence search timed out"
                );
                Vec::new()
            }
        };

        let took = started.elapsed();
        trace.timings.search_ms = Some(duration_ms(took));
        self.metrics.record_stage_timing(stage::SEARCH, took);
        tracing::debug!(claim_id = %claim.id(), hits = hits.len(), "Evidence search finished");
        hits
    }

    async fn prepare_evidence(
        &self,
        claim: &Claim,
        hits: &[SearchHit],
        trace: &mut RunTrace,
    ) -> Vec<EvidenceItem> {
        let fetcher = self
            .fetcher
            .as_deref()
            .filter(|_| self.config.evidence.fetch_full_content);

        let Some(fetcher) = fetcher else {
            return self.chunker.prepare(hits);
        };

        let started = Instant::now();
        let urls: Vec<&str> = hits
            .iter()
            .take(self.chunker.max_chunks())
            .map(|h| h.url.as_str())
            .collect();
        let fetched =
            fetch_contents(fetcher, &urls, self.config.evidence.content_fetch_timeout()).await;

        let took = started.elapsed();
        trace.timings.fetch_ms = Some(duration_ms(took));
        self.metrics.record_stage_timing(stage::FETCH, took);
        tracing::debug!(
            claim_id = %claim.id(),
            fetched = fetched.iter().filter(|c| c.is_some()).count(),
            requested = urls.len(),
            "Content fetch finished"
        );

        self.chunker.prepare_with_content(hits, &fetched)
    }

    async fn score(
        &self,
        claim_en: &str,
        evidence_en: &[String],
    ) -> Result<Vec<EntailmentScore>, EntailmentError> {
        if evidence_en.is_empty() {
            return Err(EntailmentError::EmptyEvidence);
        }
        let scoring_timeout = self.config.entailment.timeout();
        let response = timeout(scoring_timeout, self.scorer.score(claim_en, evidence_en))
            .await
            .map_err(|_| EntailmentError::Timeout(duration_ms(scoring_timeout)))??;
        response.into_item_scores(evidence_en.len())
    }

    async fn run(&self, claim: &Claim, trace: &mut RunTrace) -> Verification {
        let hits = self.search(claim, trace).await;
        if hits.is_empty() {
            return Verification::failed(
                Verdict::NoEvidence,
                ErrorKind::NoEvidence,
                "No evidence found for the claim",
            );
        }

        let items = self.prepare_evidence(claim, &hits, trace).await;
        if items.is_empty() {
            tracing::warn!(claim_id = %claim.id(), hits = hits.len(), "Search hits carried no usable text");
            self.metrics.record_scoring_failure();
            return Verification::failed(
                Verdict::Error,
                ErrorKind::ScoringUnavailable,
                "Search results carried no usable evidence text",
            );
        }

        // Translation: claim first, then evidence in order.
        let mut texts = Vec::with_capacity(items.len() + 1);
        texts.push(claim.text().to_string());
        texts.extend(items.iter().map(|i| i.text.clone()));

        let started = Instant::now();
        let translation_timeout = self.config.translation.timeout();
        let batch = match timeout(
            translation_timeout,
            translate_with_fallback(&self.translator, &texts),
        )
        .await
        {
            Ok(batch) => batch,
            Err(_) => {
                tracing::warn!(
                    claim_id = %claim.id(),
                    timeout_ms = duration_ms(translation_timeout),
                    "Translation timed out, using source texts"
                );
                untranslated(&texts)
            }
        };
        let took = started.elapsed();
        trace.timings.translation_ms = Some(duration_ms(took));
        self.metrics.record_stage_timing(stage::TRANSLATION, took);

        let degraded = batch.degraded_count();
        self.metrics.record_degraded_translations(degraded);
        let mut entries = batch.into_entries().into_iter();
        let claim_en = entries
            .next()
            .map_or_else(|| claim.text().to_string(), |e| e.translated);
        trace.translated_claim = Some(claim_en.clone());
        let evidence_entries: Vec<_> = entries.collect();
        let evidence_en: Vec<String> = evidence_entries.iter().map(|e| e.translated.clone()).collect();

        let degradation = (degraded > 0).then_some(ErrorKind::TranslationDegraded);
        if degraded > 0 {
            tracing::warn!(claim_id = %claim.id(), degraded, total = texts.len(), "Translation degraded");
        }

        // Scoring: one call with the full evidence list.
        let started = Instant::now();
        let scored = self.score(&claim_en, &evidence_en).await;
        let took = started.elapsed();
        trace.timings.scoring_ms = Some(duration_ms(took));
        self.metrics.record_stage_timing(stage::SCORING, took);

        let scores = match scored {
            Ok(scores) => scores,
            Err(e) => {
                tracing::warn!(claim_id = %claim.id(), scorer = self.scorer.name(), error = %e, "Entailment scoring failed");
                self.metrics.record_scoring_failure();
                let evidence_used = items
                    .into_iter()
                    .zip(evidence_entries)
                    .map(|(item, entry)| ScoredEvidence {
                        item,
                        translated_text: entry.translated,
                        translation_degraded: entry.degraded,
                        score: None,
                    })
                    .collect();
                return Verification {
                    evidence_used,
                    ..Verification::failed(
                        Verdict::Error,
                        ErrorKind::ScoringUnavailable,
                        format!("Entailment scoring unavailable: {e}"),
                    )
                };
            }
        };

        let outcome = self.aggregator.aggregate(&scores);
        tracing::debug!(
            claim_id = %claim.id(),
            strategy = %outcome.strategy,
            considered = outcome.considered,
            confidence = outcome.confidence,
            "Scores aggregated"
        );

        let evidence_used = items
            .into_iter()
            .zip(evidence_entries)
            .zip(scores)
            .map(|((item, entry), score)| ScoredEvidence {
                item,
                translated_text: entry.translated,
                translation_degraded: entry.degraded,
                score: Some(score),
            })
            .collect();

        Verification {
            verdict: outcome.verdict,
            confidence: outcome.confidence,
            rationale: outcome.rationale,
            evidence_used,
            error_kind: degradation,
        }
    }

    fn assemble(
        &self,
        claim: &Claim,
        verification: Verification,
        trace: RunTrace,
        started: Instant,
    ) -> ClaimResult {
        let sources = verification
            .evidence_used
            .iter()
            .map(|e| e.item.url.clone())
            .filter(|u| !u.is_empty())
            .collect();

        ClaimResult {
            claim_id: claim.id().clone(),
            claim: claim.text().to_string(),
            translated_claim: trace.translated_claim,
            verdict: verification.verdict,
            confidence: verification.confidence,
            rationale: verification.rationale,
            strategy: self.aggregator.config().strategy,
            evidence_used: verification.evidence_used,
            sources,
            processing_time_ms: elapsed_ms(started),
            stage_timings: trace.timings,
            error_kind: verification.error_kind,
            checked_at: chrono::Utc::now(),
        }
    }
}

#[async_trait]
impl<S, T, E> FactChecker for FactCheckOrchestrator<S, T, E>
where
    S: EvidenceSource,
    T: Translator,
    E: EntailmentScorer,
{
    async fn check_claim(&self, claim: &Claim) -> ClaimResult {
        let started = Instant::now();
        let deadline = self.config.pipeline.deadline();
        let mut trace = RunTrace::default();

        let verification = match timeout(deadline, self.run(claim, &mut trace)).await {
            Ok(verification) => verification,
            Err(_) => {
                tracing::warn!(
                    claim_id = %claim.id(),
                    deadline_ms = duration_ms(deadline),
                    "Claim check exceeded its deadline"
                );
                Verification::failed(
                    Verdict::Error,
                    ErrorKind::SystemError,
                    format!("Deadline of {} ms exceeded", duration_ms(deadline)),
                )
            }
        };

        let result = self.assemble(claim, verification, trace, started);
        self.metrics
            .record_claim(result.verdict, started.elapsed());
        tracing::info!(
            claim_id = %result.claim_id,
            verdict = %result.verdict,
            confidence = result.confidence,
            evidence = result.evidence_count(),
            elapsed_ms = result.processing_time_ms,
            "Claim checked"
        );
        result
    }

    async fn check_text(&self, text: &str) -> Result<ClaimResult, FactCheckError> {
        let claim = Claim::new(text, self.config.pipeline.min_claim_length)?;
        Ok(self.check_claim(&claim).await)
    }

    async fn check_claims(&self, claims: Vec<Claim>) -> Vec<ClaimResult> {
        if claims.is_empty() {
            return Vec::new();
        }
        join_all(claims.iter().map(|c| self.check_claim(c))).await
    }

    fn config(&self) -> &FactCheckConfig {
        &self.config
    }
}

/// Builder for constructing a [`FactCheckOrchestrator`].
pub struct FactCheckOrchestratorBuilder<S, T, E> {
    source: Option<S>,
    translator: Option<T>,
    scorer: Option<E>,
    fetcher: Option<Box<dyn ContentFetcher>>,
    metrics: Option<Arc<MetricsCollector>>,
    config: FactCheckConfig,
}

impl<S, T, E> Default for FactCheckOrchestratorBuilder<S, T, E> {
    fn default() -> Self {
        Self {
            source: None,
            translator: None,
            scorer: None,
            fetcher: None,
            metrics: None,
            config: FactCheckConfig::default(),
        }
    }
}

impl<S, T, E> FactCheckOrchestratorBuilder<S, T, E>
where
    S: EvidenceSource,
    T: Translator,
    E: EntailmentScorer,
{
    /// Create a new builder.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the evidence source.
    #[must_use]
    pub fn with_source(mut self, source: S) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the translator.
    #[must_use]
    pub fn with_translator(mut self, translator: T) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Set the entailment scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: E) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Set the content fetcher.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Box<dyn ContentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Share a metrics collector.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: FactCheckConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if a collaborator is missing or the configuration is invalid.
    pub fn build(self) -> Result<FactCheckOrchestrator<S, T, E>, FactCheckError> {
        let source = self
            .source
            .ok_or_else(|| FactCheckError::Build("evidence source not configured".to_string()))?;
        let translator = self
            .translator
            .ok_or_else(|| FactCheckError::Build("translator not configured".to_string()))?;
        let scorer = self
            .scorer
            .ok_or_else(|| FactCheckError::Build("entailment scorer not configured".to_string()))?;

        let mut orchestrator = FactCheckOrchestrator::new(source, translator, scorer, self.config)?;
        if let Some(fetcher) = self.fetcher {
            orchestrator = orchestrator.with_fetcher(fetcher);
        }
        if let Some(metrics) = self.metrics {
            orchestrator = orchestrator.with_metrics(metrics);
        }
        Ok(orchestrator)
    }
}
