//! Fact-check metrics.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::types::Verdict;

/// Stage names used for timing.
pub mod stage {
    /// Evidence search.
    pub const SEARCH: &str = "search";
    /// Full-content fetch.
    pub const FETCH: &str = "fetch";
    /// Batch translation.
    pub const TRANSLATION: &str = "translation";
    /// Entailment scoring.
    pub const SCORING: &str = "scoring";
}

/// Snapshot of the metrics collected for claim checks.
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    /// Total number of claims checked.
    pub claims_checked: u64,
    /// Number of results per verdict.
    pub verdict_counts: HashMap<Verdict, u64>,
    /// Average processing time in milliseconds.
    pub avg_latency_ms: f64,
    /// Minimum processing time in milliseconds.
    pub min_latency_ms: u64,
    /// Maximum processing time in milliseconds.
    pub max_latency_ms: u64,
    /// Per-stage timing statistics.
    pub stage_timings: HashMap<String, StageTiming>,
    /// Number of texts that fell back to their untranslated form.
    pub degraded_translations: u64,
    /// Number of failed scoring stages.
    pub scoring_failures: u64,
}

impl PipelineMetrics {
    /// Number of results with the given verdict.
    #[must_use]
    pub fn verdict_count(&self, verdict: Verdict) -> u64 {
        self.verdict_counts.get(&verdict).copied().unwrap_or(0)
    }
}

/// Timing statistics for a single stage.
#[derive(Debug, Clone, Default)]
pub struct StageTiming {
    /// Total invocations of this stage.
    pub invocations: u64,
    /// Total time spent in this stage (milliseconds).
    pub total_time_ms: u64,
    /// Average time per invocation (milliseconds).
    pub avg_time_ms: f64,
    /// Minimum time (milliseconds).
    pub min_time_ms: u64,
    /// Maximum time (milliseconds).
    pub max_time_ms: u64,
}

impl StageTiming {
    /// Record a timing observation.
    pub fn record(&mut self, duration_ms: u64) {
        self.invocations += 1;
        self.total_time_ms += duration_ms;

        if self.invocations == 1 {
            self.min_time_ms = duration_ms;
            self.max_time_ms = duration_ms;
        } else {
            self.min_time_ms = self.min_time_ms.min(duration_ms);
            self.max_time_ms = self.max_time_ms.max(duration_ms);
        }

        #[allow(clippy::cast_precision_loss)]
        {
            self.avg_time_ms = self.total_time_ms as f64 / self.invocations as f64;
        }
    }
}

/// Thread-safe metrics collector shared by concurrent claim checks.
pub struct MetricsCollector {
    claims_checked: AtomicU64,
    total_latency_ms: AtomicU64,
    min_latency_ms: AtomicU64,
    max_latency_ms: AtomicU64,
    degraded_translations: AtomicU64,
    scoring_failures: AtomicU64,
    verdict_counts: RwLock<HashMap<Verdict, u64>>,
    stage_timings: RwLock<HashMap<String, StageTiming>>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            claims_checked: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            min_latency_ms: AtomicU64::new(u64::MAX),
            max_latency_ms: AtomicU64::new(0),
            degraded_translations: AtomicU64::new(0),
            scoring_failures: AtomicU64::new(0),
            verdict_counts: RwLock::new(HashMap::new()),
            stage_timings: RwLock::new(HashMap::new()),
        }
    }

    /// Record a finished claim check.
    pub fn record_claim(&self, verdict: Verdict, duration: Duration) {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);

        self.claims_checked.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(duration_ms, Ordering::Relaxed);
        self.min_latency_ms.fetch_min(duration_ms, Ordering::Relaxed);
        self.max_latency_ms.fetch_max(duration_ms, Ordering::Relaxed);

        if let Ok(mut counts) = self.verdict_counts.write() {
            *counts.entry(verdict).or_insert(0) += 1;
        }
    }

    /// Record timing for a specific stage.
    pub fn record_stage_timing(&self, stage: &str, duration: Duration) {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);

        if let Ok(mut timings) = self.stage_timings.write() {
            timings
                .entry(stage.to_string())
                .or_default()
                .record(duration_ms);
        }
    }

    /// Record texts that were used untranslated.
    pub fn record_degraded_translations(&self, count: usize) {
        self.degraded_translations
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a failed scoring stage.
    pub fn record_scoring_failure(&self) {
        self.scoring_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    #[must_use]
    pub fn snapshot(&self) -> PipelineMetrics {
        let claims_checked = self.claims_checked.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        #[allow(clippy::cast_precision_loss)]
        let avg_latency_ms = if claims_checked > 0 {
            total_latency as f64 / claims_checked as f64
        } else {
            0.0
        };

        let min_latency = self.min_latency_ms.load(Ordering::Relaxed);

        PipelineMetrics {
            claims_checked,
            verdict_counts: self
                .verdict_counts
                .read()
                .map(|c| c.clone())
                .unwrap_or_default(),
            avg_latency_ms,
            min_latency_ms: if min_latency == u64::MAX { 0 } else { min_latency },
            max_latency_ms: self.max_latency_ms.load(Ordering::Relaxed),
            stage_timings: self
                .stage_timings
                .read()
                .map(|t| t.clone())
                .unwrap_or_default(),
            degraded_translations: self.degraded_translations.load(Ordering::Relaxed),
            scoring_failures: self.scoring_failures.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.claims_checked.store(0, Ordering::Relaxed);
        self.total_latency_ms.store(0, Ordering::Relaxed);
        self.min_latency_ms.store(u64::MAX, Ordering::Relaxed);
        self.max_latency_ms.store(0, Ordering::Relaxed);
        self.degraded_translations.store(0, Ordering::Relaxed);
        self.scoring_failures.store(0, Ordering::Relaxed);

        if let Ok(mut counts) = self.verdict_counts.write() {
            counts.clear();
        }
        if let Ok(mut timings) = self.stage_timings.write() {
            timings.clear();
        }
    }
}
