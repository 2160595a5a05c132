//! Benchmark suite for vifact.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use vifact::aggregator::{AggregationConfig, AggregationStrategy, VerdictAggregator};
use vifact::config::FactCheckConfig;
use vifact::entailment::MockEntailmentScorer;
use vifact::evidence::{EvidenceChunker, extract_readable};
use vifact::orchestrator::{FactCheckOrchestrator, FactChecker};
use vifact::retrieval::{MockEvidenceSource, SourceFilterMode, SourceTrustPolicy};
use vifact::translation::{CachedTranslator, MockTranslator, Translator};
use vifact::types::{Claim, EntailmentLabel, EntailmentScore, SearchHit};

fn sample_scores(n: usize) -> Vec<EntailmentScore> {
    (0..n)
        .map(|i| {
            let score = ((i as f32) * 0.37).sin().abs();
            EntailmentScore::new(i, EntailmentLabel::Neither, score)
        })
        .collect()
}

fn sample_hits(n: usize) -> Vec<SearchHit> {
    (0..n)
        .map(|i| {
            SearchHit::new(
                format!("Bài viết {i}"),
                format!("https://vnexpress.net/bai-viet-{i}.html"),
                "Hà Nội là thủ đô của nước Cộng hòa Xã hội chủ nghĩa Việt Nam. ".repeat(12),
            )
        })
        .collect()
}

// ============================================================================
// Aggregation Benchmarks
// ============================================================================

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for n in [1, 5, 20, 100] {
        let scores = sample_scores(n);
        group.throughput(Throughput::Elements(n as u64));

        for strategy in [
            AggregationStrategy::Best,
            AggregationStrategy::Average,
            AggregationStrategy::Majority,
            AggregationStrategy::Weighted,
        ] {
            let aggregator =
                VerdictAggregator::new(AggregationConfig::default().with_strategy(strategy))
                    .unwrap();
            group.bench_with_input(
                BenchmarkId::new(strategy.to_string(), n),
                &scores,
                |bench, scores| {
                    bench.iter(|| aggregator.aggregate(black_box(scores)));
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Evidence Benchmarks
// ============================================================================

fn bench_evidence_preparation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evidence");

    let policy = SourceTrustPolicy::default().with_mode(SourceFilterMode::Exclude);
    let chunker = EvidenceChunker::new(5, 400).with_policy(policy);

    for n in [5, 20] {
        let hits = sample_hits(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("prepare", n), &hits, |bench, hits| {
            bench.iter(|| chunker.prepare(black_box(hits)));
        });
    }

    let html = format!(
        "<html><head><title>Tin tức</title></head><body><article>{}</article></body></html>",
        "<p>Hà Nội là thủ đô của Việt Nam.</p>".repeat(200)
    );
    group.bench_function("extract_readable", |bench| {
        bench.iter(|| extract_readable(black_box(&html)));
    });

    group.finish();
}

// ============================================================================
// Translation Cache Benchmarks
// ============================================================================

fn bench_translation_cache(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("translation_cache");

    let texts: Vec<String> = (0..10).map(|i| format!("câu số {i}")).collect();
    let cached = CachedTranslator::with_defaults(MockTranslator::new());
    rt.block_on(async {
        let _ = cached.translate_batch(&texts).await;
    });

    group.bench_function("warm_batch", |bench| {
        bench.iter(|| rt.block_on(cached.translate_batch(black_box(&texts))));
    });

    group.bench_function("cold_batch", |bench| {
        bench.iter_batched(
            || CachedTranslator::with_defaults(MockTranslator::new()),
            |translator| rt.block_on(translator.translate_batch(&texts)),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// Pipeline Benchmarks
// ============================================================================

fn bench_check_claim(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let orchestrator = FactCheckOrchestrator::new(
        MockEvidenceSource::new(sample_hits(5)),
        MockTranslator::new(),
        MockEntailmentScorer::new(vec![0.9, 0.2, 0.4, 0.6, 0.1]),
        FactCheckConfig::default(),
    )
    .unwrap();
    let claim = Claim::new("Hà Nội là thủ đô của Việt Nam", 10).unwrap();

    c.bench_function("check_claim", |bench| {
        bench.iter(|| rt.block_on(orchestrator.check_claim(black_box(&claim))));
    });
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_aggregation,
    bench_evidence_preparation,
    bench_translation_cache,
    bench_check_claim,
);

criterion_main!(benches);
