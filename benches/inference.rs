//! Inference benchmark: aggregated vector → normalize → isolation forest verdict.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use trust_scoring::config::TrustConfig;
use trust_scoring::model::IsolationForestParams;
use trust_scoring::network::IpRangeIndex;
use trust_scoring::scoring::behavioral_corpus;
use trust_scoring::synthetic::genuine_request;
use trust_scoring::{FeatureSchema, ScoringEngine, TrainedModel};

fn trained(n_trees: usize) -> (TrainedModel, Vec<trust_scoring::AggregatedFeatures>) {
    let config = TrustConfig::default();
    let mut rng = StdRng::seed_from_u64(42);
    let requests: Vec<_> = (0..300).map(|i| genuine_request(&mut rng, &format!("g{i}"))).collect();
    let corpus = behavioral_corpus(Arc::new(IpRangeIndex::default()), &config, &requests).unwrap();
    let params = IsolationForestParams {
        n_trees,
        ..IsolationForestParams::default()
    };
    let model = TrainedModel::train(FeatureSchema::behavioral(), &corpus, &params).unwrap();
    (model, corpus)
}

fn bench_score(c: &mut Criterion) {
    let (model, corpus) = trained(100);
    let engine = ScoringEngine::new();
    let sample = &corpus[0];

    c.bench_function("score_20_features_100_trees", |b| {
        b.iter(|| engine.score(black_box(sample), &model))
    });
}

fn bench_score_by_trees(c: &mut Criterion) {
    let engine = ScoringEngine::new();
    let mut g = c.benchmark_group("score_by_trees");
    for n in [25, 50, 100, 200] {
        let (model, corpus) = trained(n);
        g.bench_function(format!("trees_{}", n).as_str(), |b| {
            b.iter(|| engine.score(black_box(&corpus[0]), &model))
        });
    }
    g.finish();
}

criterion_group!(benches, bench_score, bench_score_by_trees);
criterion_main!(benches);
