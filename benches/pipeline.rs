//! Pipeline benchmark: session events → device/keystroke/pointer features.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use trust_scoring::config::TrustConfig;
use trust_scoring::features::{FeaturePipeline, FeatureSchema, MouseExtractor};
use trust_scoring::network::IpRangeIndex;
use trust_scoring::synthetic::genuine_request;
use trust_scoring::telemetry::{Event, Session};

fn long_session(n: usize) -> Session {
    (0..n)
        .map(|i| {
            let t = (n - i) as i64 * 16;
            if i % 3 == 0 {
                Event::key_down(t, "a")
            } else {
                Event::pointer_move(t, i as f64, (i * 2) as f64)
            }
        })
        .collect()
}

fn bench_request_extraction(c: &mut Criterion) {
    let pipeline = FeaturePipeline::new(Arc::new(IpRangeIndex::default()), &TrustConfig::default());
    let schema = FeatureSchema::behavioral();
    let request = genuine_request(&mut StdRng::seed_from_u64(1), "bench");

    c.bench_function("extract_genuine_request", |b| {
        b.iter(|| black_box(pipeline.extract(black_box(&request), &schema)))
    });
}

fn bench_mouse_sorting(c: &mut Criterion) {
    let session = long_session(10_000);
    let mouse = MouseExtractor::new();

    let mut g = c.benchmark_group("mouse_10k_events");
    g.bench_function("unsorted", |b| b.iter(|| black_box(mouse.extract(black_box(&session), false))));
    g.finish();
}

criterion_group!(benches, bench_request_extraction, bench_mouse_sorting);
criterion_main!(benches);
