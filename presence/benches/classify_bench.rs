use criterion::{black_box, criterion_group, criterion_main, Criterion};
use proxima_presence::{FeatureVector, ForestModel, GateStats, PresenceClassifier, PresenceModel};
use proxima_types::{EngineParams, MotionSample};

const FOREST: &str = r#"{
    "name": "bench",
    "trees": [
        { "nodes": [
            { "feature": 13, "threshold": 0.01, "left": 1, "right": 2 },
            { "with_user": false },
            { "feature": 7, "threshold": 0.5, "left": 3, "right": 4 },
            { "with_user": false },
            { "with_user": true }
        ] },
        { "nodes": [
            { "feature": 12, "threshold": 0.02, "left": 1, "right": 2 },
            { "with_user": false },
            { "with_user": true }
        ] },
        { "nodes": [ { "with_user": true } ] }
    ]
}"#;

fn window() -> Vec<MotionSample> {
    (0..100u64)
        .map(|i| {
            let t = i as f64 * 0.02;
            MotionSample::new(
                [0.1 * t.sin(), 0.05 * t.cos(), 0.02],
                [2.0 * t.cos(), 1.5 * t.sin(), 0.3],
                i * 20,
            )
        })
        .collect()
}

fn gate_stats_bench(c: &mut Criterion) {
    let samples = window();
    c.bench_function("gate_stats_100", |b| {
        b.iter(|| GateStats::compute(black_box(&samples)))
    });
}

fn feature_extract_bench(c: &mut Criterion) {
    let samples = window();
    c.bench_function("feature_vector_100", |b| {
        b.iter(|| FeatureVector::extract(black_box(&samples)))
    });
}

fn forest_predict_bench(c: &mut Criterion) {
    let model = ForestModel::from_json_str(FOREST).unwrap();
    let features = FeatureVector::extract(&window());
    c.bench_function("forest_predict_3_trees", |b| {
        b.iter(|| model.predict(black_box(features.as_slice())))
    });
}

fn classifier_hop_bench(c: &mut Criterion) {
    let model = ForestModel::from_json_str(FOREST).unwrap();
    let mut classifier = PresenceClassifier::new(model, &EngineParams::default());
    classifier.start();
    let samples = window();
    c.bench_function("classifier_ingest_50", |b| {
        b.iter(|| {
            for s in &samples[..50] {
                black_box(classifier.ingest(*s));
            }
        })
    });
}

criterion_group!(
    benches,
    gate_stats_bench,
    feature_extract_bench,
    forest_predict_bench,
    classifier_hop_bench,
);
criterion_main!(benches);
