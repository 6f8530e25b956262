//! Classification benchmarks using Criterion.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ctc_aogm::{
    build_classification, BatchCalculator, EngineInput, EngineReport, GroundTruthCache,
    MetricEngine, NodeMapping, PenaltyConfig, Result, TrackRecord,
};

/// Ground truth of `n` tracks alive over `frames` frames, with every node mapped.
fn create_dataset(n: i32, frames: i32) -> (Vec<TrackRecord>, Vec<NodeMapping>) {
    let tracks: Vec<TrackRecord> = (1..=n).map(|id| TrackRecord::new(id, 0, frames - 1, 0)).collect();
    let mappings = (0..frames)
        .flat_map(|t| (1..=n).map(move |id| NodeMapping::new(id, t, id)))
        .collect();
    (tracks, mappings)
}

struct NullEngine;

impl MetricEngine for NullEngine {
    fn reset_reports(&mut self) {}

    fn compute(&mut self, input: &EngineInput<'_>) -> Result<EngineReport> {
        Ok(EngineReport::new(input.levels.len() as f64))
    }
}

fn benchmark_build_classification_100_tracks(c: &mut Criterion) {
    let (tracks, mappings) = create_dataset(100, 100);

    c.bench_function("build_classification_100_tracks_100_frames", |b| {
        b.iter(|| build_classification(black_box(&mappings), black_box(&tracks)).unwrap())
    });
}

fn benchmark_batch_calculate_repeated(c: &mut Criterion) {
    let (tracks, mappings) = create_dataset(50, 200);
    let cache = GroundTruthCache::from_records(tracks.clone(), "<bench>").unwrap();
    let mut calc = BatchCalculator::new(&cache, NullEngine, PenaltyConfig::default()).unwrap();

    c.bench_function("batch_calculate_50_tracks_200_frames", |b| {
        b.iter(|| {
            calc.evaluate(tracks.clone(), black_box(mappings.clone()), "<bench>")
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    benchmark_build_classification_100_tracks,
    benchmark_batch_calculate_repeated
);
criterion_main!(benches);
