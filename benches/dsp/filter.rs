//! Benchmarks for the 24 dB lowpass cascade.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use sh101_engine::dsp::filter::LowPass24;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Sawtooth-like ramp
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        for (name, cutoff, q) in [("open", 8_000.0, 0.7), ("resonant", 800.0, 8.0)] {
            let mut filter = LowPass24::new();
            let mut buffer = input.clone();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer), cutoff, q, 48_000.0);
                })
            });
        }
    }

    group.finish();
}
