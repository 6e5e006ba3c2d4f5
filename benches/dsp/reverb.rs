//! Benchmarks for the Schroeder reverb.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use sh101_engine::dsp::reverb::SchroederReverb;

use crate::BLOCK_SIZES;

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| if i == 0 { 1.0 } else { 0.0 }).collect();
        let mut reverb = SchroederReverb::new(48_000.0);
        reverb.set_decay(1.5);

        group.bench_with_input(BenchmarkId::new("schroeder", size), &size, |b, _| {
            b.iter(|| {
                for &sample in &input {
                    black_box(reverb.process(black_box(sample)));
                }
            })
        });
    }

    group.finish();
}
