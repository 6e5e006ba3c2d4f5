//! Benchmarks for the delay-line pitch shifter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use sh101_engine::dsp::pitch_shift::PitchShifter;

use crate::BLOCK_SIZES;

pub fn bench_pitch_shift(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/pitch_shift");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (std::f32::consts::TAU * 220.0 * i as f32 / 48_000.0).sin())
            .collect();
        let mut shifter = PitchShifter::new(48_000.0, 0.05);
        shifter.set_semitones(7.0);

        group.bench_with_input(BenchmarkId::new("fifth_up", size), &size, |b, _| {
            b.iter(|| {
                for &sample in &input {
                    black_box(shifter.next_sample(black_box(sample)));
                }
            })
        });
    }

    group.finish();
}
