//! Benchmarks for the band-limited oscillator and noise.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use sh101_engine::dsp::oscillator::{NoiseBlock, OscillatorBlock, OscillatorWaveform};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for (name, waveform) in [
            ("sawtooth", OscillatorWaveform::Sawtooth),
            ("square", OscillatorWaveform::Square),
            ("sine", OscillatorWaveform::Sine),
        ] {
            let mut osc = OscillatorBlock::new(waveform);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| osc.render(black_box(&mut buffer), black_box(220.0), 48_000.0))
            });
        }

        let mut noise = NoiseBlock::new(7);
        group.bench_with_input(BenchmarkId::new("noise", size), &size, |b, _| {
            b.iter(|| noise.render(black_box(&mut buffer)))
        });
    }

    group.finish();
}
