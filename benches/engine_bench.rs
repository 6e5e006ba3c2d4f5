//! Render-time benchmarks: `cargo bench`.
//!
//! A block of N samples at 48 kHz must render in well under N / 48 ms
//! (1.33 ms for 64, 10.67 ms for 512). Groups are `dsp/*` for single
//! primitives and `engine/*` for the whole SH-101 graph.

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Typical host callback sizes.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

criterion_group!(
    benches,
    dsp::bench_oscillator,
    dsp::bench_filter,
    dsp::bench_reverb,
    dsp::bench_pitch_shift,
    scenarios::bench_engine,
);
criterion_main!(benches);
