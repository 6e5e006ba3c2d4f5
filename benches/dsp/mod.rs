//! Benchmarks for low-level DSP primitives.

mod filter;
mod oscillator;
mod pitch_shift;
mod reverb;

pub use filter::bench_filter;
pub use oscillator::bench_oscillator;
pub use pitch_shift::bench_pitch_shift;
pub use reverb::bench_reverb;
