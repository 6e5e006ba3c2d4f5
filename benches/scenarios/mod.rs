//! Benchmarks for the complete engine.

mod engine;

pub use engine::bench_engine;
