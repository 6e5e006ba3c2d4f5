//! Full-graph rendering: what one audio callback costs.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use sh101_engine::{
    io::HeadlessBackend,
    sequencing::{Note, PitchClass},
    Engine, EngineConfig, ParamId,
};

use crate::BLOCK_SIZES;

fn started(configure: impl FnOnce(&mut Engine)) -> Engine {
    let mut backend = HeadlessBackend::running(48_000.0);
    let mut engine = Engine::new(EngineConfig::default());
    engine
        .start(&mut backend)
        .expect("headless backend starts");
    configure(&mut engine);
    engine
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/render");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Default patch, no note: the floor cost of the graph
        let mut idle = started(|_| {});
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| idle.render(black_box(&mut buffer)))
        });

        // A held note with filter envelope and LFO modulation
        let mut held = started(|engine| {
            let _ = engine.set_param(ParamId::FilterCutoff, 1_200.0);
            let _ = engine.set_param(ParamId::FilterEnvAmount, 0.6);
            let _ = engine.set_param(ParamId::VcfModAmount, 0.3);
            let _ = engine.note_on(Note::A4, 1.0, 0);
        });
        group.bench_with_input(BenchmarkId::new("held_note", size), &size, |b, _| {
            b.iter(|| held.render(black_box(&mut buffer)))
        });

        // Every optional node present and the sequencer running
        let mut loaded = started(|engine| {
            let _ = engine.set_param(ParamId::SubLevel, -18.0);
            let _ = engine.set_param(ParamId::NoiseLevel, -30.0);
            let _ = engine.set_param(ParamId::PitchShift, 7.0);
            for step in (0..16).step_by(2) {
                let _ = engine.toggle_step(PitchClass::ALL[step % 12], step);
            }
            let _ = engine.play();
        });
        group.bench_with_input(BenchmarkId::new("sequenced_full", size), &size, |b, _| {
            b.iter(|| loaded.render(black_box(&mut buffer)))
        });
    }

    group.finish();
}
