use std::time::Duration;

use sh101_engine::{
    graph::node::NodeKind,
    io::HeadlessBackend,
    sequencing::{Note, PitchClass, StepState, TransportState},
    synth::{EngineEvent, RebuildReason, VoiceState, VoiceTransition},
    Engine, EngineConfig, EngineError, EngineHandle, EngineInitError, ParamId,
};

const SAMPLE_RATE: f32 = 48_000.0;
const BAR: usize = 96_000;
const STEP: u64 = 6_000;

fn started() -> (Engine, EngineHandle, HeadlessBackend) {
    let mut backend = HeadlessBackend::new(SAMPLE_RATE);
    let mut engine = Engine::new(EngineConfig::default());
    let handle = engine.remote().expect("first remote() returns the handle");
    engine.start(&mut backend).expect("headless backend starts");
    (engine, handle, backend)
}

/// Render `samples` in audio-callback sized chunks.
fn run(engine: &mut Engine, samples: usize) -> Vec<f32> {
    let mut out = vec![0.0; samples];
    for chunk in out.chunks_mut(512) {
        engine.render(chunk).unwrap();
    }
    out
}

fn steps(events: &[EngineEvent]) -> Vec<(usize, Option<Note>, u64)> {
    events
        .iter()
        .filter_map(|event| match *event {
            EngineEvent::Step { step, note, at } => Some((step, note, at)),
            _ => None,
        })
        .collect()
}

#[test]
fn one_bar_plays_sixteen_steps_with_the_toggled_note() {
    let (mut engine, mut handle, _backend) = started();
    assert_eq!(
        engine.toggle_step(PitchClass::C, 0),
        Ok(StepState::Normal)
    );
    assert_eq!(engine.play(), Ok(true));

    run(&mut engine, BAR);
    let events = handle.poll();
    let steps = steps(&events);

    assert_eq!(steps.len(), 16);
    assert_eq!(steps[0], (0, Some(Note::C3), 0));
    for (i, &(step, note, at)) in steps.iter().enumerate() {
        assert_eq!(step, i);
        assert_eq!(at, i as u64 * STEP);
        if i > 0 {
            assert_eq!(note, None);
        }
    }
    assert!(events.contains(&EngineEvent::Voice(VoiceTransition::Attack { note: Note::C3 })));
    assert!(events.contains(&EngineEvent::Voice(VoiceTransition::Release { note: Note::C3 })));
}

#[test]
fn high_step_plays_an_octave_up() {
    let (mut engine, mut handle, _backend) = started();
    engine.toggle_step(PitchClass::A, 2).unwrap();
    assert_eq!(engine.toggle_step(PitchClass::A, 2), Ok(StepState::High));
    engine.play().unwrap();

    run(&mut engine, 3 * STEP as usize);
    let a4: Note = "A4".parse().unwrap();
    assert!(steps(&handle.poll()).contains(&(2, Some(a4), 2 * STEP)));
}

#[test]
fn second_note_on_retriggers_once() {
    let (mut engine, mut handle, _backend) = started();
    let e4: Note = "E4".parse().unwrap();

    assert_eq!(
        engine.note_on(Note::C4, 1.0, 0),
        Ok(Some(VoiceTransition::Attack { note: Note::C4 }))
    );
    assert_eq!(
        engine.note_on(e4, 1.0, 0),
        Ok(Some(VoiceTransition::Retrigger {
            from: Note::C4,
            to: e4
        }))
    );
    assert_eq!(engine.voice_state(), Ok(VoiceState::Sounding(e4)));

    let retriggers = handle
        .poll()
        .into_iter()
        .filter(|event| matches!(event, EngineEvent::Voice(VoiceTransition::Retrigger { .. })))
        .count();
    assert_eq!(retriggers, 1);

    let probe = engine.inspect().unwrap();
    assert!((probe.voice_frequency - e4.frequency()).abs() < 0.01);
}

#[test]
fn burst_of_cutoff_writes_is_one_monotonic_ramp() {
    let (mut engine, _handle, _backend) = started();
    let last = (0..100)
        .map(|i| engine.set_param(ParamId::FilterCutoff, 1_000.0 + 10.0 * i as f32).unwrap())
        .last()
        .unwrap();
    assert_eq!(last, 1_990.0);

    let probe = engine.inspect().unwrap();
    assert_eq!(probe.cutoff_target, last);

    let mut previous = probe.cutoff;
    let mut out = vec![0.0; 32];
    for _ in 0..48 {
        engine.render(&mut out).unwrap();
        let probe = engine.inspect().unwrap();
        assert!(probe.cutoff <= previous, "{} after {}", probe.cutoff, previous);
        assert_eq!(probe.cutoff_target, last);
        previous = probe.cutoff;
    }
    assert!((previous - last).abs() < 0.5, "ramp ended at {previous}");
}

#[test]
fn out_of_range_values_are_clamped_not_rejected() {
    let (mut engine, _handle, _backend) = started();
    assert_eq!(engine.set_param(ParamId::FilterCutoff, 1.0e6), Ok(20_000.0));
    assert_eq!(engine.set_param(ParamId::FilterResonance, -5.0), Ok(0.0));
    assert_eq!(engine.set_param(ParamId::Transpose, 99.0), Ok(24.0));
    assert_eq!(engine.set_tempo(500.0), Ok(200.0));
    assert_eq!(engine.set_tempo(10.0), Ok(60.0));
    assert_eq!(engine.set_swing(2.0), Ok(1.0));
    assert_eq!(engine.param(ParamId::FilterCutoff), Ok(20_000.0));
}

#[test]
fn stop_while_stopped_is_a_no_op() {
    let (mut engine, mut handle, _backend) = started();
    handle.poll();

    assert_eq!(engine.stop(), Ok(false));
    assert_eq!(engine.current_step(), Ok(None));
    assert!(handle.poll().is_empty());
}

#[test]
fn stop_releases_the_sequenced_note_and_resets_position() {
    let (mut engine, _handle, _backend) = started();
    engine.toggle_step(PitchClass::C, 0).unwrap();
    engine.play().unwrap();
    run(&mut engine, 100);
    assert_eq!(engine.voice_state(), Ok(VoiceState::Sounding(Note::C3)));
    assert_eq!(engine.current_step(), Ok(Some(0)));

    assert_eq!(engine.stop(), Ok(true));
    assert_eq!(engine.voice_state(), Ok(VoiceState::Releasing(Note::C3)));
    assert_eq!(engine.current_step(), Ok(None));
    assert_eq!(engine.transport_state(), Ok(TransportState::Stopped));

    // The cancelled note-off never fires against a new note
    engine.note_on(Note::A4, 1.0, engine.now()).unwrap();
    run(&mut engine, STEP as usize);
    assert_eq!(engine.voice_state(), Ok(VoiceState::Sounding(Note::A4)));
}

#[test]
fn pause_keeps_the_step_position() {
    let (mut engine, mut handle, _backend) = started();
    engine.play().unwrap();
    run(&mut engine, 3 * STEP as usize + 10);
    assert_eq!(engine.current_step(), Ok(Some(3)));

    assert_eq!(engine.pause(), Ok(true));
    run(&mut engine, 20_000);
    assert_eq!(engine.current_step(), Ok(Some(3)));
    handle.poll();

    let resumed_at = engine.now();
    assert_eq!(engine.resume(), Ok(true));
    run(&mut engine, STEP as usize);

    let steps = steps(&handle.poll());
    assert_eq!(steps[0].0, 4);
    assert_eq!(steps[0].2, resumed_at + STEP - 10);
}

#[test]
fn swing_delays_odd_steps() {
    let (mut engine, mut handle, _backend) = started();
    engine.set_swing(0.5).unwrap();
    engine.play().unwrap();
    run(&mut engine, 4 * STEP as usize);

    let times: Vec<u64> = steps(&handle.poll()).iter().map(|s| s.2).collect();
    assert_eq!(times, vec![0, 9_000, 12_000, 21_000]);
}

#[test]
fn keyboard_applies_octave_and_ignores_repeats() {
    let (mut engine, _handle, _backend) = started();
    assert_eq!(engine.shift_octave(1), Ok(1));
    assert_eq!(engine.shift_octave(5), Ok(2));
    assert_eq!(engine.shift_octave(-1), Ok(1));

    assert_eq!(
        engine.key_down(Note::C3),
        Ok(VoiceTransition::Attack { note: Note::C4 })
    );
    assert_eq!(engine.key_down(Note::C3), Ok(VoiceTransition::Ignored));

    // Releasing a key that is not held does nothing
    let d3: Note = "D3".parse().unwrap();
    assert_eq!(engine.key_up(d3), Ok(VoiceTransition::Ignored));
    assert_eq!(
        engine.key_up(Note::C3),
        Ok(VoiceTransition::Release { note: Note::C4 })
    );
}

#[test]
fn operations_before_start_are_rejected() {
    let mut engine = Engine::default();
    assert!(!engine.is_initialized());
    assert_eq!(engine.toggle_step(PitchClass::C, 0), Err(EngineError::NotInitialized));
    assert_eq!(engine.key_down(Note::C3), Err(EngineError::NotInitialized));
    assert_eq!(engine.set_tempo(100.0), Err(EngineError::NotInitialized));
    assert_eq!(engine.inspect().map(drop), Err(EngineError::NotInitialized));
}

#[test]
fn start_times_out_when_the_backend_never_runs() {
    let mut backend = HeadlessBackend::new(SAMPLE_RATE).refuse_resume();
    let timeout = Duration::from_millis(20);
    let mut engine = Engine::new(
        EngineConfig::default().with_start_timeout(timeout, Duration::from_millis(5)),
    );

    assert_eq!(
        engine.start(&mut backend),
        Err(EngineError::Init(EngineInitError::Timeout(timeout)))
    );
    assert!(!engine.is_initialized());
    assert!(backend.journal().created.is_empty());
}

#[test]
fn closed_backend_cannot_start() {
    let mut backend = HeadlessBackend::new(SAMPLE_RATE);
    backend.close();
    let mut engine = Engine::default();
    assert!(matches!(
        engine.start(&mut backend),
        Err(EngineError::Init(EngineInitError::NotRunning(_)))
    ));
}

#[test]
fn refused_node_leaves_nothing_behind() {
    let mut backend = HeadlessBackend::new(SAMPLE_RATE).fail_on(NodeKind::Lfo);
    let mut engine = Engine::default();

    assert!(matches!(
        engine.start(&mut backend),
        Err(EngineError::GraphBuild(_))
    ));
    assert!(!engine.is_initialized());

    let journal = backend.journal();
    assert!(!journal.created.is_empty());
    assert_eq!(journal.live(), 0);
    let mut created = journal.created.clone();
    created.reverse();
    assert_eq!(journal.released, created);
}

#[test]
fn failed_rebuild_uninitializes_the_engine() {
    let mut backend = HeadlessBackend::new(SAMPLE_RATE).fail_on(NodeKind::Noise);
    let mut engine = Engine::default();
    let mut handle = engine.remote().unwrap();
    engine.start(&mut backend).unwrap();

    assert!(matches!(
        engine.set_param(ParamId::NoiseLevel, -30.0),
        Err(EngineError::GraphBuild(_))
    ));
    assert!(!engine.is_initialized());
    assert!(handle.poll().contains(&EngineEvent::Failed));
    assert_eq!(backend.journal().live(), 0);

    let mut out = vec![1.0; 64];
    assert_eq!(engine.render(&mut out), Err(EngineError::NotInitialized));
    assert!(out.iter().all(|&x| x == 0.0));
}

#[test]
fn optional_nodes_follow_the_audible_floor() {
    let (mut engine, mut handle, backend) = started();
    assert!(!engine.inspect().unwrap().has_sub_oscillator);

    engine.set_param(ParamId::SubLevel, -59.5).unwrap();
    let probe = engine.inspect().unwrap();
    assert!(probe.has_sub_oscillator);
    assert_eq!(probe.nodes.len(), 17);

    // Moving within the audible range only ramps
    engine.set_param(ParamId::SubLevel, -20.0).unwrap();
    engine.set_param(ParamId::SubLevel, -60.0).unwrap();
    assert!(!engine.inspect().unwrap().has_sub_oscillator);

    let rebuilds: Vec<RebuildReason> = handle
        .poll()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Rebuilt(reason) => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(
        rebuilds,
        vec![RebuildReason::SubOscillator, RebuildReason::SubOscillator]
    );
    assert_eq!(backend.journal().live(), 16);
}

#[test]
fn every_optional_node_present_gives_nineteen() {
    let (mut engine, _handle, backend) = started();
    engine.set_param(ParamId::SubLevel, -18.0).unwrap();
    engine.set_param(ParamId::NoiseLevel, -30.0).unwrap();
    engine.set_param(ParamId::PitchShift, 3.0).unwrap();
    engine.set_param(ParamId::PitchShift, 5.0).unwrap();

    let probe = engine.inspect().unwrap();
    assert!(probe.has_sub_oscillator && probe.has_noise && probe.has_pitch_shift);
    assert_eq!(probe.nodes.len(), 19);
    assert_eq!(backend.journal().live(), 19);
}

#[test]
fn repeated_rebuilds_never_accumulate_nodes() {
    let (mut engine, _handle, backend) = started();
    for round in 0..5 {
        let level = if round % 2 == 0 { -24.0 } else { -60.0 };
        engine.set_param(ParamId::NoiseLevel, level).unwrap();
        engine.set_waveform(sh101_engine::Waveform::ALL[round % 3]).unwrap();
        run(&mut engine, 256);
    }

    let expected = engine.inspect().unwrap().nodes.len();
    assert_eq!(backend.journal().live(), expected);
}

#[test]
fn teardown_stops_sources_then_releases_in_reverse() {
    let (mut engine, _handle, backend) = started();
    engine.set_param(ParamId::SubLevel, -18.0).unwrap();
    let nodes = engine.inspect().unwrap().nodes;

    let report = engine.teardown().unwrap();
    let kind_of = |id| nodes.iter().find(|(n, _)| *n == id).map(|(_, kind)| *kind);
    let stopped: Vec<_> = report.stopped.iter().filter_map(|&id| kind_of(id)).collect();
    assert_eq!(stopped[0], NodeKind::Lfo);
    assert_eq!(stopped.last(), Some(&NodeKind::Voice));

    let mut expected: Vec<_> = nodes.iter().map(|(id, _)| *id).collect();
    expected.reverse();
    assert_eq!(report.released, expected);
    assert_eq!(backend.journal().live(), 0);
    assert!(!engine.is_initialized());
}

#[test]
fn remote_handle_drives_the_engine_between_blocks() {
    let (mut engine, mut handle, _backend) = started();
    handle.toggle_step(PitchClass::G, 0).unwrap();
    handle.set_param(ParamId::Release, 0.0);
    assert!(handle.play());

    run(&mut engine, 512);
    handle.poll();
    let g3: Note = "G3".parse().unwrap();
    assert_eq!(handle.voice_state(), VoiceState::Sounding(g3));
    assert_eq!(handle.transport_state(), TransportState::Playing);

    assert!(handle.stop());
    run(&mut engine, 4_800);
    handle.poll();
    assert_eq!(handle.transport_state(), TransportState::Stopped);
    assert_eq!(handle.current_step(), None);
    assert_eq!(handle.voice_state(), VoiceState::Idle);
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= b.abs() * 1e-4
}

#[test]
fn note_on_puts_the_sub_an_octave_down() {
    let (mut engine, _handle, _backend) = started();
    engine.set_param(ParamId::SubLevel, -20.0).unwrap();
    engine.note_on(Note::A4, 1.0, 0).unwrap();
    run(&mut engine, 512);

    let probe = engine.inspect().unwrap();
    assert!(close(probe.voice_frequency, 440.0));
    assert_eq!(probe.sub_frequency, Some(probe.voice_frequency / 2.0));
}

#[test]
fn transpose_shifts_every_played_note() {
    let (mut engine, _handle, _backend) = started();
    engine.set_param(ParamId::Transpose, 12.0).unwrap();

    engine.note_on(Note::C3, 1.0, 0).unwrap();
    run(&mut engine, 512);
    assert!(close(engine.inspect().unwrap().voice_frequency, Note::C4.frequency()));
}

#[test]
fn first_note_lands_on_pitch_even_with_portamento() {
    let (mut engine, _handle, _backend) = started();
    engine.set_param(ParamId::Portamento, 0.1).unwrap();
    engine.set_param(ParamId::Transpose, 12.0).unwrap();
    engine.set_param(ParamId::SubLevel, -20.0).unwrap();

    engine.note_on(Note::C4, 1.0, 0).unwrap();
    let probe = engine.inspect().unwrap();
    let c5 = Note::C4.transpose(12).frequency();
    assert!(close(probe.voice_frequency, c5), "{}", probe.voice_frequency);
    assert_eq!(probe.sub_frequency, Some(probe.voice_frequency / 2.0));
}

#[test]
fn retrigger_glides_over_the_portamento_time() {
    let (mut engine, _handle, _backend) = started();
    engine.set_param(ParamId::Portamento, 0.1).unwrap();
    engine.set_param(ParamId::SubLevel, -20.0).unwrap();

    engine.note_on(Note::C3, 1.0, 0).unwrap();
    run(&mut engine, 1_024);
    let now = engine.now();
    engine.note_on(Note::C4, 1.0, now).unwrap();
    run(&mut engine, 2_400);

    let probe = engine.inspect().unwrap();
    let (from, to) = (Note::C3.frequency(), Note::C4.frequency());
    assert!(probe.voice_frequency > from && probe.voice_frequency < to);
    // Halfway through an exponential glide is the geometric mean.
    assert!((probe.voice_frequency - (from * to).sqrt()).abs() < 2.0);
    assert!(close(probe.sub_frequency.unwrap(), probe.voice_frequency / 2.0));

    run(&mut engine, 2_400);
    assert!(close(engine.inspect().unwrap().voice_frequency, to));
}

#[test]
fn filter_envelope_depth_reaches_the_cutoff() {
    let (mut engine, _handle, _backend) = started();
    engine.set_param(ParamId::FilterCutoff, 500.0).unwrap();
    engine.set_param(ParamId::FilterEnvAmount, 1.0).unwrap();
    engine.set_param(ParamId::Attack, 0.0).unwrap();
    engine.set_param(ParamId::Sustain, 1.0).unwrap();

    engine.note_on(Note::C3, 1.0, 0).unwrap();
    run(&mut engine, 4_800);

    let probe = engine.inspect().unwrap();
    assert!((probe.effective_cutoff - 5_500.0).abs() < 1.0, "{}", probe.effective_cutoff);
    assert!((probe.cutoff - 500.0).abs() < 1e-3);
}

#[test]
fn lfo_depth_sweeps_the_cutoff() {
    let (mut engine, _handle, _backend) = started();
    engine.set_param(ParamId::FilterCutoff, 8_000.0).unwrap();
    engine.set_param(ParamId::VcfModAmount, 1.0).unwrap();
    run(&mut engine, 4_800);

    let mut lowest = f32::MAX;
    let mut highest = f32::MIN;
    for _ in 0..96 {
        run(&mut engine, 500);
        let cutoff = engine.inspect().unwrap().effective_cutoff;
        lowest = lowest.min(cutoff);
        highest = highest.max(cutoff);
    }

    assert!(lowest < 5_500.0 && lowest >= 2_999.0, "lowest {lowest}");
    assert!(highest > 10_500.0 && highest <= 13_001.0, "highest {highest}");
}
