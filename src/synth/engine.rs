use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::EngineConfig,
    error::EngineError,
    graph::{
        builder::{build_graph, GraphBuilder},
        topology::{DisposalReport, GraphProbe, SignalGraph},
    },
    io::backend::{await_running, AudioBackend, NodeFactory},
    sequencing::{
        notes::{Note, PitchClass},
        pattern::{StepPattern, StepState},
        scheduler::{EventSource, NoteEvent, ScheduledEvent, Scheduler},
        transport::{Transport, TransportState},
    },
    synth::{
        message::{ControlMessage, EngineEvent},
        params::{LfoWaveform, ParamId, Parameters, Waveform},
        remote::EngineHandle,
        router::{self, RebuildReason, Routed},
        voice::{VoiceController, VoiceState, VoiceTransition},
    },
};

/*
Engine
======

The engine owns everything that runs on the audio timeline:

    ┌──────────────── Engine ────────────────┐
    │ Parameters   StepPattern   Voice       │
    │ Transport ──→ Scheduler ──→ Controller │
    │                               │        │
    │                          SignalGraph ──┼──→ output
    └────────────────────────────────────────┘

Time is a sample counter. `render` splits every block at the next scheduled
event, so notes and steps land on their exact sample:

    block  |----------------|----------|---------------------|
           now           note on    step tick              end

Control messages from an `EngineHandle` are drained at the start of each
block. Direct calls (set_param, note_on, ...) apply at the current clock.

Until `start` has confirmed a running backend and built the graph, every
operation fails with `EngineError::NotInitialized`.
*/

/// Default velocity for keyboard and sequencer notes.
const DEFAULT_VELOCITY: f32 = 1.0;

/// What exists only while the engine is initialized.
struct Runtime {
    graph: SignalGraph,
    factory: Box<dyn NodeFactory>,
    transport: Transport,
}

pub struct Engine {
    config: EngineConfig,
    params: Parameters,
    pattern: StepPattern,
    voice: VoiceController,
    scheduler: Scheduler,
    runtime: Option<Runtime>,
    clock: u64,
    /// Note started by the sequencer and not yet released.
    sequencer_note: Option<Note>,
    control: Consumer<ControlMessage>,
    events: Producer<EngineEvent>,
    scope: Producer<f32>,
    remote: Option<EngineHandle>,
    scratch: Vec<f32>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let (control_tx, control_rx) = RingBuffer::new(config.control_capacity);
        let (events_tx, events_rx) = RingBuffer::new(config.event_capacity);
        let (scope_tx, scope_rx) = RingBuffer::new(config.scope_capacity);
        let params = Parameters::default();
        let remote = EngineHandle::new(
            control_tx,
            events_rx,
            scope_rx,
            params.clone(),
            config.analyzer_size,
        );

        Self {
            scratch: vec![0.0; config.max_block_size],
            scheduler: Scheduler::with_capacity(64),
            config,
            params,
            pattern: StepPattern::new(),
            voice: VoiceController::new(),
            runtime: None,
            clock: 0,
            sequencer_note: None,
            control: control_rx,
            events: events_tx,
            scope: scope_tx,
            remote: Some(remote),
        }
    }

    /// Take the UI-side handle. Only the first call returns it.
    pub fn remote(&mut self) -> Option<EngineHandle> {
        self.remote.take()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.runtime.is_some()
    }

    /// Current sample clock.
    pub fn now(&self) -> u64 {
        self.clock
    }

    /// Bring the backend to Running and build the graph.
    ///
    /// Calling it again tears the current graph down first.
    pub fn start(&mut self, backend: &mut dyn AudioBackend) -> Result<(), EngineError> {
        if self.runtime.is_some() {
            self.teardown()?;
        }

        await_running(backend, self.config.start_timeout, self.config.start_poll)?;

        let mut factory = backend.node_factory();
        let graph = build_graph(&self.params, backend, factory.as_mut(), &self.config)?;
        let transport = Transport::new(graph.sample_rate());

        info!(
            sample_rate = graph.sample_rate(),
            nodes = graph.node_count(),
            "engine started"
        );
        self.runtime = Some(Runtime {
            graph,
            factory,
            transport,
        });
        Ok(())
    }

    /// Dispose the graph and return to the uninitialized state.
    pub fn teardown(&mut self) -> Result<DisposalReport, EngineError> {
        let Runtime {
            graph, mut factory, ..
        } = self.runtime.take().ok_or(EngineError::NotInitialized)?;

        let report = graph.dispose(factory.as_mut());
        self.voice.reset();
        self.scheduler.clear();
        self.sequencer_note = None;
        info!(released = report.released.len(), "engine torn down");
        Ok(report)
    }

    fn runtime(&self) -> Result<&Runtime, EngineError> {
        self.runtime.as_ref().ok_or(EngineError::NotInitialized)
    }

    fn runtime_mut(&mut self) -> Result<&mut Runtime, EngineError> {
        self.runtime.as_mut().ok_or(EngineError::NotInitialized)
    }

    fn emit(&mut self, event: EngineEvent) {
        if self.events.push(event).is_err() {
            trace!(?event, "event ring full, dropping event");
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Render mono samples into `out`.
    ///
    /// Before `start` (or after a failed rebuild) `out` is filled with
    /// silence and `NotInitialized` is returned.
    pub fn render(&mut self, out: &mut [f32]) -> Result<(), EngineError> {
        if self.runtime.is_none() {
            out.fill(0.0);
            return Err(EngineError::NotInitialized);
        }

        self.drain_control();

        let mut offset = 0;
        while offset < out.len() {
            let now = self.clock;
            let end = now + (out.len() - offset) as u64;

            self.schedule_ticks(now, end);
            while let Some(event) = self.scheduler.pop_due(now) {
                self.dispatch(event);
            }

            let Some(runtime) = self.runtime.as_mut() else {
                out[offset..].fill(0.0);
                return Err(EngineError::NotInitialized);
            };

            let boundary = self.scheduler.next_at().map_or(end, |at| at.min(end));
            let len = ((boundary - now) as usize)
                .max(1)
                .min(self.config.max_block_size)
                .min(out.len() - offset);

            let segment = &mut out[offset..offset + len];
            runtime.graph.render(segment);
            for &sample in segment.iter() {
                if self.scope.push(sample).is_err() {
                    break;
                }
            }

            self.clock += len as u64;
            offset += len;

            if matches!(self.voice.state(), VoiceState::Releasing(_))
                && runtime.graph.voice_silent()
                && self.voice.release_finished()
            {
                self.emit(EngineEvent::VoiceIdle);
            }
        }
        Ok(())
    }

    /// Render mono and copy it to every channel of an interleaved buffer.
    pub fn render_interleaved(
        &mut self,
        out: &mut [f32],
        channels: usize,
    ) -> Result<(), EngineError> {
        let channels = channels.max(1);
        let frames = out.len() / channels;
        let mut scratch = std::mem::take(&mut self.scratch);
        let block = scratch.len().max(1);

        let mut result = Ok(());
        let mut written = 0;
        while written < frames {
            let len = (frames - written).min(block);
            let mono = &mut scratch[..len];
            if let Err(err) = self.render(mono) {
                result = Err(err);
            }
            let dst = &mut out[written * channels..(written + len) * channels];
            for (frame, &sample) in dst.chunks_exact_mut(channels).zip(mono.iter()) {
                frame.fill(sample);
            }
            written += len;
        }

        self.scratch = scratch;
        result
    }

    fn drain_control(&mut self) {
        while let Ok(message) = self.control.pop() {
            if let Err(err) = self.apply(message) {
                warn!(%err, ?message, "control message failed");
            }
        }
    }

    /// Apply one control message now.
    pub fn apply(&mut self, message: ControlMessage) -> Result<(), EngineError> {
        let now = self.clock;
        match message {
            ControlMessage::SetParam { id, value } => self.set_param(id, value).map(drop),
            ControlMessage::SetWaveform(waveform) => self.set_waveform(waveform),
            ControlMessage::SetLfoWaveform(waveform) => self.set_lfo_waveform(waveform),
            ControlMessage::NoteOn { note, velocity } => {
                self.note_on(note, velocity, now).map(drop)
            }
            ControlMessage::NoteOff { note: Some(note) } => self.note_off_for(note, now).map(drop),
            ControlMessage::NoteOff { note: None } => self.note_off(now).map(drop),
            ControlMessage::KeyDown(key) => self.key_down(key).map(drop),
            ControlMessage::KeyUp(key) => self.key_up(key).map(drop),
            ControlMessage::ShiftOctave(delta) => self.shift_octave(delta).map(drop),
            ControlMessage::ToggleStep { pitch, step } => self.toggle_step(pitch, step).map(drop),
            ControlMessage::Play => self.play().map(drop),
            ControlMessage::Stop => self.stop().map(drop),
            ControlMessage::Pause => self.pause().map(drop),
            ControlMessage::Resume => self.resume().map(drop),
            ControlMessage::SetTempo(bpm) => self.set_tempo(bpm).map(drop),
            ControlMessage::SetSwing(swing) => self.set_swing(swing).map(drop),
        }
    }

    /// Turn transport ticks before `end` into scheduled note events.
    fn schedule_ticks(&mut self, now: u64, end: u64) {
        let Some(runtime) = self.runtime.as_mut() else {
            return;
        };

        while let Some(tick) = runtime.transport.poll(now, end) {
            let note = self.pattern.active_at(tick.step);
            if let Some(note) = note {
                let gate = runtime.transport.gate_samples();
                self.scheduler.push(ScheduledEvent {
                    at: tick.at,
                    source: EventSource::Sequencer,
                    event: NoteEvent::NoteOn {
                        note,
                        velocity: DEFAULT_VELOCITY,
                    },
                });
                self.scheduler.push(ScheduledEvent {
                    at: tick.at + gate,
                    source: EventSource::Sequencer,
                    event: NoteEvent::NoteOff { note: Some(note) },
                });
            }

            let event = EngineEvent::Step {
                step: tick.step,
                note,
                at: tick.at,
            };
            if self.events.push(event).is_err() {
                trace!(step = tick.step, "event ring full, dropping step");
            }
        }
    }

    fn dispatch(&mut self, scheduled: ScheduledEvent) {
        let transition = match scheduled.event {
            NoteEvent::NoteOn { note, velocity } => self.voice_on(note, velocity),
            NoteEvent::NoteOff { note } => self.voice_off(note),
        };

        if scheduled.source == EventSource::Sequencer {
            match transition {
                VoiceTransition::Attack { note } | VoiceTransition::Retrigger { to: note, .. } => {
                    self.sequencer_note = Some(note);
                }
                VoiceTransition::Release { .. } => self.sequencer_note = None,
                VoiceTransition::Ignored => {}
            }
        } else if transition != VoiceTransition::Ignored {
            // The keyboard took over the voice.
            self.sequencer_note = None;
        }
    }

    fn voice_on(&mut self, note: Note, velocity: f32) -> VoiceTransition {
        let transpose = self.params.get(ParamId::Transpose).round() as i32;
        let portamento = self.params.get(ParamId::Portamento);
        let Some(runtime) = self.runtime.as_mut() else {
            return VoiceTransition::Ignored;
        };

        let transition = self.voice.note_on(note);
        let frequency = note.transpose(transpose).frequency();
        let glide = if portamento > 0.0 {
            runtime.graph.ctx().samples(portamento)
        } else {
            0
        };

        if let VoiceTransition::Retrigger { .. } = transition {
            runtime.graph.release();
        }
        runtime.graph.attack(frequency, velocity, glide);

        debug!(%note, frequency, glide, ?transition, "note on");
        self.emit(EngineEvent::Voice(transition));
        transition
    }

    fn voice_off(&mut self, note: Option<Note>) -> VoiceTransition {
        let Some(runtime) = self.runtime.as_mut() else {
            return VoiceTransition::Ignored;
        };

        let transition = self.voice.note_off(note);
        if let VoiceTransition::Release { .. } = transition {
            runtime.graph.release();
            self.emit(EngineEvent::Voice(transition));
        }
        transition
    }

    /// Schedule `event` at `at`, or run it now if `at` is not in the future.
    fn note_event(
        &mut self,
        event: NoteEvent,
        at: u64,
    ) -> Result<Option<VoiceTransition>, EngineError> {
        self.runtime()?;
        let scheduled = ScheduledEvent {
            at,
            source: EventSource::Manual,
            event,
        };

        if at <= self.clock {
            let transition = match event {
                NoteEvent::NoteOn { note, velocity } => self.voice_on(note, velocity),
                NoteEvent::NoteOff { note } => self.voice_off(note),
            };
            if transition != VoiceTransition::Ignored {
                self.sequencer_note = None;
            }
            Ok(Some(transition))
        } else {
            self.scheduler.push(scheduled);
            Ok(None)
        }
    }

    fn rebuild(&mut self, reason: RebuildReason) -> Result<(), EngineError> {
        let Runtime {
            graph,
            mut factory,
            transport,
        } = self.runtime.take().ok_or(EngineError::NotInitialized)?;

        info!(%reason, "rebuilding signal graph");
        let sample_rate = graph.sample_rate();
        graph.dispose(factory.as_mut());

        if self.voice.state() != VoiceState::Idle {
            self.emit(EngineEvent::VoiceIdle);
        }
        self.voice.reset();
        self.sequencer_note = None;

        match GraphBuilder::new(factory.as_mut(), sample_rate).build(&self.params, &self.config) {
            Ok(graph) => {
                self.runtime = Some(Runtime {
                    graph,
                    factory,
                    transport,
                });
                self.emit(EngineEvent::Rebuilt(reason));
                Ok(())
            }
            Err(err) => {
                error!(%err, %reason, "rebuild failed, engine is uninitialized");
                self.scheduler.clear();
                self.emit(EngineEvent::Failed);
                Err(err.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    pub fn param(&self, id: ParamId) -> Result<f32, EngineError> {
        self.runtime()?;
        Ok(self.params.get(id))
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Set a parameter (clamped) and route it to the graph.
    ///
    /// Returns the stored value. Changes that add or remove a node rebuild
    /// the graph.
    pub fn set_param(&mut self, id: ParamId, value: f32) -> Result<f32, EngineError> {
        let ramp = self.config.ramp_samples(self.runtime()?.graph.sample_rate());
        let previous = self.params.get(id);
        let stored = self.params.set(id, value);

        let runtime = self.runtime_mut()?;
        match router::apply(&mut runtime.graph, id, previous, stored, ramp) {
            Routed::RebuildRequired(reason) => self.rebuild(reason)?,
            Routed::Ramped | Routed::Applied => {}
        }
        Ok(stored)
    }

    pub fn waveform_param(&self) -> Waveform {
        self.params.waveform
    }

    /// Change the oscillator waveform. Rebuilds the graph.
    pub fn set_waveform(&mut self, waveform: Waveform) -> Result<(), EngineError> {
        self.runtime()?;
        if self.params.waveform == waveform {
            return Ok(());
        }
        self.params.waveform = waveform;
        self.rebuild(RebuildReason::Waveform)
    }

    /// Change the LFO shape in place.
    pub fn set_lfo_waveform(&mut self, waveform: LfoWaveform) -> Result<(), EngineError> {
        let runtime = self.runtime_mut()?;
        runtime.graph.lfo.node.set_waveform(waveform.oscillator());
        self.params.lfo_waveform = waveform;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------

    /// Play `note` at sample `at`. Returns the transition when it ran
    /// immediately, `None` when it was scheduled.
    pub fn note_on(
        &mut self,
        note: Note,
        velocity: f32,
        at: u64,
    ) -> Result<Option<VoiceTransition>, EngineError> {
        self.note_event(
            NoteEvent::NoteOn {
                note,
                velocity: velocity.clamp(0.0, 1.0),
            },
            at,
        )
    }

    /// Release whatever is sounding at `at`.
    pub fn note_off(&mut self, at: u64) -> Result<Option<VoiceTransition>, EngineError> {
        self.note_event(NoteEvent::NoteOff { note: None }, at)
    }

    /// Release `note` at `at` if it is the one sounding.
    pub fn note_off_for(
        &mut self,
        note: Note,
        at: u64,
    ) -> Result<Option<VoiceTransition>, EngineError> {
        self.note_event(NoteEvent::NoteOff { note: Some(note) }, at)
    }

    /// Keyboard press, with octave offset and repeat suppression.
    pub fn key_down(&mut self, key: Note) -> Result<VoiceTransition, EngineError> {
        self.runtime()?;
        match self.voice.key_down(key) {
            Some(note) => Ok(self
                .note_on(note, DEFAULT_VELOCITY, self.clock)?
                .unwrap_or(VoiceTransition::Ignored)),
            None => Ok(VoiceTransition::Ignored),
        }
    }

    /// Keyboard release; only the held key releases.
    pub fn key_up(&mut self, key: Note) -> Result<VoiceTransition, EngineError> {
        self.runtime()?;
        match self.voice.key_up(key) {
            Some(note) => Ok(self
                .note_off_for(note, self.clock)?
                .unwrap_or(VoiceTransition::Ignored)),
            None => Ok(VoiceTransition::Ignored),
        }
    }

    pub fn shift_octave(&mut self, delta: i8) -> Result<i8, EngineError> {
        self.runtime()?;
        let octave = self.voice.shift_octave(delta);
        self.emit(EngineEvent::Octave(octave));
        Ok(octave)
    }

    pub fn voice_state(&self) -> Result<VoiceState, EngineError> {
        self.runtime()?;
        Ok(self.voice.state())
    }

    // ------------------------------------------------------------------
    // Pattern and transport
    // ------------------------------------------------------------------

    pub fn toggle_step(&mut self, pitch: PitchClass, step: usize) -> Result<StepState, EngineError> {
        self.runtime()?;
        self.pattern.toggle(pitch, step)
    }

    pub fn step_state(&self, pitch: PitchClass, step: usize) -> Result<StepState, EngineError> {
        self.runtime()?;
        self.pattern.state(pitch, step)
    }

    pub fn pattern(&self) -> &StepPattern {
        &self.pattern
    }

    /// Replace the whole pattern, e.g. from a saved preset.
    pub fn load_pattern(&mut self, pattern: StepPattern) -> Result<(), EngineError> {
        self.runtime()?;
        self.pattern = pattern;
        Ok(())
    }

    pub fn play(&mut self) -> Result<bool, EngineError> {
        let now = self.clock;
        let started = self.runtime_mut()?.transport.play(now);
        if started {
            self.emit(EngineEvent::Transport(TransportState::Playing));
        }
        Ok(started)
    }

    /// Stop the transport, cancel pending sequencer notes and release the
    /// note the sequencer is holding. A no-op when already stopped.
    pub fn stop(&mut self) -> Result<bool, EngineError> {
        if !self.runtime_mut()?.transport.stop() {
            return Ok(false);
        }

        let cancelled = self.scheduler.cancel(EventSource::Sequencer);
        if let Some(note) = self.sequencer_note.take() {
            self.voice_off(Some(note));
        }
        debug!(cancelled, "transport stopped");
        self.emit(EngineEvent::Transport(TransportState::Stopped));
        Ok(true)
    }

    pub fn pause(&mut self) -> Result<bool, EngineError> {
        let now = self.clock;
        let paused = self.runtime_mut()?.transport.pause(now);
        if paused {
            self.emit(EngineEvent::Transport(TransportState::Paused));
        }
        Ok(paused)
    }

    pub fn resume(&mut self) -> Result<bool, EngineError> {
        let now = self.clock;
        let resumed = self.runtime_mut()?.transport.resume(now);
        if resumed {
            self.emit(EngineEvent::Transport(TransportState::Playing));
        }
        Ok(resumed)
    }

    pub fn set_tempo(&mut self, bpm: f32) -> Result<f32, EngineError> {
        Ok(self.runtime_mut()?.transport.set_tempo(bpm))
    }

    pub fn set_swing(&mut self, swing: f32) -> Result<f32, EngineError> {
        Ok(self.runtime_mut()?.transport.set_swing(swing))
    }

    pub fn tempo(&self) -> Result<f32, EngineError> {
        Ok(self.runtime()?.transport.tempo())
    }

    pub fn swing(&self) -> Result<f32, EngineError> {
        Ok(self.runtime()?.transport.swing())
    }

    /// Step of the most recent tick; `None` while stopped.
    pub fn current_step(&self) -> Result<Option<usize>, EngineError> {
        Ok(self.runtime()?.transport.current_step())
    }

    pub fn transport_state(&self) -> Result<TransportState, EngineError> {
        Ok(self.runtime()?.transport.state())
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// The analyzer's most recent samples, oldest first.
    pub fn waveform(&self) -> Result<Vec<f32>, EngineError> {
        let mut out = Vec::with_capacity(self.config.analyzer_size);
        self.runtime()?.graph.waveform_into(&mut out);
        Ok(out)
    }

    pub fn inspect(&self) -> Result<GraphProbe, EngineError> {
        Ok(self.runtime()?.graph.probe())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.runtime.is_some() {
            if let Err(err) = self.teardown() {
                warn!(%err, "teardown on drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::backend::HeadlessBackend;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn started() -> (Engine, HeadlessBackend) {
        let mut backend = HeadlessBackend::new(SAMPLE_RATE);
        let mut engine = Engine::default();
        engine.start(&mut backend).unwrap();
        (engine, backend)
    }

    #[test]
    fn everything_fails_before_start() {
        let mut engine = Engine::default();
        let mut out = vec![1.0; 64];

        assert_eq!(engine.render(&mut out), Err(EngineError::NotInitialized));
        assert!(out.iter().all(|&x| x == 0.0));
        assert_eq!(engine.param(ParamId::Attack), Err(EngineError::NotInitialized));
        assert_eq!(
            engine.set_param(ParamId::Attack, 0.5),
            Err(EngineError::NotInitialized)
        );
        assert_eq!(engine.play(), Err(EngineError::NotInitialized));
        assert_eq!(
            engine.note_on(Note::C4, 1.0, 0),
            Err(EngineError::NotInitialized)
        );
        assert_eq!(engine.teardown(), Err(EngineError::NotInitialized));
    }

    #[test]
    fn future_notes_land_on_their_sample() {
        let (mut engine, _backend) = started();
        assert_eq!(engine.note_on(Note::C4, 1.0, 100), Ok(None));

        let mut out = vec![0.0; 200];
        engine.render(&mut out).unwrap();

        assert!(out[..100].iter().all(|&x| x == 0.0));
        assert_eq!(engine.voice_state(), Ok(VoiceState::Sounding(Note::C4)));
    }

    #[test]
    fn release_finishes_to_idle() {
        let (mut engine, _backend) = started();
        engine.set_param(ParamId::Release, 0.01).unwrap();
        engine.note_on(Note::C4, 1.0, 0).unwrap();
        engine.note_off(0).unwrap();
        assert_eq!(engine.voice_state(), Ok(VoiceState::Releasing(Note::C4)));

        let mut out = vec![0.0; 4_800];
        engine.render(&mut out).unwrap();
        assert_eq!(engine.voice_state(), Ok(VoiceState::Idle));
    }

    #[test]
    fn waveform_change_rebuilds_and_resets_voice() {
        let (mut engine, backend) = started();
        engine.note_on(Note::C4, 1.0, 0).unwrap();

        engine.set_waveform(Waveform::Square).unwrap();
        assert_eq!(engine.voice_state(), Ok(VoiceState::Idle));
        assert_eq!(engine.inspect().unwrap().nodes.len(), 16);
        assert_eq!(backend.journal().live(), 16);
    }

    #[test]
    fn interleaved_output_duplicates_channels() {
        let (mut engine, _backend) = started();
        engine.note_on(Note::A4, 1.0, 0).unwrap();

        let mut out = vec![0.0; 2 * 512];
        engine.render_interleaved(&mut out, 2).unwrap();
        assert!(out.chunks_exact(2).all(|frame| frame[0] == frame[1]));
        assert!(out.iter().any(|&x| x != 0.0));
    }

    #[test]
    fn restart_disposes_previous_graph() {
        let (mut engine, mut backend) = started();
        engine.start(&mut backend).unwrap();

        let journal = backend.journal();
        assert_eq!(journal.created.len(), 32);
        assert_eq!(journal.live(), 16);
    }
}
