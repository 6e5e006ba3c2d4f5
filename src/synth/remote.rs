//! UI-side handle to an engine running on the audio thread.

use std::collections::VecDeque;

use rtrb::{Consumer, Producer};
use tracing::warn;

use crate::{
    error::EngineError,
    sequencing::{
        notes::{Note, PitchClass},
        pattern::{StepPattern, StepState},
        transport::{TransportState, DEFAULT_TEMPO, MAX_TEMPO, MIN_TEMPO},
    },
    synth::{
        message::{ControlMessage, EngineEvent},
        params::{LfoWaveform, ParamId, Parameters, Waveform},
        voice::{VoiceState, VoiceTransition, MAX_OCTAVE, MIN_OCTAVE},
    },
};

/// Controls an [`Engine`](crate::Engine) from another thread.
///
/// Writes are mirrored locally (clamped exactly as the engine clamps them)
/// so reads are immediate, then forwarded over a lock-free ring. Call
/// [`poll`](Self::poll) once per UI frame to pick up what the engine did.
pub struct EngineHandle {
    control: Producer<ControlMessage>,
    events: Consumer<EngineEvent>,
    scope: Consumer<f32>,
    scope_buf: VecDeque<f32>,
    scope_len: usize,
    params: Parameters,
    pattern: StepPattern,
    tempo: f32,
    swing: f32,
    octave: i8,
    transport: TransportState,
    current_step: Option<usize>,
    voice: VoiceState,
}

impl EngineHandle {
    pub(crate) fn new(
        control: Producer<ControlMessage>,
        events: Consumer<EngineEvent>,
        scope: Consumer<f32>,
        params: Parameters,
        scope_len: usize,
    ) -> Self {
        Self {
            control,
            events,
            scope,
            scope_buf: VecDeque::from(vec![0.0; scope_len]),
            scope_len,
            params,
            pattern: StepPattern::new(),
            tempo: DEFAULT_TEMPO,
            swing: 0.0,
            octave: 0,
            transport: TransportState::Stopped,
            current_step: None,
            voice: VoiceState::Idle,
        }
    }

    /// Queue a message for the engine. Returns false if the ring is full.
    pub fn send(&mut self, message: ControlMessage) -> bool {
        match self.control.push(message) {
            Ok(()) => true,
            Err(_) => {
                warn!(?message, "control ring full, message dropped");
                false
            }
        }
    }

    /// Drain engine events, update the mirrors and return the events.
    pub fn poll(&mut self) -> Vec<EngineEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.pop() {
            match event {
                EngineEvent::Step { step, .. } => self.current_step = Some(step),
                EngineEvent::Voice(transition) => {
                    self.voice = match transition {
                        VoiceTransition::Attack { note } => VoiceState::Sounding(note),
                        VoiceTransition::Retrigger { to, .. } => VoiceState::Sounding(to),
                        VoiceTransition::Release { note } => VoiceState::Releasing(note),
                        VoiceTransition::Ignored => self.voice,
                    };
                }
                EngineEvent::VoiceIdle => self.voice = VoiceState::Idle,
                EngineEvent::Octave(octave) => self.octave = octave,
                EngineEvent::Transport(state) => {
                    self.transport = state;
                    if state == TransportState::Stopped {
                        self.current_step = None;
                    }
                }
                EngineEvent::Rebuilt(_) => self.voice = VoiceState::Idle,
                EngineEvent::Failed => {
                    self.voice = VoiceState::Idle;
                    self.transport = TransportState::Stopped;
                    self.current_step = None;
                }
            }
            drained.push(event);
        }

        while let Ok(sample) = self.scope.pop() {
            if self.scope_buf.len() == self.scope_len {
                self.scope_buf.pop_front();
            }
            self.scope_buf.push_back(sample);
        }
        drained
    }

    /// Most recent output samples, oldest first.
    pub fn waveform(&mut self) -> &[f32] {
        self.scope_buf.make_contiguous()
    }

    // Parameters

    pub fn param(&self, id: ParamId) -> f32 {
        self.params.get(id)
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Display string for the mirrored value of `id`.
    pub fn display(&self, id: ParamId) -> String {
        self.params.display(id)
    }

    pub fn set_param(&mut self, id: ParamId, value: f32) -> f32 {
        let stored = self.params.set(id, value);
        self.send(ControlMessage::SetParam { id, value: stored });
        stored
    }

    pub fn waveform_param(&self) -> Waveform {
        self.params.waveform
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.params.waveform = waveform;
        self.send(ControlMessage::SetWaveform(waveform));
    }

    pub fn lfo_waveform(&self) -> LfoWaveform {
        self.params.lfo_waveform
    }

    pub fn set_lfo_waveform(&mut self, waveform: LfoWaveform) {
        self.params.lfo_waveform = waveform;
        self.send(ControlMessage::SetLfoWaveform(waveform));
    }

    // Notes

    pub fn note_on(&mut self, note: Note, velocity: f32) -> bool {
        self.send(ControlMessage::NoteOn { note, velocity })
    }

    pub fn note_off(&mut self) -> bool {
        self.send(ControlMessage::NoteOff { note: None })
    }

    pub fn note_off_for(&mut self, note: Note) -> bool {
        self.send(ControlMessage::NoteOff { note: Some(note) })
    }

    pub fn key_down(&mut self, key: Note) -> bool {
        self.send(ControlMessage::KeyDown(key))
    }

    pub fn key_up(&mut self, key: Note) -> bool {
        self.send(ControlMessage::KeyUp(key))
    }

    pub fn shift_octave(&mut self, delta: i8) -> i8 {
        self.octave = self.octave.saturating_add(delta).clamp(MIN_OCTAVE, MAX_OCTAVE);
        self.send(ControlMessage::ShiftOctave(delta));
        self.octave
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    pub fn voice_state(&self) -> VoiceState {
        self.voice
    }

    // Pattern and transport

    pub fn toggle_step(&mut self, pitch: PitchClass, step: usize) -> Result<StepState, EngineError> {
        let state = self.pattern.toggle(pitch, step)?;
        self.send(ControlMessage::ToggleStep { pitch, step });
        Ok(state)
    }

    pub fn step_state(&self, pitch: PitchClass, step: usize) -> Result<StepState, EngineError> {
        self.pattern.state(pitch, step)
    }

    pub fn pattern(&self) -> &StepPattern {
        &self.pattern
    }

    pub fn play(&mut self) -> bool {
        self.send(ControlMessage::Play)
    }

    pub fn stop(&mut self) -> bool {
        self.send(ControlMessage::Stop)
    }

    pub fn pause(&mut self) -> bool {
        self.send(ControlMessage::Pause)
    }

    pub fn resume(&mut self) -> bool {
        self.send(ControlMessage::Resume)
    }

    pub fn set_tempo(&mut self, bpm: f32) -> f32 {
        if !bpm.is_nan() {
            self.tempo = bpm.clamp(MIN_TEMPO, MAX_TEMPO);
        }
        self.send(ControlMessage::SetTempo(self.tempo));
        self.tempo
    }

    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    pub fn set_swing(&mut self, swing: f32) -> f32 {
        if !swing.is_nan() {
            self.swing = swing.clamp(0.0, 1.0);
        }
        self.send(ControlMessage::SetSwing(self.swing));
        self.swing
    }

    pub fn swing(&self) -> f32 {
        self.swing
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport
    }

    /// Step of the most recent tick reported by the engine.
    pub fn current_step(&self) -> Option<usize> {
        self.current_step
    }
}
