//! Messages between the UI thread and the audio thread.
//!
//! Both directions travel over `rtrb` rings: [`ControlMessage`] from the UI
//! into the engine (drained at the start of every block), [`EngineEvent`]
//! back out.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    sequencing::{
        notes::{Note, PitchClass},
        transport::TransportState,
    },
    synth::{
        params::{LfoWaveform, ParamId, Waveform},
        router::RebuildReason,
        voice::VoiceTransition,
    },
};

/// A request for the engine, applied at the start of the next block.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlMessage {
    SetParam { id: ParamId, value: f32 },
    SetWaveform(Waveform),
    SetLfoWaveform(LfoWaveform),
    NoteOn { note: Note, velocity: f32 },
    /// Release the sounding note, or only `note` when given.
    NoteOff { note: Option<Note> },
    KeyDown(Note),
    KeyUp(Note),
    ShiftOctave(i8),
    ToggleStep { pitch: PitchClass, step: usize },
    Play,
    Stop,
    Pause,
    Resume,
    SetTempo(f32),
    SetSwing(f32),
}

/// Something that happened on the audio thread.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// The transport reached `step` at sample `at`.
    Step {
        step: usize,
        note: Option<Note>,
        at: u64,
    },
    Voice(VoiceTransition),
    /// The release finished and the voice is free.
    VoiceIdle,
    Octave(i8),
    Rebuilt(RebuildReason),
    Transport(TransportState),
    /// The graph could not be rebuilt; the engine is uninitialized.
    Failed,
}
