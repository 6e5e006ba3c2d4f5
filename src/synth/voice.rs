use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sequencing::notes::Note;

/*
Voice Controller
================

One voice, one note at a time. The controller only decides what should
happen; the engine carries it out on the graph.

              note_on                     note_off(held)
    Idle ──────────────→ Sounding(n) ─────────────────→ Releasing(n)
     ▲                     ▲    │  note_on(m)               │  │
     │                     │    └──→ Retrigger n→m ─────────┼──┘ note_on(m)
     │                     └────────────────────────────────┘
     └──────────────────────────────────────────────────────┘
                    release finished (amp envelope idle)

A retrigger releases the old note and attacks the new one on the same
sample. Envelopes restart from wherever they are, so there is no click, and
with portamento the pitch glides from the old note to the new one.

The keyboard layer on top adds an octave offset (-2..+2), ignores key
repeat for the key already held, and only lets the held key release.
*/

pub const MIN_OCTAVE: i8 = -2;
pub const MAX_OCTAVE: i8 = 2;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Sounding(Note),
    Releasing(Note),
}

impl VoiceState {
    pub fn note(self) -> Option<Note> {
        match self {
            VoiceState::Idle => None,
            VoiceState::Sounding(note) | VoiceState::Releasing(note) => Some(note),
        }
    }
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceState::Idle => f.write_str("idle"),
            VoiceState::Sounding(note) => write!(f, "sounding {note}"),
            VoiceState::Releasing(note) => write!(f, "releasing {note}"),
        }
    }
}

/// What a note event did to the voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceTransition {
    Attack { note: Note },
    Retrigger { from: Note, to: Note },
    Release { note: Note },
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeldKey {
    key: Note,
    played: Note,
}

#[derive(Debug, Clone, Default)]
pub struct VoiceController {
    state: VoiceState,
    octave: i8,
    held: Option<HeldKey>,
}

impl VoiceController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn note_on(&mut self, note: Note) -> VoiceTransition {
        let transition = match self.state {
            VoiceState::Idle => VoiceTransition::Attack { note },
            VoiceState::Sounding(from) | VoiceState::Releasing(from) => {
                VoiceTransition::Retrigger { from, to: note }
            }
        };
        self.state = VoiceState::Sounding(note);
        transition
    }

    /// Release the sounding note. With `Some(note)` only that note releases;
    /// anything else is ignored.
    pub fn note_off(&mut self, note: Option<Note>) -> VoiceTransition {
        match self.state {
            VoiceState::Sounding(held) if note.map_or(true, |n| n == held) => {
                self.state = VoiceState::Releasing(held);
                VoiceTransition::Release { note: held }
            }
            _ => VoiceTransition::Ignored,
        }
    }

    /// The amplitude envelope finished. Returns true if the voice went idle.
    pub fn release_finished(&mut self) -> bool {
        if let VoiceState::Releasing(_) = self.state {
            self.state = VoiceState::Idle;
            true
        } else {
            false
        }
    }

    /// Forget everything, e.g. after the graph was rebuilt under the voice.
    pub fn reset(&mut self) {
        self.state = VoiceState::Idle;
        self.held = None;
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// Move the keyboard octave, clamped to -2..+2.
    pub fn shift_octave(&mut self, delta: i8) -> i8 {
        self.octave = self.octave.saturating_add(delta).clamp(MIN_OCTAVE, MAX_OCTAVE);
        self.octave
    }

    /// Keyboard press. Returns the note to play, or `None` for a repeat of
    /// the key already held.
    pub fn key_down(&mut self, key: Note) -> Option<Note> {
        if self.held.is_some_and(|held| held.key == key) {
            return None;
        }
        let played = key.transpose(12 * i32::from(self.octave));
        self.held = Some(HeldKey { key, played });
        Some(played)
    }

    /// Keyboard release. Returns the note to stop if `key` is the held key.
    pub fn key_up(&mut self, key: Note) -> Option<Note> {
        match self.held {
            Some(held) if held.key == key => {
                self.held = None;
                Some(held.played)
            }
            _ => None,
        }
    }
}
