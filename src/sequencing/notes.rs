/*
Notes
=====

A note is a MIDI note number. Middle C (C4) = MIDI note 60, and A4 = 69 is
the 440 Hz tuning reference.

    note_number = 12 * (octave + 1) + semitone
    frequency   = 440 * 2^((note_number - 69) / 12)

where semitone: C=0, C#=1, D=2, D#=3, E=4, F=5, F#=6, G=7, G#=8, A=9, A#=10, B=11

Names parse with either accidental ("A#3" and "Bb3" are the same note) and
display with sharps. Octave -1 exists (C-1 = 0) but is rarely useful.
*/

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseNoteError;

/// One of the twelve chromatic pitch classes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Semitones above C.
    #[inline]
    pub fn semitone(self) -> u8 {
        self as u8
    }

    pub fn from_semitone(semitone: u8) -> Self {
        Self::ALL[(semitone % 12) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }
}

/// A MIDI note number, 0-127.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Note(u8);

impl Note {
    pub const C3: Note = Note(48);
    pub const C4: Note = Note(60);
    pub const A4: Note = Note(69);

    pub const MAX: u8 = 127;

    /// `None` above 127.
    pub fn new(midi: u8) -> Option<Self> {
        (midi <= Self::MAX).then_some(Note(midi))
    }

    pub fn from_parts(pitch: PitchClass, octave: i8) -> Option<Self> {
        let midi = 12 * (i16::from(octave) + 1) + i16::from(pitch.semitone());
        u8::try_from(midi).ok().and_then(Note::new)
    }

    #[inline]
    pub fn midi(self) -> u8 {
        self.0
    }

    pub fn pitch_class(self) -> PitchClass {
        PitchClass::from_semitone(self.0)
    }

    pub fn octave(self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Equal-tempered frequency, A4 = 440 Hz.
    pub fn frequency(self) -> f32 {
        440.0 * 2f32.powf((f32::from(self.0) - 69.0) / 12.0)
    }

    /// Shift by `semitones`, saturating at the MIDI range.
    pub fn transpose(self, semitones: i32) -> Note {
        Note((i32::from(self.0) + semitones).clamp(0, i32::from(Self::MAX)) as u8)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class().name(), self.octave())
    }
}

impl FromStr for Note {
    type Err = ParseNoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseNoteError(s.to_string());
        let mut chars = s.trim().chars();

        let letter = chars.next().ok_or_else(invalid)?;
        let natural: i8 = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(invalid()),
        };

        let rest = chars.as_str();
        let (accidental, octave) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };
        let octave: i8 = octave.parse().map_err(|_| invalid())?;

        // Cb and B# cross the octave boundary.
        let midi = 12 * (i16::from(octave) + 1) + i16::from(natural + accidental);
        u8::try_from(midi)
            .ok()
            .and_then(Note::new)
            .ok_or_else(invalid)
    }
}
