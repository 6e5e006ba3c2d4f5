/*
Step Pattern
============

One bar of sixteen steps over twelve chromatic rows, C3 up to B3. Every row
has a normal and a high (+1 octave) variant:

          step  0 1 2 3 4 5 6 7 8 9 A B C D E F
    C3  normal  x . . . . . . . x . . . . . . .
        high    . . . . . . . . . . . . . . . .
    D#3 normal  . . . . . . . . . . . . . . . .
        high    . . . . x . . . . . . . . . . .
    ...

Each row/variant is a `u16` bitmask, bit n = step n.

Toggling a cell cycles off → normal → high → off. Turning a note on clears
every other note at that step, so a well-formed pattern never has more than
one active note per step. A pattern restored from outside (see
[`StepPattern::from_masks`]) may break that; the playback scan resolves it
by letting the high variant win and then the lowest pitch.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, SequenceStateError};
use crate::sequencing::notes::{Note, PitchClass};

pub const STEPS: usize = 16;
pub const ROWS: usize = 12;

/// Lowest note of the grid (normal variant of the C row).
pub const BASE_NOTE: Note = Note::C3;

/// State of one cell.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepState {
    #[default]
    Off,
    Normal,
    High,
}

impl StepState {
    pub fn next(self) -> Self {
        match self {
            StepState::Off => StepState::Normal,
            StepState::Normal => StepState::High,
            StepState::High => StepState::Off,
        }
    }

    pub fn is_on(self) -> bool {
        self != StepState::Off
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepPattern {
    normal: [u16; ROWS],
    high: [u16; ROWS],
}

fn check_step(step: usize) -> Result<u16, EngineError> {
    if step < STEPS {
        Ok(1 << step)
    } else {
        Err(EngineError::StepOutOfRange(step))
    }
}

impl StepPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a pattern from raw row masks. No consistency is enforced.
    pub fn from_masks(normal: [u16; ROWS], high: [u16; ROWS]) -> Self {
        Self { normal, high }
    }

    pub fn masks(&self) -> ([u16; ROWS], [u16; ROWS]) {
        (self.normal, self.high)
    }

    pub fn state(&self, pitch: PitchClass, step: usize) -> Result<StepState, EngineError> {
        let bit = check_step(step)?;
        Ok(self.cell(pitch.semitone() as usize, bit))
    }

    #[inline]
    fn cell(&self, row: usize, bit: u16) -> StepState {
        if self.high[row] & bit != 0 {
            StepState::High
        } else if self.normal[row] & bit != 0 {
            StepState::Normal
        } else {
            StepState::Off
        }
    }

    /// Advance a cell one state through off → normal → high → off.
    ///
    /// Returns the new state.
    pub fn toggle(&mut self, pitch: PitchClass, step: usize) -> Result<StepState, EngineError> {
        let bit = check_step(step)?;
        let row = pitch.semitone() as usize;
        let next = self.cell(row, bit).next();

        if next.is_on() {
            for other in 0..ROWS {
                self.normal[other] &= !bit;
                self.high[other] &= !bit;
            }
        }

        match next {
            StepState::Off => {
                self.normal[row] &= !bit;
                self.high[row] &= !bit;
            }
            StepState::Normal => self.normal[row] |= bit,
            StepState::High => self.high[row] |= bit,
        }
        Ok(next)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.normal.iter().chain(&self.high).all(|&mask| mask == 0)
    }

    /// Number of active cells at `step` (both variants counted).
    pub fn active_count(&self, step: usize) -> usize {
        let Ok(bit) = check_step(step) else {
            return 0;
        };
        self.normal
            .iter()
            .chain(&self.high)
            .filter(|&&mask| mask & bit != 0)
            .count()
    }

    /// Report a step holding more than one note.
    pub fn validate(&self, step: usize) -> Result<(), SequenceStateError> {
        match self.active_count(step) {
            0 | 1 => Ok(()),
            active => Err(SequenceStateError { step, active }),
        }
    }

    /// The note to play at `step`, if any.
    ///
    /// An inconsistent step is resolved (high variant first, then lowest
    /// pitch) and logged.
    pub fn active_at(&self, step: usize) -> Option<Note> {
        let bit = check_step(step).ok()?;

        if let Err(err) = self.validate(step) {
            warn!(%err, "resolving inconsistent step");
        }

        let row_note = |row: usize, octave_up: i32| {
            BASE_NOTE.transpose(row as i32 + octave_up)
        };

        if let Some(row) = (0..ROWS).find(|&row| self.high[row] & bit != 0) {
            return Some(row_note(row, 12));
        }
        (0..ROWS)
            .find(|&row| self.normal[row] & bit != 0)
            .map(|row| row_note(row, 0))
    }
}
