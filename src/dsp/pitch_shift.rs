//! Delay-line pitch shifter.
//!
//! Shifts pitch without changing duration by reading a short delay line at a
//! different speed than it is written. A read pointer that moves towards the
//! write head plays faster (pitch up); one that falls behind plays slower
//! (pitch down).
//!
//! ```text
//!            window (100 ms)
//!   ├───────────────────────────┤
//!   write ◄── tap A ······ tap B      taps half a window apart
//!
//!   gain A = sin²(π·phase)   gain B = cos²(π·phase)   (A + B = 1)
//! ```
//!
//! Each tap eventually runs off the end of the window and wraps. The wrap is
//! a discontinuity, so the gains put each tap at zero exactly when it wraps
//! while the other tap is at full level.

use std::f32::consts::PI;

use crate::dsp::delay::DelayLine;

pub struct PitchShifter {
    line: DelayLine,
    window_samples: f32,
    phase: f32,
    ratio: f32,
}

impl PitchShifter {
    /// Window length used by the instrument.
    pub const DEFAULT_WINDOW: f32 = 0.1;

    pub fn new(sample_rate: f32, window_seconds: f32) -> Self {
        let window_samples = (window_seconds * sample_rate).max(2.0);
        Self {
            line: DelayLine::new(window_samples.ceil() as usize + 1),
            window_samples,
            phase: 0.0,
            ratio: 1.0,
        }
    }

    /// Shift in semitones (-12..12 for the instrument, any value works).
    pub fn set_semitones(&mut self, semitones: f32) {
        self.ratio = 2.0f32.powf(semitones / 12.0);
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    #[inline]
    pub fn next_sample(&mut self, input: f32) -> f32 {
        self.line.write(input);

        let phase_b = (self.phase + 0.5) % 1.0;
        let tap_a = self.line.read(self.phase * self.window_samples);
        let tap_b = self.line.read(phase_b * self.window_samples);

        let gain_a = (PI * self.phase).sin().powi(2);
        let gain_b = 1.0 - gain_a;

        self.phase = (self.phase + (1.0 - self.ratio) / self.window_samples).rem_euclid(1.0);

        tap_a * gain_a + tap_b * gain_b
    }

    pub fn reset(&mut self) {
        self.line.reset();
        self.phase = 0.0;
    }
}
