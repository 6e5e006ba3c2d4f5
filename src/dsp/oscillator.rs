use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Band-Limited Oscillators
========================

A naive sawtooth jumps from +1 to -1 in a single sample. That jump contains
energy far above Nyquist, which folds back down as inharmonic "aliasing"
(a metallic whine that moves the wrong way when you bend the pitch).

PolyBLEP
--------

PolyBLEP ("polynomial band-limited step") smooths each discontinuity by
subtracting a tiny two-sample polynomial correction centred on the jump:

     naive saw          correction          polyblep saw
    ╱│  ╱│  ╱          ╷   ╷               ╱╲  ╱╲  ╱
   ╱ │ ╱ │ ╱      -    ╵   ╵         =    ╱  ╲╱  ╲╱
  ╱  │╱  │╱

The correction only touches the samples within one phase increment of the
edge, so it costs a couple of multiplies per sample.

  saw     one falling edge per cycle (at phase 0)
  square  two edges: rising at 0, falling at 0.5
  pulse   like square, falling edge at the pulse width

Sine and triangle have no steps and are rendered directly.
*/

/// Oscillator waveforms available to graph nodes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    Sawtooth,
    Square,
    Pulse,
    Triangle,
}

/// Two-sample polynomial correction around a step at phase 0.
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if t < dt {
        let t = t / dt;
        t + t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

/// Phase-accumulator oscillator producing one sample at a time.
pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    pub fn set_waveform(&mut self, waveform: OscillatorWaveform) {
        self.waveform = waveform;
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Render the next sample at `frequency` Hz.
    ///
    /// `pulse_width` only affects [`OscillatorWaveform::Pulse`]. It is kept
    /// away from 0 and 1 so the pulse never collapses into silence.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, pulse_width: f32, sample_rate: f32) -> f32 {
        let dt = (frequency / sample_rate).clamp(0.0, 0.5);
        let t = self.phase;

        let out = match self.waveform {
            OscillatorWaveform::Sine => (TAU * t).sin(),
            OscillatorWaveform::Sawtooth => (2.0 * t - 1.0) - poly_blep(t, dt),
            OscillatorWaveform::Square => pulse(t, 0.5, dt),
            OscillatorWaveform::Pulse => pulse(t, pulse_width.clamp(0.05, 0.95), dt),
            OscillatorWaveform::Triangle => 1.0 - 4.0 * (t - 0.5).abs(),
        };

        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        out
    }

    /// Fill `buffer` at a constant frequency.
    pub fn render(&mut self, buffer: &mut [f32], frequency: f32, sample_rate: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(frequency, 0.5, sample_rate);
        }
    }
}

#[inline]
fn pulse(t: f32, width: f32, dt: f32) -> f32 {
    let naive = if t < width { 1.0 } else { -1.0 };
    let falling = (t - width + 1.0) % 1.0;
    naive + poly_blep(t, dt) - poly_blep(falling, dt)
}

/// White noise from a seeded generator.
pub struct NoiseBlock {
    rng: fastrand::Rng,
}

impl NoiseBlock {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.rng.f32() * 2.0 - 1.0
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }
}
