//! Instrument parameters: identities, ranges, units and clamped storage.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::dsp::oscillator::OscillatorWaveform;
use crate::error::EngineError;

/// Sub-oscillator and noise exist only while their level is above this.
pub const AUDIBLE_FLOOR_DB: f32 = -60.0;

/// Every continuous parameter of the instrument.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    PulseWidth,
    MainLevel,
    SubLevel,
    NoiseLevel,
    FilterCutoff,
    FilterResonance,
    FilterEnvAmount,
    Attack,
    Decay,
    Sustain,
    Release,
    LfoRate,
    VcoModAmount,
    VcfModAmount,
    DelayTime,
    DelayFeedback,
    DelayMix,
    PitchShift,
    ReverbPreDelay,
    ReverbDecay,
    ReverbMix,
    MasterVolume,
    Portamento,
    Transpose,
}

/// Unit a parameter is expressed in.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Ratio,
    Decibels,
    Hertz,
    Q,
    Seconds,
    Semitones,
}

/// Declared range and default of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub unit: Unit,
}

impl ParamSpec {
    const fn new(min: f32, max: f32, default: f32, unit: Unit) -> Self {
        Self {
            min,
            max,
            default,
            unit,
        }
    }

    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Position of `value` within the range, 0.0 - 1.0.
    pub fn normalize(&self, value: f32) -> f32 {
        (self.clamp(value) - self.min) / (self.max - self.min)
    }

    /// Human readable value, e.g. "1.20 kHz", "350 ms", "30%".
    pub fn format(&self, value: f32) -> String {
        match self.unit {
            Unit::Ratio => format!("{:.0}%", value * 100.0),
            Unit::Decibels if value <= AUDIBLE_FLOOR_DB => "off".to_string(),
            Unit::Decibels => format!("{value:.1} dB"),
            Unit::Hertz if value >= 1_000.0 => format!("{:.2} kHz", value / 1_000.0),
            Unit::Hertz => format!("{value:.1} Hz"),
            Unit::Q => format!("Q {value:.2}"),
            Unit::Seconds if value < 1.0 => format!("{:.0} ms", value * 1_000.0),
            Unit::Seconds => format!("{value:.2} s"),
            Unit::Semitones => format!("{value:+.0} st"),
        }
    }
}

impl ParamId {
    pub const ALL: [ParamId; 24] = [
        ParamId::PulseWidth,
        ParamId::MainLevel,
        ParamId::SubLevel,
        ParamId::NoiseLevel,
        ParamId::FilterCutoff,
        ParamId::FilterResonance,
        ParamId::FilterEnvAmount,
        ParamId::Attack,
        ParamId::Decay,
        ParamId::Sustain,
        ParamId::Release,
        ParamId::LfoRate,
        ParamId::VcoModAmount,
        ParamId::VcfModAmount,
        ParamId::DelayTime,
        ParamId::DelayFeedback,
        ParamId::DelayMix,
        ParamId::PitchShift,
        ParamId::ReverbPreDelay,
        ParamId::ReverbDecay,
        ParamId::ReverbMix,
        ParamId::MasterVolume,
        ParamId::Portamento,
        ParamId::Transpose,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamId::PulseWidth => "pulse_width",
            ParamId::MainLevel => "main_level",
            ParamId::SubLevel => "sub_level",
            ParamId::NoiseLevel => "noise_level",
            ParamId::FilterCutoff => "filter_cutoff",
            ParamId::FilterResonance => "filter_resonance",
            ParamId::FilterEnvAmount => "filter_env_amount",
            ParamId::Attack => "attack",
            ParamId::Decay => "decay",
            ParamId::Sustain => "sustain",
            ParamId::Release => "release",
            ParamId::LfoRate => "lfo_rate",
            ParamId::VcoModAmount => "vco_mod",
            ParamId::VcfModAmount => "vcf_mod",
            ParamId::DelayTime => "delay_time",
            ParamId::DelayFeedback => "delay_feedback",
            ParamId::DelayMix => "delay_mix",
            ParamId::PitchShift => "pitch_shift",
            ParamId::ReverbPreDelay => "reverb_predelay",
            ParamId::ReverbDecay => "reverb_decay",
            ParamId::ReverbMix => "reverb_mix",
            ParamId::MasterVolume => "master_volume",
            ParamId::Portamento => "portamento",
            ParamId::Transpose => "transpose",
        }
    }

    pub fn spec(self) -> ParamSpec {
        use Unit::*;
        match self {
            ParamId::PulseWidth => ParamSpec::new(0.0, 1.0, 0.5, Ratio),
            ParamId::MainLevel => ParamSpec::new(0.0, 1.0, 1.0, Ratio),
            ParamId::SubLevel => ParamSpec::new(-60.0, -12.0, -60.0, Decibels),
            ParamId::NoiseLevel => ParamSpec::new(-60.0, -12.0, -60.0, Decibels),
            ParamId::FilterCutoff => ParamSpec::new(20.0, 20_000.0, 20_000.0, Hertz),
            ParamId::FilterResonance => ParamSpec::new(0.0, 10.0, 1.0, Q),
            ParamId::FilterEnvAmount => ParamSpec::new(0.0, 1.0, 0.0, Ratio),
            ParamId::Attack => ParamSpec::new(0.0, 2.0, 0.1, Seconds),
            ParamId::Decay => ParamSpec::new(0.0, 2.0, 0.1, Seconds),
            ParamId::Sustain => ParamSpec::new(0.0, 1.0, 0.7, Ratio),
            ParamId::Release => ParamSpec::new(0.0, 2.0, 0.1, Seconds),
            ParamId::LfoRate => ParamSpec::new(0.1, 20.0, 5.0, Hertz),
            ParamId::VcoModAmount => ParamSpec::new(0.0, 1.0, 0.0, Ratio),
            ParamId::VcfModAmount => ParamSpec::new(0.0, 1.0, 0.0, Ratio),
            ParamId::DelayTime => ParamSpec::new(0.05, 1.0, 0.3, Seconds),
            ParamId::DelayFeedback => ParamSpec::new(0.0, 0.9, 0.3, Ratio),
            ParamId::DelayMix => ParamSpec::new(0.0, 1.0, 0.3, Ratio),
            ParamId::PitchShift => ParamSpec::new(-12.0, 12.0, 0.0, Semitones),
            ParamId::ReverbPreDelay => ParamSpec::new(0.0, 0.5, 0.1, Seconds),
            ParamId::ReverbDecay => ParamSpec::new(0.1, 4.0, 1.5, Seconds),
            ParamId::ReverbMix => ParamSpec::new(0.0, 1.0, 0.3, Ratio),
            ParamId::MasterVolume => ParamSpec::new(0.0, 1.0, 0.6, Ratio),
            ParamId::Portamento => ParamSpec::new(0.0, 1.0, 0.0, Seconds),
            ParamId::Transpose => ParamSpec::new(-24.0, 24.0, 0.0, Semitones),
        }
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| EngineError::UnknownParam(s.to_string()))
    }
}

/// Main oscillator waveform. Changing it rebuilds the graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sawtooth,
    Square,
    Pulse,
}

impl Waveform {
    pub const ALL: [Waveform; 3] = [Waveform::Sawtooth, Waveform::Square, Waveform::Pulse];

    pub fn oscillator(self) -> OscillatorWaveform {
        match self {
            Waveform::Sawtooth => OscillatorWaveform::Sawtooth,
            Waveform::Square => OscillatorWaveform::Square,
            Waveform::Pulse => OscillatorWaveform::Pulse,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Waveform::Sawtooth => Waveform::Square,
            Waveform::Square => Waveform::Pulse,
            Waveform::Pulse => Waveform::Sawtooth,
        }
    }
}

/// LFO waveform. Changes apply in place without a rebuild.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoWaveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl LfoWaveform {
    pub const ALL: [LfoWaveform; 4] = [
        LfoWaveform::Sine,
        LfoWaveform::Square,
        LfoWaveform::Sawtooth,
        LfoWaveform::Triangle,
    ];

    pub fn oscillator(self) -> OscillatorWaveform {
        match self {
            LfoWaveform::Sine => OscillatorWaveform::Sine,
            LfoWaveform::Square => OscillatorWaveform::Square,
            LfoWaveform::Sawtooth => OscillatorWaveform::Sawtooth,
            LfoWaveform::Triangle => OscillatorWaveform::Triangle,
        }
    }

    pub fn next(self) -> Self {
        match self {
            LfoWaveform::Sine => LfoWaveform::Square,
            LfoWaveform::Square => LfoWaveform::Sawtooth,
            LfoWaveform::Sawtooth => LfoWaveform::Triangle,
            LfoWaveform::Triangle => LfoWaveform::Sine,
        }
    }
}

/// Complete, always-in-range instrument settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    values: [f32; 24],
    pub waveform: Waveform,
    pub lfo_waveform: LfoWaveform,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            values: ParamId::ALL.map(|id| id.spec().default),
            waveform: Waveform::default(),
            lfo_waveform: LfoWaveform::default(),
        }
    }
}

impl Parameters {
    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()]
    }

    /// Store `value` clamped to the declared range and return what was stored.
    ///
    /// NaN is ignored and leaves the current value in place.
    pub fn set(&mut self, id: ParamId, value: f32) -> f32 {
        if value.is_nan() {
            trace!(param = %id, "ignoring NaN parameter write");
            return self.get(id);
        }

        let clamped = id.spec().clamp(value);
        if clamped != value {
            trace!(param = %id, requested = value, clamped, "parameter clamped");
        }
        self.values[id.index()] = clamped;
        clamped
    }

    /// Formatted current value of `id`.
    pub fn display(&self, id: ParamId) -> String {
        id.spec().format(self.get(id))
    }

    pub fn has_sub_oscillator(&self) -> bool {
        self.get(ParamId::SubLevel) > AUDIBLE_FLOOR_DB
    }

    pub fn has_noise(&self) -> bool {
        self.get(ParamId::NoiseLevel) > AUDIBLE_FLOOR_DB
    }

    pub fn has_pitch_shift(&self) -> bool {
        self.get(ParamId::PitchShift) != 0.0
    }
}

/// Map a 0..1 slider position to 20 Hz .. 20 kHz logarithmically.
pub fn slider_to_freq(position: f32) -> f32 {
    10f32.powf(3.0 * position + 1.3)
}

/// Inverse of [`slider_to_freq`].
pub fn freq_to_slider(frequency: f32) -> f32 {
    (frequency.log10() - 1.3) / 3.0
}
