use std::f32::consts::PI;

/*
Cascaded State-Variable Lowpass
===============================

The instrument filter is a 24 dB/octave lowpass: two 12 dB/octave TPT
state-variable stages in series.

    input ──→ [SVF stage 1, k = √2] ──→ [SVF stage 2, k = 1/Q] ──→ output
               (flat, Butterworth)        (carries the resonance)

Only the second stage resonates. Putting resonance in both stages squares the
peak, and at Q = 10 that is a 40 dB spike instead of a 20 dB one.

| slope      | stages | rolloff one octave above cutoff |
| ---------- | ------ | ------------------------------- |
| 12 dB/oct  | 1      | about 1/4 amplitude             |
| 24 dB/oct  | 2      | about 1/16 amplitude            |

The TPT ("topology-preserving transform") form keeps the filter stable when
the cutoff moves every sample, which it does here: envelope and LFO both
modulate it at audio rate.
*/

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
}

/// Prewarped integrator gain for a cutoff at the given sample rate.
#[inline]
pub fn compute_g(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let cutoff = cutoff_hz.clamp(10.0, sample_rate * 0.45);
    (PI * cutoff / sample_rate).tan()
}

/// One 12 dB/octave TPT state-variable stage.
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory
}

impl SVFilter {
    pub fn new() -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
        }
    }

    /// Process one sample with damping `k` (2 = no peak, smaller = sharper).
    #[inline]
    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

impl Default for SVFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Two SVF stages in series: a 24 dB/octave resonant lowpass.
pub struct LowPass24 {
    stages: [SVFilter; 2],
}

impl LowPass24 {
    const FLAT_K: f32 = std::f32::consts::SQRT_2;

    pub fn new() -> Self {
        Self {
            stages: [SVFilter::new(), SVFilter::new()],
        }
    }

    /// Filter one sample. `q` is the resonance of the second stage.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, cutoff_hz: f32, q: f32, sample_rate: f32) -> f32 {
        let g = compute_g(cutoff_hz, sample_rate);
        let k = 1.0 / q.max(0.1);

        let first = self.stages[0].next_sample(sample, Self::FLAT_K, g).lowpass;
        self.stages[1].next_sample(first, k, g).lowpass
    }

    pub fn render(&mut self, buffer: &mut [f32], cutoff_hz: f32, q: f32, sample_rate: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, cutoff_hz, q, sample_rate);
        }
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}

impl Default for LowPass24 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::{OscillatorBlock, OscillatorWaveform};

    const SAMPLE_RATE: f32 = 48_000.0;

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(256);
        buffer
            .get(skip..)
            .unwrap_or(buffer)
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    fn filtered_sine(freq: f32, cutoff: f32, q: f32) -> f32 {
        let mut osc = OscillatorBlock::new(OscillatorWaveform::Sine);
        let mut filter = LowPass24::new();
        let mut buffer = vec![0.0f32; 2048];
        osc.render(&mut buffer, freq, SAMPLE_RATE);
        filter.render(&mut buffer, cutoff, q, SAMPLE_RATE);
        peak_after_transient(&buffer)
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = LowPass24::new();
        let mut buffer = vec![1.0; 512];
        filter.render(&mut buffer, 500.0, 0.707, SAMPLE_RATE);

        assert!(buffer[511] > 0.99, "DC should pass, got {}", buffer[511]);
    }

    #[test]
    fn test_stage_highpass_rejects_dc() {
        let mut stage = SVFilter::new();
        let g = compute_g(500.0, SAMPLE_RATE);
        let mut last = 1.0;
        for _ in 0..512 {
            last = stage.next_sample(1.0, 2.0, g).highpass;
        }
        assert!(last.abs() < 0.001);
    }

    #[test]
    fn test_rolloff_is_steeper_than_one_stage() {
        // Two octaves above cutoff: 12 dB/oct gives ~1/16, 24 dB/oct ~1/256.
        let peak = filtered_sine(4_000.0, 1_000.0, 0.707);
        assert!(peak < 0.02, "expected 24 dB/oct attenuation, got peak: {}", peak);
    }

    #[test]
    fn test_cutoff_affects_filtering() {
        let closed = filtered_sine(1_000.0, 200.0, 0.707);
        let open = filtered_sine(1_000.0, 5_000.0, 0.707);

        assert!(
            open > closed * 2.0,
            "open filter should pass more signal: open={}, closed={}",
            open,
            closed
        );
    }

    #[test]
    fn test_resonance_affects_peak() {
        let low_res = filtered_sine(1_000.0, 1_000.0, 0.5);
        let high_res = filtered_sine(1_000.0, 1_000.0, 4.0);

        assert!(
            high_res > low_res * 1.5,
            "high resonance should boost signal: high_res={}, low_res={}",
            high_res,
            low_res
        );
    }

    #[test]
    fn test_extreme_cutoff_is_stable() {
        let mut filter = LowPass24::new();
        for i in 0..10_000 {
            let cutoff = if i % 2 == 0 { 20.0 } else { 40_000.0 };
            let out = filter.next_sample(1.0, cutoff, 10.0, SAMPLE_RATE);
            assert!(out.is_finite(), "filter blew up at sample {i}");
        }
    }
}
