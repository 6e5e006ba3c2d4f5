//! Low-level DSP primitives used by the graph nodes.
//!
//! These components allocate only at construction and are realtime-safe
//! afterwards. They stay focused on the signal-processing math; parameter
//! smoothing, wiring and lifecycle live in [`crate::graph`].

/// Time-domain delay line with fractional reads.
pub mod delay;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// State-variable filter stages and the 24 dB lowpass cascade.
pub mod filter;
/// Band-limited oscillator waveforms and white noise.
pub mod oscillator;
/// Two-tap delay-line pitch shifter.
pub mod pitch_shift;
/// Schroeder reverb (parallel combs into series allpasses).
pub mod reverb;
/// Ramped parameter values.
pub mod smooth;

pub use envelope::EnvelopeState;
pub use smooth::{AudioParam, RampCurve};

/// Convert decibels to linear amplitude.
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels (silence maps to -inf).
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decibel_conversions_agree() {
        assert!((db_to_gain(-6.0) - 0.501).abs() < 1e-3);
        assert!((gain_to_db(db_to_gain(-12.0)) + 12.0).abs() < 1e-4);
        assert_eq!(db_to_gain(0.0), 1.0);
    }
}
