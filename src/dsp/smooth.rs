//! Smoothed, automatable parameter values.

/*
Parameter Smoothing
===================

Changing a parameter instantly (cutoff 500 Hz -> 5 kHz in one sample) puts a
step into the signal. Steps are broadband, so you hear a click, and a slider
dragged quickly becomes a burst of clicks: "zippering".

The fix is to never jump. Every audible parameter lives in an AudioParam, and
writes schedule a short ramp from wherever the value is right now to the new
target.

Vocabulary
----------

  value       The parameter's current output. Read once per sample.

  target      Where the active ramp is heading (or the value, if idle).

  ramp        A segment: start value, target, curve, length in samples.
              Only ONE ramp is ever active. A new write cancels the rest of
              the old ramp and starts again from the current value.

  curve       Linear: equal steps per sample. Right for gains and times.
              Exponential: equal RATIOS per sample. Right for frequencies,
              because pitch is perceived logarithmically.


Why Cancel-And-Restart?
-----------------------

Many writes can land at the same audio time (a UI drag delivers dozens per
block). Since no samples elapse between them, every restart begins from the
same value, so the net effect is ONE ramp to the last target:

    write 1000 Hz ─┐
    write 1100 Hz ─┤  same sample  ─→  one ramp: current → 1200 Hz
    write 1200 Hz ─┘

Writes that arrive later restart from the interpolated value mid-ramp, so the
trajectory stays continuous.


Exponential Ramps
-----------------

    value(t) = start * (target / start) ^ (t / total)

Undefined when start or target is <= 0 or they differ in sign. Those ramps
fall back to linear.
*/

/// Shape of a parameter ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampCurve {
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy)]
struct Ramp {
    start: f32,
    target: f32,
    curve: RampCurve,
    total: u32,
    elapsed: u32,
}

impl Ramp {
    fn value_at(&self, elapsed: u32) -> f32 {
        let t = elapsed as f32 / self.total as f32;
        match self.curve {
            RampCurve::Linear => self.start + (self.target - self.start) * t,
            RampCurve::Exponential => self.start * (self.target / self.start).powf(t),
        }
    }
}

/// A parameter value with click-free automation.
#[derive(Debug, Clone)]
pub struct AudioParam {
    value: f32,
    min: f32,
    max: f32,
    ramp: Option<Ramp>,
}

impl AudioParam {
    pub fn new(value: f32, min: f32, max: f32) -> Self {
        Self {
            value: value.clamp(min, max),
            min,
            max,
            ramp: None,
        }
    }

    /// Current value (the value the next rendered sample starts from).
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Value the parameter is heading towards.
    pub fn target(&self) -> f32 {
        self.ramp.map_or(self.value, |r| r.target)
    }

    pub fn is_ramping(&self) -> bool {
        self.ramp.is_some()
    }

    /// Jump to a value immediately, cancelling any ramp.
    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(self.min, self.max);
        self.ramp = None;
    }

    /// Ramp from the current value to `target` over `samples` samples.
    ///
    /// Cancels whatever ramp was active. Zero-length ramps jump.
    pub fn ramp_to(&mut self, target: f32, samples: u32, curve: RampCurve) {
        let target = target.clamp(self.min, self.max);

        if samples == 0 || target == self.value {
            self.set(target);
            return;
        }

        let curve = match curve {
            RampCurve::Exponential if self.value > 0.0 && target > 0.0 => curve,
            RampCurve::Exponential if self.value < 0.0 && target < 0.0 => curve,
            _ => RampCurve::Linear,
        };

        self.ramp = Some(Ramp {
            start: self.value,
            target,
            curve,
            total: samples,
            elapsed: 0,
        });
    }

    /// Advance one sample and return the value for that sample.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if let Some(ramp) = self.ramp.as_mut() {
            ramp.elapsed += 1;
            if ramp.elapsed >= ramp.total {
                self.value = ramp.target;
                self.ramp = None;
            } else {
                self.value = ramp.value_at(ramp.elapsed);
            }
        }
        self.value
    }

    /// Skip ahead by `samples` without producing output.
    pub fn advance(&mut self, samples: u32) {
        if let Some(ramp) = self.ramp.as_mut() {
            ramp.elapsed = ramp.elapsed.saturating_add(samples);
            if ramp.elapsed >= ramp.total {
                self.value = ramp.target;
                self.ramp = None;
            } else {
                self.value = ramp.value_at(ramp.elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_to_range() {
        let mut p = AudioParam::new(0.5, 0.0, 1.0);
        p.set(3.0);
        assert_eq!(p.value(), 1.0);
        p.set(-1.0);
        assert_eq!(p.value(), 0.0);
    }

    #[test]
    fn linear_ramp_reaches_target_in_time() {
        let mut p = AudioParam::new(0.0, 0.0, 1.0);
        p.ramp_to(1.0, 100, RampCurve::Linear);

        for _ in 0..99 {
            p.next_value();
        }
        assert!(p.is_ramping());
        assert!((p.next_value() - 1.0).abs() < 1e-6);
        assert!(!p.is_ramping());
    }

    #[test]
    fn exponential_ramp_is_monotonic() {
        let mut p = AudioParam::new(100.0, 20.0, 20_000.0);
        p.ramp_to(10_000.0, 480, RampCurve::Exponential);

        let mut last = p.value();
        for _ in 0..480 {
            let v = p.next_value();
            assert!(v >= last, "exponential ramp went backwards: {} -> {}", last, v);
            last = v;
        }
        assert!((last - 10_000.0).abs() < 1e-2);
    }

    #[test]
    fn exponential_through_zero_falls_back_to_linear() {
        let mut p = AudioParam::new(0.0, 0.0, 1.0);
        p.ramp_to(1.0, 10, RampCurve::Exponential);
        let first = p.next_value();
        assert!((first - 0.1).abs() < 1e-6, "expected linear step, got {}", first);
    }

    #[test]
    fn writes_at_same_time_collapse_into_one_ramp() {
        let mut p = AudioParam::new(1000.0, 20.0, 20_000.0);
        for i in 0..100 {
            p.ramp_to(1000.0 + i as f32 * 100.0, 768, RampCurve::Linear);
        }

        assert_eq!(p.target(), 10_900.0);
        let step = p.next_value() - 1000.0;
        let expected = (10_900.0 - 1000.0) / 768.0;
        assert!((step - expected).abs() < 1e-2, "one ramp step expected, got {}", step);
    }

    #[test]
    fn retarget_mid_ramp_starts_from_current_value() {
        let mut p = AudioParam::new(0.0, 0.0, 1.0);
        p.ramp_to(1.0, 10, RampCurve::Linear);
        for _ in 0..5 {
            p.next_value();
        }
        let mid = p.value();
        p.ramp_to(0.0, 10, RampCurve::Linear);
        let next = p.next_value();
        assert!(next < mid && (mid - next) < 0.1, "jumped from {} to {}", mid, next);
    }
}
