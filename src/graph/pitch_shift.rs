use crate::{
    dsp::{
        pitch_shift::PitchShifter,
        smooth::{AudioParam, RampCurve},
    },
    graph::node::{GraphNode, NodeKind, Ports, RenderCtx},
};

/// Widest shift in either direction.
const MAX_SEMITONES: f32 = 12.0;

/// Pitch shifter in the effects chain (fully wet).
///
/// Only present while the shift is non-zero. The builder leaves it out
/// entirely at 0 semitones, so the untouched path adds no latency. Moving
/// between two non-zero shifts ramps the interval.
pub struct PitchShiftNode {
    shifter: PitchShifter,
    semitones: AudioParam,
    /// Interval the shifter currently reads at.
    applied: f32,
}

impl PitchShiftNode {
    pub fn new(sample_rate: f32, semitones: f32) -> Self {
        let semitones = AudioParam::new(semitones, -MAX_SEMITONES, MAX_SEMITONES);
        let mut shifter = PitchShifter::new(sample_rate, PitchShifter::DEFAULT_WINDOW);
        shifter.set_semitones(semitones.value());
        Self {
            shifter,
            applied: semitones.value(),
            semitones,
        }
    }

    pub fn semitones(&self) -> f32 {
        self.semitones.value()
    }

    pub fn semitones_target(&self) -> f32 {
        self.semitones.target()
    }

    pub fn set_semitones(&mut self, semitones: f32) {
        self.ramp_semitones(semitones, 0);
    }

    pub fn ramp_semitones(&mut self, semitones: f32, samples: u32) {
        self.semitones.ramp_to(semitones, samples, RampCurve::Linear);
        if samples == 0 {
            self.retune();
        }
    }

    #[inline]
    fn retune(&mut self) {
        let semitones = self.semitones.value();
        if semitones != self.applied {
            self.applied = semitones;
            self.shifter.set_semitones(semitones);
        }
    }
}

impl GraphNode for PitchShiftNode {
    const KIND: NodeKind = NodeKind::PitchShift;

    #[inline]
    fn process(&mut self, ports: Ports, _ctx: &RenderCtx) -> f32 {
        if self.semitones.is_ramping() {
            self.semitones.next_value();
            self.retune();
        }
        self.shifter.next_sample(ports.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn interval_changes_glide() {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        let mut node = PitchShiftNode::new(SAMPLE_RATE, 7.0);
        node.ramp_semitones(-5.0, 120);

        for _ in 0..60 {
            node.process(Ports::default(), &ctx);
        }
        let mid = node.semitones();
        assert!(mid < 7.0 && mid > -5.0, "mid-ramp interval {mid}");
        assert_eq!(node.semitones_target(), -5.0);

        for _ in 0..60 {
            node.process(Ports::default(), &ctx);
        }
        assert_eq!(node.semitones(), -5.0);
        assert!((node.shifter.ratio() - 2.0f32.powf(-5.0 / 12.0)).abs() < 1e-6);
    }

    #[test]
    fn set_applies_at_once() {
        let mut node = PitchShiftNode::new(SAMPLE_RATE, 3.0);
        node.set_semitones(12.0);
        assert!((node.shifter.ratio() - 2.0).abs() < 1e-6);
    }
}
