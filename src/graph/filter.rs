use crate::{
    dsp::{
        filter::LowPass24,
        smooth::{AudioParam, RampCurve},
    },
    graph::node::{GraphNode, NodeKind, Ports, RenderCtx},
};

/*
VCF
===

24 dB/octave lowpass (two cascaded SVF stages, see `dsp::filter`). The
Cutoff port carries the envelope and LFO contributions, already scaled by
their amounts; they are added to the knob position every sample:

    cutoff(t) = knob(t) + env(t) * amount * 5000 + lfo(t) * depth * 5000

The sum is clamped to 20 Hz - 20 kHz. Resonance is a Q from 0 (no peak) to
10 (close to self-oscillation).
*/

const MIN_CUTOFF: f32 = 20.0;
const MAX_CUTOFF: f32 = 20_000.0;

pub struct FilterNode {
    filter: LowPass24,
    cutoff: AudioParam,
    resonance: AudioParam,
    last_cutoff: f32,
}

impl FilterNode {
    pub fn lowpass(cutoff_hz: f32) -> Self {
        FilterNode {
            filter: LowPass24::new(),
            cutoff: AudioParam::new(cutoff_hz, MIN_CUTOFF, MAX_CUTOFF),
            resonance: AudioParam::new(1.0, 0.0, 10.0),
            last_cutoff: cutoff_hz,
        }
    }

    /// Knob position (before modulation).
    pub fn cutoff(&self) -> f32 {
        self.cutoff.value()
    }

    pub fn cutoff_target(&self) -> f32 {
        self.cutoff.target()
    }

    /// Cutoff actually used for the last sample, modulation included.
    pub fn effective_cutoff(&self) -> f32 {
        self.last_cutoff
    }

    pub fn resonance(&self) -> f32 {
        self.resonance.value()
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff.set(cutoff);
    }

    pub fn ramp_cutoff(&mut self, cutoff: f32, samples: u32) {
        self.cutoff.ramp_to(cutoff, samples, RampCurve::Exponential);
    }

    pub fn set_resonance(&mut self, q: f32) {
        self.resonance.set(q);
    }

    pub fn ramp_resonance(&mut self, q: f32, samples: u32) {
        self.resonance.ramp_to(q, samples, RampCurve::Linear);
    }
}

impl GraphNode for FilterNode {
    const KIND: NodeKind = NodeKind::Filter;

    #[inline]
    fn process(&mut self, ports: Ports, ctx: &RenderCtx) -> f32 {
        let cutoff = (self.cutoff.next_value() + ports.cutoff).clamp(MIN_CUTOFF, MAX_CUTOFF);
        let q = self.resonance.next_value();
        self.last_cutoff = cutoff;
        self.filter.next_sample(ports.input, cutoff, q, ctx.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulation_adds_to_knob_and_clamps() {
        let ctx = RenderCtx::new(48_000.0);
        let mut filter = FilterNode::lowpass(1_000.0);

        let ports = Ports {
            cutoff: 2_500.0,
            ..Ports::default()
        };
        filter.process(ports, &ctx);
        assert_eq!(filter.effective_cutoff(), 3_500.0);

        let ports = Ports {
            cutoff: -50_000.0,
            ..Ports::default()
        };
        filter.process(ports, &ctx);
        assert_eq!(filter.effective_cutoff(), MIN_CUTOFF);
        assert_eq!(filter.cutoff(), 1_000.0, "knob is untouched by modulation");
    }

    #[test]
    fn cutoff_ramp_is_exponential() {
        let ctx = RenderCtx::new(48_000.0);
        let mut filter = FilterNode::lowpass(100.0);
        filter.ramp_cutoff(10_000.0, 100);
        for _ in 0..50 {
            filter.process(Ports::default(), &ctx);
        }
        assert!((filter.cutoff() - 1_000.0).abs() < 1.0, "got {}", filter.cutoff());
    }
}
