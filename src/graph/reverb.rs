use crate::{
    dsp::{
        delay::DelayLine,
        reverb::SchroederReverb,
        smooth::{AudioParam, RampCurve},
    },
    graph::node::{GraphNode, NodeKind, Ports, RenderCtx},
};

/*
Reverb Node
===========

  input ──┬────────────────────────────────→ × (1 - mix) ──→ (+) → out
          └─→ pre-delay ─→ SchroederReverb ─→ × mix ────────↑

Pre-delay (0 - 0.5 s) and decay (RT60, 0.1 - 4 s) are settings, not
signals: a new value applies on the next sample. Mix is ramped.
*/

/// Longest pre-delay, in seconds.
pub const MAX_PREDELAY_SECONDS: f32 = 0.5;

/// Schroeder reverb with pre-delay and wet/dry mix.
pub struct ReverbNode {
    reverb: Box<SchroederReverb>,
    predelay_line: DelayLine,
    predelay: f32,
    mix: AudioParam,
}

impl ReverbNode {
    /// Create a reverb for the given sample rate.
    ///
    /// - `predelay`: seconds before the tail starts (0.0 - 0.5)
    /// - `decay`: RT60 in seconds
    /// - `mix`: 0.0 (dry) to 1.0 (wet)
    pub fn new(sample_rate: f32, predelay: f32, decay: f32, mix: f32) -> Self {
        let mut reverb = Box::new(SchroederReverb::new(sample_rate));
        reverb.set_decay(decay);
        reverb.set_damping(0.3);

        let capacity = (MAX_PREDELAY_SECONDS * sample_rate).ceil() as usize + 1;
        Self {
            reverb,
            predelay_line: DelayLine::new(capacity),
            predelay: predelay.clamp(0.0, MAX_PREDELAY_SECONDS),
            mix: AudioParam::new(mix, 0.0, 1.0),
        }
    }

    pub fn predelay(&self) -> f32 {
        self.predelay
    }

    pub fn set_predelay(&mut self, seconds: f32) {
        self.predelay = seconds.clamp(0.0, MAX_PREDELAY_SECONDS);
    }

    pub fn decay(&self) -> f32 {
        self.reverb.decay()
    }

    pub fn set_decay(&mut self, seconds: f32) {
        self.reverb.set_decay(seconds);
    }

    pub fn mix(&self) -> f32 {
        self.mix.value()
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix.set(mix);
    }

    pub fn ramp_mix(&mut self, mix: f32, samples: u32) {
        self.mix.ramp_to(mix, samples, RampCurve::Linear);
    }
}

impl GraphNode for ReverbNode {
    const KIND: NodeKind = NodeKind::Reverb;

    #[inline]
    fn process(&mut self, ports: Ports, ctx: &RenderCtx) -> f32 {
        let dry = ports.input;
        let mix = self.mix.next_value();

        let delayed = self
            .predelay_line
            .next_sample(dry, self.predelay * ctx.sample_rate);
        let wet = self.reverb.process(delayed);

        dry * (1.0 - mix) + wet * mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn feed(reverb: &mut ReverbNode, input: f32) -> f32 {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        reverb.process(
            Ports {
                input,
                ..Ports::default()
            },
            &ctx,
        )
    }

    #[test]
    fn test_reverb_adds_tail() {
        let mut reverb = ReverbNode::new(SAMPLE_RATE, 0.0, 1.5, 1.0);

        feed(&mut reverb, 1.0);
        let tail_energy: f32 = (0..6_400).map(|_| feed(&mut reverb, 0.0).powi(2)).sum();

        assert!(tail_energy > 0.01, "Reverb should produce a tail");
    }

    #[test]
    fn test_dry_reverb_preserves_signal() {
        let mut reverb = ReverbNode::new(SAMPLE_RATE, 0.1, 1.5, 0.0);

        for input in [0.5, 0.3, 0.7] {
            let out = feed(&mut reverb, input);
            assert!((out - input).abs() < 1e-6, "Dry reverb should preserve signal");
        }
    }

    #[test]
    fn test_predelay_holds_back_tail() {
        let mut reverb = ReverbNode::new(SAMPLE_RATE, 0.2, 1.5, 1.0);

        feed(&mut reverb, 1.0);
        // 200 ms pre-delay + shortest comb (29.7 ms) before anything comes out.
        let early: f32 = (0..9_000).map(|_| feed(&mut reverb, 0.0).abs()).sum();
        assert!(early < 1e-6, "tail started before the pre-delay: {early}");
    }
}
