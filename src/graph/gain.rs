use crate::{
    dsp::smooth::{AudioParam, RampCurve},
    graph::node::{GraphNode, NodeKind, Ports, RenderCtx},
};

/*
Gain Stages
===========

A gain node multiplies its input by a (ramped) factor. The instrument uses
them in two roles:

  level stages     voice -> main gain -> mixer, sub -> sub gain -> mixer ...
                   The factor is an amplitude (0.0 - 1.0ish).

  mod scalers      LFO -> scaler -> voice frequency
                   env -> scaler -> filter cutoff
                   The input is a unit control signal (-1..1 or 0..1) and the
                   factor is a depth in Hz, e.g. 0.5 * 5000 = 2500 Hz of
                   filter sweep.

Both are the same node; only what is wired to them differs.
*/

pub struct GainNode {
    gain: AudioParam,
}

impl GainNode {
    /// Upper bound for the factor. Large enough for modulation depths in Hz.
    const MAX_GAIN: f32 = 24_000.0;

    pub fn new(gain: f32) -> Self {
        Self {
            gain: AudioParam::new(gain, 0.0, Self::MAX_GAIN),
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain.value()
    }

    pub fn target(&self) -> f32 {
        self.gain.target()
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain.set(gain);
    }

    pub fn ramp_gain(&mut self, gain: f32, samples: u32) {
        self.gain.ramp_to(gain, samples, RampCurve::Linear);
    }
}

impl GraphNode for GainNode {
    const KIND: NodeKind = NodeKind::Gain;

    #[inline]
    fn process(&mut self, ports: Ports, _ctx: &RenderCtx) -> f32 {
        ports.input * self.gain.next_value()
    }
}
