use crate::{
    dsp::{
        oscillator::{OscillatorBlock, OscillatorWaveform},
        smooth::{AudioParam, RampCurve},
    },
    graph::node::{GraphNode, NodeKind, Ports, RenderCtx, Source},
};

/*
LFO (Low Frequency Oscillator)
==============================

An LFO is an oscillator that runs at sub-audio frequencies to modulate
parameters over time. Its output is bipolar (-1.0 to +1.0) and never reaches
the speakers directly; it goes through the modulation scalers:

    LFO ──┬──→ [VCO mod scaler, depth × 50 Hz]   ──→ voice frequency (vibrato)
          └──→ [VCF mod scaler, depth × 5000 Hz] ──→ filter cutoff   (wah)

One LFO, two destinations, independent depths. That is the fan-out the
patchbay allows: one source, many edges.

Typical Rates
-------------

    0.1 - 0.5 Hz    Slow sweeps, gradual filter movement
    0.5 - 2 Hz      Classic tremolo, auto-pan
    2 - 7 Hz        Vibrato sweet spot
    7 - 20 Hz       Fast warble, approaching audio rate

Rate changes ramp exponentially (they are frequencies). Waveform changes
apply in place: the phase carries on, so switching shape never restarts the
cycle.
*/

pub struct LfoNode {
    osc: OscillatorBlock,
    rate: AudioParam,
    running: bool,
}

impl LfoNode {
    pub fn new(waveform: OscillatorWaveform, rate: f32) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            rate: AudioParam::new(rate, 0.01, 100.0),
            running: false,
        }
    }

    pub fn sine(rate: f32) -> Self {
        Self::new(OscillatorWaveform::Sine, rate)
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.osc.waveform()
    }

    pub fn set_waveform(&mut self, waveform: OscillatorWaveform) {
        self.osc.set_waveform(waveform);
    }

    pub fn rate(&self) -> f32 {
        self.rate.value()
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate.set(rate);
    }

    pub fn ramp_rate(&mut self, rate: f32, samples: u32) {
        self.rate.ramp_to(rate, samples, RampCurve::Exponential);
    }
}

impl GraphNode for LfoNode {
    const KIND: NodeKind = NodeKind::Lfo;

    #[inline]
    fn process(&mut self, _ports: Ports, ctx: &RenderCtx) -> f32 {
        let rate = self.rate.next_value();
        if !self.running {
            return 0.0;
        }
        self.osc.next_sample(rate, 0.5, ctx.sample_rate)
    }
}

impl Source for LfoNode {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
