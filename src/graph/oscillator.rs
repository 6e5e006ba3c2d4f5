use crate::{
    dsp::{
        envelope::Envelope,
        oscillator::{NoiseBlock, OscillatorBlock, OscillatorWaveform},
        smooth::{AudioParam, RampCurve},
    },
    graph::node::{GraphNode, NodeKind, Ports, RenderCtx, Source},
};

/*
Sound Sources
=============

Three nodes make sound on their own:

  VoiceNode     The main oscillator with its amplitude envelope built in.
                Sawtooth is bright and buzzy (every harmonic, falling as 1/n),
                square is hollow (odd harmonics only), and pulse thins out as
                the width moves away from 50%.

  SubOscNode    A square wave one octave below the voice. It adds weight
                under the main oscillator without changing the perceived
                pitch.

  NoiseNode     White noise, every frequency at equal energy. Mixed in for
                breath, hiss and percussive attacks.

Frequency Inputs
----------------

The voice frequency is a ramped parameter plus whatever arrives on its
Frequency port (the LFO through the VCO mod scaler):

    f(t) = frequency_param(t) + lfo(t) * vco_depth

Portamento is just a longer exponential ramp on that parameter, so a glide
from C3 to C4 moves at a constant rate in octaves per second.
*/

const MIN_FREQUENCY: f32 = 0.1;
const MAX_FREQUENCY: f32 = 24_000.0;

/// Main voice: oscillator into an amplitude envelope.
pub struct VoiceNode {
    osc: OscillatorBlock,
    envelope: Envelope,
    frequency: AudioParam,
    pulse_width: AudioParam,
    velocity: f32,
    volume: f32,
    running: bool,
    /// False until the first note; there is nothing to glide from before it.
    pitched: bool,
}

impl VoiceNode {
    pub fn new(waveform: OscillatorWaveform, volume: f32) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            envelope: Envelope::new(),
            frequency: AudioParam::new(440.0, MIN_FREQUENCY, MAX_FREQUENCY),
            pulse_width: AudioParam::new(0.5, 0.0, 1.0),
            velocity: 1.0,
            volume,
            running: false,
            pitched: false,
        }
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.osc.waveform()
    }

    /// Gate on at `frequency`, gliding there over `glide` samples.
    ///
    /// The first note after construction jumps. Returns the glide actually
    /// used.
    pub fn trigger_attack(
        &mut self,
        frequency: f32,
        velocity: f32,
        glide: u32,
        ctx: &RenderCtx,
    ) -> u32 {
        let glide = if self.pitched { glide } else { 0 };
        self.pitched = true;
        self.frequency.ramp_to(frequency, glide, RampCurve::Exponential);
        self.velocity = velocity.clamp(0.0, 1.0);
        self.envelope.note_on(ctx);
        glide
    }

    pub fn trigger_release(&mut self, ctx: &RenderCtx) {
        self.envelope.note_off(ctx);
    }

    /// True once the amplitude envelope has finished its release.
    pub fn is_silent(&self) -> bool {
        !self.envelope.is_active()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }

    pub fn frequency(&self) -> f32 {
        self.frequency.value()
    }

    pub fn ramp_pulse_width(&mut self, width: f32, samples: u32) {
        self.pulse_width.ramp_to(width, samples, RampCurve::Linear);
    }

    pub fn pulse_width(&self) -> f32 {
        self.pulse_width.value()
    }
}

impl GraphNode for VoiceNode {
    const KIND: NodeKind = NodeKind::Voice;

    #[inline]
    fn process(&mut self, ports: Ports, ctx: &RenderCtx) -> f32 {
        let frequency = (self.frequency.next_value() + ports.frequency).max(0.0);
        let width = self.pulse_width.next_value();
        self.envelope.next_sample(ctx);

        if !self.running {
            return 0.0;
        }

        let sample = self.osc.next_sample(frequency, width, ctx.sample_rate);
        sample * self.envelope.level() * self.velocity * self.volume
    }
}

impl Source for VoiceNode {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        self.envelope.reset();
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// Square wave sub-oscillator with its own output volume.
pub struct SubOscNode {
    osc: OscillatorBlock,
    frequency: AudioParam,
    volume: AudioParam,
    running: bool,
}

impl SubOscNode {
    pub fn new(volume: f32) -> Self {
        Self {
            osc: OscillatorBlock::new(OscillatorWaveform::Square),
            frequency: AudioParam::new(220.0, MIN_FREQUENCY, MAX_FREQUENCY),
            volume: AudioParam::new(volume, 0.0, 1.0),
            running: false,
        }
    }

    /// Follow the voice: same glide, one octave below.
    pub fn track(&mut self, voice_frequency: f32, glide: u32) {
        self.frequency
            .ramp_to(voice_frequency / 2.0, glide, RampCurve::Exponential);
    }

    pub fn frequency(&self) -> f32 {
        self.frequency.value()
    }

    pub fn volume(&self) -> f32 {
        self.volume.value()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume.set(volume);
    }

    pub fn ramp_volume(&mut self, volume: f32, samples: u32) {
        self.volume.ramp_to(volume, samples, RampCurve::Linear);
    }
}

impl GraphNode for SubOscNode {
    const KIND: NodeKind = NodeKind::Oscillator;

    #[inline]
    fn process(&mut self, _ports: Ports, ctx: &RenderCtx) -> f32 {
        let frequency = self.frequency.next_value();
        let volume = self.volume.next_value();
        if !self.running {
            return 0.0;
        }
        self.osc.next_sample(frequency, 0.5, ctx.sample_rate) * volume
    }
}

impl Source for SubOscNode {
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

/// White noise source with its own output volume.
pub struct NoiseNode {
    noise: NoiseBlock,
    volume: AudioParam,
    running: bool,
}

impl NoiseNode {
    pub fn new(seed: u64, volume: f32) -> Self {
        Self {
            noise: NoiseBlock::new(seed),
            volume: AudioParam::new(volume, 0.0, 1.0),
            running: false,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume.value()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume.set(volume);
    }

    pub fn ramp_volume(&mut self, volume: f32, samples: u32) {
        self.volume.ramp_to(volume, samples, RampCurve::Linear);
    }
}

impl GraphNode for NoiseNode {
    const KIND: NodeKind = NodeKind::Noise;

    #[inline]
    fn process(&mut self, _ports: Ports, _ctx: &RenderCtx) -> f32 {
        let volume = self.volume.next_value();
        if !self.running {
            return 0.0;
        }
        self.noise.next_sample() * volume
    }
}

impl Source for NoiseNode {
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
