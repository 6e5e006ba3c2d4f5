use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    dsp::db_to_gain,
    graph::topology::SignalGraph,
    synth::params::{ParamId, Parameters, AUDIBLE_FLOOR_DB},
};

/*
Parameter Routing
=================

Every continuous parameter has one entry in a static dispatch table:

    ParamId ──→ Route { target, smoothing, scale }

  target      which node property the value ends up on
  smoothing   how the node gets there
                Linear       gains, ratios, times, sustain level, pitch
                             shift (ramp over the window)
                Exponential  frequencies (cutoff, LFO rate)
                Immediate    envelope times, reverb decay and pre-delay,
                             portamento, transpose
  scale       the mapping from the stored value to the node value

Scale rules
-----------

    main level        × 0.8
    sub level         dB → amplitude, clamped to -40 .. -12 dB first
    noise level       dB → amplitude
    filter env amt    × 5000 Hz
    vco mod           × 50 Hz
    vcf mod           × 5000 Hz
    sustain           × 0.8 on the amplitude envelope only

A few changes cannot be expressed as a ramp because a node appears or
disappears. Those return `RebuildRequired` and the engine rebuilds the graph:

    sub level / noise level   crossing the -60 dB floor
    pitch shift               0 ↔ non-zero
    oscillator waveform       any change

Ramps cancel and restart from the current value, so a burst of writes at
the same instant collapses into a single ramp toward the last one.
*/

/// Sub-oscillator level range actually applied to the node.
const SUB_LEVEL_RANGE_DB: (f32, f32) = (-40.0, -12.0);

pub const MAIN_LEVEL_SCALE: f32 = 0.8;
pub const AMP_SUSTAIN_SCALE: f32 = 0.8;
pub const FILTER_ENV_DEPTH_HZ: f32 = 5_000.0;
pub const VCO_MOD_DEPTH_HZ: f32 = 50.0;
pub const VCF_MOD_DEPTH_HZ: f32 = 5_000.0;

/// Node property a parameter lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    PulseWidth,
    MainGain,
    SubVolume,
    NoiseVolume,
    Cutoff,
    Resonance,
    FilterEnvDepth,
    Attack,
    Decay,
    Sustain,
    Release,
    LfoRate,
    VcoDepth,
    VcfDepth,
    DelayTime,
    DelayFeedback,
    DelayMix,
    PitchShift,
    ReverbPreDelay,
    ReverbDecay,
    ReverbMix,
    MasterGain,
    /// Read by the voice controller at note time.
    Portamento,
    /// Read by the voice controller at note time.
    Transpose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Smoothing {
    Linear,
    Exponential,
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    Identity,
    Factor(f32),
    DbToGain,
    ClampedDbToGain { min: f32, max: f32 },
}

impl Scale {
    #[inline]
    pub fn apply(self, value: f32) -> f32 {
        match self {
            Scale::Identity => value,
            Scale::Factor(factor) => value * factor,
            Scale::DbToGain => db_to_gain(value),
            Scale::ClampedDbToGain { min, max } => db_to_gain(value.clamp(min, max)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub param: ParamId,
    pub target: Target,
    pub smoothing: Smoothing,
    pub scale: Scale,
}

const fn route(param: ParamId, target: Target, smoothing: Smoothing, scale: Scale) -> Route {
    Route {
        param,
        target,
        smoothing,
        scale,
    }
}

/// Indexed by `ParamId::index()`.
static ROUTES: [Route; 24] = {
    use Smoothing::*;
    [
        route(ParamId::PulseWidth, Target::PulseWidth, Linear, Scale::Identity),
        route(ParamId::MainLevel, Target::MainGain, Linear, Scale::Factor(MAIN_LEVEL_SCALE)),
        route(
            ParamId::SubLevel,
            Target::SubVolume,
            Linear,
            Scale::ClampedDbToGain {
                min: SUB_LEVEL_RANGE_DB.0,
                max: SUB_LEVEL_RANGE_DB.1,
            },
        ),
        route(ParamId::NoiseLevel, Target::NoiseVolume, Linear, Scale::DbToGain),
        route(ParamId::FilterCutoff, Target::Cutoff, Exponential, Scale::Identity),
        route(ParamId::FilterResonance, Target::Resonance, Linear, Scale::Identity),
        route(
            ParamId::FilterEnvAmount,
            Target::FilterEnvDepth,
            Linear,
            Scale::Factor(FILTER_ENV_DEPTH_HZ),
        ),
        route(ParamId::Attack, Target::Attack, Immediate, Scale::Identity),
        route(ParamId::Decay, Target::Decay, Immediate, Scale::Identity),
        route(ParamId::Sustain, Target::Sustain, Linear, Scale::Identity),
        route(ParamId::Release, Target::Release, Immediate, Scale::Identity),
        route(ParamId::LfoRate, Target::LfoRate, Exponential, Scale::Identity),
        route(ParamId::VcoModAmount, Target::VcoDepth, Linear, Scale::Factor(VCO_MOD_DEPTH_HZ)),
        route(ParamId::VcfModAmount, Target::VcfDepth, Linear, Scale::Factor(VCF_MOD_DEPTH_HZ)),
        route(ParamId::DelayTime, Target::DelayTime, Linear, Scale::Identity),
        route(ParamId::DelayFeedback, Target::DelayFeedback, Linear, Scale::Identity),
        route(ParamId::DelayMix, Target::DelayMix, Linear, Scale::Identity),
        route(ParamId::PitchShift, Target::PitchShift, Linear, Scale::Identity),
        route(ParamId::ReverbPreDelay, Target::ReverbPreDelay, Immediate, Scale::Identity),
        route(ParamId::ReverbDecay, Target::ReverbDecay, Immediate, Scale::Identity),
        route(ParamId::ReverbMix, Target::ReverbMix, Linear, Scale::Identity),
        route(ParamId::MasterVolume, Target::MasterGain, Linear, Scale::Identity),
        route(ParamId::Portamento, Target::Portamento, Immediate, Scale::Identity),
        route(ParamId::Transpose, Target::Transpose, Immediate, Scale::Identity),
    ]
};

pub fn route_for(id: ParamId) -> &'static Route {
    &ROUTES[id.index()]
}

/// Why the graph had to be rebuilt.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    Waveform,
    SubOscillator,
    Noise,
    PitchShift,
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            RebuildReason::Waveform => "oscillator waveform changed",
            RebuildReason::SubOscillator => "sub-oscillator crossed the audible floor",
            RebuildReason::Noise => "noise crossed the audible floor",
            RebuildReason::PitchShift => "pitch shift switched on or off",
        };
        f.write_str(reason)
    }
}

/// Outcome of routing one parameter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// A ramp toward the new value was scheduled.
    Ramped,
    /// The value took effect at once (or is read later at note time).
    Applied,
    /// A node must appear or disappear; the change is stored but not routed.
    RebuildRequired(RebuildReason),
}

/// Does changing `id` from `previous` to `value` change the graph's shape?
pub fn structural_change(id: ParamId, previous: f32, value: f32) -> Option<RebuildReason> {
    let audible = |level: f32| level > AUDIBLE_FLOOR_DB;
    match id {
        ParamId::SubLevel if audible(previous) != audible(value) => {
            Some(RebuildReason::SubOscillator)
        }
        ParamId::NoiseLevel if audible(previous) != audible(value) => Some(RebuildReason::Noise),
        ParamId::PitchShift if (previous != 0.0) != (value != 0.0) => {
            Some(RebuildReason::PitchShift)
        }
        _ => None,
    }
}

/// Route a stored (already clamped) value onto the graph.
///
/// `ramp` is the ramp window in samples; 0 applies everything at once.
pub fn apply(graph: &mut SignalGraph, id: ParamId, previous: f32, value: f32, ramp: u32) -> Routed {
    if let Some(reason) = structural_change(id, previous, value) {
        return Routed::RebuildRequired(reason);
    }

    let route = route_for(id);
    let scaled = route.scale.apply(value);
    trace!(param = %id, value, scaled, "routing parameter");

    // Ramps of zero length are plain sets.
    let immediate = ramp == 0 || route.smoothing == Smoothing::Immediate;
    let samples = if immediate { 0 } else { ramp };

    match route.target {
        Target::PulseWidth => graph.voice.node.ramp_pulse_width(scaled, samples),
        Target::MainGain => graph.main_gain.node.ramp_gain(scaled, samples),
        Target::SubVolume => {
            if let Some(sub) = graph.sub_osc.as_mut() {
                sub.node.ramp_volume(scaled, samples);
            }
        }
        Target::NoiseVolume => {
            if let Some(noise) = graph.noise.as_mut() {
                noise.node.ramp_volume(scaled, samples);
            }
        }
        Target::Cutoff => graph.filter.node.ramp_cutoff(scaled, samples),
        Target::Resonance => graph.filter.node.ramp_resonance(scaled, samples),
        Target::FilterEnvDepth => graph.env_scale.node.ramp_gain(scaled, samples),
        Target::Attack => {
            graph.voice.node.envelope_mut().set_attack(scaled);
            graph.filter_env.node.envelope_mut().set_attack(scaled);
        }
        Target::Decay => {
            graph.voice.node.envelope_mut().set_decay(scaled);
            graph.filter_env.node.envelope_mut().set_decay(scaled);
        }
        Target::Sustain => {
            graph
                .voice
                .node
                .envelope_mut()
                .ramp_sustain(scaled * AMP_SUSTAIN_SCALE, samples);
            graph
                .filter_env
                .node
                .envelope_mut()
                .ramp_sustain(scaled, samples);
        }
        Target::Release => {
            graph.voice.node.envelope_mut().set_release(scaled);
            graph.filter_env.node.envelope_mut().set_release(scaled);
        }
        Target::LfoRate => graph.lfo.node.ramp_rate(scaled, samples),
        Target::VcoDepth => graph.vco_scale.node.ramp_gain(scaled, samples),
        Target::VcfDepth => graph.vcf_scale.node.ramp_gain(scaled, samples),
        Target::DelayTime => graph.delay.node.ramp_time(scaled, samples),
        Target::DelayFeedback => graph.delay.node.ramp_feedback(scaled, samples),
        Target::DelayMix => graph.delay_mix.node.ramp_fade(scaled, samples),
        Target::PitchShift => {
            if let Some(pitch) = graph.pitch_shift.as_mut() {
                pitch.node.ramp_semitones(scaled, samples);
            }
        }
        Target::ReverbPreDelay => graph.reverb.node.set_predelay(scaled),
        Target::ReverbDecay => graph.reverb.node.set_decay(scaled),
        Target::ReverbMix => graph.reverb.node.ramp_mix(scaled, samples),
        Target::MasterGain => graph.master.node.ramp_gain(scaled, samples),
        Target::Portamento | Target::Transpose => {}
    }

    if immediate {
        Routed::Applied
    } else {
        Routed::Ramped
    }
}

/// Push every parameter onto a freshly built graph, without ramps.
pub fn initialize(graph: &mut SignalGraph, params: &Parameters) {
    for id in ParamId::ALL {
        let value = params.get(id);
        apply(graph, id, value, value, 0);
    }
    graph
        .lfo
        .node
        .set_waveform(params.lfo_waveform.oscillator());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::EngineConfig,
        graph::builder::build_graph,
        io::backend::{AudioBackend, HeadlessBackend},
    };

    fn held_note_graph(params: &Parameters) -> SignalGraph {
        let backend = HeadlessBackend::running(48_000.0);
        let mut factory = backend.node_factory();
        let mut graph =
            build_graph(params, &backend, factory.as_mut(), &EngineConfig::default()).unwrap();
        graph.attack(220.0, 1.0, 0);
        graph.render(&mut [0.0; 480]);
        graph
    }

    #[test]
    fn table_is_indexed_by_param() {
        for id in ParamId::ALL {
            assert_eq!(route_for(id).param, id);
        }
    }

    #[test]
    fn frequencies_ramp_exponentially() {
        assert_eq!(route_for(ParamId::FilterCutoff).smoothing, Smoothing::Exponential);
        assert_eq!(route_for(ParamId::LfoRate).smoothing, Smoothing::Exponential);
        assert_eq!(route_for(ParamId::MainLevel).smoothing, Smoothing::Linear);
        assert_eq!(route_for(ParamId::Attack).smoothing, Smoothing::Immediate);
        assert_eq!(route_for(ParamId::ReverbDecay).smoothing, Smoothing::Immediate);
        assert_eq!(route_for(ParamId::Sustain).smoothing, Smoothing::Linear);
        assert_eq!(route_for(ParamId::PitchShift).smoothing, Smoothing::Linear);
    }

    #[test]
    fn scale_rules() {
        let scaled = |id: ParamId, v: f32| route_for(id).scale.apply(v);
        assert!((scaled(ParamId::MainLevel, 1.0) - 0.8).abs() < 1e-6);
        assert!((scaled(ParamId::FilterEnvAmount, 0.5) - 2_500.0).abs() < 1e-3);
        assert!((scaled(ParamId::VcoModAmount, 1.0) - 50.0).abs() < 1e-6);
        assert!((scaled(ParamId::VcfModAmount, 0.2) - 1_000.0).abs() < 1e-3);
        assert!((scaled(ParamId::NoiseLevel, -20.0) - 0.1).abs() < 1e-6);
        // Sub level below -40 dB is held at -40 dB.
        assert!((scaled(ParamId::SubLevel, -50.0) - 0.01).abs() < 1e-6);
    }

    #[test]
    fn floor_crossings_are_structural() {
        assert_eq!(
            structural_change(ParamId::SubLevel, -60.0, -30.0),
            Some(RebuildReason::SubOscillator)
        );
        assert_eq!(
            structural_change(ParamId::NoiseLevel, -20.0, -60.0),
            Some(RebuildReason::Noise)
        );
        assert_eq!(structural_change(ParamId::SubLevel, -30.0, -20.0), None);
        assert_eq!(structural_change(ParamId::SubLevel, -60.0, -60.0), None);
    }

    #[test]
    fn pitch_shift_presence_is_structural() {
        assert_eq!(
            structural_change(ParamId::PitchShift, 0.0, 7.0),
            Some(RebuildReason::PitchShift)
        );
        assert_eq!(
            structural_change(ParamId::PitchShift, 7.0, 0.0),
            Some(RebuildReason::PitchShift)
        );
        assert_eq!(structural_change(ParamId::PitchShift, 7.0, -3.0), None);
        assert_eq!(structural_change(ParamId::FilterCutoff, 20.0, 20_000.0), None);
    }

    #[test]
    fn sustain_write_on_a_held_note_ramps() {
        let mut params = Parameters::default();
        params.set(ParamId::Attack, 0.0);
        params.set(ParamId::Decay, 0.0);
        params.set(ParamId::Sustain, 1.0);
        let mut graph = held_note_graph(&params);
        let amp = |graph: &SignalGraph| graph.voice.node.envelope().level();
        assert!((amp(&graph) - AMP_SUSTAIN_SCALE).abs() < 1e-6);

        let window = 768;
        assert_eq!(
            apply(&mut graph, ParamId::Sustain, 1.0, 0.0, window),
            Routed::Ramped
        );

        let max_step = AMP_SUSTAIN_SCALE / window as f32 + 1e-6;
        let mut previous = amp(&graph);
        for _ in 0..window {
            graph.render(&mut [0.0; 1]);
            assert!((previous - amp(&graph)).abs() <= max_step);
            previous = amp(&graph);
        }
        assert_eq!(amp(&graph), 0.0);
    }

    #[test]
    fn pitch_shift_between_intervals_ramps() {
        let mut params = Parameters::default();
        params.set(ParamId::PitchShift, 7.0);
        let mut graph = held_note_graph(&params);

        assert_eq!(
            apply(&mut graph, ParamId::PitchShift, 7.0, -3.0, 768),
            Routed::Ramped
        );
        graph.render(&mut [0.0; 384]);
        let shift = graph.pitch_shift.as_ref().map(|p| p.node.semitones());
        assert!(shift.is_some_and(|st| st < 7.0 && st > -3.0), "{shift:?}");
    }
}
