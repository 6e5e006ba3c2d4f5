use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    graph::{
        analyzer::AnalyzerNode,
        delay::DelayNode,
        envelope::EnvNode,
        filter::FilterNode,
        gain::GainNode,
        lfo::LfoNode,
        mix::CrossfadeNode,
        node::{GraphNode, NodeId, NodeKind, RenderCtx, Source},
        oscillator::{NoiseNode, SubOscNode, VoiceNode},
        pitch_shift::PitchShiftNode,
        reverb::ReverbNode,
        wiring::{Bus, Edge, Patchbay},
    },
    io::backend::NodeFactory,
};

/*
Synthesizer Topology
====================

The graph has a fixed shape. Three nodes are optional and only exist while
their parameter says they are audible (sub, noise) or active (pitch shift).

    voice ──→ main gain ──┐
    sub? ───→ sub gain ───┼──→ mixer ──→ filter ──┬──────────→ crossfade ──→ pitch? ──→ reverb ──→ master ──→ out
    noise? ─→ noise gain ─┘                ▲  ▲   └──→ delay ──→ ┘(B)                           └──→ analyzer
                                           │  │
    filter env ──→ env scaler ─────────────┘  │
    lfo ──┬──→ vcf scaler ────────────────────┘
          └──→ vco scaler ──→ voice frequency

Rendering walks the nodes in dependency order once per sample. Each node
takes what the patchbay delivered to its ports, produces one value, and
scatters it along its outgoing edges. Because the order is fixed and the
graph is acyclic, every input is complete by the time its node runs.
*/

/// A node together with its identity in the graph.
pub struct Slot<N> {
    pub id: NodeId,
    pub node: N,
}

impl<N: GraphNode> Slot<N> {
    #[inline]
    fn step(&mut self, bus: &mut Bus, patchbay: &Patchbay, ctx: &RenderCtx) -> f32 {
        let ports = bus.take(self.id);
        let value = self.node.process(ports, ctx);
        bus.scatter(patchbay, self.id, value);
        value
    }
}

/// The complete synthesizer signal graph.
///
/// Owned exclusively by the engine. Nothing outside the crate reaches the
/// nodes; parameters are routed to them by `ParamId`.
pub struct SignalGraph {
    pub(crate) master: Slot<GainNode>,
    pub(crate) analyzer: Slot<AnalyzerNode>,
    pub(crate) reverb: Slot<ReverbNode>,
    pub(crate) pitch_shift: Option<Slot<PitchShiftNode>>,
    pub(crate) delay: Slot<DelayNode>,
    pub(crate) delay_mix: Slot<CrossfadeNode>,
    pub(crate) filter: Slot<FilterNode>,
    pub(crate) mixer: Slot<GainNode>,
    pub(crate) main_gain: Slot<GainNode>,
    pub(crate) sub_gain: Slot<GainNode>,
    pub(crate) noise_gain: Slot<GainNode>,
    pub(crate) voice: Slot<VoiceNode>,
    pub(crate) filter_env: Slot<EnvNode>,
    pub(crate) env_scale: Slot<GainNode>,
    pub(crate) lfo: Slot<LfoNode>,
    pub(crate) vco_scale: Slot<GainNode>,
    pub(crate) vcf_scale: Slot<GainNode>,
    pub(crate) sub_osc: Option<Slot<SubOscNode>>,
    pub(crate) noise: Option<Slot<NoiseNode>>,

    /// Every node in creation order.
    pub(crate) nodes: Vec<(NodeId, NodeKind)>,
    pub(crate) patchbay: Patchbay,
    pub(crate) bus: Bus,
    pub(crate) ctx: RenderCtx,
}

/// What a disposal did, in the order it did it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisposalReport {
    /// Sources that were running and got stopped.
    pub stopped: Vec<NodeId>,
    /// Number of edges removed.
    pub disconnected: usize,
    /// Nodes handed back to the backend, reverse creation order.
    pub released: Vec<NodeId>,
}

/// Read-only view of the graph for tests and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphProbe {
    pub nodes: Vec<(NodeId, NodeKind)>,
    pub edges: Vec<Edge>,
    pub has_sub_oscillator: bool,
    pub has_noise: bool,
    pub has_pitch_shift: bool,
    pub running_sources: usize,
    pub voice_frequency: f32,
    pub sub_frequency: Option<f32>,
    pub cutoff: f32,
    pub cutoff_target: f32,
    pub effective_cutoff: f32,
    pub lfo_rate: f32,
    pub master_gain: f32,
    pub main_gain: f32,
}

impl SignalGraph {
    pub fn sample_rate(&self) -> f32 {
        self.ctx.sample_rate
    }

    pub fn ctx(&self) -> &RenderCtx {
        &self.ctx
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Render one sample per slot of `out`.
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.render_sample();
        }
    }

    #[inline]
    fn render_sample(&mut self) -> f32 {
        let bus = &mut self.bus;
        let patchbay = &self.patchbay;
        let ctx = &self.ctx;

        // modulation
        self.lfo.step(bus, patchbay, ctx);
        self.vco_scale.step(bus, patchbay, ctx);
        self.vcf_scale.step(bus, patchbay, ctx);
        self.filter_env.step(bus, patchbay, ctx);
        self.env_scale.step(bus, patchbay, ctx);

        // sources
        self.voice.step(bus, patchbay, ctx);
        if let Some(sub) = self.sub_osc.as_mut() {
            sub.step(bus, patchbay, ctx);
        }
        if let Some(noise) = self.noise.as_mut() {
            noise.step(bus, patchbay, ctx);
        }

        // mix and effects
        self.main_gain.step(bus, patchbay, ctx);
        self.sub_gain.step(bus, patchbay, ctx);
        self.noise_gain.step(bus, patchbay, ctx);
        self.mixer.step(bus, patchbay, ctx);
        self.filter.step(bus, patchbay, ctx);
        self.delay.step(bus, patchbay, ctx);
        self.delay_mix.step(bus, patchbay, ctx);
        if let Some(pitch) = self.pitch_shift.as_mut() {
            pitch.step(bus, patchbay, ctx);
        }
        self.reverb.step(bus, patchbay, ctx);
        self.master.step(bus, patchbay, ctx);
        self.analyzer.step(bus, patchbay, ctx);

        bus.take_destination()
    }

    /// Open the gate of the voice and the filter envelope.
    ///
    /// The frequency glides over `glide` samples (0 jumps); the first note
    /// on a fresh graph always jumps. The sub oscillator follows one octave
    /// down with the same glide.
    pub fn attack(&mut self, frequency: f32, velocity: f32, glide: u32) {
        let glide = self
            .voice
            .node
            .trigger_attack(frequency, velocity, glide, &self.ctx);
        self.filter_env.node.note_on(&self.ctx);
        if let Some(sub) = self.sub_osc.as_mut() {
            sub.node.track(frequency, glide);
        }
    }

    /// Close the gate: both envelopes enter their release.
    pub fn release(&mut self) {
        self.voice.node.trigger_release(&self.ctx);
        self.filter_env.node.note_off(&self.ctx);
    }

    /// True once the amplitude envelope has finished.
    pub fn voice_silent(&self) -> bool {
        self.voice.node.is_silent()
    }

    /// Analyzer contents, oldest sample first.
    pub fn waveform_into(&self, out: &mut Vec<f32>) {
        self.analyzer.node.snapshot_into(out);
    }

    pub(crate) fn start_sources(&mut self) {
        self.lfo.node.start();
        self.voice.node.start();
        if let Some(sub) = self.sub_osc.as_mut() {
            sub.node.start();
        }
        if let Some(noise) = self.noise.as_mut() {
            noise.node.start();
        }
    }

    fn running_sources(&self) -> usize {
        [
            self.lfo.node.is_running(),
            self.voice.node.is_running(),
            self.sub_osc.as_ref().is_some_and(|s| s.node.is_running()),
            self.noise.as_ref().is_some_and(|n| n.node.is_running()),
        ]
        .into_iter()
        .filter(|&running| running)
        .count()
    }

    pub fn probe(&self) -> GraphProbe {
        GraphProbe {
            nodes: self.nodes.clone(),
            edges: self.patchbay.edges().to_vec(),
            has_sub_oscillator: self.sub_osc.is_some(),
            has_noise: self.noise.is_some(),
            has_pitch_shift: self.pitch_shift.is_some(),
            running_sources: self.running_sources(),
            voice_frequency: self.voice.node.frequency(),
            sub_frequency: self.sub_osc.as_ref().map(|s| s.node.frequency()),
            cutoff: self.filter.node.cutoff(),
            cutoff_target: self.filter.node.cutoff_target(),
            effective_cutoff: self.filter.node.effective_cutoff(),
            lfo_rate: self.lfo.node.rate(),
            master_gain: self.master.node.gain(),
            main_gain: self.main_gain.node.gain(),
        }
    }

    /// Tear the graph down: stop sources, unwire, release every node.
    pub fn dispose(mut self, factory: &mut dyn NodeFactory) -> DisposalReport {
        let mut stopped = Vec::new();
        stop(&mut self.lfo, &mut stopped);
        if let Some(sub) = self.sub_osc.as_mut() {
            stop(sub, &mut stopped);
        }
        if let Some(noise) = self.noise.as_mut() {
            stop(noise, &mut stopped);
        }
        stop(&mut self.voice, &mut stopped);

        let mut report = release_all(&mut self.patchbay, &self.nodes, factory);
        report.stopped = stopped;
        debug!(
            stopped = report.stopped.len(),
            disconnected = report.disconnected,
            released = report.released.len(),
            "signal graph disposed"
        );
        report
    }
}

fn stop<N: Source>(slot: &mut Slot<N>, stopped: &mut Vec<NodeId>) {
    if slot.node.is_running() {
        slot.node.stop();
        stopped.push(slot.id);
    }
}

/// Unwire and release `nodes` in reverse creation order.
///
/// Shared by full disposal and by the rollback of a half-built graph.
pub(crate) fn release_all(
    patchbay: &mut Patchbay,
    nodes: &[(NodeId, NodeKind)],
    factory: &mut dyn NodeFactory,
) -> DisposalReport {
    let disconnected = patchbay.disconnect_all();
    let released = nodes
        .iter()
        .rev()
        .map(|&(id, kind)| {
            factory.release_node(kind, id);
            id
        })
        .collect();

    DisposalReport {
        stopped: Vec::new(),
        disconnected,
        released,
    }
}
