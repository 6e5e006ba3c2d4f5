use tracing::{debug, warn};

use crate::{
    config::EngineConfig,
    dsp::db_to_gain,
    error::{EngineError, EngineInitError, GraphBuildError},
    graph::{
        analyzer::AnalyzerNode,
        delay::DelayNode,
        envelope::EnvNode,
        filter::FilterNode,
        gain::GainNode,
        lfo::LfoNode,
        mix::CrossfadeNode,
        node::{GraphNode, NodeId, NodeKind, Port, RenderCtx},
        oscillator::{NoiseNode, SubOscNode, VoiceNode},
        pitch_shift::PitchShiftNode,
        reverb::ReverbNode,
        topology::{release_all, SignalGraph, Slot},
        wiring::{Bus, Input, Patchbay},
    },
    io::backend::{AudioBackend, BackendState, NodeFactory},
    synth::{
        params::{ParamId, Parameters},
        router,
    },
};

/// Fixed gain of the sub and noise stages ahead of the mixer.
const SOURCE_STAGE_GAIN: f32 = 0.5;
/// Source mixer headroom.
const MIXER_GAIN: f32 = 0.7;
/// Voice output level in dB.
const VOICE_VOLUME_DB: f32 = -6.0;

/// Build the graph for `params` on a running backend.
///
/// Fails with [`EngineInitError::NotRunning`] unless the backend is Running.
/// On any other failure the half-built graph has already been released.
pub fn build_graph(
    params: &Parameters,
    backend: &dyn AudioBackend,
    factory: &mut dyn NodeFactory,
    config: &EngineConfig,
) -> Result<SignalGraph, EngineError> {
    let state = backend.state();
    if state != BackendState::Running {
        return Err(EngineInitError::NotRunning(state).into());
    }

    let graph = GraphBuilder::new(factory, backend.sample_rate()).build(params, config)?;
    Ok(graph)
}

/// Creates nodes through a [`NodeFactory`], keeping track of what exists so
/// a failed build can be unwound.
pub struct GraphBuilder<'a> {
    factory: &'a mut dyn NodeFactory,
    ctx: RenderCtx,
    nodes: Vec<(NodeId, NodeKind)>,
    patchbay: Patchbay,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(factory: &'a mut dyn NodeFactory, sample_rate: f32) -> Self {
        Self {
            factory,
            ctx: RenderCtx::new(sample_rate),
            nodes: Vec::new(),
            patchbay: Patchbay::new(),
        }
    }

    /// Create, wire, initialize and start the whole graph.
    pub fn build(
        mut self,
        params: &Parameters,
        config: &EngineConfig,
    ) -> Result<SignalGraph, GraphBuildError> {
        match self.assemble(params, config) {
            Ok(mut graph) => {
                router::initialize(&mut graph, params);
                graph.start_sources();
                debug!(
                    nodes = graph.node_count(),
                    edges = graph.patchbay.len(),
                    sub = graph.sub_osc.is_some(),
                    noise = graph.noise.is_some(),
                    pitch_shift = graph.pitch_shift.is_some(),
                    "signal graph built"
                );
                Ok(graph)
            }
            Err(err) => {
                let report = release_all(&mut self.patchbay, &self.nodes, self.factory);
                warn!(
                    error = %err,
                    released = report.released.len(),
                    "graph build failed, partial graph released"
                );
                Err(err)
            }
        }
    }

    fn create<N: GraphNode>(&mut self, node: N) -> Result<Slot<N>, GraphBuildError> {
        let id = NodeId(self.nodes.len() as u16);
        self.factory
            .create_node(N::KIND, id)
            .map_err(|source| GraphBuildError::NodeRefused {
                kind: N::KIND,
                id,
                source,
            })?;
        self.nodes.push((id, N::KIND));
        Ok(Slot { id, node })
    }

    fn connect(&mut self, from: NodeId, to: Input) -> Result<(), GraphBuildError> {
        self.patchbay.connect(from, to)
    }

    fn assemble(
        &mut self,
        params: &Parameters,
        config: &EngineConfig,
    ) -> Result<SignalGraph, GraphBuildError> {
        let sr = self.ctx.sample_rate;
        let value = |id: ParamId| params.get(id);

        // Output backward.
        let master = self.create(GainNode::new(value(ParamId::MasterVolume)))?;
        let analyzer = self.create(AnalyzerNode::new(config.analyzer_size))?;
        let reverb = self.create(ReverbNode::new(
            sr,
            value(ParamId::ReverbPreDelay),
            value(ParamId::ReverbDecay),
            value(ParamId::ReverbMix),
        ))?;
        let pitch_shift = if params.has_pitch_shift() {
            Some(self.create(PitchShiftNode::new(sr, value(ParamId::PitchShift)))?)
        } else {
            None
        };
        let delay = self.create(DelayNode::new(
            sr,
            value(ParamId::DelayTime),
            value(ParamId::DelayFeedback),
        ))?;
        let delay_mix = self.create(CrossfadeNode::new(value(ParamId::DelayMix)))?;
        let filter = self.create(FilterNode::lowpass(value(ParamId::FilterCutoff)))?;
        let mixer = self.create(GainNode::new(MIXER_GAIN))?;
        let main_gain = self.create(GainNode::new(1.0))?;
        let sub_gain = self.create(GainNode::new(SOURCE_STAGE_GAIN))?;
        let noise_gain = self.create(GainNode::new(SOURCE_STAGE_GAIN))?;
        let voice = self.create(VoiceNode::new(
            params.waveform.oscillator(),
            db_to_gain(VOICE_VOLUME_DB),
        ))?;
        let filter_env = self.create(EnvNode::new())?;
        let env_scale = self.create(GainNode::new(0.0))?;
        let lfo = self.create(LfoNode::new(
            params.lfo_waveform.oscillator(),
            value(ParamId::LfoRate),
        ))?;
        let vco_scale = self.create(GainNode::new(0.0))?;
        let vcf_scale = self.create(GainNode::new(0.0))?;
        let sub_osc = if params.has_sub_oscillator() {
            Some(self.create(SubOscNode::new(0.0))?)
        } else {
            None
        };
        let noise = if params.has_noise() {
            Some(self.create(NoiseNode::new(config.noise_seed, 0.0))?)
        } else {
            None
        };

        // Sources into the mixer.
        self.connect(voice.id, Input::audio(main_gain.id))?;
        if let Some(sub) = &sub_osc {
            self.connect(sub.id, Input::audio(sub_gain.id))?;
        }
        if let Some(noise) = &noise {
            self.connect(noise.id, Input::audio(noise_gain.id))?;
        }
        for stage in [main_gain.id, sub_gain.id, noise_gain.id] {
            self.connect(stage, Input::audio(mixer.id))?;
        }
        self.connect(mixer.id, Input::audio(filter.id))?;

        // Modulation.
        self.connect(filter_env.id, Input::audio(env_scale.id))?;
        self.connect(env_scale.id, Input::port(filter.id, Port::Cutoff))?;
        self.connect(lfo.id, Input::audio(vco_scale.id))?;
        self.connect(lfo.id, Input::audio(vcf_scale.id))?;
        self.connect(vco_scale.id, Input::port(voice.id, Port::Frequency))?;
        self.connect(vcf_scale.id, Input::port(filter.id, Port::Cutoff))?;

        // Effects chain.
        self.connect(filter.id, Input::audio(delay_mix.id))?;
        self.connect(filter.id, Input::audio(delay.id))?;
        self.connect(delay.id, Input::port(delay_mix.id, Port::InputB))?;
        match &pitch_shift {
            Some(pitch) => {
                self.connect(delay_mix.id, Input::audio(pitch.id))?;
                self.connect(pitch.id, Input::audio(reverb.id))?;
            }
            None => self.connect(delay_mix.id, Input::audio(reverb.id))?,
        }
        self.connect(reverb.id, Input::audio(master.id))?;
        self.connect(master.id, Input::audio(analyzer.id))?;
        self.connect(master.id, Input::Destination)?;

        let node_count = self.nodes.len();
        Ok(SignalGraph {
            master,
            analyzer,
            reverb,
            pitch_shift,
            delay,
            delay_mix,
            filter,
            mixer,
            main_gain,
            sub_gain,
            noise_gain,
            voice,
            filter_env,
            env_scale,
            lfo,
            vco_scale,
            vcf_scale,
            sub_osc,
            noise,
            nodes: std::mem::take(&mut self.nodes),
            patchbay: std::mem::take(&mut self.patchbay),
            bus: Bus::new(node_count),
            ctx: self.ctx,
        })
    }
}
