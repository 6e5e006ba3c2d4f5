use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Context passed to graph nodes during rendering.
///
/// Fixed for the lifetime of a graph: a sample-rate change means a rebuild.
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
}

impl RenderCtx {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }

    /// Convert seconds to a whole number of samples.
    #[inline]
    pub fn samples(&self, seconds: f32) -> u32 {
        (seconds.max(0.0) * self.sample_rate).round() as u32
    }
}

/// Identity of a node inside one graph, assigned in creation order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u16);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node is, as far as the backend and disposal are concerned.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Gain,
    Voice,
    Oscillator,
    Noise,
    Envelope,
    Lfo,
    Filter,
    Delay,
    Crossfade,
    PitchShift,
    Reverb,
    Analyzer,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Gain => "gain",
            NodeKind::Voice => "voice",
            NodeKind::Oscillator => "oscillator",
            NodeKind::Noise => "noise",
            NodeKind::Envelope => "envelope",
            NodeKind::Lfo => "lfo",
            NodeKind::Filter => "filter",
            NodeKind::Delay => "delay",
            NodeKind::Crossfade => "crossfade",
            NodeKind::PitchShift => "pitch-shift",
            NodeKind::Reverb => "reverb",
            NodeKind::Analyzer => "analyzer",
        };
        f.write_str(name)
    }
}

/// Where an edge lands on its destination node.
///
/// Edges into `Frequency` and `Cutoff` behave like connections into an
/// audio parameter: the incoming signal is added to the parameter's own
/// value every sample.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    Input,
    InputB,
    Frequency,
    Cutoff,
}

/// Summed signal arriving at each port of a node for one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ports {
    pub input: f32,
    pub input_b: f32,
    pub frequency: f32,
    pub cutoff: f32,
}

impl Ports {
    #[inline]
    pub fn add(&mut self, port: Port, value: f32) {
        match port {
            Port::Input => self.input += value,
            Port::InputB => self.input_b += value,
            Port::Frequency => self.frequency += value,
            Port::Cutoff => self.cutoff += value,
        }
    }
}

/// Core trait for audio processing graph nodes.
///
/// Nodes render one sample at a time from whatever the patchbay delivered
/// to their ports.
pub trait GraphNode: Send {
    const KIND: NodeKind;

    fn process(&mut self, ports: Ports, ctx: &RenderCtx) -> f32;
}

/// Nodes that generate signal on their own and must be started.
///
/// A stopped source outputs silence. Teardown stops every source before any
/// node downstream of it is released.
pub trait Source {
    fn start(&mut self);

    fn stop(&mut self);

    fn is_running(&self) -> bool;
}
