use crate::{
    dsp::envelope::Envelope,
    graph::node::{GraphNode, NodeKind, Ports, RenderCtx},
};

/// Envelope generator as a control signal (0.0 - 1.0).
///
/// The filter envelope is one of these; its output goes through a gain node
/// that turns it into Hz of cutoff sweep.
pub struct EnvNode {
    env: Envelope,
}

impl EnvNode {
    pub fn new() -> Self {
        Self {
            env: Envelope::new(),
        }
    }

    pub fn with_params(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            env: Envelope::adsr(attack, decay, sustain, release),
        }
    }

    pub fn note_on(&mut self, ctx: &RenderCtx) {
        self.env.note_on(ctx);
    }

    pub fn note_off(&mut self, ctx: &RenderCtx) {
        self.env.note_off(ctx);
    }

    pub fn envelope(&self) -> &Envelope {
        &self.env
    }

    pub fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.env
    }
}

impl Default for EnvNode {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphNode for EnvNode {
    const KIND: NodeKind = NodeKind::Envelope;

    #[inline]
    fn process(&mut self, _ports: Ports, ctx: &RenderCtx) -> f32 {
        self.env.next_sample(ctx);
        self.env.level()
    }
}
