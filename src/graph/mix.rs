use crate::{
    dsp::smooth::{AudioParam, RampCurve},
    graph::node::{GraphNode, NodeKind, Ports, RenderCtx},
};

/*
Crossfade Mixing
================

The crossfade node blends two inputs: the dry filter output on `Input` and
the delay's wet output on `InputB`.

    output = A × (1 - fade) + B × fade

  - fade = 0.0 → 100% dry
  - fade = 0.5 → 50% dry, 50% wet (both signals at half amplitude)
  - fade = 1.0 → 100% wet

The law is linear, not equal-power: the wet signal is a delayed copy of the
dry one, and for correlated inputs linear weights keep the level flat. Fade is ramped.
*/

pub struct CrossfadeNode {
    fade: AudioParam,
}

impl CrossfadeNode {
    pub fn new(fade: f32) -> Self {
        Self {
            fade: AudioParam::new(fade, 0.0, 1.0),
        }
    }

    pub fn fade(&self) -> f32 {
        self.fade.value()
    }

    pub fn set_fade(&mut self, fade: f32) {
        self.fade.set(fade);
    }

    pub fn ramp_fade(&mut self, fade: f32, samples: u32) {
        self.fade.ramp_to(fade, samples, RampCurve::Linear);
    }
}

impl GraphNode for CrossfadeNode {
    const KIND: NodeKind = NodeKind::Crossfade;

    #[inline]
    fn process(&mut self, ports: Ports, _ctx: &RenderCtx) -> f32 {
        let fade = self.fade.next_value();
        ports.input * (1.0 - fade) + ports.input_b * fade
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mix(fade: f32) -> f32 {
        let ctx = RenderCtx::new(48_000.0);
        let mut node = CrossfadeNode::new(fade);
        node.process(
            Ports {
                input: 1.0,
                input_b: -1.0,
                ..Ports::default()
            },
            &ctx,
        )
    }

    #[test]
    fn endpoints_select_one_input() {
        assert_eq!(mix(0.0), 1.0);
        assert_eq!(mix(1.0), -1.0);
    }

    #[test]
    fn midpoint_is_linear() {
        assert!(mix(0.5).abs() < 1e-6);
        assert!((mix(0.25) - 0.5).abs() < 1e-6);
    }
}
