use crate::{
    dsp::{
        delay::DelayLine,
        smooth::{AudioParam, RampCurve},
    },
    graph::node::{GraphNode, NodeKind, Ports, RenderCtx},
};

/// Longest delay time the node supports, in seconds.
pub const MAX_DELAY_SECONDS: f32 = 1.0;

/// Feedback delay. Outputs only the delayed (wet) signal; the dry path runs
/// around it into the crossfade mixer.
///
/// ```text
/// input ──→ (+) ──→ [line] ──┬──→ output
///            ↑               │
///            └── feedback ───┘
/// ```
pub struct DelayNode {
    line: DelayLine,
    time: AudioParam,
    feedback: AudioParam,
}

impl DelayNode {
    pub fn new(sample_rate: f32, time: f32, feedback: f32) -> Self {
        let capacity = (MAX_DELAY_SECONDS * sample_rate).ceil() as usize + 1;
        Self {
            line: DelayLine::new(capacity),
            time: AudioParam::new(time, 0.0, MAX_DELAY_SECONDS),
            feedback: AudioParam::new(feedback, 0.0, 0.95),
        }
    }

    pub fn time(&self) -> f32 {
        self.time.value()
    }

    pub fn feedback(&self) -> f32 {
        self.feedback.value()
    }

    pub fn set_time(&mut self, seconds: f32) {
        self.time.set(seconds);
    }

    /// Ramping the time bends the pitch of the echoes briefly instead of
    /// clicking.
    pub fn ramp_time(&mut self, seconds: f32, samples: u32) {
        self.time.ramp_to(seconds, samples, RampCurve::Linear);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback.set(feedback);
    }

    pub fn ramp_feedback(&mut self, feedback: f32, samples: u32) {
        self.feedback.ramp_to(feedback, samples, RampCurve::Linear);
    }
}

impl GraphNode for DelayNode {
    const KIND: NodeKind = NodeKind::Delay;

    #[inline]
    fn process(&mut self, ports: Ports, ctx: &RenderCtx) -> f32 {
        let delay = self.time.next_value() * ctx.sample_rate;
        let feedback = self.feedback.next_value();

        // Read before write so a delay of N samples is exactly N.
        let delayed = self.line.read((delay - 1.0).max(0.0));
        self.line.write(ports.input + delayed * feedback);
        delayed
    }
}
