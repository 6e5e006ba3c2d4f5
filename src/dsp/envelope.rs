use crate::{
    dsp::smooth::{AudioParam, RampCurve},
    graph::node::RenderCtx,
    MIN_TIME,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Gated ADSR
==========

Every stage except Sustain is one straight segment, planned when the stage
is entered:

    level
    1.0 ┤    ╱╲
        │   ╱  ╲
      S ┤  ╱    ╲_________
        │ ╱               ╲
    0.0 ┼╱─────────────────╲────→ samples
         │ A  │ D │  S    │ R │
         gate on         gate off

    segment:  from ──(total samples)──→ to

Gate on plans Attack from the current level, so a retrigger during a
release tail climbs without a click. Gate off plans Release from the current
level in any stage. The stage times are read when a segment is planned;
changing one mid-segment applies from the next segment on. Sustain is a
smoothed parameter: a ramped write glides a held note to the new level, and
Decay heads for wherever that ramp ends.
*/

/// The current stage of the envelope state machine.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// One planned straight line.
#[derive(Debug, Clone, Copy)]
struct Segment {
    from: f32,
    to: f32,
    elapsed: u32,
    total: u32,
}

impl Segment {
    fn plan(from: f32, to: f32, seconds: f32, ctx: &RenderCtx) -> Self {
        Self {
            from,
            to,
            elapsed: 0,
            total: ctx.samples(seconds).max(1),
        }
    }

    /// Advance one sample; returns the level and whether the line is done.
    #[inline]
    fn step(&mut self) -> (f32, bool) {
        self.elapsed += 1;
        if self.elapsed >= self.total {
            return (self.to, true);
        }
        let t = self.elapsed as f32 / self.total as f32;
        (self.from + (self.to - self.from) * t, false)
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    attack: f32,
    decay: f32,
    sustain: AudioParam,
    release: f32,
    stage: EnvelopeState,
    level: f32,
    segment: Segment,
}

impl Envelope {
    /// 100 ms attack, decay and release around a 0.7 sustain.
    pub fn new() -> Self {
        Self::adsr(0.1, 0.1, 0.7, 0.1)
    }

    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.max(MIN_TIME),
            decay: decay.max(MIN_TIME),
            sustain: AudioParam::new(sustain, 0.0, 1.0),
            release: release.max(MIN_TIME),
            stage: EnvelopeState::Idle,
            level: 0.0,
            segment: Segment {
                from: 0.0,
                to: 0.0,
                elapsed: 0,
                total: 1,
            },
        }
    }

    /// Gate on: climb to full level from wherever the envelope is.
    pub fn note_on(&mut self, ctx: &RenderCtx) {
        self.segment = Segment::plan(self.level, 1.0, self.attack, ctx);
        self.stage = EnvelopeState::Attack;
    }

    /// Gate off: fall to zero from the current level. Ignored while idle.
    pub fn note_off(&mut self, ctx: &RenderCtx) {
        if self.stage == EnvelopeState::Idle {
            return;
        }
        self.segment = Segment::plan(self.level, 0.0, self.release, ctx);
        self.stage = EnvelopeState::Release;
    }

    /// Advance the envelope by one sample.
    pub fn next_sample(&mut self, ctx: &RenderCtx) {
        let sustain = self.sustain.next_value();
        match self.stage {
            EnvelopeState::Idle => self.level = 0.0,
            EnvelopeState::Sustain => self.level = sustain,
            EnvelopeState::Attack | EnvelopeState::Decay | EnvelopeState::Release => {
                let (level, done) = self.segment.step();
                self.level = level;
                if done {
                    self.finish_segment(ctx);
                }
            }
        }
    }

    fn finish_segment(&mut self, ctx: &RenderCtx) {
        self.stage = match self.stage {
            EnvelopeState::Attack => {
                self.segment = Segment::plan(1.0, self.sustain.target(), self.decay, ctx);
                EnvelopeState::Decay
            }
            EnvelopeState::Decay => EnvelopeState::Sustain,
            _ => EnvelopeState::Idle,
        };
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            self.next_sample(ctx);
            *sample = self.level;
        }
    }

    /// False once the release has reached zero.
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeState::Idle
    }

    /// Drop to idle at zero immediately.
    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }

    pub fn set_attack(&mut self, seconds: f32) {
        self.attack = seconds.max(MIN_TIME);
    }

    pub fn set_decay(&mut self, seconds: f32) {
        self.decay = seconds.max(MIN_TIME);
    }

    /// Jump to a new sustain level.
    pub fn set_sustain(&mut self, level: f32) {
        self.sustain.set(level);
    }

    /// Move the sustain level over `samples` samples.
    pub fn ramp_sustain(&mut self, level: f32, samples: u32) {
        self.sustain.ramp_to(level, samples, RampCurve::Linear);
    }

    pub fn set_release(&mut self, seconds: f32) {
        self.release = seconds.max(MIN_TIME);
    }

    pub fn sustain_level(&self) -> f32 {
        self.sustain.value()
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn run(env: &mut Envelope, samples: usize) {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        for _ in 0..samples {
            env.next_sample(&ctx);
        }
    }

    #[test]
    fn attack_peaks_on_time_then_decays_to_sustain() {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        let mut env = Envelope::adsr(0.01, 0.05, 0.6, 0.2);

        env.note_on(&ctx);
        run(&mut env, 10);
        assert_eq!(env.level(), 1.0);
        assert_eq!(env.state(), EnvelopeState::Decay);

        run(&mut env, 50);
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((env.level() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn release_reaches_idle_from_any_stage() {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        let mut env = Envelope::adsr(0.1, 0.05, 0.5, 0.03);

        env.note_on(&ctx);
        run(&mut env, 20);
        assert_eq!(env.state(), EnvelopeState::Attack);

        env.note_off(&ctx);
        run(&mut env, 30);
        assert_eq!(env.level(), 0.0);
        assert!(!env.is_active());
    }

    #[test]
    fn retrigger_during_release_has_no_jump() {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        let mut env = Envelope::adsr(0.01, 0.05, 0.8, 0.1);

        env.note_on(&ctx);
        run(&mut env, 100);
        env.note_off(&ctx);
        run(&mut env, 20);

        let before = env.level();
        env.note_on(&ctx);
        env.next_sample(&ctx);

        assert!(before > 0.1);
        assert!(env.level() >= before && env.level() - before < 0.2);
        assert_eq!(env.state(), EnvelopeState::Attack);
    }

    #[test]
    fn note_off_while_idle_is_ignored() {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        let mut env = Envelope::new();
        env.note_off(&ctx);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn sustain_change_applies_while_held() {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        let mut env = Envelope::adsr(0.001, 0.001, 0.8, 0.1);

        env.note_on(&ctx);
        run(&mut env, 20);
        env.set_sustain(0.4);
        run(&mut env, 1);

        assert!((env.level() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn zero_times_still_take_one_sample() {
        let ctx = RenderCtx::new(48_000.0);
        let mut env = Envelope::adsr(0.0, 0.0, 0.5, 0.0);

        env.note_on(&ctx);
        env.next_sample(&ctx);
        assert_eq!(env.level(), 1.0);
        env.next_sample(&ctx);
        assert_eq!(env.level(), 0.5);

        env.note_off(&ctx);
        env.next_sample(&ctx);
        assert!(!env.is_active());
    }

    #[test]
    fn ramped_sustain_moves_a_held_note_smoothly() {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        let mut env = Envelope::adsr(0.001, 0.001, 1.0, 0.1);

        env.note_on(&ctx);
        run(&mut env, 10);
        assert_eq!(env.level(), 1.0);

        env.ramp_sustain(0.0, 16);
        let mut previous = env.level();
        for _ in 0..16 {
            env.next_sample(&ctx);
            assert!((previous - env.level()).abs() <= 1.0 / 16.0 + 1e-6);
            previous = env.level();
        }
        assert_eq!(env.level(), 0.0);
        assert_eq!(env.state(), EnvelopeState::Sustain);
    }

    #[test]
    fn decay_heads_for_the_ramped_sustain() {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        let mut env = Envelope::adsr(0.01, 0.05, 0.8, 0.1);

        env.ramp_sustain(0.2, 5);
        env.note_on(&ctx);
        run(&mut env, 60);

        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((env.level() - 0.2).abs() < 1e-6);
    }
}
