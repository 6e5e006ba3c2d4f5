//! Schroeder reverb
//!
//! Four damped feedback combs in parallel build the tail, then two allpass
//! diffusers in series smear it:
//!
//! ```text
//! x ──┬─ comb 29.7 ms ─┐
//!     ├─ comb 37.1 ms ─┤
//!     ├─ comb 41.1 ms ─┼─ Σ/4 ─ allpass 5.0 ms ─ allpass 1.7 ms ─ y
//!     └─ comb 43.7 ms ─┘
//! ```
//!
//! Decay is an RT60 in seconds. A comb of length `d` passes its signal
//! `T / d` times in `T` seconds, so a gain of `0.001 ^ (d / T)` per pass puts
//! every comb 60 dB down at the same moment.
//!
//! Delay memory is sized once from the sample rate in [`SchroederReverb::new`];
//! processing never allocates.

const COMB_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
const DIFFUSER_MS: [f32; 2] = [5.0, 1.7];
const DIFFUSER_GAIN: f32 = 0.5;
const MAX_COMB_GAIN: f32 = 0.99;
const MIN_DECAY: f32 = 0.01;
/// -60 dB as a linear gain.
const RT60_GAIN: f32 = 0.001;

/// Circular buffer of a fixed length; reading the head yields the sample
/// written `len` samples ago.
#[derive(Debug, Clone)]
struct Ring {
    data: Vec<f32>,
    head: usize,
}

impl Ring {
    fn with_len(len: usize) -> Self {
        Self {
            data: vec![0.0; len.max(1)],
            head: 0,
        }
    }

    #[inline]
    fn oldest(&self) -> f32 {
        self.data[self.head]
    }

    #[inline]
    fn push(&mut self, sample: f32) {
        self.data[self.head] = sample;
        self.head += 1;
        if self.head == self.data.len() {
            self.head = 0;
        }
    }

    fn clear(&mut self) {
        self.data.fill(0.0);
        self.head = 0;
    }
}

/// Feedback comb with a one-pole lowpass in the loop.
#[derive(Debug, Clone)]
pub struct CombFilter {
    ring: Ring,
    seconds: f32,
    gain: f32,
    damping: f32,
    lowpass: f32,
}

impl CombFilter {
    fn new(seconds: f32, sample_rate: f32) -> Self {
        Self {
            ring: Ring::with_len((seconds * sample_rate) as usize),
            seconds,
            gain: 0.5,
            damping: 0.0,
            lowpass: 0.0,
        }
    }

    /// Pick the loop gain that reaches -60 dB after `rt60` seconds.
    fn tune(&mut self, rt60: f32) {
        self.gain = RT60_GAIN.powf(self.seconds / rt60).min(MAX_COMB_GAIN);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let out = self.ring.oldest();
        self.lowpass += (out - self.lowpass) * (1.0 - self.damping);
        self.ring.push(input + self.lowpass * self.gain);
        out
    }

    fn clear(&mut self) {
        self.ring.clear();
        self.lowpass = 0.0;
    }
}

/// Schroeder allpass: flat magnitude, smeared phase.
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    ring: Ring,
}

impl AllpassFilter {
    fn new(seconds: f32, sample_rate: f32) -> Self {
        Self {
            ring: Ring::with_len((seconds * sample_rate) as usize),
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.ring.oldest();
        let out = delayed - DIFFUSER_GAIN * input;
        self.ring.push(input + DIFFUSER_GAIN * out);
        out
    }

    fn clear(&mut self) {
        self.ring.clear();
    }
}

#[derive(Debug, Clone)]
pub struct SchroederReverb {
    combs: [CombFilter; 4],
    diffusers: [AllpassFilter; 2],
    sample_rate: f32,
    decay: f32,
}

impl SchroederReverb {
    /// A 1.5 s room with no damping.
    pub fn new(sample_rate: f32) -> Self {
        let mut reverb = Self {
            combs: COMB_MS.map(|ms| CombFilter::new(ms / 1000.0, sample_rate)),
            diffusers: DIFFUSER_MS.map(|ms| AllpassFilter::new(ms / 1000.0, sample_rate)),
            sample_rate,
            decay: 1.5,
        };
        reverb.set_decay(reverb.decay);
        reverb
    }

    /// RT60 in seconds.
    pub fn set_decay(&mut self, seconds: f32) {
        self.decay = seconds.max(MIN_DECAY);
        for comb in &mut self.combs {
            comb.tune(self.decay);
        }
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// 0 keeps the tail bright, 1 removes everything but DC from the loops.
    pub fn set_damping(&mut self, damping: f32) {
        let damping = damping.clamp(0.0, 1.0);
        for comb in &mut self.combs {
            comb.damping = damping;
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let tail = self
            .combs
            .iter_mut()
            .map(|comb| comb.process(input))
            .sum::<f32>()
            * 0.25;
        self.diffusers
            .iter_mut()
            .fold(tail, |signal, diffuser| diffuser.process(signal))
    }

    /// Silence every delay line.
    pub fn reset(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::clear);
        self.diffusers.iter_mut().for_each(AllpassFilter::clear);
    }
}
