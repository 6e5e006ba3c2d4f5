/// Ring-buffer delay line with fractional (linearly interpolated) reads.
///
/// The buffer is allocated once at construction; reads and writes never
/// allocate.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Create a line able to delay up to `max_delay_samples`.
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay_samples.max(1) + 2],
            write_pos: 0,
        }
    }

    /// Longest delay this line can produce, in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len() - 2
    }

    /// Read the sample written `delay` samples ago (fractional).
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay.clamp(0.0, self.capacity() as f32);

        let whole = delay.floor();
        let frac = delay - whole;
        let whole = whole as usize;

        // write_pos holds the next slot, so the newest sample is one behind it.
        let newer = (self.write_pos + len - 1 - whole) % len;
        let older = (newer + len - 1) % len;

        let a = self.buffer[newer];
        let b = self.buffer[older];
        a + (b - a) * frac
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Write `sample` and return the sample from `delay` samples earlier.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, delay: f32) -> f32 {
        self.write(sample);
        self.read(delay)
    }

    pub fn render(&mut self, buffer: &mut [f32], delay: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, delay);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
