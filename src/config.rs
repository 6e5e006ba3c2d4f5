//! Engine configuration.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::MAX_BLOCK_SIZE;

/// Tunables that are fixed for the lifetime of an engine.
///
/// ```
/// use std::time::Duration;
/// use sh101_engine::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_ramp_window(Duration::from_millis(10))
///     .with_noise_seed(7);
/// assert_eq!(config.ramp_window, Duration::from_millis(10));
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Length of the ramp applied to continuous parameter changes.
    pub ramp_window: Duration,
    /// Number of samples kept by the analyzer tap.
    pub analyzer_size: usize,
    /// Capacity of the UI -> audio control ring.
    pub control_capacity: usize,
    /// Capacity of the audio -> UI event ring.
    pub event_capacity: usize,
    /// Capacity of the audio -> UI scope sample ring.
    pub scope_capacity: usize,
    /// How long `Engine::start` waits for the backend to report Running.
    pub start_timeout: Duration,
    /// Poll interval while waiting for the backend.
    pub start_poll: Duration,
    /// Seed for the noise source.
    pub noise_seed: u64,
    /// Largest block rendered in one pass.
    pub max_block_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ramp_window: Duration::from_millis(16),
            analyzer_size: 256,
            control_capacity: 1024,
            event_capacity: 1024,
            scope_capacity: 8192,
            start_timeout: Duration::from_secs(2),
            start_poll: Duration::from_millis(100),
            noise_seed: 0x5101,
            max_block_size: MAX_BLOCK_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn with_ramp_window(mut self, window: Duration) -> Self {
        self.ramp_window = window;
        self
    }

    pub fn with_analyzer_size(mut self, size: usize) -> Self {
        self.analyzer_size = size.max(1);
        self
    }

    pub fn with_channel_capacity(mut self, control: usize, events: usize, scope: usize) -> Self {
        self.control_capacity = control.max(1);
        self.event_capacity = events.max(1);
        self.scope_capacity = scope.max(1);
        self
    }

    pub fn with_start_timeout(mut self, timeout: Duration, poll: Duration) -> Self {
        self.start_timeout = timeout;
        self.start_poll = poll;
        self
    }

    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = seed;
        self
    }

    pub fn with_max_block_size(mut self, size: usize) -> Self {
        self.max_block_size = size.clamp(1, MAX_BLOCK_SIZE);
        self
    }

    /// Ramp window in samples at the given rate.
    pub fn ramp_samples(&self, sample_rate: f32) -> u32 {
        (self.ramp_window.as_secs_f32() * sample_rate).round() as u32
    }
}
