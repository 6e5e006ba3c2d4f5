use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::sequencing::pattern::STEPS;

/*
Transport Clock
===============

The clock runs on the sample timeline at sixteen ticks per bar:

    samples per step = sample_rate × 60 / bpm / 4

At 120 BPM and 48 kHz a step is 6000 samples and a bar of sixteen steps is
two seconds.

    even ticks  land on the grid
    odd ticks   are pushed late by swing × step

    swing 0.0   |x . . . x . . . x . . . x . . .|   straight sixteenths
    swing 0.5   |x . . . . . x . x . . . . . x .|   triplet-ish shuffle

The grid position is kept as an f64 so rounding never accumulates; each
tick is rounded to a sample on its own. Tempo and swing changes take effect
from the next tick without restarting the bar.
*/

pub const MIN_TEMPO: f32 = 60.0;
pub const MAX_TEMPO: f32 = 200.0;
pub const DEFAULT_TEMPO: f32 = 120.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportState::Stopped => "stopped",
            TransportState::Playing => "playing",
            TransportState::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// One clock tick: which step, and at which sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub at: u64,
    pub step: usize,
}

#[derive(Debug, Clone)]
pub struct Transport {
    state: TransportState,
    tempo: f32,
    swing: f32,
    sample_rate: f64,
    /// Ticks emitted since play.
    tick: u64,
    /// Unswung time of the next tick.
    next_grid: f64,
    /// Distance to the next tick, kept while paused.
    paused_remaining: f64,
    current_step: Option<usize>,
}

impl Transport {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            state: TransportState::Stopped,
            tempo: DEFAULT_TEMPO,
            swing: 0.0,
            sample_rate: f64::from(sample_rate),
            tick: 0,
            next_grid: 0.0,
            paused_remaining: 0.0,
            current_step: None,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    pub fn swing(&self) -> f32 {
        self.swing
    }

    /// Step of the most recent tick; `None` while stopped.
    pub fn current_step(&self) -> Option<usize> {
        self.current_step
    }

    /// Set tempo, clamped to 60 - 200 BPM. Returns the applied value.
    pub fn set_tempo(&mut self, bpm: f32) -> f32 {
        if !bpm.is_nan() {
            self.tempo = bpm.clamp(MIN_TEMPO, MAX_TEMPO);
            trace!(tempo = self.tempo, "tempo set");
        }
        self.tempo
    }

    /// Set swing, clamped to 0 - 1. Returns the applied value.
    pub fn set_swing(&mut self, swing: f32) -> f32 {
        if !swing.is_nan() {
            self.swing = swing.clamp(0.0, 1.0);
        }
        self.swing
    }

    /// Length of one sixteenth-note step in samples.
    pub fn step_samples(&self) -> f64 {
        self.sample_rate * 60.0 / f64::from(self.tempo) / 4.0
    }

    /// Note length for sequenced notes: a thirty-second note.
    pub fn gate_samples(&self) -> u64 {
        (self.step_samples() / 2.0).round() as u64
    }

    /// Start from step 0 at `now`, or continue if paused.
    ///
    /// Returns false when already playing.
    pub fn play(&mut self, now: u64) -> bool {
        match self.state {
            TransportState::Playing => false,
            TransportState::Paused => self.resume(now),
            TransportState::Stopped => {
                self.state = TransportState::Playing;
                self.tick = 0;
                self.next_grid = now as f64;
                true
            }
        }
    }

    /// Hold the clock, keeping the step position.
    pub fn pause(&mut self, now: u64) -> bool {
        if self.state != TransportState::Playing {
            return false;
        }
        self.paused_remaining = (self.next_grid - now as f64).max(0.0);
        self.state = TransportState::Paused;
        true
    }

    pub fn resume(&mut self, now: u64) -> bool {
        if self.state != TransportState::Paused {
            return false;
        }
        self.next_grid = now as f64 + self.paused_remaining;
        self.state = TransportState::Playing;
        true
    }

    /// Stop and forget the position. A no-op when already stopped.
    pub fn stop(&mut self) -> bool {
        if self.state == TransportState::Stopped {
            return false;
        }
        self.state = TransportState::Stopped;
        self.current_step = None;
        self.tick = 0;
        true
    }

    /// Emit the next tick if it falls before `end`.
    ///
    /// Ticks that should have happened before `now` fire at `now`.
    pub fn poll(&mut self, now: u64, end: u64) -> Option<Tick> {
        if self.state != TransportState::Playing {
            return None;
        }

        let step_samples = self.step_samples();
        let swing = if self.tick % 2 == 1 {
            f64::from(self.swing) * step_samples
        } else {
            0.0
        };
        let at = ((self.next_grid + swing).round() as u64).max(now);
        if at >= end {
            return None;
        }

        let step = (self.tick % STEPS as u64) as usize;
        self.current_step = Some(step);
        self.tick += 1;
        self.next_grid += step_samples;
        Some(Tick { at, step })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn ticks(transport: &mut Transport, now: u64, end: u64) -> Vec<Tick> {
        std::iter::from_fn(|| transport.poll(now, end)).collect()
    }

    #[test]
    fn one_bar_at_120_bpm_is_sixteen_ticks_in_two_seconds() {
        let mut transport = Transport::new(SAMPLE_RATE);
        transport.play(0);

        let bar = ticks(&mut transport, 0, 96_000);
        assert_eq!(bar.len(), 16);
        assert_eq!(bar[1].at, 6_000);
        assert_eq!(bar[15].step, 15);
        assert_eq!(transport.gate_samples(), 3_000);

        let next = transport.poll(96_000, 96_001);
        assert_eq!(next, Some(Tick { at: 96_000, step: 0 }));
    }

    #[test]
    fn swing_delays_odd_ticks() {
        let mut transport = Transport::new(SAMPLE_RATE);
        transport.set_swing(0.5);
        transport.play(0);

        let bar = ticks(&mut transport, 0, 24_000);
        let times: Vec<u64> = bar.iter().map(|t| t.at).collect();
        assert_eq!(times, vec![0, 9_000, 12_000, 21_000]);
    }

    #[test]
    fn tempo_change_applies_from_next_tick() {
        let mut transport = Transport::new(SAMPLE_RATE);
        transport.play(0);
        transport.poll(0, 1);
        transport.set_tempo(60.0);

        assert_eq!(transport.poll(0, 100_000).map(|t| t.at), Some(6_000));
        assert_eq!(transport.poll(0, 100_000).map(|t| t.at), Some(18_000));
    }

    #[test]
    fn tempo_and_swing_clamp() {
        let mut transport = Transport::new(SAMPLE_RATE);
        assert_eq!(transport.set_tempo(500.0), MAX_TEMPO);
        assert_eq!(transport.set_tempo(10.0), MIN_TEMPO);
        assert_eq!(transport.set_tempo(f32::NAN), MIN_TEMPO);
        assert_eq!(transport.set_swing(-1.0), 0.0);
        assert_eq!(transport.set_swing(3.0), 1.0);
    }

    #[test]
    fn stop_while_stopped_is_a_no_op() {
        let mut transport = Transport::new(SAMPLE_RATE);
        assert!(!transport.stop());
        assert_eq!(transport.current_step(), None);

        transport.play(0);
        transport.poll(0, 1);
        assert_eq!(transport.current_step(), Some(0));
        assert!(transport.stop());
        assert_eq!(transport.current_step(), None);
        assert_eq!(transport.poll(0, u64::MAX), None);
    }

    #[test]
    fn pause_keeps_position() {
        let mut transport = Transport::new(SAMPLE_RATE);
        transport.play(0);
        ticks(&mut transport, 0, 7_000);
        assert_eq!(transport.current_step(), Some(1));

        assert!(transport.pause(7_000));
        assert_eq!(transport.poll(7_000, 50_000), None);
        assert_eq!(transport.current_step(), Some(1));

        // 5000 samples were left until step 2 when paused.
        assert!(transport.play(20_000));
        assert_eq!(
            transport.poll(20_000, 50_000),
            Some(Tick { at: 25_000, step: 2 })
        );
    }
}
