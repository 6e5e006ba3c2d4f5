//! Realtime signal-graph engine for an SH-101 style monophonic synthesizer.
//!
//! The crate is layered bottom-up:
//!
//! - [`dsp`]: allocation-free signal processing primitives.
//! - [`graph`]: typed nodes, the patchbay that wires them, and the fixed
//!   synthesizer topology with its build and disposal lifecycle.
//! - [`synth`]: parameters, routing, the monophonic voice controller and the
//!   [`Engine`] facade that renders audio.
//! - [`sequencing`]: notes, the 16-step pattern, the transport clock and the
//!   timestamped event scheduler.
//! - [`io`]: audio backends (headless for tests, cpal for real output).

pub mod config;
pub mod dsp;
pub mod error;
pub mod graph;
pub mod io;
pub mod sequencing;
pub mod synth;

pub use config::EngineConfig;
pub use error::{EngineError, EngineInitError, GraphBuildError, SequenceStateError};
pub use synth::engine::Engine;
pub use synth::params::{LfoWaveform, ParamId, Parameters, Waveform};
pub use synth::remote::EngineHandle;

/// Largest block the engine renders in one pass.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// Shortest envelope stage, one sample at 48 kHz.
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
