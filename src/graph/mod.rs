//! The synthesizer signal graph.
//!
//! Graph nodes wrap the low-level DSP primitives with what the instrument
//! needs: ramped parameters, gates, and modulation inputs. The patchbay wires
//! them into a DAG, the builder assembles the fixed topology, and the
//! topology renders it sample by sample and tears it down again.

/// Waveform tap feeding the visualizer.
pub mod analyzer;
/// Node creation, wiring and rollback.
pub mod builder;
/// Feedback delay effect.
pub mod delay;
/// Envelope generator as a control signal.
pub mod envelope;
/// 24 dB lowpass with cutoff modulation input.
pub mod filter;
/// Level stages and modulation scalers.
pub mod gain;
/// Low frequency oscillator.
pub mod lfo;
/// Linear crossfade between two inputs.
pub mod mix;
/// Core traits and identities shared by all graph nodes.
pub mod node;
/// Voice, sub-oscillator and noise sources.
pub mod oscillator;
/// Pitch shifter effect.
pub mod pitch_shift;
/// Pre-delayed Schroeder reverb.
pub mod reverb;
/// The fixed synthesizer graph, rendering and disposal.
pub mod topology;
/// Edges, fan-out and per-sample signal delivery.
pub mod wiring;

pub use builder::{build_graph, GraphBuilder};
pub use node::{GraphNode, NodeId, NodeKind, Port, RenderCtx, Source};
pub use topology::{DisposalReport, GraphProbe, SignalGraph};
pub use wiring::{Edge, Input};
