//! The instrument: parameters, routing, the voice controller and the engine.
//!
//! This layer sits above the graph. Collaborators address parameters by
//! [`ParamId`](params::ParamId) and notes by [`Note`](crate::sequencing::Note);
//! only the engine ever touches a node.

pub mod engine;
pub mod message;
pub mod params;
pub mod remote;
pub mod router;
pub mod voice;

pub use engine::Engine;
pub use message::{ControlMessage, EngineEvent};
pub use params::{LfoWaveform, ParamId, Parameters, Waveform};
pub use remote::EngineHandle;
pub use router::{RebuildReason, Routed};
pub use voice::{VoiceController, VoiceState, VoiceTransition};
