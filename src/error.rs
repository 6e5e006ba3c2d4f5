//! Error taxonomy for the engine.
//!
//! Out-of-range parameter values are never errors: they are clamped. Pattern
//! inconsistencies are repaired during playback and only logged. Everything
//! structural (backend startup, graph construction) tears down before it
//! reports.

use std::time::Duration;

use crate::graph::node::{NodeId, NodeKind};
use crate::io::backend::BackendState;

/// Failure reported by an audio backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// No usable output device or stream configuration.
    #[error("audio output unavailable: {0}")]
    Unavailable(String),

    /// The backend declined to allocate a node.
    #[error("backend refused to create a {0} node")]
    NodeRefused(NodeKind),

    /// The output stream failed to build or play.
    #[error("audio stream failed: {0}")]
    Stream(String),
}

/// The audio backend could not be brought to the running state.
///
/// Fatal for the current attempt; calling `Engine::start` again retries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineInitError {
    /// The backend exists but is not running (suspended or closed).
    #[error("audio backend is {0:?}, expected Running")]
    NotRunning(BackendState),

    /// Resume was requested but the backend never confirmed it was running.
    #[error("audio backend did not start within {0:?}")]
    Timeout(Duration),

    /// The backend itself reported a failure.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Node construction or wiring failed. The partial graph has been disposed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphBuildError {
    #[error("could not create {kind} node {id}")]
    NodeRefused {
        kind: NodeKind,
        id: NodeId,
        #[source]
        source: BackendError,
    },

    /// An edge would close a loop in the signal graph.
    #[error("connecting {from} to {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },
}

/// A step holds more than one active note.
///
/// Only a pattern restored from outside the toggle API can be in this state.
/// Playback resolves it (high variants win) and logs this at `warn`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("step {step} has {active} active notes, expected at most one")]
pub struct SequenceStateError {
    pub step: usize,
    pub active: usize,
}

/// Note name that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid note name {0:?}")]
pub struct ParseNoteError(pub String);

/// Umbrella error returned by the engine facade.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The engine has no running backend and no graph yet.
    #[error("engine is not initialized, call start() first")]
    NotInitialized,

    #[error("engine initialization failed: {0}")]
    Init(#[from] EngineInitError),

    #[error("signal graph build failed: {0}")]
    GraphBuild(#[from] GraphBuildError),

    #[error(transparent)]
    InvalidNote(#[from] ParseNoteError),

    #[error("step {0} is out of range (0-15)")]
    StepOutOfRange(usize),

    #[error("unknown parameter {0:?}")]
    UnknownParam(String),
}
