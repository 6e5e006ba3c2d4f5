//! Audio backends.
//!
//! A backend owns the output device. The engine needs three things from it:
//! whether audio is running, the sample rate, and a [`NodeFactory`] that
//! accounts for every node the graph creates and releases. The factory is
//! split out because the engine keeps it for rebuilds while the backend
//! itself stays with whoever drives the output stream.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BackendError, EngineInitError};
use crate::graph::node::{NodeId, NodeKind};

/// Lifecycle of an audio backend.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    /// Created but not producing audio yet.
    Suspended,
    Running,
    /// Shut down; cannot be resumed.
    Closed,
}

/// Allocates and releases graph nodes on behalf of the engine.
pub trait NodeFactory: Send {
    /// Called before a node exists. An error aborts the graph build.
    fn create_node(&mut self, kind: NodeKind, id: NodeId) -> Result<(), BackendError>;

    fn release_node(&mut self, kind: NodeKind, id: NodeId);
}

pub trait AudioBackend {
    fn state(&self) -> BackendState;

    fn sample_rate(&self) -> f32;

    /// Ask the backend to start producing audio. Running may be reported
    /// later; see [`await_running`].
    fn resume(&mut self) -> Result<(), BackendError>;

    fn node_factory(&self) -> Box<dyn NodeFactory>;
}

/// Resume `backend` if needed and wait until it reports Running.
///
/// Polls every `poll` until `timeout` has passed.
pub fn await_running(
    backend: &mut dyn AudioBackend,
    timeout: Duration,
    poll: Duration,
) -> Result<(), EngineInitError> {
    match backend.state() {
        BackendState::Running => return Ok(()),
        BackendState::Closed => return Err(EngineInitError::NotRunning(BackendState::Closed)),
        BackendState::Suspended => {}
    }

    debug!("resuming audio backend");
    backend.resume()?;

    let deadline = Instant::now() + timeout;
    loop {
        match backend.state() {
            BackendState::Running => return Ok(()),
            BackendState::Closed => {
                return Err(EngineInitError::NotRunning(BackendState::Closed));
            }
            BackendState::Suspended if Instant::now() >= deadline => {
                warn!(?timeout, "audio backend never reported running");
                return Err(EngineInitError::Timeout(timeout));
            }
            BackendState::Suspended => thread::sleep(poll),
        }
    }
}

/// Record of node traffic through a factory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeJournal {
    pub created: Vec<(NodeId, NodeKind)>,
    pub released: Vec<(NodeId, NodeKind)>,
}

impl NodeJournal {
    /// Nodes created and not yet released.
    pub fn live(&self) -> usize {
        self.created.len().saturating_sub(self.released.len())
    }
}

/// Backend without a device, for tests and offline rendering.
///
/// Records every create/release in a shared [`NodeJournal`] and can be told
/// to refuse a node kind or to never start.
pub struct HeadlessBackend {
    state: BackendState,
    sample_rate: f32,
    refuse_resume: bool,
    fail_on: Option<NodeKind>,
    journal: Arc<Mutex<NodeJournal>>,
}

impl HeadlessBackend {
    /// A suspended backend; `Engine::start` resumes it.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            state: BackendState::Suspended,
            sample_rate,
            refuse_resume: false,
            fail_on: None,
            journal: Arc::default(),
        }
    }

    /// A backend that is already running.
    pub fn running(sample_rate: f32) -> Self {
        Self {
            state: BackendState::Running,
            ..Self::new(sample_rate)
        }
    }

    /// Refuse every node of `kind`.
    pub fn fail_on(mut self, kind: NodeKind) -> Self {
        self.fail_on = Some(kind);
        self
    }

    /// Accept resume requests but never reach Running.
    pub fn refuse_resume(mut self) -> Self {
        self.refuse_resume = true;
        self
    }

    pub fn close(&mut self) {
        self.state = BackendState::Closed;
    }

    /// Snapshot of everything the factories have recorded so far.
    pub fn journal(&self) -> NodeJournal {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AudioBackend for HeadlessBackend {
    fn state(&self) -> BackendState {
        self.state
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn resume(&mut self) -> Result<(), BackendError> {
        match self.state {
            BackendState::Closed => Err(BackendError::Unavailable("backend is closed".into())),
            _ if self.refuse_resume => Ok(()),
            _ => {
                self.state = BackendState::Running;
                Ok(())
            }
        }
    }

    fn node_factory(&self) -> Box<dyn NodeFactory> {
        Box::new(JournalFactory {
            fail_on: self.fail_on,
            journal: Arc::clone(&self.journal),
        })
    }
}

struct JournalFactory {
    fail_on: Option<NodeKind>,
    journal: Arc<Mutex<NodeJournal>>,
}

impl NodeFactory for JournalFactory {
    fn create_node(&mut self, kind: NodeKind, id: NodeId) -> Result<(), BackendError> {
        if self.fail_on == Some(kind) {
            return Err(BackendError::NodeRefused(kind));
        }
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .created
            .push((id, kind));
        Ok(())
    }

    fn release_node(&mut self, kind: NodeKind, id: NodeId) {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .released
            .push((id, kind));
    }
}
