//! External interfaces: audio backends.

pub mod backend;
pub mod cpal_backend;

pub use backend::{AudioBackend, BackendState, HeadlessBackend, NodeFactory, NodeJournal};
pub use cpal_backend::CpalBackend;
