//! Notes, the 16-step pattern, the transport clock and the event scheduler.

pub mod notes;
pub mod pattern;
pub mod scheduler;
pub mod transport;

pub use notes::{Note, PitchClass};
pub use pattern::{StepPattern, StepState, ROWS, STEPS};
pub use scheduler::{EventSource, NoteEvent, ScheduledEvent, Scheduler};
pub use transport::{Tick, Transport, TransportState};
