//! Timestamped note events waiting for their sample.
//!
//! The engine renders up to the next due event, applies it, and carries on,
//! so every note lands on the exact sample it was scheduled for.

use std::collections::VecDeque;

use crate::sequencing::notes::Note;

/// Who scheduled an event. Stopping the transport cancels only
/// sequencer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Manual,
    Sequencer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteEvent {
    NoteOn { note: Note, velocity: f32 },
    /// Release `note`, or whatever is sounding when `None`.
    NoteOff { note: Option<Note> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    /// Sample clock time.
    pub at: u64,
    pub source: EventSource,
    pub event: NoteEvent,
}

/// Events ordered by time; equal times keep insertion order.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: VecDeque<ScheduledEvent>,
}

impl Scheduler {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, event: ScheduledEvent) {
        let index = self.queue.partition_point(|queued| queued.at <= event.at);
        self.queue.insert(index, event);
    }

    /// Time of the earliest pending event.
    pub fn next_at(&self) -> Option<u64> {
        self.queue.front().map(|event| event.at)
    }

    /// Remove and return the earliest event if it is due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<ScheduledEvent> {
        match self.queue.front() {
            Some(event) if event.at <= now => self.queue.pop_front(),
            _ => None,
        }
    }

    /// Drop every pending event from `source`, returning how many.
    pub fn cancel(&mut self, source: EventSource) -> usize {
        let before = self.queue.len();
        self.queue.retain(|event| event.source != source);
        before - self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
