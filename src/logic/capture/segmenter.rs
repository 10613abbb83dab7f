//! Event Segmenter
//!
//! Chunks the live event stream into session batches. A batch stays open while
//! the span between its first and latest event is below the idle gap; the
//! event that reaches the gap closes it and is not part of the batch.

use serde::{Deserialize, Serialize};

use super::event::RawEvent;

/// Completed run of pointer events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBatch {
    events: Vec<RawEvent>,
}

impl SessionBatch {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[RawEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Seconds between first and last event
    pub fn span(&self) -> f64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }
}

impl From<Vec<RawEvent>> for SessionBatch {
    fn from(events: Vec<RawEvent>) -> Self {
        Self::new(events)
    }
}

#[derive(Debug, Clone)]
pub struct Segmenter {
    idle_gap: f64,
    buffer: Vec<RawEvent>,
}

impl Segmenter {
    pub fn new(idle_gap: f64) -> Self {
        Self { idle_gap, buffer: Vec::new() }
    }

    /// Feed one event; `Some` when it closed the current batch
    ///
    /// `None` means keep listening.
    pub fn observe(&mut self, event: RawEvent) -> Option<SessionBatch> {
        self.buffer.push(event);

        let span = match self.buffer.first() {
            Some(first) => event.timestamp - first.timestamp,
            None => 0.0,
        };
        if span < self.idle_gap {
            return None;
        }

        let mut events = std::mem::take(&mut self.buffer);
        events.pop();
        log::debug!("Batch closed: {} events over {:.3}s", events.len(), span);
        Some(SessionBatch::new(events))
    }

    /// Drop the in-progress batch, returning how many events were discarded
    pub fn reset(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn idle_gap(&self) -> f64 {
        self.idle_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_listening_below_gap() {
        let mut seg = Segmenter::new(3.0);
        for i in 0..6 {
            assert!(seg.observe(RawEvent::moved(i as f64 * 0.5, i, i)).is_none());
        }
        assert_eq!(seg.pending(), 6);
    }

    #[test]
    fn test_flush_excludes_trigger() {
        let mut seg = Segmenter::new(3.0);
        for i in 0..5 {
            assert!(seg.observe(RawEvent::moved(i as f64 * 0.5, i, i)).is_none());
        }
        let batch = seg.observe(RawEvent::moved(3.0, 99, 99)).expect("batch should flush");

        assert_eq!(batch.len(), 5);
        assert!(batch.events().iter().all(|e| e.x != 99));
        assert_eq!(batch.span(), 2.0);
        assert_eq!(seg.pending(), 0);
    }

    #[test]
    fn test_long_pause_flushes_previous_run() {
        let mut seg = Segmenter::new(3.0);
        seg.observe(RawEvent::moved(0.0, 0, 0));
        seg.observe(RawEvent::moved(0.1, 1, 0));
        let batch = seg.observe(RawEvent::moved(10.0, 2, 0)).unwrap();
        assert_eq!(batch.len(), 2);

        // Next batch starts fresh after the trigger.
        assert!(seg.observe(RawEvent::moved(10.5, 3, 0)).is_none());
        assert_eq!(seg.pending(), 1);
    }

    #[test]
    fn test_reset_discards_partial_batch() {
        let mut seg = Segmenter::new(3.0);
        seg.observe(RawEvent::moved(0.0, 0, 0));
        seg.observe(RawEvent::moved(1.0, 0, 0));
        assert_eq!(seg.reset(), 2);
        assert_eq!(seg.pending(), 0);
    }
}
