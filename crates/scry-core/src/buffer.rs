//! Per-stream event buffers and the shared session slot.

use std::collections::VecDeque;
use std::sync::{Mutex, RwLock};

use crate::endpoints::SessionId;
use crate::sync::{lock, read, write};

/// Ordered, in-memory buffer of not-yet-delivered events for one stream.
///
/// Capture hooks append; the flush task swaps the whole content out before
/// sending, so events captured while a delivery is in flight land in the next
/// batch.
#[derive(Debug)]
pub struct EventBuffer<T> {
    events: Mutex<VecDeque<T>>,
    limit: Option<usize>,
}

impl<T> Default for EventBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventBuffer<T> {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            limit: None,
        }
    }

    /// A buffer that evicts its oldest events once it holds `limit` of them.
    pub fn bounded(limit: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            limit: Some(limit.max(1)),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Append an event, returning how many old events were evicted.
    pub fn push(&self, event: T) -> usize {
        let mut events = lock(&self.events);
        events.push_back(event);
        Self::enforce_limit(&mut events, self.limit)
    }

    /// Remove and return everything buffered.
    pub fn take(&self) -> Vec<T> {
        let mut events = lock(&self.events);
        Vec::from(std::mem::take(&mut *events))
    }

    /// Put a batch back in front of anything captured since it was taken,
    /// returning how many old events were evicted.
    pub fn restore(&self, batch: Vec<T>) -> usize {
        let mut events = lock(&self.events);
        let newer = std::mem::take(&mut *events);
        events.extend(batch);
        events.extend(newer);
        Self::enforce_limit(&mut events, self.limit)
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.events).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.events).is_empty()
    }

    fn enforce_limit(events: &mut VecDeque<T>, limit: Option<usize>) -> usize {
        let Some(limit) = limit else {
            return 0;
        };
        let excess = events.len().saturating_sub(limit);
        events.drain(..excess);
        excess
    }
}

impl<T: Clone> EventBuffer<T> {
    pub fn snapshot(&self) -> Vec<T> {
        lock(&self.events).iter().cloned().collect()
    }
}

/// Where a recorder's flushes go. Empty until the session is created.
#[derive(Debug, Default)]
pub struct SessionSlot {
    id: RwLock<Option<SessionId>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<SessionId> {
        read(&self.id).clone()
    }

    pub fn set(&self, id: SessionId) {
        *write(&self.id) = Some(id);
    }

    pub fn is_set(&self) -> bool {
        read(&self.id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_empties_buffer_in_order() {
        let buffer = EventBuffer::new();
        buffer.push(1);
        buffer.push(2);
        buffer.push(3);

        assert_eq!(buffer.take(), vec![1, 2, 3]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_restore_puts_batch_before_newer_events() {
        let buffer = EventBuffer::new();
        buffer.push("a");
        buffer.push("b");
        let batch = buffer.take();
        buffer.push("c");

        buffer.restore(batch);
        assert_eq!(buffer.snapshot(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_bounded_buffer_evicts_oldest() {
        let buffer = EventBuffer::bounded(3);
        for i in 0..3 {
            assert_eq!(buffer.push(i), 0);
        }
        assert_eq!(buffer.push(3), 1);
        assert_eq!(buffer.snapshot(), vec![1, 2, 3]);

        let batch = buffer.take();
        buffer.push(4);
        assert_eq!(buffer.restore(batch), 1);
        assert_eq!(buffer.snapshot(), vec![2, 3, 4]);
    }

    #[test]
    fn test_session_slot() {
        let slot = SessionSlot::new();
        assert!(slot.get().is_none());
        slot.set(SessionId::from("sess-1"));
        assert_eq!(slot.get(), Some(SessionId::from("sess-1")));
        assert!(slot.is_set());
    }
}
