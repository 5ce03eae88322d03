//! Coalescing event queue
//!
//! Each event kind is pending at most once. Events run in the order they were
//! raised; timer expiries found in the same pass are raised in the order of
//! [`Event`]'s discriminants.

use heapless::Vec;

use crate::platform::timer::TimerId;

/// Number of event kinds
pub const EVENT_COUNT: usize = 7;

/// Work items handled by the controller's task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// PAN advertisement solicit trickle fired
    PasTrickle = 0,
    /// PAN configuration solicit trickle fired
    PcsTrickle = 1,
    /// Keep-alive poll due
    Poll = 2,
    /// FH association delay elapsed
    AssociateRequest = 3,
    /// Orphan scan found the coordinator again
    CoordRealign = 4,
    /// Scan backoff elapsed
    ScanBackoff = 5,
    /// Sub-state changed and needs processing
    StateChange = 6,
}

impl From<TimerId> for Event {
    fn from(id: TimerId) -> Self {
        match id {
            TimerId::PasTrickle => Event::PasTrickle,
            TimerId::PcsTrickle => Event::PcsTrickle,
            TimerId::Poll => Event::Poll,
            TimerId::FhAssociate => Event::AssociateRequest,
            TimerId::ScanBackoff => Event::ScanBackoff,
        }
    }
}

/// Pending events
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<Event, EVENT_COUNT>,
}

impl EventQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queue `event` unless it is already pending. Returns whether it was added.
    pub fn raise(&mut self, event: Event) -> bool {
        if self.pending.contains(&event) {
            return false;
        }
        // One slot per kind, so this cannot overflow
        self.pending.push(event).is_ok()
    }

    /// Whether `event` is pending
    pub fn is_pending(&self, event: Event) -> bool {
        self.pending.contains(&event)
    }

    /// No event pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending event, leaving the queue empty
    pub fn take_all(&mut self) -> Vec<Event, EVENT_COUNT> {
        core::mem::take(&mut self.pending)
    }

    /// Drop every pending event
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coalescing() {
        let mut queue = EventQueue::new();
        assert!(queue.raise(Event::StateChange));
        assert!(!queue.raise(Event::StateChange));
        assert!(queue.raise(Event::Poll));

        let batch = queue.take_all();
        assert_eq!(batch.as_slice(), &[Event::StateChange, Event::Poll]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_raised_after_take_waits() {
        let mut queue = EventQueue::new();
        queue.raise(Event::ScanBackoff);
        let batch = queue.take_all();
        queue.raise(Event::ScanBackoff);
        assert_eq!(batch.len(), 1);
        assert!(queue.is_pending(Event::ScanBackoff));
    }

    #[test]
    fn test_timer_mapping_keeps_priority() {
        let events: Vec<Event, EVENT_COUNT> =
            TimerId::ALL.iter().map(|id| Event::from(*id)).collect();
        let mut sorted = events.clone();
        sorted.sort_unstable_by_key(|e| *e as u8);
        assert_eq!(events, sorted);
    }
}
