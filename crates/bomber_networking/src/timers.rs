//! # Timer Queue
//!
//! Deadlines owned by the game thread. Nothing fires by itself: the owner
//! calls [`TimerQueue::pop_due`] from its frame loop, so a timer can never
//! run against state that has been torn down. Clearing the queue is the
//! whole of cancellation.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Handle to a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Deadline-ordered payloads.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    pending: BTreeMap<(Instant, TimerId), T>,
    deadlines: BTreeMap<TimerId, Instant>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self { next_id: 0, pending: BTreeMap::new(), deadlines: BTreeMap::new() }
    }
}

impl<T> TimerQueue<T> {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `payload` to become due `delay` after `now`.
    pub fn schedule(&mut self, now: Instant, delay: Duration, payload: T) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let at = now + delay;
        self.pending.insert((at, id), payload);
        self.deadlines.insert(id, at);
        id
    }

    /// Cancels one timer; returns its payload if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let at = self.deadlines.remove(&id)?;
        self.pending.remove(&(at, id))
    }

    /// Removes and returns every payload whose deadline is at or before
    /// `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<T> {
        let mut due = Vec::new();
        while let Some(entry) = self.pending.first_entry() {
            let (at, id) = *entry.key();
            if at > now {
                break;
            }
            due.push(entry.remove());
            self.deadlines.remove(&id);
        }
        due
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.keys().next().map(|(at, _)| *at)
    }

    /// Drops every pending timer; returns how many there were.
    pub fn clear(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        self.deadlines.clear();
        n
    }

    /// Pending count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_deadline_order() {
        let t0 = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(t0, Duration::from_millis(30), "late");
        timers.schedule(t0, Duration::from_millis(10), "early");

        assert!(timers.pop_due(t0).is_empty());
        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_millis(10)));
        assert_eq!(timers.pop_due(t0 + Duration::from_millis(10)), vec!["early"]);
        assert_eq!(timers.pop_due(t0 + Duration::from_secs(1)), vec!["late"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_same_deadline_keeps_schedule_order() {
        let t0 = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(t0, Duration::ZERO, 1);
        timers.schedule(t0, Duration::ZERO, 2);
        assert_eq!(timers.pop_due(t0), vec![1, 2]);
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut timers = TimerQueue::new();
        let id = timers.schedule(t0, Duration::from_millis(5), 'x');
        assert_eq!(timers.cancel(id), Some('x'));
        assert_eq!(timers.cancel(id), None);
        assert!(timers.pop_due(t0 + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_clear() {
        let t0 = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(t0, Duration::from_millis(5), ());
        timers.schedule(t0, Duration::from_millis(6), ());
        assert_eq!(timers.clear(), 2);
        assert_eq!(timers.len(), 0);
        assert!(timers.next_deadline().is_none());
    }
}
