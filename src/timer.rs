//! Deferred work as data.
//!
//! The core never sleeps. Anything that must happen later is pushed here with
//! an absolute due time and handed back by [`TimerQueue::pop_due`] once the
//! caller's clock passes it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

struct Entry<T> {
    due: Duration,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest due first, then insertion order (reversed for the max-heap).
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of tasks keyed by due time. Ties pop in insertion order.
pub struct TimerQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { due, seq, task });
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, T)> {
        if self.heap.peek()?.due > now {
            return None;
        }
        self.heap.pop().map(|e| (e.due, e.task))
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|e| e.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pending tasks in pop order, without removing them.
    pub fn pending(&self) -> Vec<(Duration, &T)> {
        let mut entries: Vec<&Entry<T>> = self.heap.iter().collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries.into_iter().map(|e| (e.due, &e.task)).collect()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn pops_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule(ms(500), "c");
        q.schedule(ms(100), "a");
        q.schedule(ms(250), "b");

        assert_eq!(q.next_due(), Some(ms(100)));
        assert_eq!(q.pop_due(ms(50)), None);
        assert_eq!(q.pop_due(ms(300)), Some((ms(100), "a")));
        assert_eq!(q.pop_due(ms(300)), Some((ms(250), "b")));
        assert_eq!(q.pop_due(ms(300)), None);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_due(ms(500)), Some((ms(500), "c")));
        assert!(q.is_empty());
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut q = TimerQueue::new();
        for name in ["first", "second", "third"] {
            q.schedule(ms(10), name);
        }
        let order: Vec<_> = std::iter::from_fn(|| q.pop_due(ms(10)).map(|(_, t)| t)).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn pending_matches_pop_order() {
        let mut q = TimerQueue::new();
        q.schedule(ms(30), 3);
        q.schedule(ms(10), 1);
        q.schedule(ms(20), 2);
        let pending: Vec<_> = q.pending().into_iter().map(|(d, &t)| (d, t)).collect();
        assert_eq!(pending, vec![(ms(10), 1), (ms(20), 2), (ms(30), 3)]);
    }
}
