//! Delayed task queue with per-run cancellation.
//!
//! Tasks are kept in a min-heap keyed by due time; tasks due at the same
//! instant pop in the order they were scheduled. Every task is stamped
//! with the [`RunToken`] of the run that created it, so a whole run can be
//! purged at once and a stale task can be recognised if one slips through.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Identity of one start..stop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RunToken(u64);

impl RunToken {
    /// Token for the run after this one.
    pub fn next(self) -> Self {
        RunToken(self.0.wrapping_add(1))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A task waiting in the queue.
#[derive(Debug, Clone)]
pub struct ScheduledTask<T> {
    pub due_ms: u64,
    pub run: RunToken,
    seq: u64,
    pub payload: T,
}

impl<T> PartialEq for ScheduledTask<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl<T> Eq for ScheduledTask<T> {}

impl<T> PartialOrd for ScheduledTask<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ScheduledTask<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest time first, then FIFO)
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of delayed tasks.
#[derive(Debug, Clone)]
pub struct DelayedQueue<T> {
    heap: BinaryHeap<ScheduledTask<T>>,
    next_seq: u64,
}

impl<T> Default for DelayedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DelayedQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Queue `payload` to fire at `due_ms`.
    pub fn schedule(&mut self, due_ms: u64, run: RunToken, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(ScheduledTask {
            due_ms,
            run,
            seq,
            payload,
        });
    }

    /// Pop the earliest task if it is due at `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<ScheduledTask<T>> {
        match self.heap.peek() {
            Some(task) if task.due_ms <= now_ms => self.heap.pop(),
            _ => None,
        }
    }

    /// Due time of the earliest task.
    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|t| t.due_ms)
    }

    /// Drop every task of `run`. Returns how many were removed.
    pub fn cancel_run(&mut self, run: RunToken) -> usize {
        let before = self.heap.len();
        self.heap.retain(|t| t.run != run);
        before - self.heap.len()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_due_order() {
        let mut queue = DelayedQueue::new();
        let run = RunToken::default();
        queue.schedule(1000, run, "complete");
        queue.schedule(100, run, "entangle");
        queue.schedule(500, run, "swap");

        assert_eq!(queue.next_due(), Some(100));
        assert!(queue.pop_due(99).is_none());
        assert_eq!(queue.pop_due(5000).unwrap().payload, "entangle");
        assert_eq!(queue.pop_due(5000).unwrap().payload, "swap");
        assert_eq!(queue.pop_due(5000).unwrap().payload, "complete");
        assert!(queue.pop_due(5000).is_none());
    }

    #[test]
    fn test_same_time_is_fifo() {
        let mut queue = DelayedQueue::new();
        let run = RunToken::default();
        for i in 0..5 {
            queue.schedule(100, run, i);
        }

        let order: Vec<_> = std::iter::from_fn(|| queue.pop_due(100))
            .map(|t| t.payload)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cancel_run() {
        let mut queue = DelayedQueue::new();
        let old = RunToken::default();
        let new = old.next();
        queue.schedule(100, old, 1);
        queue.schedule(200, old, 2);
        queue.schedule(150, new, 3);

        assert_eq!(queue.cancel_run(old), 2);
        assert_eq!(queue.len(), 1);
        let task = queue.pop_due(1000).unwrap();
        assert_eq!(task.payload, 3);
        assert_eq!(task.run, new);
    }

    #[test]
    fn test_run_token_advances() {
        let token = RunToken::default();
        assert_eq!(token.value(), 0);
        assert_eq!(token.next().value(), 1);
        assert_ne!(token, token.next());
    }

    #[test]
    fn test_clear() {
        let mut queue = DelayedQueue::new();
        queue.schedule(1, RunToken::default(), ());
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.next_due().is_none());
    }
}
