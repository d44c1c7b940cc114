//! Sliding window of completed-cycle samples for trend display.

use crate::metrics::HistorySample;
use std::collections::VecDeque;

/// Default number of retained samples.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Chronological, bounded history. Oldest samples are dropped first.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    samples: VecDeque<HistorySample>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample and prune to capacity.
    pub fn push(&mut self, sample: HistorySample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Mean quality (percent) over the window.
    pub fn mean_quality(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.quality).sum();
        Some(sum / self.samples.len() as f64)
    }

    /// Time span covered by the window in ms.
    pub fn time_range(&self) -> Option<(u64, u64)> {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => Some((first.timestamp_ms, last.timestamp_ms)),
            _ => None,
        }
    }

    pub fn to_vec(&self) -> Vec<HistorySample> {
        self.samples.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;

    fn sample(timestamp_ms: u64, quality: f64) -> HistorySample {
        let metrics = Metrics {
            quality,
            ..Default::default()
        };
        HistorySample::from_metrics("00:00", timestamp_ms, &metrics)
    }

    #[test]
    fn test_history_new() {
        let history = HistoryStore::default();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 20);
        assert!(history.mean_quality().is_none());
    }

    #[test]
    fn test_history_sliding_window() {
        let mut history = HistoryStore::new(DEFAULT_HISTORY_CAPACITY);
        for i in 0..45 {
            history.push(sample(i * 3000, 0.9));
        }

        assert_eq!(history.len(), 20);
        assert_eq!(history.iter().next().unwrap().timestamp_ms, 25 * 3000);
        assert_eq!(history.latest().unwrap().timestamp_ms, 44 * 3000);
    }

    #[test]
    fn test_history_chronological() {
        let mut history = HistoryStore::new(5);
        for i in 0..5 {
            history.push(sample(i * 1000, 0.9));
        }

        let stamps: Vec<_> = history.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(stamps, vec![0, 1000, 2000, 3000, 4000]);
        assert_eq!(history.time_range(), Some((0, 4000)));
    }

    #[test]
    fn test_history_mean_quality() {
        let mut history = HistoryStore::new(5);
        history.push(sample(0, 0.8));
        history.push(sample(1000, 0.6));

        let mean = history.mean_quality().unwrap();
        assert!((mean - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_history_clear() {
        let mut history = HistoryStore::new(5);
        history.push(sample(0, 0.8));
        history.clear();
        assert!(history.is_empty());
        assert!(history.time_range().is_none());
    }
}
