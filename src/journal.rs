//! Transmission log: bounded, newest-first store of human-readable entries.
//!
//! This is the only user-visible output channel of the engine. Once the
//! store holds `capacity` entries, every push silently drops the oldest.

use crate::clock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of retained entries.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Info,
    Success,
    Warning,
    Error,
}

impl LogSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSeverity::Info => "INFO",
            LogSeverity::Success => "OK",
            LogSeverity::Warning => "WARN",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// One immutable log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic sequence number, never reused within a store.
    pub seq: u64,
    /// Epoch milliseconds.
    pub timestamp_ms: u64,
    /// `HH:MM:SS` label.
    pub timestamp: String,
    #[serde(rename = "type")]
    pub severity: LogSeverity,
    pub message: String,
}

/// Bounded newest-first log.
#[derive(Debug, Clone)]
pub struct TransmissionLog {
    /// Front is newest.
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_seq: u64,
}

impl Default for TransmissionLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl TransmissionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 1,
        }
    }

    /// Append an entry, dropping the oldest beyond capacity.
    pub fn push(
        &mut self,
        severity: LogSeverity,
        message: impl Into<String>,
        timestamp_ms: u64,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.entries.push_front(LogEntry {
            seq,
            timestamp_ms,
            timestamp: clock::wall_clock_label(timestamp_ms),
            severity,
            message: message.into(),
        });

        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }

        seq
    }

    pub fn info(&mut self, message: impl Into<String>, timestamp_ms: u64) -> u64 {
        self.push(LogSeverity::Info, message, timestamp_ms)
    }

    pub fn success(&mut self, message: impl Into<String>, timestamp_ms: u64) -> u64 {
        self.push(LogSeverity::Success, message, timestamp_ms)
    }

    pub fn warning(&mut self, message: impl Into<String>, timestamp_ms: u64) -> u64 {
        self.push(LogSeverity::Warning, message, timestamp_ms)
    }

    pub fn error(&mut self, message: impl Into<String>, timestamp_ms: u64) -> u64 {
        self.push(LogSeverity::Error, message, timestamp_ms)
    }

    /// Entries newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Retained entries with `seq > after`, oldest first. Used for tailing.
    pub fn entries_since(&self, after: u64) -> Vec<LogEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.seq > after)
            .cloned()
            .collect()
    }

    /// Sequence number of the last entry ever pushed (0 if none).
    pub fn last_seq(&self) -> u64 {
        self.next_seq - 1
    }

    pub fn count(&self, severity: LogSeverity) -> usize {
        self.entries.iter().filter(|e| e.severity == severity).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all entries. Sequence numbers keep counting.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Owned copy, newest first.
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut log = TransmissionLog::new(10);
        log.info("first", 1000);
        log.success("second", 2000);

        let messages: Vec<_> = log.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "first"]);
        assert_eq!(log.latest().unwrap().severity, LogSeverity::Success);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut log = TransmissionLog::new(DEFAULT_LOG_CAPACITY);
        for i in 0..120 {
            log.info(format!("entry {}", i), i);
        }

        assert_eq!(log.len(), 50);
        assert_eq!(log.latest().unwrap().message, "entry 119");
        assert_eq!(log.iter().last().unwrap().message, "entry 70");
    }

    #[test]
    fn test_entries_since() {
        let mut log = TransmissionLog::new(3);
        log.info("a", 0);
        log.info("b", 0);
        let mark = log.last_seq();
        log.info("c", 0);
        log.info("d", 0);

        let tail: Vec<_> = log
            .entries_since(mark)
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(tail, vec!["c", "d"]);
    }

    #[test]
    fn test_clear_keeps_sequence() {
        let mut log = TransmissionLog::new(5);
        log.info("a", 0);
        log.info("b", 0);
        log.clear();

        assert!(log.is_empty());
        let seq = log.error("c", 0);
        assert_eq!(seq, 3);
        assert_eq!(log.count(LogSeverity::Error), 1);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let mut log = TransmissionLog::new(5);
        log.warning("careful", 0);

        let json = serde_json::to_string(log.latest().unwrap()).unwrap();
        assert!(json.contains("\"type\":\"warning\""));
    }

    #[test]
    fn test_severity_as_str() {
        assert_eq!(LogSeverity::Info.as_str(), "INFO");
        assert_eq!(LogSeverity::Error.as_str(), "ERROR");
    }
}
