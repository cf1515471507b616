//! Event log shown next to the heap grid
//!
//! Append-only, newest first, capped at [`MAX_LOG_ENTRIES`]. Every committed
//! entry is mirrored to `tracing` under the `heapsim::gc` target.

use serde::Serialize;
use std::collections::VecDeque;

/// Maximum number of retained log entries
pub const MAX_LOG_ENTRIES: usize = 50;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Informational
    Info,
    /// A pause or other notable event
    Warn,
    /// A collection finished
    Success,
    /// A failure path was taken
    Error,
}

/// A log message produced by a collector step, not yet committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Severity
    pub level: LogLevel,
    /// Human-readable text
    pub message: String,
}

impl LogEvent {
    /// Create an event
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// A committed log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Unique id within the simulation
    pub id: u64,
    /// Human-readable text
    pub message: String,
    /// Severity
    #[serde(rename = "type")]
    pub level: LogLevel,
    /// Wall-clock display time (HH:MM:SS)
    pub timestamp: String,
}

/// Capacity-bounded log, newest entry first
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    sequence: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Create an empty log with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }

    /// Create an empty log holding at most `capacity` entries (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            sequence: 0,
        }
    }

    /// Append an entry; the oldest entry is dropped once capacity is exceeded
    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) -> &LogEntry {
        let now = chrono::Local::now();
        self.sequence += 1;
        // Millisecond clock in the high bits keeps ids unique across resets.
        let id = ((now.timestamp_millis() as u64) << 16) | (self.sequence & 0xffff);
        let entry = LogEntry {
            id,
            message: message.into(),
            level,
            timestamp: now.format("%H:%M:%S").to_string(),
        };

        match level {
            LogLevel::Info | LogLevel::Success => {
                tracing::info!(target: "heapsim::gc", message = %entry.message)
            }
            LogLevel::Warn => tracing::warn!(target: "heapsim::gc", message = %entry.message),
            LogLevel::Error => tracing::error!(target: "heapsim::gc", message = %entry.message),
        }

        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        &self.entries[0]
    }

    /// Commit a pending event
    pub fn record(&mut self, event: LogEvent) -> &LogEntry {
        self.push(event.level, event.message)
    }

    /// Entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Clone entries into a vector, newest first
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut log = EventLog::new();
        log.push(LogLevel::Info, "first");
        log.push(LogLevel::Warn, "second");

        let messages: Vec<_> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "first"]);
        assert_eq!(log.latest().map(|e| e.level), Some(LogLevel::Warn));
    }

    #[test]
    fn test_capacity_bound() {
        let mut log = EventLog::new();
        for i in 0..120 {
            log.push(LogLevel::Info, format!("event {i}"));
            assert!(log.len() <= MAX_LOG_ENTRIES);
            assert_eq!(log.latest().map(|e| e.message.clone()), Some(format!("event {i}")));
        }
        assert_eq!(log.len(), MAX_LOG_ENTRIES);
        assert_eq!(log.entries().last().map(|e| e.message.as_str()), Some("event 70"));
    }

    #[test]
    fn test_ids_unique() {
        let mut log = EventLog::new();
        for _ in 0..10 {
            log.push(LogLevel::Info, "tick");
        }
        let mut ids: Vec<_> = log.entries().map(|e| e.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_record_event() {
        let mut log = EventLog::new();
        let entry = log.record(LogEvent::new(LogLevel::Error, "boom"));
        assert_eq!(entry.message, "boom");
        assert_eq!(entry.timestamp.len(), 8);
    }
}
