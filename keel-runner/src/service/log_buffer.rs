//! Log buffer service
//!
//! Collects the log entries of the step currently running. The sequencer
//! drains the buffer when the step finishes and attaches the entries to
//! the step record.

use keel_core::domain::log::LogEntry;
use std::sync::{Arc, Mutex};

/// Service for managing log buffers
pub trait LogBufferService: Send + Sync {
    /// Adds a log entry to the buffer
    fn add_entry(&self, entry: LogEntry);

    /// Drains all log entries from the buffer
    ///
    /// This returns all buffered entries and clears the buffer.
    fn drain(&self) -> Vec<LogEntry>;
}

/// In-memory implementation of LogBufferService
///
/// Uses Arc<Mutex<Vec<LogEntry>>> for thread-safe access across tasks.
#[derive(Clone)]
pub struct InMemoryLogBuffer {
    buffer: Arc<Mutex<Vec<LogEntry>>>,
}

impl InMemoryLogBuffer {
    /// Creates a new in-memory log buffer
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for InMemoryLogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBufferService for InMemoryLogBuffer {
    fn add_entry(&self, entry: LogEntry) {
        // A poisoned buffer still holds valid entries
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        buffer.push(entry);
    }

    fn drain(&self) -> Vec<LogEntry> {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        buffer.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::domain::log::LogLevel;

    #[test]
    fn test_drain_empties_buffer() {
        let buffer = InMemoryLogBuffer::new();
        buffer.add_entry(LogEntry::now(LogLevel::Info, "first"));
        buffer.add_entry(LogEntry::now(LogLevel::Error, "second"));

        let drained = buffer.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].message, "second");
        assert!(buffer.drain().is_empty());
    }
}
