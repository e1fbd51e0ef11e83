//! Bounded in-memory session log (SPEC_FULL §4.14 supplement).
//! Grounded in the teacher's `fault.rs::FaultManager` circular-buffer
//! eviction and the original source's `host/state/session_logs.py`,
//! which records `{category, data, timestamp}` entries for later
//! review with a fixed capacity.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::SESSION_LOG_CAPACITY;
use crate::state::now_seconds;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub category: String,
    pub data: String,
    pub timestamp: f64,
}

/// Fixed-capacity ring of [`SessionLogEntry`]; the oldest entry is
/// evicted when a new one arrives at capacity, matching the teacher's
/// `FaultManager` eviction policy.
pub struct SessionLog {
    entries: Mutex<VecDeque<SessionLogEntry>>,
    capacity: usize,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::with_capacity(SESSION_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn record(&self, category: impl Into<String>, data: impl Into<String>) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(SessionLogEntry {
            category: category.into(),
            data: data.into(),
            timestamp: now_seconds(),
        });
    }

    pub fn snapshot(&self) -> Vec<SessionLogEntry> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_in_order() {
        let log = SessionLog::new();
        log.record("command", "move");
        log.record("command", "focus");
        let entries = log.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].data, "move");
        assert_eq!(entries[1].data, "focus");
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let log = SessionLog::with_capacity(2);
        log.record("a", "1");
        log.record("a", "2");
        log.record("a", "3");
        let entries = log.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].data, "2");
        assert_eq!(entries[1].data, "3");
    }
}
