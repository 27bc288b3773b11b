//! Operator-facing activity log

use parking_lot::Mutex;
use scalper_ports::ActivityLog;
use std::collections::VecDeque;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct Entry {
    is_error: bool,
    message: String,
}

/// Bounded in-memory log shown under the status lines
///
/// Snapshots list informational entries first, then errors prefixed with
/// `ERROR:`, each group in arrival order. When full the oldest entry is
/// dropped.
#[derive(Debug)]
pub struct LogBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<Entry>>,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn error_count(&self) -> usize {
        self.entries.lock().iter().filter(|e| e.is_error).count()
    }
}

impl ActivityLog for LogBuffer {
    fn record(&self, is_error: bool, message: &str) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(Entry {
            is_error,
            message: message.to_string(),
        });
    }

    fn reset(&self) {
        self.entries.lock().clear();
    }

    fn snapshot(&self) -> Vec<String> {
        let entries = self.entries.lock();
        let infos = entries
            .iter()
            .filter(|e| !e.is_error)
            .map(|e| e.message.clone());
        let errors = entries
            .iter()
            .filter(|e| e.is_error)
            .map(|e| format!("ERROR: {}", e.message));
        infos.chain(errors).collect()
    }
}
