use std::collections::VecDeque;

use crate::types::PredictionRecord;

/// Number of predictions kept for the dashboard.
pub const MAX_HISTORY: usize = 200;

/// Fixed-capacity window of recent predictions, oldest evicted first.
#[derive(Debug)]
pub struct History {
    capacity: usize,
    window: VecDeque<PredictionRecord>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            window: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends a record, returning the evicted one when the window was full.
    pub fn push(&mut self, record: PredictionRecord) -> Option<PredictionRecord> {
        if self.capacity == 0 {
            return Some(record);
        }
        let evicted = if self.window.len() == self.capacity {
            self.window.pop_front()
        } else {
            None
        };
        self.window.push_back(record);
        evicted
    }

    pub fn last(&self) -> Option<&PredictionRecord> {
        self.window.back()
    }

    /// Oldest first.
    pub fn snapshot(&self) -> Vec<PredictionRecord> {
        self.window.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
