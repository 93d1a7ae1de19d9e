//! Bounded FIFO of recent classifications

use std::collections::VecDeque;

use crate::gesture::Classification;

/// Default number of classifications kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Most recent classifications in temporal order, oldest evicted first
#[derive(Debug, Clone)]
pub struct RollingHistory {
    entries: VecDeque<Classification>,
    capacity: usize,
}

impl RollingHistory {
    /// Create a history holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a classification, evicting the oldest when full
    pub fn push(&mut self, entry: Classification) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Classification> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&Classification> {
        self.entries.back()
    }

    /// Whether any remembered frame had no extended fingers
    pub fn contains_closed_hand(&self) -> bool {
        self.entries.iter().any(|c| c.extended_count == 0)
    }
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
