//! Bounded history of named result snapshots for side-by-side comparison.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::simulation::AcousticResult;

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 5;

/// Named snapshot of the headline metrics of one result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    name: String,
    f1: f64,
    cutoff: f64,
    resistance: f64,
    brightness: f64,
    harmonicity: f64,
}

impl ComparisonEntry {
    pub fn from_result(name: impl Into<String>, result: &AcousticResult) -> Self {
        Self {
            name: name.into(),
            f1: result.first_resonance_hz(),
            cutoff: result.cutoff_hz(),
            resistance: result.resistance_score(),
            brightness: result.brightness(),
            harmonicity: result.harmonicity(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn f1(&self) -> f64 {
        self.f1
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    pub fn harmonicity(&self) -> f64 {
        self.harmonicity
    }
}

/// FIFO window of the most recent entries, oldest first.
#[derive(Debug, Clone)]
pub struct ComparisonHistory {
    capacity: usize,
    entries: VecDeque<ComparisonEntry>,
}

impl ComparisonHistory {
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
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

    /// Append, evicting the oldest entry when full. Returns the window.
    pub fn add(&mut self, entry: ComparisonEntry) -> Vec<ComparisonEntry> {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.current()
    }

    /// Snapshot `result` under `name` and append it.
    ///
    /// Without a result nothing is recorded and `None` is returned. A blank
    /// name becomes `Design {n}` where `n` is the entry's 1-based position.
    pub fn add_result(&mut self, name: &str, result: Option<&AcousticResult>) -> Option<Vec<ComparisonEntry>> {
        let result = result?;
        let name = match name.trim() {
            "" => format!("Design {}", self.entries.len() + 1),
            trimmed => trimmed.to_string(),
        };
        Some(self.add(ComparisonEntry::from_result(name, result)))
    }

    /// Entries, oldest to newest.
    pub fn current(&self) -> Vec<ComparisonEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ComparisonHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
