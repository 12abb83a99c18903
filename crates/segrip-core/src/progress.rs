//! Shared segment counter and the snapshot it publishes to the CLI.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Count of completed segments, shared by all download workers.
///
/// Only `increment_and_get`, `reset` and `get` are exposed.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    count: AtomicUsize,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one and returns the new value.
    pub fn increment_and_get(&self) -> usize {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Release);
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

/// Snapshot of download progress (CLI-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStats {
    pub completed: usize,
    pub total: usize,
}

impl ProgressStats {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }

    /// Textual bar, e.g. `[#####-----] 50.00% (5/10)`.
    pub fn render_bar(&self, width: usize) -> String {
        let filled = ((self.fraction() * width as f64).round() as usize).min(width);
        format!(
            "[{}{}] {:.2}% ({}/{})",
            "#".repeat(filled),
            "-".repeat(width - filled),
            self.fraction() * 100.0,
            self.completed,
            self.total
        )
    }
}
