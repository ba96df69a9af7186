//! Coarse batch progress: percentage processed, reported only on change.

/// Snapshot handed to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    /// Percentage in tenths of a percent (1000 = 100.0%)
    pub tenths: u64,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        self.tenths as f64 / 10.0
    }
}

/// Counts processed IDs and yields a snapshot whenever the truncated
/// percentage moves. 100.0% is only reached on the last ID.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    done: usize,
    last_tenths: Option<u64>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: 0,
            last_tenths: None,
        }
    }

    /// Record one processed ID (blocked or skipped)
    pub fn advance(&mut self) -> Option<Progress> {
        if self.total == 0 {
            return None;
        }
        self.done = (self.done + 1).min(self.total);

        let total = self.total as u64;
        let tenths = self.done as u64 * 1000 / total;
        if self.last_tenths == Some(tenths) {
            return None;
        }
        self.last_tenths = Some(tenths);

        Some(Progress {
            done: self.done,
            total: self.total,
            tenths,
        })
    }
}
