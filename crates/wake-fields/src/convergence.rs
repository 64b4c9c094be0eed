//! Per-slice convergence records and running averages.

use wake_types::state::{ConvergenceRecord, NonConvergenceWarning, SliceOutcome};

#[derive(Debug, Clone, Default)]
pub struct ConvergenceLog {
    records: Vec<ConvergenceRecord>,
    warnings: Vec<NonConvergenceWarning>,
    iteration_sum: usize,
    error_sum: f64,
}

impl ConvergenceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ConvergenceRecord) {
        self.iteration_sum += record.iterations;
        self.error_sum += record.relative_error;
        self.records.push(record);
    }

    pub fn warn(&mut self, warning: NonConvergenceWarning) {
        self.warnings.push(warning);
    }

    pub fn records(&self) -> &[ConvergenceRecord] {
        &self.records
    }

    pub fn warnings(&self) -> &[NonConvergenceWarning] {
        &self.warnings
    }

    pub fn last(&self) -> Option<&ConvergenceRecord> {
        self.records.last()
    }

    /// Mean iteration count over all recorded slices.
    pub fn average_iterations(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.iteration_sum as f64 / self.records.len() as f64
    }

    /// Mean relative error over all recorded slices.
    pub fn average_error(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.error_sum / self.records.len() as f64
    }

    /// Slices that ended at the iteration budget.
    pub fn max_iter_hits(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == SliceOutcome::MaxIterHit)
            .count()
    }
}
