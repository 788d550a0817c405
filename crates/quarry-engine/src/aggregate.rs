//! Reduction of task outcomes into run statistics.

use quarry_types::{
    DownloadEvent, DownloadOutcome, EventSink, RunSummary, SymbolDataResult, SymbolDay, Task,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Default number of completions between progress events.
pub const DEFAULT_PROGRESS_EVERY: usize = 10;

/// Rolls outcomes into counters and per symbol-day results.
///
/// Owned by a single consumer loop; outcomes may arrive in any order.
pub struct Aggregator {
    total: usize,
    expected: HashMap<SymbolDay, usize>,
    pending: HashMap<SymbolDay, SymbolDataResult>,
    finished: Vec<SymbolDataResult>,
    completed: usize,
    successful: usize,
    skipped: usize,
    failed: usize,
    progress_every: usize,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("total", &self.total)
            .field("completed", &self.completed)
            .field("successful", &self.successful)
            .field("skipped", &self.skipped)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Creates an aggregator for the given plan.
    #[must_use]
    pub fn new(tasks: &[Task], progress_every: usize, sink: Arc<dyn EventSink>) -> Self {
        let mut expected: HashMap<SymbolDay, usize> = HashMap::new();
        for task in tasks {
            *expected.entry(task.symbol_day()).or_default() += 1;
        }
        Self {
            total: tasks.len(),
            expected,
            pending: HashMap::new(),
            finished: Vec::new(),
            completed: 0,
            successful: 0,
            skipped: 0,
            failed: 0,
            progress_every: progress_every.max(1),
            sink,
        }
    }

    /// Number of outcomes recorded so far.
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// Number of tasks in the plan.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Records one outcome.
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        self.completed += 1;
        if outcome.succeeded() {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        if outcome.is_skipped() {
            self.skipped += 1;
        }

        let key = outcome.task.symbol_day();
        let group = self
            .pending
            .entry(key.clone())
            .or_insert_with(|| SymbolDataResult::new(key.symbol.clone(), key.date));
        group.record(outcome);

        let expected = self.expected.get(&key).copied().unwrap_or(0);
        if group.total_count() >= expected {
            if let Some(result) = self.pending.remove(&key) {
                self.sink.emit(DownloadEvent::SymbolDayFinished {
                    result: result.clone(),
                });
                self.finished.push(result);
            }
        }

        if self.completed % self.progress_every == 0 || self.completed == self.total {
            self.sink.emit(DownloadEvent::Progress {
                completed: self.completed,
                total: self.total,
                successful: self.successful,
            });
        }
    }

    /// Produces the final summary.
    ///
    /// Symbol-days with outstanding tasks (only possible when interrupted) are
    /// counted in `symbol_days_total` but not listed.
    #[must_use]
    pub fn finish(mut self, interrupted: bool) -> RunSummary {
        self.finished
            .sort_by(|a, b| (a.date, &a.symbol).cmp(&(b.date, &b.symbol)));
        RunSummary {
            total: self.total,
            completed: self.completed,
            successful: self.successful,
            skipped: self.skipped,
            failed: self.failed,
            symbol_days_total: self.expected.len(),
            symbol_days: self.finished,
            interrupted,
        }
    }
}
