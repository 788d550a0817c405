//! Task outcomes and run statistics.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::{Task, TaskError};

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// A complete output already existed; nothing was fetched.
    Skipped,
    /// The archive was fetched (and extracted, if enabled).
    Downloaded {
        /// Archive size in bytes.
        bytes: u64,
    },
    /// The task failed.
    Failed(TaskError),
}

/// Result of driving one task through the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// The task this outcome belongs to.
    pub task: Task,
    /// How it ended.
    pub detail: Disposition,
}

impl DownloadOutcome {
    /// Creates a skipped outcome.
    #[must_use]
    pub const fn skipped(task: Task) -> Self {
        Self {
            task,
            detail: Disposition::Skipped,
        }
    }

    /// Creates a downloaded outcome.
    #[must_use]
    pub const fn downloaded(task: Task, bytes: u64) -> Self {
        Self {
            task,
            detail: Disposition::Downloaded { bytes },
        }
    }

    /// Creates a failed outcome.
    #[must_use]
    pub const fn failed(task: Task, error: TaskError) -> Self {
        Self {
            task,
            detail: Disposition::Failed(error),
        }
    }

    /// Skipped and downloaded tasks both count as successes.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        !matches!(self.detail, Disposition::Failed(_))
    }

    /// Returns true if the task was skipped by the resume check.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.detail, Disposition::Skipped)
    }

    /// Returns the error, if the task failed.
    #[must_use]
    pub const fn error(&self) -> Option<&TaskError> {
        match &self.detail {
            Disposition::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Success flags for every data type (and interval) of one symbol and date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDataResult {
    /// Trading pair.
    pub symbol: String,
    /// Trading day.
    pub date: NaiveDate,
    /// Task key (`data_type` or `data_type_interval`) → success.
    pub results: BTreeMap<String, bool>,
}

impl SymbolDataResult {
    /// Creates an empty result.
    #[must_use]
    pub const fn new(symbol: String, date: NaiveDate) -> Self {
        Self {
            symbol,
            date,
            results: BTreeMap::new(),
        }
    }

    /// Records an outcome under its task key.
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        self.results.insert(outcome.task.key(), outcome.succeeded());
    }

    /// Number of successful keys.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.results.values().filter(|ok| **ok).count()
    }

    /// Number of recorded keys.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Fraction of successful keys in `0.0..=1.0`; zero when nothing was recorded.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.success_count() as f64 / self.total_count() as f64
    }

    /// True when at least one key was recorded and every key succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        !self.results.is_empty() && self.results.values().all(|ok| *ok)
    }
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Number of tasks planned.
    pub total: usize,
    /// Number of tasks that produced an outcome.
    pub completed: usize,
    /// Tasks that succeeded (downloaded or skipped).
    pub successful: usize,
    /// Tasks skipped by the resume check.
    pub skipped: usize,
    /// Tasks that failed.
    pub failed: usize,
    /// Number of symbol-days planned.
    pub symbol_days_total: usize,
    /// Per symbol-day results for every group whose tasks all completed, in
    /// date-major order.
    pub symbol_days: Vec<SymbolDataResult>,
    /// True if the run was stopped before every task was started.
    pub interrupted: bool,
}

impl RunSummary {
    /// Number of symbol-days where every data type and interval succeeded.
    #[must_use]
    pub fn symbol_days_successful(&self) -> usize {
        self.symbol_days.iter().filter(|r| r.all_succeeded()).count()
    }

    /// Percentage of planned symbol-days that fully succeeded.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.symbol_days_total == 0 {
            return 0.0;
        }
        self.symbol_days_successful() as f64 / self.symbol_days_total as f64 * 100.0
    }

    /// Percentage of planned tasks that succeeded.
    #[must_use]
    pub fn task_success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total as f64 * 100.0
    }

    /// Returns true if every planned task produced an outcome.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}
