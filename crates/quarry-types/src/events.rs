//! Run events and the sinks that consume them.
//!
//! Every component reports through an injected [`EventSink`] instead of a
//! global logger, so a run can be observed by tracing, by a progress bar, by
//! a test harness, or not at all.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use crate::{DataType, RunSummary, SymbolDataResult, Task, TaskError};

/// Something observable that happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// Task generation finished.
    PlanBuilt {
        /// Number of tasks generated.
        tasks: usize,
        /// Number of days in the range.
        days: usize,
        /// Number of symbols.
        symbols: usize,
    },
    /// An interval-bearing type is enabled but no intervals are configured.
    IntervalsMissing {
        /// The skipped data type.
        data_type: DataType,
    },
    /// The dispatcher started.
    RunStarted {
        /// Number of tasks.
        tasks: usize,
        /// Concurrency limit.
        workers: usize,
    },
    /// A task entered the fetcher.
    TaskStarted {
        /// The task.
        task: Task,
    },
    /// A network attempt is about to be made.
    AttemptStarted {
        /// The task.
        task: Task,
        /// The archive URL.
        url: String,
        /// 1-based attempt number.
        attempt: u32,
        /// Configured number of attempts.
        max_attempts: u32,
    },
    /// A network attempt failed with a retryable error.
    AttemptFailed {
        /// The task.
        task: Task,
        /// 1-based attempt number.
        attempt: u32,
        /// Configured number of attempts.
        max_attempts: u32,
        /// Error description.
        error: String,
    },
    /// Another attempt will follow after a delay.
    RetryScheduled {
        /// The task.
        task: Task,
        /// Delay before the next attempt.
        delay: Duration,
    },
    /// The output already exists and looks complete.
    Skipped {
        /// The task.
        task: Task,
        /// The existing output.
        path: PathBuf,
    },
    /// The store has no archive for the task.
    NotFound {
        /// The task.
        task: Task,
        /// The requested URL.
        url: String,
    },
    /// The archive was written to disk.
    Downloaded {
        /// The task.
        task: Task,
        /// The archive path.
        path: PathBuf,
        /// Archive size in bytes.
        bytes: u64,
    },
    /// The archive was extracted.
    Extracted {
        /// The task.
        task: Task,
        /// The extracted file.
        path: PathBuf,
    },
    /// The archive was deleted after extraction.
    ArchiveRemoved {
        /// The task.
        task: Task,
        /// The deleted archive.
        path: PathBuf,
    },
    /// The archive could not be deleted after extraction. Not a task failure.
    ArchiveRemoveFailed {
        /// The task.
        task: Task,
        /// The archive path.
        path: PathBuf,
        /// Error description.
        error: String,
    },
    /// The task finished successfully.
    TaskSucceeded {
        /// The task.
        task: Task,
        /// True if the resume check skipped it.
        skipped: bool,
    },
    /// The task failed.
    TaskFailed {
        /// The task.
        task: Task,
        /// Why.
        error: TaskError,
    },
    /// Every task of a symbol-day has finished.
    SymbolDayFinished {
        /// The grouped result.
        result: SymbolDataResult,
    },
    /// Periodic progress report.
    Progress {
        /// Tasks completed so far.
        completed: usize,
        /// Tasks planned.
        total: usize,
        /// Tasks that succeeded so far.
        successful: usize,
    },
    /// The run was stopped early; no new tasks were started.
    Interrupted {
        /// Tasks completed before stopping.
        completed: usize,
        /// Tasks planned.
        total: usize,
    },
    /// The run finished.
    Summary {
        /// Final statistics.
        summary: RunSummary,
    },
}

/// Receiver for [`DownloadEvent`]s.
///
/// Implementations must be `Send + Sync`; events are emitted concurrently from
/// every worker.
pub trait EventSink: Send + Sync {
    /// Handles one event.
    fn emit(&self, event: DownloadEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: DownloadEvent) {}
}

/// Sink that forwards events to `tracing` with structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: DownloadEvent) {
        match event {
            DownloadEvent::PlanBuilt {
                tasks,
                days,
                symbols,
            } => tracing::info!(tasks, days, symbols, "Generated download tasks"),
            DownloadEvent::IntervalsMissing { data_type } => tracing::warn!(
                data_type = %data_type,
                "No kline intervals configured, skipping data type"
            ),
            DownloadEvent::RunStarted { tasks, workers } => {
                tracing::info!(tasks, workers, "Starting downloads");
            }
            DownloadEvent::TaskStarted { task } => tracing::debug!(task = %task, "Task started"),
            DownloadEvent::AttemptStarted {
                task,
                url,
                attempt,
                max_attempts,
            } => tracing::debug!(task = %task, url, attempt, max_attempts, "Downloading"),
            DownloadEvent::AttemptFailed {
                task,
                attempt,
                max_attempts,
                error,
            } => tracing::warn!(task = %task, attempt, max_attempts, error, "Attempt failed"),
            DownloadEvent::RetryScheduled { task, delay } => {
                tracing::debug!(task = %task, delay_ms = delay.as_millis() as u64, "Retrying");
            }
            DownloadEvent::Skipped { task, path } => {
                tracing::info!(task = %task, path = %path.display(), "Already exists, skipping");
            }
            DownloadEvent::NotFound { task, url } => {
                tracing::warn!(task = %task, url, "Archive not found");
            }
            DownloadEvent::Downloaded { task, path, bytes } => {
                tracing::info!(task = %task, path = %path.display(), bytes, "Downloaded");
            }
            DownloadEvent::Extracted { task, path } => {
                tracing::info!(task = %task, path = %path.display(), "Extracted");
            }
            DownloadEvent::ArchiveRemoved { task, path } => {
                tracing::debug!(task = %task, path = %path.display(), "Removed archive");
            }
            DownloadEvent::ArchiveRemoveFailed { task, path, error } => tracing::warn!(
                task = %task,
                path = %path.display(),
                error,
                "Failed to remove archive"
            ),
            DownloadEvent::TaskSucceeded { task, skipped } => {
                tracing::debug!(task = %task, skipped, "Task succeeded");
            }
            DownloadEvent::TaskFailed { task, error } => {
                tracing::error!(task = %task, kind = error.kind(), error = %error, "Task failed");
            }
            DownloadEvent::SymbolDayFinished { result } => tracing::info!(
                symbol = %result.symbol,
                date = %result.date,
                successful = result.success_count(),
                total = result.total_count(),
                "Symbol-day finished"
            ),
            DownloadEvent::Progress {
                completed,
                total,
                successful,
            } => {
                let percent = if total == 0 {
                    100.0
                } else {
                    completed as f64 / total as f64 * 100.0
                };
                tracing::info!(
                    completed,
                    total,
                    successful,
                    percent = format_args!("{percent:.1}"),
                    "Progress"
                );
            }
            DownloadEvent::Interrupted { completed, total } => {
                tracing::warn!(completed, total, "Run interrupted, no new tasks started");
            }
            DownloadEvent::Summary { summary } => tracing::info!(
                total = summary.total,
                completed = summary.completed,
                successful = summary.successful,
                skipped = summary.skipped,
                failed = summary.failed,
                symbol_days = summary.symbol_days_total,
                symbol_days_successful = summary.symbol_days_successful(),
                success_rate = format_args!("{:.1}%", summary.success_rate()),
                interrupted = summary.interrupted,
                "Download run complete"
            ),
        }
    }
}

/// Sink that records every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DownloadEvent>>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<DownloadEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Counts recorded events matching a predicate.
    pub fn count(&self, predicate: impl Fn(&DownloadEvent) -> bool) -> usize {
        self.events
            .lock()
            .map(|events| events.iter().filter(|event| predicate(event)).count())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: DownloadEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
