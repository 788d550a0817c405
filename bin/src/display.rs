//! Progress bar and summary output for the quarry CLI.

use indicatif::{ProgressBar, ProgressStyle};
use quarry_lib::prelude::*;

/// Event sink that drives a progress bar and forwards every event to tracing.
///
/// Log lines are written with the bar suspended so they do not tear it.
pub(crate) struct ProgressSink {
    bar: ProgressBar,
    inner: TracingSink,
}

impl ProgressSink {
    /// Creates a sink; the bar stays hidden in quiet mode.
    pub(crate) fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}",
            ) {
                bar.set_style(style.progress_chars("=>-"));
            }
            bar
        };
        Self {
            bar,
            inner: TracingSink,
        }
    }
}

impl EventSink for ProgressSink {
    fn emit(&self, event: DownloadEvent) {
        match &event {
            DownloadEvent::RunStarted { tasks, .. } => self.bar.set_length(*tasks as u64),
            DownloadEvent::TaskSucceeded { .. } | DownloadEvent::TaskFailed { .. } => {
                self.bar.inc(1);
            }
            DownloadEvent::SymbolDayFinished { result } => {
                self.bar.set_message(format!("{} {}", result.symbol, result.date));
            }
            DownloadEvent::Summary { .. } => self.bar.finish_and_clear(),
            _ => {}
        }
        self.bar.suspend(|| self.inner.emit(event));
    }
}

/// Prints the final run summary to stdout.
pub(crate) fn print_summary(summary: &RunSummary) {
    println!();
    println!("Download summary");
    println!(
        "  Files:        {}/{} succeeded ({} skipped, {} failed)",
        summary.successful, summary.total, summary.skipped, summary.failed
    );
    println!(
        "  Symbol-days:  {}/{} complete",
        summary.symbol_days_successful(),
        summary.symbol_days_total
    );
    println!("  Success rate: {:.1}%", summary.success_rate());
    if summary.interrupted {
        println!(
            "  Interrupted after {}/{} files; rerun to resume.",
            summary.completed, summary.total
        );
    }
}

/// Prints one symbol-day result to stdout.
pub(crate) fn print_symbol_day(result: &SymbolDataResult) {
    println!("{} {}", result.symbol, result.date);
    for (key, ok) in &result.results {
        println!("  {:<28} {}", key, if *ok { "ok" } else { "FAILED" });
    }
    println!(
        "  {}/{} succeeded ({:.1}%)",
        result.success_count(),
        result.total_count(),
        result.success_rate() * 100.0
    );
}
