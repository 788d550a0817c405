//! Tracing subscriber setup: console output plus dated log files.

use anyhow::{Context, Result};
use quarry_lib::settings::{LogFormat, LoggingSettings};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::GlobalOpts;

const LOG_PREFIX: &str = "quarry";
const ERROR_LOG_PREFIX: &str = "quarry-errors";

/// Flushes and closes the log files when dropped. Hold it for the whole run.
#[derive(Debug)]
pub(crate) struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Installs the global subscriber. `RUST_LOG` wins over everything else.
///
/// With `file_output` on, every record also goes to
/// `{log_directory}/quarry.YYYY-MM-DD.log` and errors additionally to
/// `{log_directory}/quarry-errors.YYYY-MM-DD.log`.
pub(crate) fn init(settings: &LoggingSettings, opts: GlobalOpts) -> Result<LoggingGuard> {
    let directive = filter_directive(&settings.level, opts.verbose, opts.quiet);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let format = opts.log_format.unwrap_or(settings.format);
    let console = settings.console_output;

    let mut guards = Vec::new();
    let mut files = None;
    if settings.file_output {
        let dir = &settings.log_directory;
        let (all, all_guard) = file_writer(dir, LOG_PREFIX, settings.max_log_files)?;
        let (errors, errors_guard) = file_writer(dir, ERROR_LOG_PREFIX, settings.max_log_files)?;
        guards.extend([all_guard, errors_guard]);
        files = Some((all, errors));
    }

    let result = tracing_subscriber::registry()
        .with(filter)
        .with((console && format == LogFormat::Text).then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
        }))
        .with(
            (console && format == LogFormat::Json)
                .then(|| fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            files
                .as_ref()
                .map(|(all, _)| fmt::layer().with_writer(all.clone()).with_ansi(false)),
        )
        .with(files.map(|(_, errors)| {
            fmt::layer()
                .with_writer(errors)
                .with_ansi(false)
                .with_filter(LevelFilter::ERROR)
        }))
        .try_init();
    // A subscriber may already be installed; keep it.
    let _ = result;

    Ok(LoggingGuard { _guards: guards })
}

/// Non-blocking writer to a daily-rotated `{prefix}.YYYY-MM-DD.log` in `dir`.
fn file_writer(dir: &Path, prefix: &str, max_files: usize) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(max_files)
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Filter directive from the configured level and CLI verbosity flags.
fn filter_directive(level: &str, verbose: u8, quiet: bool) -> String {
    match (verbose, quiet) {
        (0, true) => "warn".to_string(),
        (0, false) => level.to_string(),
        (1, _) => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive("info", 0, false), "info");
        assert_eq!(filter_directive("quarry=debug", 0, false), "quarry=debug");
        assert_eq!(filter_directive("info", 0, true), "warn");
        assert_eq!(filter_directive("info", 1, true), "debug");
        assert_eq!(filter_directive("info", 3, false), "trace");
    }

    #[test]
    fn test_file_writer_creates_dated_log() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");

        let (mut writer, guard) = file_writer(&logs, ERROR_LOG_PREFIX, 2).unwrap();
        writer.write_all(b"disk full\n").unwrap();
        drop(writer);
        drop(guard);

        let files: Vec<_> = std::fs::read_dir(&logs)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("quarry-errors."), "{name}");
        assert!(name.ends_with(".log"), "{name}");
        assert_eq!(std::fs::read_to_string(&files[0]).unwrap(), "disk full\n");
    }

    #[test]
    fn test_file_writer_reports_unusable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        assert!(file_writer(&blocker.join("logs"), LOG_PREFIX, 1).is_err());
    }
}
