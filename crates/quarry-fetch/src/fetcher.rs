//! Single-file fetcher.
//!
//! Each task is driven through an explicit state machine:
//!
//! ```text
//! Resolve -> ResumeCheck -> Attempt(1..=n) -> Extract -> Done
//!               |              |    ^   |
//!               v              |    +---+ retry
//!             Done(Skipped)    v
//!                            Done(Failed)
//! ```
//!
//! Every transition is one call; events go to the injected [`EventSink`].

use futures::StreamExt;
use quarry_types::{
    Disposition, DownloadEvent, DownloadOutcome, EventSink, Settings, Task, TaskError,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::extract::extract_archive_blocking;
use crate::layout::FileTarget;
use crate::resume::is_download_needed;
use crate::{ArchiveSource, ByteStream, SourceError, SourceResponse};

/// Per-file behavior of the fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Store root, ending with `/`.
    pub base_url: String,
    /// Root of the local directory tree.
    pub output_dir: PathBuf,
    /// Attempts per file, including the first.
    pub retry_attempts: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
    /// Delay before every request.
    pub rate_limit_delay: Duration,
    /// Write buffer size.
    pub chunk_size: usize,
    /// Extract archives after download.
    pub auto_extract: bool,
    /// Delete the archive after a successful extraction.
    pub delete_archive: bool,
    /// Ignore the resume check.
    pub overwrite: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl FetchConfig {
    /// Builds the fetcher configuration from run settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let download = &settings.download;
        let files = &settings.file_processing;
        Self {
            base_url: settings.normalized_base_url(),
            output_dir: settings.output_directory.clone(),
            retry_attempts: download.retry_attempts.max(1),
            retry_delay: download.retry_delay(),
            rate_limit_delay: download.rate_limit_delay(),
            chunk_size: download.chunk_size.max(1),
            auto_extract: files.auto_extract,
            delete_archive: files.delete_archive_after_extract,
            overwrite: files.overwrite_existing,
        }
    }
}

/// One state of the per-task machine.
enum Step {
    Resolve,
    ResumeCheck(FileTarget),
    Attempt { target: FileTarget, attempt: u32 },
    Extract { target: FileTarget, bytes: u64 },
    Done(Disposition),
}

/// Failure while streaming a body to disk.
enum WriteError {
    /// The body broke off; retryable.
    Source(SourceError),
    /// Local I/O; not retryable.
    Io(std::io::Error),
}

/// Drives single tasks from URL resolution to extracted file.
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn ArchiveSource>,
    config: FetchConfig,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Creates a fetcher.
    #[must_use]
    pub fn new(source: Arc<dyn ArchiveSource>, config: FetchConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            source,
            config,
            sink,
        }
    }

    /// Returns the fetcher configuration.
    #[must_use]
    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Returns the event sink.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Processes one task to completion. Never fails; failures are recorded in
    /// the returned outcome.
    pub async fn fetch(&self, task: &Task) -> DownloadOutcome {
        self.sink.emit(DownloadEvent::TaskStarted { task: task.clone() });

        let mut step = Step::Resolve;
        let detail = loop {
            step = match step {
                Step::Resolve => self.resolve(task).await,
                Step::ResumeCheck(target) => self.resume_check(task, target).await,
                Step::Attempt { target, attempt } => self.attempt(task, target, attempt).await,
                Step::Extract { target, bytes } => self.extract(task, target, bytes).await,
                Step::Done(detail) => break detail,
            };
        };

        match &detail {
            Disposition::Failed(error) => self.sink.emit(DownloadEvent::TaskFailed {
                task: task.clone(),
                error: error.clone(),
            }),
            other => self.sink.emit(DownloadEvent::TaskSucceeded {
                task: task.clone(),
                skipped: matches!(other, Disposition::Skipped),
            }),
        }

        DownloadOutcome {
            task: task.clone(),
            detail,
        }
    }

    async fn resolve(&self, task: &Task) -> Step {
        let target = match FileTarget::resolve(&self.config.base_url, &self.config.output_dir, task) {
            Ok(target) => target,
            Err(error) => return Step::Done(Disposition::Failed(error)),
        };
        if let Err(e) = tokio::fs::create_dir_all(&target.dir).await {
            return Step::Done(Disposition::Failed(TaskError::Unexpected(format!(
                "creating directory '{}': {e}",
                target.dir.display()
            ))));
        }
        Step::ResumeCheck(target)
    }

    async fn resume_check(&self, task: &Task, target: FileTarget) -> Step {
        let csv_path = target.csv_path.clone();
        let overwrite = self.config.overwrite;
        let needed = tokio::task::spawn_blocking(move || is_download_needed(&csv_path, overwrite))
            .await
            .unwrap_or(true);

        if needed {
            return Step::Attempt { target, attempt: 1 };
        }
        self.sink.emit(DownloadEvent::Skipped {
            task: task.clone(),
            path: target.csv_path,
        });
        Step::Done(Disposition::Skipped)
    }

    async fn attempt(&self, task: &Task, target: FileTarget, attempt: u32) -> Step {
        tokio::time::sleep(self.config.rate_limit_delay).await;
        self.sink.emit(DownloadEvent::AttemptStarted {
            task: task.clone(),
            url: target.url.clone(),
            attempt,
            max_attempts: self.config.retry_attempts,
        });

        let stream = match self.source.get(&target.url).await {
            Ok(SourceResponse::Body(stream)) => stream,
            Ok(SourceResponse::NotFound) => {
                self.sink.emit(DownloadEvent::NotFound {
                    task: task.clone(),
                    url: target.url.clone(),
                });
                return Step::Done(Disposition::Failed(TaskError::NotFound { url: target.url }));
            }
            Ok(SourceResponse::Status(status)) => {
                return self
                    .retry_or_fail(task, target, attempt, format!("HTTP status {status}"))
                    .await;
            }
            Err(e) => return self.retry_or_fail(task, target, attempt, e.to_string()).await,
        };

        match self.write_archive(&target.archive_path, stream).await {
            Ok(bytes) => {
                self.sink.emit(DownloadEvent::Downloaded {
                    task: task.clone(),
                    path: target.archive_path.clone(),
                    bytes,
                });
                if self.config.auto_extract {
                    Step::Extract { target, bytes }
                } else {
                    Step::Done(Disposition::Downloaded { bytes })
                }
            }
            Err(WriteError::Source(e)) => {
                let _ = tokio::fs::remove_file(&target.archive_path).await;
                self.retry_or_fail(task, target, attempt, e.to_string()).await
            }
            Err(WriteError::Io(e)) => {
                let _ = tokio::fs::remove_file(&target.archive_path).await;
                Step::Done(Disposition::Failed(TaskError::Unexpected(format!(
                    "writing '{}': {e}",
                    target.archive_path.display()
                ))))
            }
        }
    }

    async fn retry_or_fail(&self, task: &Task, target: FileTarget, attempt: u32, message: String) -> Step {
        let max_attempts = self.config.retry_attempts;
        self.sink.emit(DownloadEvent::AttemptFailed {
            task: task.clone(),
            attempt,
            max_attempts,
            error: message.clone(),
        });

        if attempt >= max_attempts {
            return Step::Done(Disposition::Failed(TaskError::Transient {
                url: target.url,
                attempts: attempt,
                message,
            }));
        }

        self.sink.emit(DownloadEvent::RetryScheduled {
            task: task.clone(),
            delay: self.config.retry_delay,
        });
        tokio::time::sleep(self.config.retry_delay).await;
        Step::Attempt {
            target,
            attempt: attempt + 1,
        }
    }

    async fn write_archive(&self, path: &Path, mut stream: ByteStream) -> Result<u64, WriteError> {
        let file = tokio::fs::File::create(path).await.map_err(WriteError::Io)?;
        let mut writer = BufWriter::with_capacity(self.config.chunk_size, file);
        let mut bytes = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(WriteError::Source)?;
            writer.write_all(&chunk).await.map_err(WriteError::Io)?;
            bytes += chunk.len() as u64;
        }
        writer.flush().await.map_err(WriteError::Io)?;
        Ok(bytes)
    }

    async fn extract(&self, task: &Task, target: FileTarget, bytes: u64) -> Step {
        let extracted = extract_archive_blocking(
            target.archive_path.clone(),
            target.dir.clone(),
            target.csv_path.clone(),
        )
        .await;

        let path = match extracted {
            Ok(path) => path,
            Err(e) => {
                return Step::Done(Disposition::Failed(TaskError::Extraction {
                    path: target.archive_path,
                    message: e.to_string(),
                }));
            }
        };
        self.sink.emit(DownloadEvent::Extracted {
            task: task.clone(),
            path,
        });

        if self.config.delete_archive {
            match tokio::fs::remove_file(&target.archive_path).await {
                Ok(()) => self.sink.emit(DownloadEvent::ArchiveRemoved {
                    task: task.clone(),
                    path: target.archive_path,
                }),
                Err(e) => self.sink.emit(DownloadEvent::ArchiveRemoveFailed {
                    task: task.clone(),
                    path: target.archive_path,
                    error: e.to_string(),
                }),
            }
        }
        Step::Done(Disposition::Downloaded { bytes })
    }
}
